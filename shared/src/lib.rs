use serde::{Deserialize, Serialize};

pub mod cache;
pub mod date;
pub mod error;
pub mod preview;

// =========================================================
// 常量定义 (Constants)
// =========================================================

/// 视频列表查询的缓存键
pub const QUERY_VIDEOS: &str = "videos";

// =========================================================
// 领域模型 (Domain Models)
// =========================================================

/// 后端持久化的视频记录
///
/// `id` 由服务端分配，唯一且不可变；其余字段在创建时写入，
/// 本系统不提供编辑操作（只有创建和删除）。
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub video_link: String,
    pub script: String,
    /// 操作员填写的短标识，与服务端分配的 `id` 无关，
    /// 不做唯一性或格式校验
    pub video_id: String,
    /// 服务端分配的创建时间（RFC 3339 字符串）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// 创建视频的请求体
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideoRequest {
    pub video_link: String,
    pub script: String,
    pub video_id: String,
}

/// 列表接口的响应体：`{ "videos": [...] }`
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VideoListResponse {
    pub videos: Vec<Video>,
}

/// 后端错误响应体中携带的消息字段
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ServerMessage {
    #[serde(default)]
    pub message: Option<String>,
}
