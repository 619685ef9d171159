//! 启动配置模块
//!
//! 后端基础 URL 在构建期由 Trunk 注入环境变量，
//! 未配置时启动必须立即失败，而不是带病运行。

use reelboard_shared::error::{ConsoleError, ConsoleResult};

/// 读取后端基础 URL
///
/// 未设置或为空白时返回 `ConsoleError::Config`。
pub fn api_base_url() -> ConsoleResult<&'static str> {
    match option_env!("REELBOARD_API_BASE_URL") {
        Some(url) if !url.trim().is_empty() => Ok(url),
        _ => Err(ConsoleError::config(
            "REELBOARD_API_BASE_URL is not set; refusing to start",
        )),
    }
}
