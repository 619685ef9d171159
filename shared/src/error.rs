//! 错误类型模块
//!
//! 控制台的错误分类：配置缺失、网络传输失败、服务端非 2xx 响应、
//! 身份提供者拒绝。错误一律通过 `Result` 向发起操作的视图传播，
//! 由视图负责以通知的形式呈现，任何一层都不得吞掉错误。

use std::fmt;

/// 应用级错误
///
/// 要求 `Clone`：查询缓存通过 `futures::future::Shared`
/// 把同一次拉取的结果分发给多个调用方。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    /// 启动配置缺失（如未设置后端基础 URL），启动期致命
    Config(String),
    /// 传输层失败（如主机不可达）
    Network(String),
    /// 服务端返回非 2xx，携带后端给出的消息
    Server { status: u16, message: String },
    /// 身份提供者拒绝登录/登出
    Auth(String),
}

impl ConsoleError {
    // --- Convenience constructors ---

    pub fn config(message: impl Into<String>) -> Self {
        ConsoleError::Config(message.into())
    }

    pub fn network(message: impl Into<String>) -> Self {
        ConsoleError::Network(message.into())
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        ConsoleError::Server {
            status,
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        ConsoleError::Auth(message.into())
    }

    /// 面向用户的消息文本
    ///
    /// 服务端错误优先展示后端自己的措辞。
    pub fn message(&self) -> &str {
        match self {
            ConsoleError::Config(msg)
            | ConsoleError::Network(msg)
            | ConsoleError::Auth(msg)
            | ConsoleError::Server { message: msg, .. } => msg,
        }
    }
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleError::Config(msg) => write!(f, "configuration error: {}", msg),
            ConsoleError::Network(msg) => write!(f, "network error: {}", msg),
            ConsoleError::Server { status, message } => {
                write!(f, "server error ({}): {}", status, message)
            }
            ConsoleError::Auth(msg) => write!(f, "auth error: {}", msg),
        }
    }
}

impl std::error::Error for ConsoleError {}

pub type ConsoleResult<T> = std::result::Result<T, ConsoleError>;
