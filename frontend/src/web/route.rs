//! 路由定义模块
//!
//! 路由表、路径解析和认证守卫都是纯函数，不碰浏览器 API，
//! 可以在原生环境下直接测试。

/// 应用路由表
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AppRoute {
    #[default]
    Login,
    Dashboard,
    NotFound,
}

impl AppRoute {
    /// 从路径解析路由，未知路径归入 `NotFound`
    pub fn from_path(path: &str) -> Self {
        match path {
            "/" | "/login" => Self::Login,
            "/dashboard" => Self::Dashboard,
            _ => Self::NotFound,
        }
    }

    /// 路由对应的规范路径
    pub fn to_path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
            Self::NotFound => "/404",
        }
    }

    /// 该路由是否要求已登录
    pub fn requires_auth(self) -> bool {
        matches!(self, Self::Dashboard)
    }

    /// 已登录用户访问该路由时是否应跳走（登录页对已登录者无意义）
    pub fn redirects_when_authenticated(self) -> bool {
        matches!(self, Self::Login)
    }
}

/// 会话检查的三态结果
///
/// `Unknown` 表示会话恢复还没完成，此时守卫既不放行也不跳转。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthStatus {
    Unknown,
    SignedIn,
    SignedOut,
}

/// 守卫裁决
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardCheck {
    /// 放行，渲染目标视图
    Grant,
    /// 会话状态未知，渲染中立占位，不跳转
    Defer,
    /// 未登录访问受保护路由
    RedirectToLogin,
    /// 已登录访问登录页
    RedirectToDashboard,
}

/// 认证守卫
///
/// 对认证敏感的路由，在会话状态确定之前一律 `Defer`，
/// 避免恢复会话期间闪现错误的跳转。
pub fn guard(route: AppRoute, auth: AuthStatus) -> GuardCheck {
    let auth_sensitive = route.requires_auth() || route.redirects_when_authenticated();
    match auth {
        AuthStatus::Unknown if auth_sensitive => GuardCheck::Defer,
        AuthStatus::SignedOut if route.requires_auth() => GuardCheck::RedirectToLogin,
        AuthStatus::SignedIn if route.redirects_when_authenticated() => {
            GuardCheck::RedirectToDashboard
        }
        _ => GuardCheck::Grant,
    }
}
