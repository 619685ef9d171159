//! 路由服务模块 - 核心引擎
//!
//! 封装了 web_sys 的 History API，实现高内聚：
//! 所有对 window.history 的操作都集中在此模块。
//! 守卫裁决本身是纯函数（见 route 模块），这里只负责执行：
//! 更新 History、更新路由信号、在会话状态变化时自动重定向。

use leptos::prelude::*;
use wasm_bindgen::prelude::*;

use super::route::{AppRoute, AuthStatus, GuardCheck, guard};

/// 获取当前浏览器路径
fn current_path() -> String {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_else(|| "/".to_string())
}

/// 推送 History 状态
fn push_history_state(path: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(history) = window.history() {
            let _ = history.push_state_with_url(&JsValue::NULL, "", Some(path));
        }
    }
}

/// 替换 History 状态（用于重定向）
fn replace_history_state(path: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(history) = window.history() {
            let _ = history.replace_state_with_url(&JsValue::NULL, "", Some(path));
        }
    }
}

/// 路由器服务
///
/// 封装所有路由操作，通过 Signal 驱动界面更新。
/// 认证状态以信号形式注入，与会话系统解耦。
#[derive(Clone, Copy)]
pub struct RouterService {
    /// 当前路由（只读信号）
    current_route: ReadSignal<AppRoute>,
    /// 设置当前路由（写入信号）
    set_route: WriteSignal<AppRoute>,
    /// 注入的认证状态信号
    auth_status: Signal<AuthStatus>,
}

impl RouterService {
    fn new(auth_status: Signal<AuthStatus>) -> Self {
        let path = current_path();
        let initial_route = AppRoute::from_path(&path);
        let (current_route, set_route) = signal(initial_route);

        Self {
            current_route,
            set_route,
            auth_status,
        }
    }

    /// 获取当前路由信号
    pub fn current_route(&self) -> ReadSignal<AppRoute> {
        self.current_route
    }

    /// 当前路由在当前认证状态下的守卫裁决
    pub fn current_check(&self) -> GuardCheck {
        guard(self.current_route.get(), self.auth_status.get())
    }

    /// **核心方法：导航与守卫**
    ///
    /// 流程：请求 -> 验证(Guard) -> 处理 -> 加载
    pub fn navigate(&self, path: &str) {
        let target_route = AppRoute::from_path(path);
        self.navigate_to_route(target_route, true);
    }

    /// 导航到指定路由
    ///
    /// `use_push` 为 true 时使用 pushState，否则 replaceState。
    fn navigate_to_route(&self, target_route: AppRoute, use_push: bool) {
        let auth = self.auth_status.get_untracked();

        let resolved = match guard(target_route, auth) {
            // 会话状态未知时先落在目标路由上，出口渲染占位，
            // 状态确定后由 auth Effect 补发重定向
            GuardCheck::Grant | GuardCheck::Defer => target_route,
            GuardCheck::RedirectToLogin => {
                web_sys::console::log_1(&"[Router] Access denied. Redirecting to login.".into());
                AppRoute::Login
            }
            GuardCheck::RedirectToDashboard => {
                web_sys::console::log_1(
                    &"[Router] Already signed in. Redirecting to dashboard.".into(),
                );
                AppRoute::Dashboard
            }
        };

        if use_push {
            push_history_state(resolved.to_path());
        } else {
            replace_history_state(resolved.to_path());
        }
        self.set_route.set(resolved);
    }

    /// 初始化浏览器后退/前进按钮监听
    fn init_popstate_listener(&self) {
        let set_route = self.set_route;
        let auth_status = self.auth_status;

        let closure = Closure::<dyn Fn()>::new(move || {
            let path = current_path();
            let target_route = AppRoute::from_path(&path);

            // popstate 时也执行守卫逻辑
            match guard(target_route, auth_status.get_untracked()) {
                GuardCheck::Grant | GuardCheck::Defer => set_route.set(target_route),
                GuardCheck::RedirectToLogin => {
                    replace_history_state(AppRoute::Login.to_path());
                    set_route.set(AppRoute::Login);
                }
                GuardCheck::RedirectToDashboard => {
                    replace_history_state(AppRoute::Dashboard.to_path());
                    set_route.set(AppRoute::Dashboard);
                }
            }
        });

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
        }

        // 泄漏闭包以保持监听器存活
        closure.forget();
    }

    /// 会话状态变化时的自动重定向
    ///
    /// 登录成功把登录页换成面板，会话失效把受保护页换回登录页。
    /// 状态仍为 Unknown 时不动作。
    fn setup_auth_redirect(&self) {
        let current_route = self.current_route;
        let set_route = self.set_route;
        let auth_status = self.auth_status;

        Effect::new(move |_| {
            let auth = auth_status.get();
            let route = current_route.get_untracked();

            match guard(route, auth) {
                GuardCheck::Grant | GuardCheck::Defer => {}
                GuardCheck::RedirectToLogin => {
                    web_sys::console::log_1(
                        &"[Router] Session ended. Redirecting to login.".into(),
                    );
                    push_history_state(AppRoute::Login.to_path());
                    set_route.set(AppRoute::Login);
                }
                GuardCheck::RedirectToDashboard => {
                    web_sys::console::log_1(
                        &"[Router] Signed in. Redirecting to dashboard.".into(),
                    );
                    push_history_state(AppRoute::Dashboard.to_path());
                    set_route.set(AppRoute::Dashboard);
                }
            }
        });
    }
}

/// 提供路由服务到 Context 并初始化
fn provide_router(auth_status: Signal<AuthStatus>) -> RouterService {
    let router = RouterService::new(auth_status);

    router.init_popstate_listener();
    router.setup_auth_redirect();

    provide_context(router);
    router
}

/// 从 Context 获取路由服务
pub fn use_router() -> RouterService {
    use_context::<RouterService>()
        .expect("RouterService not found in context. Ensure Router is provided.")
}

/// 导航函数（返回一个可调用的闭包）
pub fn use_navigate() -> impl Fn(&str) + Clone {
    let router = use_router();
    move |to: &str| {
        router.navigate(to);
    }
}

// ============================================================================
// UI 组件
// ============================================================================

/// 路由器根组件
///
/// 提供路由上下文，应在 App 根部使用。
#[component]
pub fn Router(
    /// 认证状态信号
    auth_status: Signal<AuthStatus>,
    /// 子组件
    children: Children,
) -> impl IntoView {
    provide_router(auth_status);

    children()
}

/// 路由出口组件
///
/// 按守卫裁决渲染：放行时交给匹配函数，会话未知时渲染中立占位，
/// 需要重定向时渲染空视图（跳转由导航和 auth Effect 负责）。
#[component]
pub fn RouterOutlet(
    /// 路由匹配函数：接收当前路由，返回对应视图
    matcher: fn(AppRoute) -> AnyView,
) -> impl IntoView {
    let router = use_router();

    move || match router.current_check() {
        GuardCheck::Grant => matcher(router.current_route().get()),
        GuardCheck::Defer => view! {
            <div class="min-h-screen flex items-center justify-center">
                <span class="loading loading-spinner loading-lg"></span>
            </div>
        }
        .into_any(),
        GuardCheck::RedirectToLogin | GuardCheck::RedirectToDashboard => ().into_any(),
    }
}
