//! Reelboard 管理前端
//!
//! 采用 Context-Driven 的高内聚低耦合架构：
//! - `web::route`: 路由定义与认证守卫（纯领域模型）
//! - `web::router`: 路由服务（核心引擎）
//! - `session`: 会话状态管理
//! - `queries`: 查询/变更缓存之上的视频数据层
//! - `components`: UI 组件层

mod api;
mod components {
    pub mod dashboard;
    mod icons;
    pub mod login;
    mod video_form;
    mod video_table;
}
mod config;
mod identity;
mod queries;
mod session;

pub(crate) mod web {
    pub mod route;
    pub mod router;
}

use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::VideoApi;
use crate::components::dashboard::DashboardPage;
use crate::components::login::LoginPage;
use crate::identity::RestIdentityProvider;
use crate::queries::{VideoQueries, provide_video_queries};
use crate::session::{SessionStore, provide_session};
use crate::web::route::AppRoute;
use crate::web::router::{Router, RouterOutlet};

/// 路由匹配函数
///
/// 根据 AppRoute 枚举返回对应的视图组件。
fn route_matcher(route: AppRoute) -> AnyView {
    match route {
        AppRoute::Login => view! { <LoginPage /> }.into_any(),
        AppRoute::Dashboard => view! { <DashboardPage /> }.into_any(),
        AppRoute::NotFound => view! {
            <div class="flex items-center justify-center min-h-screen bg-base-200">
                <div class="text-center">
                    <h1 class="text-6xl font-bold text-error">"404"</h1>
                    <p class="text-xl mt-4">"Page not found"</p>
                </div>
            </div>
        }
        .into_any(),
    }
}

#[component]
pub fn App() -> impl IntoView {
    // 1. 读取构建期配置，缺失时立即失败
    let base_url = match config::api_base_url() {
        Ok(url) => url,
        Err(e) => {
            web_sys::console::error_1(&e.to_string().into());
            panic!("{}", e);
        }
    };

    // 2. 创建会话层并触发既有会话恢复
    let provider = Rc::new(RestIdentityProvider::new(base_url));
    let store = SessionStore::new(provider);
    let session = provide_session(store.clone());
    spawn_local(async move { store.initialize().await });

    // 3. 创建查询层
    provide_video_queries(VideoQueries::new(VideoApi::new(base_url)));

    // 4. 认证状态信号注入路由服务，实现守卫
    let auth_status = session.auth_status_signal();

    view! {
        <Router auth_status=auth_status>
            <RouterOutlet matcher=route_matcher />
        </Router>
    }
}
