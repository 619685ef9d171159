//! 会话模块
//!
//! 管理操作员的认证状态，与路由系统解耦：
//! - `SessionStore`: 进程内唯一的会话状态机，发布状态变更通知；
//! - `IdentityProvider`: 外部身份提供者的契约，具体实现可替换；
//! - `SessionContext`: 把状态桥接为 Leptos 信号，供视图与路由守卫消费。
//!
//! 登录/登出失败时状态保持不变，错误交还调用方，绝不吞掉。

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use async_trait::async_trait;
use gloo_storage::Storage;
use leptos::prelude::*;

use reelboard_shared::error::ConsoleResult;

use crate::web::route::AuthStatus;

const STORAGE_EMAIL_KEY: &str = "reelboard_email";

/// 已认证的操作员
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
}

/// 会话状态机
///
/// 启动时处于 `Loading`，向身份提供者查询既有会话后
/// 落入 `Authenticated` 或 `Anonymous`。
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Loading,
    Authenticated(User),
    Anonymous,
}

/// 外部身份提供者契约
///
/// 仅消费其成功/失败语义，提供者本身（托管服务还是自建接口）不在本层关心。
#[async_trait(?Send)]
pub trait IdentityProvider {
    /// 查询既有会话对应的用户
    async fn current_user(&self) -> ConsoleResult<Option<User>>;
    /// 用邮箱和密码登录
    async fn sign_in(&self, email: &str, password: &str) -> ConsoleResult<User>;
    /// 登出当前会话
    async fn sign_out(&self) -> ConsoleResult<()>;
}

type SessionListeners = RefCell<Vec<Option<Box<dyn Fn(&SessionState)>>>>;

/// 会话存储
///
/// 整个进程只构造一个实例，状态只通过本类型定义的操作变化。
#[derive(Clone)]
pub struct SessionStore {
    provider: Rc<dyn IdentityProvider>,
    state: Rc<RefCell<SessionState>>,
    listeners: Rc<SessionListeners>,
}

impl SessionStore {
    pub fn new(provider: Rc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            state: Rc::new(RefCell::new(SessionState::Loading)),
            listeners: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// 启动时查询身份提供者的既有会话
    ///
    /// 查询出错按匿名处理：控制台宁可要求重新登录，也不能卡在加载态。
    pub async fn initialize(&self) {
        let next = match self.provider.current_user().await {
            Ok(Some(user)) => SessionState::Authenticated(user),
            Ok(None) | Err(_) => SessionState::Anonymous,
        };
        self.set_state(next);
    }

    /// 登录
    ///
    /// 成功后进入 `Authenticated` 并通知订阅者；
    /// 失败时状态不变，错误向调用方传播。
    pub async fn sign_in(&self, email: &str, password: &str) -> ConsoleResult<()> {
        let user = self.provider.sign_in(email, password).await?;
        self.set_state(SessionState::Authenticated(user));
        Ok(())
    }

    /// 登出
    ///
    /// 成功后进入 `Anonymous`；失败时状态不变，错误向调用方传播。
    pub async fn sign_out(&self) -> ConsoleResult<()> {
        self.provider.sign_out().await?;
        self.set_state(SessionState::Anonymous);
        Ok(())
    }

    /// 订阅状态变更通知，句柄 drop 时退订
    pub fn subscribe(&self, listener: impl Fn(&SessionState) + 'static) -> SessionSubscription {
        let mut listeners = self.listeners.borrow_mut();
        let slot = listeners.len();
        listeners.push(Some(Box::new(listener)));
        SessionSubscription {
            slot,
            listeners: Rc::downgrade(&self.listeners),
        }
    }

    fn set_state(&self, next: SessionState) {
        {
            *self.state.borrow_mut() = next;
        }
        let state = self.state.borrow();
        let listeners = self.listeners.borrow();
        for listener in listeners.iter().flatten() {
            listener(&state);
        }
    }
}

/// 会话状态订阅句柄，drop 时退订
pub struct SessionSubscription {
    slot: usize,
    listeners: Weak<SessionListeners>,
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.borrow_mut()[self.slot] = None;
        }
    }
}

// =========================================================
// Leptos 桥接层
// =========================================================

/// 会话上下文
///
/// `store` 放在 LocalStorage 槽位中（`SessionStore` 含 `Rc`，不跨线程），
/// 句柄本身 `Copy`，可以安全地被任意闭包捕获。
#[derive(Clone, Copy)]
pub struct SessionContext {
    pub store: StoredValue<SessionStore, LocalStorage>,
    pub state: ReadSignal<SessionState>,
}

impl SessionContext {
    /// 认证状态信号（用于路由守卫注入）
    pub fn auth_status_signal(&self) -> Signal<AuthStatus> {
        let state = self.state;
        Signal::derive(move || match state.get() {
            SessionState::Loading => AuthStatus::Unknown,
            SessionState::Authenticated(_) => AuthStatus::SignedIn,
            SessionState::Anonymous => AuthStatus::SignedOut,
        })
    }
}

/// 创建会话上下文并放入 Context
///
/// 订阅句柄随当前 Owner 一起销毁，视图树卸载时保证退订。
pub fn provide_session(store: SessionStore) -> SessionContext {
    let (state, set_state) = signal(store.state());
    let subscription = store.subscribe(move |next| set_state.set(next.clone()));
    StoredValue::new_local(subscription);

    let ctx = SessionContext {
        store: StoredValue::new_local(store),
        state,
    };
    provide_context(ctx);
    ctx
}

/// 从 Context 获取会话上下文
pub fn use_session() -> SessionContext {
    use_context::<SessionContext>().expect("SessionContext should be provided")
}

// =========================================================
// 操作员邮箱记忆
// =========================================================

/// 读取上次登录成功的邮箱，用于表单预填
pub fn remembered_email() -> Option<String> {
    gloo_storage::LocalStorage::get(STORAGE_EMAIL_KEY).ok()
}

/// 记住登录成功的邮箱（只存邮箱，绝不存密码）
pub fn remember_email(email: &str) {
    let _ = gloo_storage::LocalStorage::set(STORAGE_EMAIL_KEY, email);
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelboard_shared::error::ConsoleError;

    /// 可配置的身份提供者替身，记录调用序列
    struct TestProvider {
        log: RefCell<Vec<String>>,
        current: Option<User>,
        reject_sign_in: bool,
        reject_sign_out: bool,
    }

    impl TestProvider {
        fn new() -> Self {
            Self {
                log: RefCell::new(Vec::new()),
                current: None,
                reject_sign_in: false,
                reject_sign_out: false,
            }
        }

        fn operator() -> User {
            User {
                id: "op-1".to_string(),
                email: "admin@example.com".to_string(),
            }
        }
    }

    #[async_trait(?Send)]
    impl IdentityProvider for TestProvider {
        async fn current_user(&self) -> ConsoleResult<Option<User>> {
            self.log.borrow_mut().push("current_user".to_string());
            Ok(self.current.clone())
        }

        async fn sign_in(&self, email: &str, _password: &str) -> ConsoleResult<User> {
            self.log.borrow_mut().push(format!("sign_in:{}", email));
            if self.reject_sign_in {
                Err(ConsoleError::auth("invalid credentials"))
            } else {
                Ok(Self::operator())
            }
        }

        async fn sign_out(&self) -> ConsoleResult<()> {
            self.log.borrow_mut().push("sign_out".to_string());
            if self.reject_sign_out {
                Err(ConsoleError::auth("sign-out rejected"))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_initialize_with_existing_session() {
        let mut provider = TestProvider::new();
        provider.current = Some(TestProvider::operator());
        let store = SessionStore::new(Rc::new(provider));

        assert_eq!(store.state(), SessionState::Loading);
        store.initialize().await;
        assert_eq!(
            store.state(),
            SessionState::Authenticated(TestProvider::operator())
        );
    }

    #[tokio::test]
    async fn test_initialize_without_session_is_anonymous() {
        let store = SessionStore::new(Rc::new(TestProvider::new()));
        store.initialize().await;
        assert_eq!(store.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_sign_in_success_authenticates_and_notifies() {
        let store = SessionStore::new(Rc::new(TestProvider::new()));
        store.initialize().await;

        let seen = Rc::new(RefCell::new(Vec::new()));
        let _sub = store.subscribe({
            let seen = seen.clone();
            move |state| seen.borrow_mut().push(state.clone())
        });

        let result = store.sign_in("admin@example.com", "secret").await;
        assert_eq!(result, Ok(()));
        assert_eq!(
            store.state(),
            SessionState::Authenticated(TestProvider::operator())
        );
        assert_eq!(
            *seen.borrow(),
            vec![SessionState::Authenticated(TestProvider::operator())]
        );
    }

    #[tokio::test]
    async fn test_sign_in_failure_leaves_state_unchanged() {
        let mut provider = TestProvider::new();
        provider.reject_sign_in = true;
        let store = SessionStore::new(Rc::new(provider));
        store.initialize().await;

        let result = store.sign_in("admin@example.com", "wrong").await;
        assert_eq!(result, Err(ConsoleError::auth("invalid credentials")));
        assert_eq!(store.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_sign_out_success_becomes_anonymous() {
        let mut provider = TestProvider::new();
        provider.current = Some(TestProvider::operator());
        let store = SessionStore::new(Rc::new(provider));
        store.initialize().await;

        assert_eq!(store.sign_out().await, Ok(()));
        assert_eq!(store.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_sign_out_failure_keeps_authenticated_state() {
        let mut provider = TestProvider::new();
        provider.current = Some(TestProvider::operator());
        provider.reject_sign_out = true;
        let store = SessionStore::new(Rc::new(provider));
        store.initialize().await;

        let result = store.sign_out().await;
        assert_eq!(result, Err(ConsoleError::auth("sign-out rejected")));
        assert_eq!(
            store.state(),
            SessionState::Authenticated(TestProvider::operator())
        );
    }

    #[tokio::test]
    async fn test_dropped_subscription_stops_notifications() {
        let store = SessionStore::new(Rc::new(TestProvider::new()));
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sub = store.subscribe({
            let seen = seen.clone();
            move |state| seen.borrow_mut().push(state.clone())
        });
        drop(sub);

        store.initialize().await;
        assert!(seen.borrow().is_empty());
    }
}
