//! 身份提供者的 REST 实现
//!
//! 走后端的认证接口，令牌存在浏览器 LocalStorage 中，
//! 随每个认证请求以 Bearer 头带出。

use gloo_net::http::Request;
use gloo_storage::Storage;
use serde::{Deserialize, Serialize};

use reelboard_shared::error::{ConsoleError, ConsoleResult};

use crate::session::{IdentityProvider, User};

const STORAGE_TOKEN_KEY: &str = "reelboard_token";

#[derive(Serialize)]
struct SignInBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct SignInReply {
    token: String,
    user: UserBody,
}

#[derive(Deserialize)]
struct SessionBody {
    user: Option<UserBody>,
}

#[derive(Deserialize)]
struct UserBody {
    id: String,
    email: String,
}

impl From<UserBody> for User {
    fn from(body: UserBody) -> Self {
        User {
            id: body.id,
            email: body.email,
        }
    }
}

/// 基于后端认证接口的身份提供者
#[derive(Clone, Debug)]
pub struct RestIdentityProvider {
    base_url: String,
}

impl RestIdentityProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn stored_token() -> Option<String> {
        gloo_storage::LocalStorage::get(STORAGE_TOKEN_KEY).ok()
    }
}

#[async_trait::async_trait(?Send)]
impl IdentityProvider for RestIdentityProvider {
    /// 校验既有令牌是否仍对应一个有效会话
    ///
    /// 没有令牌、令牌失效都按无会话处理，由上层决定跳转登录页。
    async fn current_user(&self) -> ConsoleResult<Option<User>> {
        let Some(token) = Self::stored_token() else {
            return Ok(None);
        };

        let res = Request::get(&self.url("/api/auth/session"))
            .header("Authorization", &format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| ConsoleError::network(e.to_string()))?;

        if !res.ok() {
            return Ok(None);
        }

        let body: SessionBody = res
            .json()
            .await
            .map_err(|e| ConsoleError::network(e.to_string()))?;
        Ok(body.user.map(User::from))
    }

    async fn sign_in(&self, email: &str, password: &str) -> ConsoleResult<User> {
        let res = Request::post(&self.url("/api/auth/login"))
            .header("Content-Type", "application/json")
            .json(&SignInBody { email, password })
            .map_err(|e| ConsoleError::network(e.to_string()))?
            .send()
            .await
            .map_err(|e| ConsoleError::network(e.to_string()))?;

        if !res.ok() {
            let body = res.text().await.unwrap_or_default();
            return Err(auth_error(&body));
        }

        let reply: SignInReply = res
            .json()
            .await
            .map_err(|e| ConsoleError::network(e.to_string()))?;
        let _ = gloo_storage::LocalStorage::set(STORAGE_TOKEN_KEY, &reply.token);
        Ok(reply.user.into())
    }

    async fn sign_out(&self) -> ConsoleResult<()> {
        let res = Request::post(&self.url("/api/auth/logout"))
            .send()
            .await
            .map_err(|e| ConsoleError::network(e.to_string()))?;

        if !res.ok() {
            return Err(ConsoleError::auth("sign-out was rejected by the server"));
        }

        gloo_storage::LocalStorage::delete(STORAGE_TOKEN_KEY);
        Ok(())
    }
}

/// 登录失败时优先用后端自己的措辞
fn auth_error(body: &str) -> ConsoleError {
    let message = serde_json::from_str::<reelboard_shared::ServerMessage>(body)
        .ok()
        .and_then(|m| m.message)
        .unwrap_or_else(|| "invalid email or password".to_string());
    ConsoleError::auth(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_error_prefers_backend_message() {
        assert_eq!(
            auth_error(r#"{"message":"account locked"}"#),
            ConsoleError::auth("account locked")
        );
    }

    #[test]
    fn auth_error_falls_back_to_generic_message() {
        assert_eq!(
            auth_error("not json"),
            ConsoleError::auth("invalid email or password")
        );
    }
}
