use gloo_net::http::Request;
use reelboard_shared::error::{ConsoleError, ConsoleResult};
use reelboard_shared::{CreateVideoRequest, ServerMessage, Video, VideoListResponse};

#[derive(Clone, Debug, PartialEq)]
pub struct VideoApi {
    pub base_url: String,
}

impl VideoApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// 获取视频列表，按后端返回的顺序原样交给视图
    pub async fn list_videos(&self) -> ConsoleResult<Vec<Video>> {
        let url = self.url("/api/videos/get-all-videos");
        let res = Request::get(&url)
            .send()
            .await
            .map_err(|e| ConsoleError::network(e.to_string()))?;

        if !res.ok() {
            let status = res.status();
            return Err(server_error(status, &res.text().await.unwrap_or_default()));
        }

        let body: VideoListResponse = res
            .json()
            .await
            .map_err(|e| ConsoleError::network(e.to_string()))?;
        Ok(body.videos)
    }

    /// 创建视频
    ///
    /// 2xx 即创建成功。响应体可能是创建好的记录，也可能只是确认消息，
    /// 两者都接受；列表内容以随后的重新拉取为准。
    pub async fn create_video(
        &self,
        request: CreateVideoRequest,
    ) -> ConsoleResult<Option<Video>> {
        let url = self.url("/api/videos/add-video");
        let res = Request::post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .map_err(|e| ConsoleError::network(e.to_string()))?
            .send()
            .await
            .map_err(|e| ConsoleError::network(e.to_string()))?;

        if !res.ok() {
            let status = res.status();
            return Err(server_error(status, &res.text().await.unwrap_or_default()));
        }

        let body = res
            .text()
            .await
            .map_err(|e| ConsoleError::network(e.to_string()))?;
        Ok(created_video(&body))
    }

    /// 删除视频，成功时忽略确认响应体
    pub async fn delete_video(&self, id: String) -> ConsoleResult<()> {
        let url = self.url(&format!("/api/videos/delete-video/{}", id));
        let res = Request::delete(&url)
            .send()
            .await
            .map_err(|e| ConsoleError::network(e.to_string()))?;

        if !res.ok() {
            let status = res.status();
            return Err(server_error(status, &res.text().await.unwrap_or_default()));
        }

        Ok(())
    }

    /// 按记录标识获取单个视频（主流程之外的临时查询）
    #[allow(dead_code)]
    pub async fn get_video(&self, id: String) -> ConsoleResult<Video> {
        let url = self.url(&format!("/api/videos/get-video/{}", id));
        let res = Request::get(&url)
            .send()
            .await
            .map_err(|e| ConsoleError::network(e.to_string()))?;

        if !res.ok() {
            let status = res.status();
            return Err(server_error(status, &res.text().await.unwrap_or_default()));
        }

        res.json()
            .await
            .map_err(|e| ConsoleError::network(e.to_string()))
    }
}

/// 从创建接口的 2xx 响应体中解析记录
///
/// 解析不出 `Video` 时按纯确认处理，不算错误。
fn created_video(body: &str) -> Option<Video> {
    serde_json::from_str(body).ok()
}

/// 把非 2xx 响应映射为服务端错误
///
/// 优先使用响应体 `{ "message": ... }` 中后端自己的措辞。
fn server_error(status: u16, body: &str) -> ConsoleError {
    let message = serde_json::from_str::<ServerMessage>(body)
        .ok()
        .and_then(|m| m.message)
        .unwrap_or_else(|| format!("request failed with status {}", status));
    ConsoleError::server(status, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_error_prefers_backend_message() {
        let err = server_error(500, r#"{"message":"boom"}"#);
        assert_eq!(err, ConsoleError::server(500, "boom"));
    }

    #[test]
    fn server_error_falls_back_on_unparsable_body() {
        let err = server_error(502, "<html>bad gateway</html>");
        assert_eq!(err, ConsoleError::server(502, "request failed with status 502"));

        let err = server_error(404, r#"{"error":"nope"}"#);
        assert_eq!(err, ConsoleError::server(404, "request failed with status 404"));
    }

    #[test]
    fn created_video_accepts_record_or_plain_ack() {
        let record = r#"{"id":"rec-1","videoLink":"l","script":"s","videoId":"v"}"#;
        assert!(created_video(record).is_some());

        // 只回确认消息的后端同样算创建成功
        assert_eq!(created_video(r#"{"success":true}"#), None);
        assert_eq!(created_video(""), None);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let api = VideoApi::new("https://backend.example.com/");
        assert_eq!(
            api.url("/api/videos/get-all-videos"),
            "https://backend.example.com/api/videos/get-all-videos"
        );
        assert_eq!(api.url("health"), "https://backend.example.com/health");
    }
}
