//! 视频预览推导模块
//!
//! 从存储的视频链接中尽力提取可播放的嵌入标识：
//! 链接带有 youtube.com 标记时取 `v` 查询参数，
//! 否则取路径的最后一段。这是启发式而非严格解析，
//! 畸形链接静默产生不可播放的预览，客户端不报错。

/// 从链接推导嵌入标识
pub fn embed_id(link: &str) -> Option<String> {
    if link.contains("youtube.com") {
        query_param(link, "v")
    } else {
        last_path_segment(link)
    }
}

/// 推导完整的嵌入播放地址
pub fn embed_url(link: &str) -> Option<String> {
    embed_id(link).map(|id| format!("https://www.youtube.com/embed/{}", id))
}

fn query_param(link: &str, name: &str) -> Option<String> {
    let (_, query) = link.split_once('?')?;
    let query = query.split('#').next().unwrap_or(query);
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name && !value.is_empty()).then(|| value.to_string())
    })
}

fn last_path_segment(link: &str) -> Option<String> {
    let link = link.split('#').next().unwrap_or(link);
    let link = link.split('?').next().unwrap_or(link);
    let segment = link.rsplit('/').next()?;
    (!segment.is_empty()).then(|| segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn youtube_link_uses_v_parameter() {
        assert_eq!(
            embed_id("https://youtube.com/watch?v=abc123"),
            Some("abc123".to_string())
        );
        assert_eq!(
            embed_id("https://www.youtube.com/watch?t=5&v=abc123"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn other_links_use_last_path_segment() {
        assert_eq!(
            embed_id("https://cdn.example.com/clips/xyz789"),
            Some("xyz789".to_string())
        );
        // youtu.be 短链没有 youtube.com 标记，走路径分支
        assert_eq!(
            embed_id("https://youtu.be/abc123"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn malformed_links_yield_no_preview() {
        assert_eq!(embed_id("https://youtube.com/watch"), None);
        assert_eq!(embed_id("https://youtube.com/watch?list=PL1"), None);
        assert_eq!(embed_id("https://cdn.example.com/clips/"), None);
        assert_eq!(embed_id(""), None);
    }

    #[test]
    fn query_and_fragment_are_stripped_from_segment() {
        assert_eq!(
            embed_id("https://cdn.example.com/clips/xyz789?quality=hd#t=5"),
            Some("xyz789".to_string())
        );
    }

    #[test]
    fn embed_url_wraps_the_id() {
        assert_eq!(
            embed_url("https://youtube.com/watch?v=abc123").as_deref(),
            Some("https://www.youtube.com/embed/abc123")
        );
        assert_eq!(embed_url("https://youtube.com/watch"), None);
    }
}
