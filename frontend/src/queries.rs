//! 视频查询层
//!
//! 在 REST 客户端之上套一层查询/变更缓存：
//! - 读操作经过缓存去重与重试；
//! - 写操作成功后使列表键失效；
//! - 失效通过版本信号广播，视图据此重新拉取。

use std::rc::Rc;

use futures::FutureExt;
use leptos::prelude::*;

use reelboard_shared::cache::{CacheSubscription, QueryCache};
use reelboard_shared::error::ConsoleResult;
use reelboard_shared::{CreateVideoRequest, QUERY_VIDEOS, Video};

use crate::api::VideoApi;

/// 视频数据的统一入口，视图不直接接触 REST 客户端
#[derive(Clone)]
pub struct VideoQueries {
    api: VideoApi,
    cache: QueryCache<Vec<Video>>,
    videos_version: ReadSignal<u64>,
    _subscription: Rc<CacheSubscription>,
}

impl VideoQueries {
    pub fn new(api: VideoApi) -> Self {
        let cache = QueryCache::new();
        let (videos_version, set_version) = signal(0u64);
        let subscription = cache.subscribe(move |key| {
            if key == QUERY_VIDEOS {
                set_version.update(|v| *v += 1);
            }
        });

        Self {
            api,
            cache,
            videos_version,
            _subscription: Rc::new(subscription),
        }
    }

    /// 列表键每失效一次递增，用于驱动视图重新拉取
    pub fn videos_version(&self) -> ReadSignal<u64> {
        self.videos_version
    }

    pub async fn list(&self) -> ConsoleResult<Vec<Video>> {
        let api = self.api.clone();
        self.cache
            .query(QUERY_VIDEOS, move || {
                let api = api.clone();
                async move { api.list_videos().await }.boxed_local()
            })
            .await
    }

    /// 强制刷新列表
    ///
    /// 先使列表键过期再查询，保证新鲜的缓存值也会重新触网；
    /// 失效通知驱动的并发读取共享同一次拉取。
    pub async fn refresh(&self) -> ConsoleResult<Vec<Video>> {
        self.cache.invalidate(QUERY_VIDEOS);
        self.list().await
    }

    pub async fn create(&self, request: CreateVideoRequest) -> ConsoleResult<Option<Video>> {
        self.cache
            .mutate(self.api.create_video(request), &[QUERY_VIDEOS])
            .await
    }

    pub async fn delete(&self, id: String) -> ConsoleResult<()> {
        self.cache
            .mutate(self.api.delete_video(id), &[QUERY_VIDEOS])
            .await
    }
}

/// 查询层上下文句柄
///
/// `VideoQueries` 内部是 `Rc`，放进 LocalStorage 槽位后句柄可 `Copy`。
#[derive(Clone, Copy)]
pub struct QueriesContext(pub StoredValue<VideoQueries, LocalStorage>);

pub fn provide_video_queries(queries: VideoQueries) -> QueriesContext {
    let ctx = QueriesContext(StoredValue::new_local(queries));
    provide_context(ctx);
    ctx
}

pub fn use_video_queries() -> QueriesContext {
    use_context::<QueriesContext>().expect("QueriesContext should be provided")
}
