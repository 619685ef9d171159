//! 查询/变更缓存模块
//!
//! 以逻辑查询名为键缓存读取结果，并把"变更 -> 失效哪些键"作为
//! 显式参数表达，使失效契约可以脱离渲染单独测试：
//! - `query`: 新鲜的缓存值直接返回；否则加入（或发起）该键唯一的
//!   在途拉取，并发调用共享同一次网络请求。读取失败自动重试一次。
//! - `mutate`: 执行变更操作；成功后把列出的键标记为过期并通知订阅者，
//!   由持有视图重新拉取；失败时缓存数据原样保留，错误向调用方传播。
//!   变更绝不自动重试（避免重复创建/删除）。
//!
//! 缓存中的列表是唯一可信来源：变更的响应体从不被就地拼进缓存。
//!
//! 单线程协作式设计（`Rc<RefCell<..>>`，`!Send` future），
//! 整个进程只持有一个共享实例。

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::rc::{Rc, Weak};

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};

use crate::error::ConsoleResult;

type SharedFetch<T> = Shared<LocalBoxFuture<'static, ConsoleResult<T>>>;
type ListenerSlots = RefCell<Vec<Option<Box<dyn Fn(&'static str)>>>>;

/// 单个键的缓存条目
struct Entry<T: Clone> {
    /// 上一次成功拉取的值
    value: Option<T>,
    /// 过期标记：为真时值不可信，必须重新拉取
    stale: bool,
    /// 该键当前唯一的在途拉取
    in_flight: Option<SharedFetch<T>>,
}

impl<T: Clone> Default for Entry<T> {
    fn default() -> Self {
        Self {
            value: None,
            stale: false,
            in_flight: None,
        }
    }
}

/// 键值查询缓存
#[derive(Clone)]
pub struct QueryCache<T: Clone + 'static> {
    entries: Rc<RefCell<HashMap<&'static str, Entry<T>>>>,
    listeners: Rc<ListenerSlots>,
}

impl<T: Clone + 'static> QueryCache<T> {
    pub fn new() -> Self {
        Self {
            entries: Rc::new(RefCell::new(HashMap::new())),
            listeners: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// 读取查询
    ///
    /// 缓存值存在且未过期时直接返回，不触网；否则等待该键的
    /// 在途拉取（没有则用 `fetcher` 发起一次）。读取失败重试一次。
    pub async fn query<F>(&self, key: &'static str, fetcher: F) -> ConsoleResult<T>
    where
        F: Fn() -> LocalBoxFuture<'static, ConsoleResult<T>> + 'static,
    {
        if let Some(value) = self.fresh_value(key) {
            return Ok(value);
        }

        let fetch = self.join_or_start(key, fetcher);
        let result = fetch.clone().await;
        self.settle(key, &fetch, &result);
        result
    }

    /// 执行变更操作
    ///
    /// 成功后使 `invalidates` 中的每个键过期并通知订阅者；
    /// 失败时不触碰缓存，错误原样传播。不做任何自动重试。
    pub async fn mutate<R, Fut>(&self, op: Fut, invalidates: &[&'static str]) -> ConsoleResult<R>
    where
        Fut: Future<Output = ConsoleResult<R>>,
    {
        let value = op.await?;
        for key in invalidates {
            self.invalidate(key);
        }
        Ok(value)
    }

    /// 使某个键过期
    ///
    /// 同时丢弃该键的在途拉取：早于失效发起的请求，其结果不再可信。
    pub fn invalidate(&self, key: &'static str) {
        {
            let mut entries = self.entries.borrow_mut();
            let entry = entries.entry(key).or_default();
            entry.stale = true;
            entry.in_flight = None;
        }
        let listeners = self.listeners.borrow();
        for listener in listeners.iter().flatten() {
            listener(key);
        }
    }

    /// 订阅键失效通知
    ///
    /// 返回的句柄被 drop 时自动退订。
    pub fn subscribe(&self, listener: impl Fn(&'static str) + 'static) -> CacheSubscription {
        let mut listeners = self.listeners.borrow_mut();
        let slot = listeners.len();
        listeners.push(Some(Box::new(listener)));
        CacheSubscription {
            slot,
            listeners: Rc::downgrade(&self.listeners),
        }
    }

    fn fresh_value(&self, key: &'static str) -> Option<T> {
        let entries = self.entries.borrow();
        let entry = entries.get(key)?;
        if entry.stale {
            return None;
        }
        entry.value.clone()
    }

    fn join_or_start<F>(&self, key: &'static str, fetcher: F) -> SharedFetch<T>
    where
        F: Fn() -> LocalBoxFuture<'static, ConsoleResult<T>> + 'static,
    {
        let mut entries = self.entries.borrow_mut();
        let entry = entries.entry(key).or_default();
        if let Some(fetch) = &entry.in_flight {
            return fetch.clone();
        }

        let fetch = async move {
            match fetcher().await {
                Ok(value) => Ok(value),
                // 读取是幂等的，失败后重试一次
                Err(_) => fetcher().await,
            }
        }
        .boxed_local()
        .shared();
        entry.in_flight = Some(fetch.clone());
        fetch
    }

    fn settle(&self, key: &'static str, fetch: &SharedFetch<T>, result: &ConsoleResult<T>) {
        let mut entries = self.entries.borrow_mut();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        // 在途拉取已被失效替换时，本次结果不能写回缓存
        let owns = entry
            .in_flight
            .as_ref()
            .is_some_and(|current| current.ptr_eq(fetch));
        if !owns {
            return;
        }
        entry.in_flight = None;
        if let Ok(value) = result {
            entry.value = Some(value.clone());
            entry.stale = false;
        }
    }
}

impl<T: Clone + 'static> Default for QueryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// 失效通知订阅句柄，drop 时退订
pub struct CacheSubscription {
    slot: usize,
    listeners: Weak<ListenerSlots>,
}

impl Drop for CacheSubscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.borrow_mut()[self.slot] = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConsoleError;

    /// 计数拉取器：记录调用次数，前 `fail_first` 次返回错误
    fn counting_fetcher(
        calls: Rc<RefCell<u32>>,
        fail_first: u32,
    ) -> impl Fn() -> LocalBoxFuture<'static, ConsoleResult<Vec<u32>>> + Clone + 'static {
        move || {
            let calls = calls.clone();
            async move {
                *calls.borrow_mut() += 1;
                tokio::task::yield_now().await;
                if *calls.borrow() <= fail_first {
                    Err(ConsoleError::network("unreachable"))
                } else {
                    Ok(vec![1, 2, 3])
                }
            }
            .boxed_local()
        }
    }

    #[tokio::test]
    async fn test_fresh_value_served_without_refetch() {
        let cache = QueryCache::new();
        let calls = Rc::new(RefCell::new(0));
        let fetcher = counting_fetcher(calls.clone(), 0);

        assert_eq!(cache.query("videos", fetcher.clone()).await, Ok(vec![1, 2, 3]));
        assert_eq!(cache.query("videos", fetcher).await, Ok(vec![1, 2, 3]));
        assert_eq!(*calls.borrow(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_queries_share_one_fetch() {
        let cache = QueryCache::new();
        let calls = Rc::new(RefCell::new(0));
        let fetcher = counting_fetcher(calls.clone(), 0);

        let (a, b) = futures::join!(
            cache.query("videos", fetcher.clone()),
            cache.query("videos", fetcher)
        );
        assert_eq!(a, Ok(vec![1, 2, 3]));
        assert_eq!(b, Ok(vec![1, 2, 3]));
        assert_eq!(*calls.borrow(), 1);
    }

    #[tokio::test]
    async fn test_read_retries_exactly_once() {
        let cache = QueryCache::new();
        let calls = Rc::new(RefCell::new(0));
        // 第一次失败，重试成功
        let fetcher = counting_fetcher(calls.clone(), 1);

        assert_eq!(cache.query("videos", fetcher).await, Ok(vec![1, 2, 3]));
        assert_eq!(*calls.borrow(), 2);
    }

    #[tokio::test]
    async fn test_read_gives_up_after_single_retry() {
        let cache = QueryCache::new();
        let calls = Rc::new(RefCell::new(0));
        let fetcher = counting_fetcher(calls.clone(), 10);

        let result = cache.query("videos", fetcher.clone()).await;
        assert_eq!(result, Err(ConsoleError::network("unreachable")));
        assert_eq!(*calls.borrow(), 2);

        // 失败不会缓存任何值，下一次查询重新发起
        let _ = cache.query("videos", fetcher).await;
        assert_eq!(*calls.borrow(), 4);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch_despite_fresh_value() {
        let cache = QueryCache::new();
        let calls = Rc::new(RefCell::new(0));
        let fetcher = counting_fetcher(calls.clone(), 0);

        let _ = cache.query("videos", fetcher.clone()).await;
        assert_eq!(*calls.borrow(), 1);

        // 手动刷新走失效路径：新鲜值也必须重新触网
        cache.invalidate("videos");
        assert_eq!(cache.query("videos", fetcher).await, Ok(vec![1, 2, 3]));
        assert_eq!(*calls.borrow(), 2);
    }

    #[tokio::test]
    async fn test_successful_mutation_invalidates_and_notifies() {
        let cache = QueryCache::new();
        let calls = Rc::new(RefCell::new(0));
        let fetcher = counting_fetcher(calls.clone(), 0);

        let notified = Rc::new(RefCell::new(Vec::new()));
        let _sub = cache.subscribe({
            let notified = notified.clone();
            move |key| notified.borrow_mut().push(key)
        });

        let _ = cache.query("videos", fetcher.clone()).await;
        assert_eq!(*calls.borrow(), 1);

        let created = cache.mutate(async { Ok("rec-1") }, &["videos"]).await;
        assert_eq!(created, Ok("rec-1"));
        assert_eq!(*notified.borrow(), vec!["videos"]);

        // 过期后的查询必须重新拉取
        let _ = cache.query("videos", fetcher).await;
        assert_eq!(*calls.borrow(), 2);
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_cache_untouched() {
        let cache = QueryCache::new();
        let calls = Rc::new(RefCell::new(0));
        let fetcher = counting_fetcher(calls.clone(), 0);

        let notified = Rc::new(RefCell::new(Vec::new()));
        let _sub = cache.subscribe({
            let notified = notified.clone();
            move |key| notified.borrow_mut().push(key)
        });

        let _ = cache.query("videos", fetcher.clone()).await;

        let result: ConsoleResult<()> = cache
            .mutate(async { Err(ConsoleError::server(500, "boom")) }, &["videos"])
            .await;
        assert_eq!(result, Err(ConsoleError::server(500, "boom")));
        assert!(notified.borrow().is_empty());

        // 缓存仍然新鲜，不触网
        assert_eq!(cache.query("videos", fetcher).await, Ok(vec![1, 2, 3]));
        assert_eq!(*calls.borrow(), 1);
    }

    #[tokio::test]
    async fn test_mutation_never_retries() {
        let cache: QueryCache<Vec<u32>> = QueryCache::new();
        let attempts = Rc::new(RefCell::new(0));

        let op = {
            let attempts = attempts.clone();
            async move {
                *attempts.borrow_mut() += 1;
                Err::<(), _>(ConsoleError::network("unreachable"))
            }
        };
        let result = cache.mutate(op, &["videos"]).await;
        assert!(result.is_err());
        assert_eq!(*attempts.borrow(), 1);
    }

    #[tokio::test]
    async fn test_invalidation_during_fetch_discards_result() {
        let cache = QueryCache::new();
        let calls = Rc::new(RefCell::new(0));
        let fetcher = counting_fetcher(calls.clone(), 0);

        // 拉取在途时失效：结果仍交给调用方，但不得写回缓存
        let (result, ()) = futures::join!(cache.query("videos", fetcher.clone()), async {
            cache.invalidate("videos");
        });
        assert_eq!(result, Ok(vec![1, 2, 3]));

        let _ = cache.query("videos", fetcher).await;
        assert_eq!(*calls.borrow(), 2);
    }

    #[tokio::test]
    async fn test_dropped_subscription_stops_notifications() {
        let cache: QueryCache<Vec<u32>> = QueryCache::new();
        let notified = Rc::new(RefCell::new(Vec::new()));

        let sub = cache.subscribe({
            let notified = notified.clone();
            move |key| notified.borrow_mut().push(key)
        });
        drop(sub);

        cache.invalidate("videos");
        assert!(notified.borrow().is_empty());
    }
}
