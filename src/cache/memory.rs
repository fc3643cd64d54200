//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了进程内缓存后端，基于 Moka。

use super::LookasideCache;
use crate::config::CacheConfig;
use crate::error::Result;
use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;
use tracing::{debug, instrument};

/// 进程内缓存
///
/// 不跨进程共享，用于本地开发和测试
#[derive(Clone)]
pub struct MemoryCache {
    cache: Cache<String, Vec<u8>>,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl MemoryCache {
    /// 创建新的进程内缓存
    ///
    /// # 参数
    ///
    /// * `capacity` - 最大条目数
    /// * `ttl` - 条目存活时间，None 表示不过期
    pub fn new(capacity: u64, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder().max_capacity(capacity);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }
        Self {
            cache: builder.build(),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(
            config.memory_capacity,
            config.ttl_secs.map(Duration::from_secs),
        )
    }

    /// 删除条目，仅供测试与运维使用
    pub async fn remove(&self, key: &str) {
        self.cache.invalidate(key).await;
    }

    /// 执行挂起的淘汰任务后返回条目数
    pub async fn len(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl LookasideCache for MemoryCache {
    #[instrument(skip(self), level = "debug")]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self.cache.get(key).await;
        debug!("memory get: key={}, found={}", key, value.is_some());
        Ok(value)
    }

    #[instrument(skip(self, value), level = "debug")]
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        debug!("memory set: key={}, value_len={}", key, value.len());
        self.cache.insert(key.to_string(), value).await;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
