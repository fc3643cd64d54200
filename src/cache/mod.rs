//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 旁路缓存抽象
//!
//! 缓存只认识字节：键由 [`crate::model::cache_key`] 推导，值由协调器负责编解码。
//! 缓存中的内容永远只是存储的副本，任何条目都可以随时丢失。

use crate::config::{CacheConfig, CacheMode};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub mod memory;
pub mod redis_backend;

pub use memory::MemoryCache;
pub use redis_backend::RedisCache;

/// 旁路缓存 trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LookasideCache: Send + Sync {
    /// 读取条目
    ///
    /// 键不存在返回 `Ok(None)`，与连接或协议错误严格区分
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// 写入条目，覆盖旧值
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// 连通性检查
    async fn ping(&self) -> Result<()>;
}

/// 按配置建立缓存连接
pub async fn connect(config: &CacheConfig) -> Result<Arc<dyn LookasideCache>> {
    match config.mode {
        CacheMode::Standalone | CacheMode::Cluster => {
            Ok(Arc::new(RedisCache::connect(config).await?))
        }
        CacheMode::Memory => Ok(Arc::new(MemoryCache::from_config(config))),
    }
}
