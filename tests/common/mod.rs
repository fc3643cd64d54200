//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了测试的通用工具函数和设置。

#![allow(dead_code)]

use async_trait::async_trait;
use oxdata::cache::{LookasideCache, MemoryCache};
use oxdata::config::StoreConfig;
use oxdata::coordinator::Coordinator;
use oxdata::error::{DataError, Result};
use oxdata::store::SeaRecordStore;
use secrecy::SecretString;
use std::sync::Arc;
use tempfile::TempDir;

pub use oxdata::utils::setup_logging;

/// 临时 SQLite 数据库，`dir` 被 drop 时文件随之删除
pub struct TestDb {
    pub dir: TempDir,
    pub dsn: String,
}

impl TestDb {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let dsn = format!("sqlite://{}?mode=rwc", dir.path().join("data.db").display());
        Self { dir, dsn }
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            read_dsn: SecretString::new(self.dsn.clone().into()),
            write_dsn: SecretString::new(self.dsn.clone().into()),
            bootstrap_schema: true,
            ..StoreConfig::default()
        }
    }

    pub async fn store(&self) -> SeaRecordStore {
        SeaRecordStore::connect(&self.store_config())
            .await
            .expect("connect sqlite store")
    }
}

/// 基于 SQLite 与进程内缓存的协调器
pub async fn memory_coordinator(db: &TestDb) -> (Arc<Coordinator>, MemoryCache) {
    setup_logging();
    let cache = MemoryCache::new(1_000, None);
    let coordinator = Coordinator::new(Arc::new(db.store().await), Arc::new(cache.clone()));
    (Arc::new(coordinator), cache)
}

/// 所有操作都失败的缓存，模拟 Redis 不可达
#[derive(Debug, Default)]
pub struct UnreachableCache;

#[async_trait]
impl LookasideCache for UnreachableCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Err(DataError::CacheBackend("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: Vec<u8>) -> Result<()> {
        Err(DataError::CacheBackend("connection refused".to_string()))
    }

    async fn ping(&self) -> Result<()> {
        Err(DataError::CacheBackend("connection refused".to_string()))
    }
}

/// 测试用 Redis 地址，优先取 `REDIS_URL`
pub fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
}

/// 检查Redis是否可用
pub async fn is_redis_available() -> bool {
    oxdata::utils::is_redis_available_url(&redis_url()).await
}
