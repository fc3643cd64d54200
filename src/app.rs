//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 按配置装配存储、缓存与协调器。

use crate::cache::{self, LookasideCache};
use crate::config::AppConfig;
use crate::coordinator::Coordinator;
use crate::error::{DataError, Result};
use crate::metrics::Metrics;
use crate::serialization::SerializerEnum;
use crate::server::AppState;
use crate::store::{RecordStore, SeaRecordStore};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// 建立所有外部连接并构造协调器
///
/// 任一连接无法建立都会返回错误，调用方应据此终止启动
pub async fn connect_coordinator(config: &AppConfig, metrics: Metrics) -> Result<Coordinator> {
    let store = SeaRecordStore::connect(&config.store).await?;
    info!(store = ?store, "Record store ready");

    let cache = cache::connect(&config.cache).await?;
    info!(mode = ?config.cache.mode, "Lookaside cache ready");

    Ok(Coordinator::new(Arc::new(store), cache)
        .with_serializer(SerializerEnum::from_compress_flag(config.cache.compress))
        .with_metrics(metrics)
        .with_timeouts(config.store.command_timeout(), config.cache.command_timeout()))
}

/// 构造 HTTP 层共享状态
pub async fn build_state(config: &AppConfig) -> Result<AppState> {
    let coordinator = connect_coordinator(config, Metrics::new()).await?;
    Ok(AppState::new(
        Arc::new(coordinator),
        config.server.lenient_path_ids,
    ))
}

/// 存储与缓存各自的检查结果
#[derive(Debug)]
pub struct DependencyHealth {
    pub store: Result<()>,
    pub cache: Result<()>,
}

impl DependencyHealth {
    pub fn is_healthy(&self) -> bool {
        self.store.is_ok() && self.cache.is_ok()
    }
}

/// 分别连接并检查存储与缓存
///
/// 一方连接失败不影响另一方的检查，连接失败与检查失败都记在对应一项上
pub async fn check_dependencies(config: &AppConfig) -> DependencyHealth {
    let store = async {
        let store = SeaRecordStore::connect(&config.store).await?;
        within(config.store.command_timeout(), "store ping", store.ping()).await
    }
    .await;
    if let Err(e) = &store {
        warn!(error = %e, "Record store unhealthy");
    }

    let cache = async {
        let cache = cache::connect(&config.cache).await?;
        within(config.cache.command_timeout(), "cache ping", cache.ping()).await
    }
    .await;
    if let Err(e) = &cache {
        warn!(error = %e, "Lookaside cache unhealthy");
    }

    DependencyHealth { store, cache }
}

async fn within<F>(limit: Duration, what: &str, fut: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| DataError::Timeout(format!("{} exceeded {:?}", what, limit)))?
}
