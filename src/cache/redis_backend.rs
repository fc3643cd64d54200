//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了基于 Redis 的旁路缓存后端，支持单机与集群两种部署。

use super::LookasideCache;
use crate::config::{CacheConfig, CacheMode};
use crate::error::{DataError, Result};
use crate::utils::redaction::redact_connection_string;
use async_trait::async_trait;
use redis::{
    aio::ConnectionManager, cluster::ClusterClient, cluster_async::ClusterConnection,
    AsyncCommands, Client, ConnectionInfo, IntoConnectionInfo,
};
use secrecy::ExposeSecret;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, instrument};

/// Redis 缓存后端
///
/// 两种连接都可以廉价克隆，内部自带重连
#[derive(Clone)]
pub enum RedisCache {
    Standalone {
        manager: ConnectionManager,
        ttl_secs: Option<u64>,
    },
    Cluster {
        connection: ClusterConnection,
        ttl_secs: Option<u64>,
    },
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standalone { .. } => write!(f, "RedisCache::Standalone"),
            Self::Cluster { .. } => write!(f, "RedisCache::Cluster"),
        }
    }
}

impl RedisCache {
    /// 创建新的 Redis 缓存后端实例
    ///
    /// # 参数
    ///
    /// * `config` - 缓存配置，`mode` 必须是 standalone 或 cluster
    ///
    /// # 返回值
    ///
    /// 连接在 `connection_timeout_ms` 内建立成功则返回实例
    #[instrument(skip(config), level = "info", name = "init_redis_cache", fields(mode = ?config.mode))]
    pub async fn connect(config: &CacheConfig) -> Result<Self> {
        let connect_timeout = Duration::from_millis(config.connection_timeout_ms);
        match config.mode {
            CacheMode::Standalone => {
                let info = standalone_connection_info(config)?;
                let client = Client::open(info)?;
                let manager = match timeout(connect_timeout, client.get_connection_manager()).await
                {
                    Ok(res) => res?,
                    Err(_) => {
                        return Err(DataError::CacheBackend(format!(
                            "Connection timed out after {}ms. Target: {}",
                            config.connection_timeout_ms,
                            redact_connection_string(config.connection_string.expose_secret())
                        )));
                    }
                };
                info!("Connected to standalone Redis");
                Ok(RedisCache::Standalone {
                    manager,
                    ttl_secs: config.ttl_secs,
                })
            }
            CacheMode::Cluster => {
                if config.nodes.is_empty() {
                    return Err(DataError::ConfigError(
                        "Cluster mode requires at least one node".to_string(),
                    ));
                }
                let mut builder = ClusterClient::builder(config.nodes.clone());
                if let Some(password) = &config.password {
                    builder = builder.password(password.expose_secret().to_string());
                }
                if config.read_from_replicas {
                    builder = builder.read_from_replicas();
                }
                let client = builder.build()?;

                let connection = timeout(connect_timeout, client.get_async_connection())
                    .await
                    .map_err(|_| {
                        DataError::CacheBackend(format!(
                            "Cluster connection timed out after {}ms",
                            config.connection_timeout_ms
                        ))
                    })??;
                info!(nodes = config.nodes.len(), "Connected to Redis cluster");
                Ok(RedisCache::Cluster {
                    connection,
                    ttl_secs: config.ttl_secs,
                })
            }
            CacheMode::Memory => Err(DataError::ConfigError(
                "RedisCache cannot be built for memory mode".to_string(),
            )),
        }
    }

    fn ttl_secs(&self) -> Option<u64> {
        match self {
            RedisCache::Standalone { ttl_secs, .. } | RedisCache::Cluster { ttl_secs, .. } => {
                *ttl_secs
            }
        }
    }
}

/// 解析单机连接串，并在连接串未携带密码时补上配置中的密码
fn standalone_connection_info(config: &CacheConfig) -> Result<ConnectionInfo> {
    let mut info = config
        .connection_string
        .expose_secret()
        .into_connection_info()?;
    if info.redis.password.is_none() {
        if let Some(password) = &config.password {
            info.redis.password = Some(password.expose_secret().to_string());
        }
    }
    Ok(info)
}

#[async_trait]
impl LookasideCache for RedisCache {
    #[instrument(skip(self), level = "debug")]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value: Option<Vec<u8>> = match self {
            RedisCache::Standalone { manager, .. } => manager.clone().get(key).await?,
            RedisCache::Cluster { connection, .. } => connection.clone().get(key).await?,
        };
        debug!("redis get: key={}, found={}", key, value.is_some());
        Ok(value)
    }

    #[instrument(skip(self, value), level = "debug")]
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        debug!(
            "redis set: key={}, value_len={}, ttl={:?}",
            key,
            value.len(),
            self.ttl_secs()
        );
        match (self, self.ttl_secs()) {
            (RedisCache::Standalone { manager, .. }, Some(ttl)) => {
                manager.clone().set_ex::<_, _, ()>(key, value, ttl).await?
            }
            (RedisCache::Standalone { manager, .. }, None) => {
                manager.clone().set::<_, _, ()>(key, value).await?
            }
            (RedisCache::Cluster { connection, .. }, Some(ttl)) => {
                connection.clone().set_ex::<_, _, ()>(key, value, ttl).await?
            }
            (RedisCache::Cluster { connection, .. }, None) => {
                connection.clone().set::<_, _, ()>(key, value).await?
            }
        }
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let response = match self {
            RedisCache::Standalone { manager, .. } => {
                redis::cmd("PING")
                    .query_async::<String>(&mut manager.clone())
                    .await?
            }
            RedisCache::Cluster { connection, .. } => {
                redis::cmd("PING")
                    .query_async::<String>(&mut connection.clone())
                    .await?
            }
        };
        debug!("redis ping: {}", response);
        Ok(())
    }
}
