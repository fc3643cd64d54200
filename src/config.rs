//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了服务的配置结构和解析逻辑。
//!
//! 配置来源有两层：可选的 TOML 文件，以及覆盖其上的环境变量。

use crate::error::{DataError, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

pub const ENV_READ_DSN: &str = "READ_REPLICA_DSN";
pub const ENV_WRITE_DSN: &str = "WRITE_REPLICA_DSN";
pub const ENV_REDIS_CLUSTER_ADDRESSES: &str = "REDIS_CLUSTER_ADDRESSES";
pub const ENV_REDIS_PASSWORD: &str = "REDIS_PASSWORD";
pub const ENV_REDIS_URL: &str = "REDIS_URL";
pub const ENV_BIND: &str = "OXDATA_BIND";
pub const ENV_CONFIG_PATH: &str = "OXDATA_CONFIG";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub cache: CacheConfig,
    pub telemetry: TelemetryConfig,
}

/// HTTP 服务配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub bind: String,
    /// 为 true 时，无法解析为整数的路径 id 按 0 处理，而不是返回 400
    pub lenient_path_ids: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            lenient_path_ids: false,
        }
    }
}

/// upsert 时区分"新建"与"更新"的方式
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UpsertStrategy {
    /// 依赖 MySQL `ON DUPLICATE KEY UPDATE` 返回的影响行数（1 新建，2 更新）
    ///
    /// sqlx 的 MySQL 驱动总是协商 `CLIENT_FOUND_ROWS`，内容相同的重复写入会报告 1 行，
    /// 被误判为新建。只在驱动不设置该标志时才能选用
    NativeRowCount,
    /// 先执行仅插入，主键冲突时再执行更新；插入是否生效决定新建还是更新
    ExistenceCheck,
}

/// 记录存储配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct StoreConfig {
    /// 读副本连接字符串
    pub read_dsn: SecretString,
    /// 写副本连接字符串
    pub write_dsn: SecretString,
    /// 表名
    pub table: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// 建立连接超时（毫秒）
    pub connect_timeout_ms: u64,
    /// 单次查询的截止时间（毫秒）
    pub command_timeout_ms: u64,
    /// 为空时按数据库类型选择默认策略
    pub upsert_strategy: Option<UpsertStrategy>,
    /// 启动时创建表（仅用于开发环境，不做迁移）
    pub bootstrap_schema: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            read_dsn: SecretString::new(String::new().into()),
            write_dsn: SecretString::new(String::new().into()),
            table: "data".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_ms: 5000,
            command_timeout_ms: 3000,
            upsert_strategy: None,
            bootstrap_schema: false,
        }
    }
}

impl StoreConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

/// 缓存部署模式
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// 单机 Redis
    Standalone,
    /// Redis 集群
    Cluster,
    /// 进程内缓存（本地开发与测试）
    Memory,
}

/// 旁路缓存配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct CacheConfig {
    pub mode: CacheMode,
    /// 单机模式的连接字符串
    pub connection_string: SecretString,
    /// 集群模式的初始节点
    pub nodes: Vec<String>,
    pub password: Option<SecretString>,
    /// 连接超时时间（毫秒）
    pub connection_timeout_ms: u64,
    /// 命令执行超时时间（毫秒）
    pub command_timeout_ms: u64,
    /// 条目过期时间（秒），None 表示永不过期
    pub ttl_secs: Option<u64>,
    /// 集群模式下允许从副本读取
    pub read_from_replicas: bool,
    /// 进程内缓存的最大条目数
    pub memory_capacity: u64,
    /// 以 gzip 压缩条目
    pub compress: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            mode: CacheMode::Standalone,
            connection_string: SecretString::new("redis://localhost:6379".to_string().into()),
            nodes: Vec::new(),
            password: None,
            connection_timeout_ms: 5000,
            command_timeout_ms: 1000,
            ttl_secs: None,
            read_from_replicas: false,
            memory_capacity: 100_000,
            compress: false,
        }
    }
}

impl CacheConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

/// 日志与链路追踪配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct TelemetryConfig {
    pub service_name: String,
    /// `RUST_LOG` 未设置时使用的过滤规则
    pub log_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "oxdata".to_string(),
            log_filter: "oxdata=info,tower_http=info,warn".to_string(),
        }
    }
}

impl AppConfig {
    /// 从文件（可选）与进程环境变量加载配置并校验
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        config.validate().map_err(DataError::ConfigError)?;
        Ok(config)
    }

    /// 解析 TOML 配置文件
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| DataError::ConfigError(e.to_string()))
    }

    /// 用环境变量覆盖配置
    ///
    /// `lookup` 通常是 `std::env::var`，测试中可以传入固定映射。空值视为未设置。
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(dsn) = get(ENV_READ_DSN) {
            self.store.read_dsn = SecretString::new(dsn.into());
        }
        if let Some(dsn) = get(ENV_WRITE_DSN) {
            self.store.write_dsn = SecretString::new(dsn.into());
        }
        if let Some(url) = get(ENV_REDIS_URL) {
            self.cache.mode = CacheMode::Standalone;
            self.cache.connection_string = SecretString::new(url.into());
        }
        if let Some(addresses) = get(ENV_REDIS_CLUSTER_ADDRESSES) {
            self.cache.mode = CacheMode::Cluster;
            self.cache.nodes = parse_cluster_addresses(&addresses);
        }
        if let Some(password) = get(ENV_REDIS_PASSWORD) {
            self.cache.password = Some(SecretString::new(password.into()));
        }
        if let Some(bind) = get(ENV_BIND) {
            self.server.bind = bind;
        }
    }

    /// 验证配置
    ///
    /// 检查必需字段，并确保各项取值在合理范围内
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.server
            .bind
            .parse::<SocketAddr>()
            .map_err(|e| format!("Invalid bind address '{}': {}", self.server.bind, e))?;

        if self.store.read_dsn.expose_secret().is_empty() {
            return Err(format!("{} is not set", ENV_READ_DSN));
        }
        if self.store.write_dsn.expose_secret().is_empty() {
            return Err(format!("{} is not set", ENV_WRITE_DSN));
        }
        validate_identifier(&self.store.table)?;

        if self.store.max_connections == 0 {
            return Err("store max_connections cannot be zero".to_string());
        }
        if self.store.min_connections > self.store.max_connections {
            return Err(format!(
                "store min_connections ({}) must be <= max_connections ({})",
                self.store.min_connections, self.store.max_connections
            ));
        }
        if !(100..=30000).contains(&self.store.connect_timeout_ms) {
            return Err("store connect_timeout_ms must be between 100 and 30000 ms".to_string());
        }
        if !(10..=60000).contains(&self.store.command_timeout_ms) {
            return Err("store command_timeout_ms must be between 10 and 60000 ms".to_string());
        }

        match self.cache.mode {
            CacheMode::Cluster if self.cache.nodes.is_empty() => {
                return Err(format!(
                    "cache mode is cluster but no nodes are configured (set {})",
                    ENV_REDIS_CLUSTER_ADDRESSES
                ));
            }
            CacheMode::Standalone if self.cache.connection_string.expose_secret().is_empty() => {
                return Err("cache connection_string cannot be empty".to_string());
            }
            CacheMode::Memory if self.cache.memory_capacity == 0 => {
                return Err("cache memory_capacity cannot be zero".to_string());
            }
            _ => {}
        }
        if !(100..=30000).contains(&self.cache.connection_timeout_ms) {
            return Err("cache connection_timeout_ms must be between 100 and 30000 ms".to_string());
        }
        if !(10..=60000).contains(&self.cache.command_timeout_ms) {
            return Err("cache command_timeout_ms must be between 10 and 60000 ms".to_string());
        }
        if self.cache.ttl_secs == Some(0) {
            return Err("cache ttl_secs cannot be zero; omit it to disable expiry".to_string());
        }

        Ok(())
    }
}

/// 解析逗号分隔的集群地址，缺少协议头时补上 `redis://`
pub fn parse_cluster_addresses(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|node| {
            if node.contains("://") {
                node.to_string()
            } else {
                format!("redis://{}", node)
            }
        })
        .collect()
}

/// 验证SQL标识符是否安全（防止SQL注入）
///
/// 只能包含字母、数字、下划线，且不能以数字开头
pub fn validate_identifier(identifier: &str) -> std::result::Result<(), String> {
    if identifier.is_empty() {
        return Err("Identifier cannot be empty".to_string());
    }
    if identifier.len() > 64 {
        return Err(format!(
            "Identifier '{}' exceeds maximum length of 64 characters",
            identifier
        ));
    }

    let mut chars = identifier.chars();
    if let Some(first) = chars.next() {
        if !first.is_ascii_alphabetic() && first != '_' {
            return Err(format!(
                "Invalid identifier '{}': must start with a letter or underscore",
                identifier
            ));
        }
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!(
            "Invalid identifier '{}': only alphanumeric characters and underscores are allowed",
            identifier
        ));
    }

    Ok(())
}
