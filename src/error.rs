//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了记录服务的错误类型和处理机制。

use thiserror::Error;

/// 记录服务错误类型枚举
///
/// 覆盖存储、缓存、编解码与配置等各环节可能出现的错误。
/// "记录不存在"不是错误，由 `Option` 表达。
#[derive(Error, Debug)]
pub enum DataError {
    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// 缓存中的条目无法解码为合法记录
    #[error("Corrupt cache entry at {key}: {reason}")]
    CorruptCacheEntry { key: String, reason: String },

    /// 请求内容不合法（请求体或路径参数）
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// upsert 返回的影响行数既不是 1 也不是 2
    #[error("Unexpected rows affected by upsert of id {id}: {rows}")]
    UnexpectedRowCount { id: i64, rows: u64 },

    /// 配置错误
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Sea-ORM数据库错误
    #[error("Sea-ORM error: {0}")]
    SeaOrmError(#[from] sea_orm::DbErr),

    /// 数据库连接错误
    #[error("Database connection error: {0}")]
    DatabaseError(String),

    /// Redis错误
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    /// 缓存后端错误
    #[error("Cache backend error: {0}")]
    CacheBackend(String),

    /// IO错误
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// 超时错误
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// 后台任务异常终止
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DataError {
    /// 是否属于调用方的问题（对应 4xx）
    pub fn is_client_error(&self) -> bool {
        matches!(self, DataError::InvalidRequest(_))
    }
}

/// 操作结果类型别名
pub type Result<T> = std::result::Result<T, DataError>;
