//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 记录存储抽象
//!
//! 持久化的键值存储，读路径与写路径是两个独立的连接目标（读副本 / 写副本）。

use crate::config::UpsertStrategy;
use crate::error::{DataError, Result};
use crate::model::Record;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod sea;

pub use sea::SeaRecordStore;

/// upsert 影响的行数
///
/// 约定沿用 MySQL `ON DUPLICATE KEY UPDATE` 的语义：1 表示插入，2 表示冲突后更新。
/// 不具备该原生信号的存储先尝试仅插入，冲突后再更新，给出同样的值。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowsTouched(pub u64);

impl RowsTouched {
    pub const INSERTED: RowsTouched = RowsTouched(1);
    pub const UPDATED: RowsTouched = RowsTouched(2);
}

/// 记录存储 trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 通过读路径按 id 查询
    ///
    /// 行不存在返回 `Ok(None)`；其它任何数据访问失败都返回错误
    async fn read_by_id(&self, id: i64) -> Result<Option<Record>>;

    /// 通过写路径执行单条原子 insert-or-update
    async fn upsert(&self, record: &Record) -> Result<RowsTouched>;

    /// 检查读写两条路径的连通性
    async fn ping(&self) -> Result<()>;
}

/// 数据库类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseType {
    PostgreSQL,
    MySQL,
    SQLite,
}

impl DatabaseType {
    /// 从URL字符串解析数据库类型
    pub fn from_url(url: &str) -> Self {
        let lower = url.to_lowercase();
        if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
            DatabaseType::PostgreSQL
        } else if lower.starts_with("mysql://") || lower.starts_with("mariadb://") {
            DatabaseType::MySQL
        } else {
            DatabaseType::SQLite
        }
    }

    pub fn backend(&self) -> sea_orm::DatabaseBackend {
        match self {
            DatabaseType::PostgreSQL => sea_orm::DatabaseBackend::Postgres,
            DatabaseType::MySQL => sea_orm::DatabaseBackend::MySql,
            DatabaseType::SQLite => sea_orm::DatabaseBackend::Sqlite,
        }
    }

    /// 只有 MySQL 会把"冲突后更新"报告为 2 行
    pub fn reports_update_as_two_rows(&self) -> bool {
        matches!(self, DatabaseType::MySQL)
    }

    /// 确定实际使用的写入策略
    ///
    /// 未配置时所有数据库都使用先插入后更新。sqlx 总是以 `CLIENT_FOUND_ROWS` 连接 MySQL，
    /// 原生影响行数对内容相同的重复写入给出 1，因此只作为显式选项保留
    pub fn resolve_strategy(&self, configured: Option<UpsertStrategy>) -> Result<UpsertStrategy> {
        match configured {
            None | Some(UpsertStrategy::ExistenceCheck) => Ok(UpsertStrategy::ExistenceCheck),
            Some(UpsertStrategy::NativeRowCount) if self.reports_update_as_two_rows() => {
                tracing::warn!(
                    "native_row_count reports identical rewrites as creates when CLIENT_FOUND_ROWS is set"
                );
                Ok(UpsertStrategy::NativeRowCount)
            }
            Some(UpsertStrategy::NativeRowCount) => Err(DataError::ConfigError(format!(
                "{:?} cannot distinguish insert from update by row count; use existence_check",
                self
            ))),
        }
    }
}
