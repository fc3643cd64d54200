//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 基于 Sea-ORM 的记录存储实现，支持 MySQL、PostgreSQL 与 SQLite。

use super::{DatabaseType, RecordStore, RowsTouched};
use crate::config::{validate_identifier, StoreConfig, UpsertStrategy};
use crate::error::{DataError, Result};
use crate::model::Record;
use crate::utils::redaction::redact_connection_string;
use async_trait::async_trait;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr,
    SqlErr, Statement, Value,
};
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

/// Sea-ORM 记录存储
///
/// 读操作只走 `read` 连接池，写操作只走 `write` 连接池。
/// 两个连接字符串相同时共用同一个连接池。
pub struct SeaRecordStore {
    read: Arc<DatabaseConnection>,
    write: Arc<DatabaseConnection>,
    db_type: DatabaseType,
    table: String,
    strategy: UpsertStrategy,
}

impl std::fmt::Debug for SeaRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeaRecordStore")
            .field("db_type", &self.db_type)
            .field("table", &self.table)
            .field("strategy", &self.strategy)
            .field("shared_pool", &Arc::ptr_eq(&self.read, &self.write))
            .finish()
    }
}

impl SeaRecordStore {
    /// 按配置建立读、写两条连接
    #[instrument(skip(config), level = "info", name = "init_record_store")]
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let read_dsn = config.read_dsn.expose_secret();
        let write_dsn = config.write_dsn.expose_secret();

        let write_type = DatabaseType::from_url(write_dsn);
        let read_type = DatabaseType::from_url(read_dsn);
        if read_type != write_type {
            return Err(DataError::ConfigError(format!(
                "read replica is {:?} but write replica is {:?}",
                read_type, write_type
            )));
        }

        let write = Arc::new(open_pool(write_dsn, config).await?);
        let read = if read_dsn == write_dsn {
            debug!("Read and write DSNs are identical, sharing one pool");
            write.clone()
        } else {
            Arc::new(open_pool(read_dsn, config).await?)
        };

        let store = Self::from_connections(read, write, &config.table, config.upsert_strategy)?;
        if config.bootstrap_schema {
            store.initialize_table().await?;
        }
        Ok(store)
    }

    /// 使用已建立的连接构造存储
    ///
    /// `strategy` 为空时使用先插入后更新；原生影响行数只能在 MySQL 上显式选择
    pub fn from_connections(
        read: Arc<DatabaseConnection>,
        write: Arc<DatabaseConnection>,
        table: &str,
        strategy: Option<UpsertStrategy>,
    ) -> Result<Self> {
        validate_identifier(table).map_err(DataError::ConfigError)?;

        let db_type = match write.get_database_backend() {
            DatabaseBackend::MySql => DatabaseType::MySQL,
            DatabaseBackend::Postgres => DatabaseType::PostgreSQL,
            DatabaseBackend::Sqlite => DatabaseType::SQLite,
        };

        let strategy = db_type.resolve_strategy(strategy)?;

        Ok(Self {
            read,
            write,
            db_type,
            table: table.to_string(),
            strategy,
        })
    }

    pub fn db_type(&self) -> DatabaseType {
        self.db_type
    }

    pub fn strategy(&self) -> UpsertStrategy {
        self.strategy
    }

    /// 创建记录表（如不存在）
    pub async fn initialize_table(&self) -> Result<()> {
        let ddl = match self.db_type {
            DatabaseType::MySQL => format!(
                "CREATE TABLE IF NOT EXISTS {} (id BIGINT NOT NULL PRIMARY KEY, name VARCHAR(255) NOT NULL)",
                self.table
            ),
            DatabaseType::PostgreSQL => format!(
                "CREATE TABLE IF NOT EXISTS {} (id BIGINT PRIMARY KEY, name TEXT NOT NULL)",
                self.table
            ),
            DatabaseType::SQLite => format!(
                "CREATE TABLE IF NOT EXISTS {} (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
                self.table
            ),
        };
        self.write
            .execute(Statement::from_string(self.db_type.backend(), ddl))
            .await?;
        info!(table = %self.table, "Record table ensured");
        Ok(())
    }

    fn placeholder(&self, n: usize) -> String {
        match self.db_type {
            DatabaseType::PostgreSQL => format!("${}", n),
            DatabaseType::MySQL | DatabaseType::SQLite => "?".to_string(),
        }
    }

    fn select_statement(&self, id: i64) -> Statement {
        let sql = format!(
            "SELECT id, name FROM {} WHERE id = {}",
            self.table,
            self.placeholder(1)
        );
        Statement::from_sql_and_values(self.db_type.backend(), sql, [Value::from(id)])
    }

    /// 仅在主键不存在时插入
    ///
    /// MySQL 没有不吞掉其它错误的 `DO NOTHING` 写法，冲突以唯一键错误返回
    fn insert_if_absent_statement(&self, record: &Record) -> Statement {
        let conflict = match self.db_type {
            DatabaseType::MySQL => "",
            DatabaseType::PostgreSQL | DatabaseType::SQLite => " ON CONFLICT (id) DO NOTHING",
        };
        let sql = format!(
            "INSERT INTO {} (id, name) VALUES ({}, {}){}",
            self.table,
            self.placeholder(1),
            self.placeholder(2),
            conflict
        );
        Statement::from_sql_and_values(
            self.db_type.backend(),
            sql,
            [Value::from(record.id), Value::from(record.name.clone())],
        )
    }

    fn update_statement(&self, record: &Record) -> Statement {
        let sql = format!(
            "UPDATE {} SET name = {} WHERE id = {}",
            self.table,
            self.placeholder(1),
            self.placeholder(2)
        );
        Statement::from_sql_and_values(
            self.db_type.backend(),
            sql,
            [Value::from(record.name.clone()), Value::from(record.id)],
        )
    }

    fn upsert_statement(&self, record: &Record) -> Statement {
        let backend = self.db_type.backend();
        match self.db_type {
            DatabaseType::MySQL => Statement::from_sql_and_values(
                backend,
                format!(
                    "INSERT INTO {} (id, name) VALUES (?, ?) ON DUPLICATE KEY UPDATE name = ?",
                    self.table
                ),
                [
                    Value::from(record.id),
                    Value::from(record.name.clone()),
                    Value::from(record.name.clone()),
                ],
            ),
            DatabaseType::PostgreSQL | DatabaseType::SQLite => Statement::from_sql_and_values(
                backend,
                format!(
                    "INSERT INTO {} (id, name) VALUES ({}, {}) ON CONFLICT (id) DO UPDATE SET name = excluded.name",
                    self.table,
                    self.placeholder(1),
                    self.placeholder(2)
                ),
                [Value::from(record.id), Value::from(record.name.clone())],
            ),
        }
    }

    async fn upsert_native(&self, record: &Record) -> Result<RowsTouched> {
        let result = self.write.execute(self.upsert_statement(record)).await?;
        Ok(RowsTouched(result.rows_affected()))
    }

    /// 先插入，冲突再更新
    ///
    /// 两条语句都直接获取写锁，不存在先读后升级的锁。并发的首次写入中只有
    /// 一个能插入成功，其余都落到更新分支。
    async fn upsert_with_existence_check(&self, record: &Record) -> Result<RowsTouched> {
        let inserted = match self
            .write
            .execute(self.insert_if_absent_statement(record))
            .await
        {
            Ok(result) => result.rows_affected(),
            Err(e) if is_duplicate_key(&e) => 0,
            Err(e) => return Err(e.into()),
        };
        if inserted == 1 {
            return Ok(RowsTouched::INSERTED);
        }

        let updated = self.write.execute(self.update_statement(record)).await?;
        match updated.rows_affected() {
            0 => Ok(RowsTouched(0)),
            _ => Ok(RowsTouched::UPDATED),
        }
    }
}

fn is_duplicate_key(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[async_trait]
impl RecordStore for SeaRecordStore {
    #[instrument(skip(self), level = "debug")]
    async fn read_by_id(&self, id: i64) -> Result<Option<Record>> {
        let row = self.read.query_one(self.select_statement(id)).await?;
        match row {
            Some(row) => {
                let record = Record {
                    id: row.try_get::<i64>("", "id")?,
                    name: row.try_get::<String>("", "name")?,
                };
                debug!(id, "Record found in store");
                Ok(Some(record))
            }
            None => {
                debug!(id, "Record not found in store");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, record), level = "debug", fields(id = record.id))]
    async fn upsert(&self, record: &Record) -> Result<RowsTouched> {
        let rows = match self.strategy {
            UpsertStrategy::NativeRowCount => self.upsert_native(record).await?,
            UpsertStrategy::ExistenceCheck => self.upsert_with_existence_check(record).await?,
        };
        debug!(rows = rows.0, strategy = ?self.strategy, "Upsert applied");
        Ok(rows)
    }

    async fn ping(&self) -> Result<()> {
        let probe = || Statement::from_string(self.db_type.backend(), "SELECT 1".to_string());
        self.read.execute(probe()).await.map_err(|e| {
            DataError::DatabaseError(format!("Read replica health check failed: {}", e))
        })?;
        self.write.execute(probe()).await.map_err(|e| {
            DataError::DatabaseError(format!("Write replica health check failed: {}", e))
        })?;
        Ok(())
    }
}

/// 建立连接池
async fn open_pool(dsn: &str, config: &StoreConfig) -> Result<DatabaseConnection> {
    let db_type = DatabaseType::from_url(dsn);
    let connect_timeout = Duration::from_millis(config.connect_timeout_ms);

    let mut opt = ConnectOptions::new(dsn.to_string());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(connect_timeout)
        .acquire_timeout(connect_timeout)
        .sqlx_logging(false);
    if db_type == DatabaseType::SQLite && dsn.contains(":memory:") {
        // 每个连接都是独立的内存库，只能保留一个
        opt.max_connections(1).min_connections(1);
    }

    let start = Instant::now();
    let connection = match timeout(connect_timeout * 2, Database::connect(opt)).await {
        Ok(Ok(conn)) => conn,
        Ok(Err(e)) => {
            return Err(DataError::DatabaseError(format!(
                "Failed to connect to {}: {}",
                redact_connection_string(dsn),
                e
            )));
        }
        Err(_) => {
            return Err(DataError::DatabaseError(format!(
                "Connection timeout: {} not responding within {:?}",
                redact_connection_string(dsn),
                connect_timeout * 2
            )));
        }
    };

    let elapsed = start.elapsed();
    info!(
        dsn = %redact_connection_string(dsn),
        db_type = ?db_type,
        "Database connection established in {:?}",
        elapsed
    );
    if elapsed > Duration::from_secs(3) {
        warn!("Database connection took longer than expected: {:?}", elapsed);
    }
    Ok(connection)
}
