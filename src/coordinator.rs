//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 一致性协调器
//!
//! 负责记录存储与旁路缓存之间的读写协议：
//! 读取时缓存未命中则回源并回填，写入时先落库再写穿缓存。
//! 存储是唯一的权威来源，缓存写入失败只记录日志；缓存读取失败作为错误返回。

use crate::cache::LookasideCache;
use crate::error::{DataError, Result};
use crate::metrics::Metrics;
use crate::model::{cache_key, Origin, Record, RecordBody, WriteStatus};
use crate::serialization::{Serializer, SerializerEnum};
use crate::store::{RecordStore, RowsTouched};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, error, instrument, warn, Instrument};

const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(3);
const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_secs(1);

/// Fetch 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub record: Record,
    pub origin: Origin,
}

/// Upsert 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upserted {
    pub record: Record,
    pub status: WriteStatus,
}

/// 一致性协调器
///
/// 所有依赖在启动时显式注入，不持有任何全局状态
#[derive(Clone)]
pub struct Coordinator {
    store: Arc<dyn RecordStore>,
    cache: Arc<dyn LookasideCache>,
    serializer: SerializerEnum,
    metrics: Metrics,
    store_timeout: Duration,
    cache_timeout: Duration,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("serializer", &self.serializer)
            .field("store_timeout", &self.store_timeout)
            .field("cache_timeout", &self.cache_timeout)
            .finish()
    }
}

impl Coordinator {
    /// 创建新的协调器
    ///
    /// # 参数
    ///
    /// * `store` - 记录存储
    /// * `cache` - 旁路缓存
    pub fn new(store: Arc<dyn RecordStore>, cache: Arc<dyn LookasideCache>) -> Self {
        Self {
            store,
            cache,
            serializer: SerializerEnum::default(),
            metrics: Metrics::default(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
            cache_timeout: DEFAULT_CACHE_TIMEOUT,
        }
    }

    pub fn with_serializer(mut self, serializer: SerializerEnum) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// 设置存储与缓存调用的截止时间
    pub fn with_timeouts(mut self, store_timeout: Duration, cache_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self.cache_timeout = cache_timeout;
        self
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// 按 id 读取记录
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(_))` - 找到记录，`origin` 标明来自缓存还是存储
    /// * `Ok(None)` - 存储中不存在该记录，不会写入缓存
    /// * `Err(_)` - 缓存读取失败或条目损坏，或存储访问失败
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch(&self, id: i64) -> Result<Option<Fetched>> {
        let key = cache_key(id);

        if let Some(bytes) = self.cache_get(&key).await? {
            let record = self.decode_entry(id, &key, &bytes).map_err(|e| {
                self.metrics.record("cache", "get", "corrupt");
                error!(key = %key, error = %e, "Undecodable cache entry");
                e
            })?;
            debug!(id, "Served from cache");
            return Ok(Some(Fetched {
                record,
                origin: Origin::Cache,
            }));
        }

        let start = Instant::now();
        let found = bounded(self.store_timeout, "store read", self.store.read_by_id(id)).await;
        self.metrics
            .record_duration("store", "read", start.elapsed().as_secs_f64());

        let record = match found {
            Ok(Some(record)) => {
                self.metrics.record("store", "read", "found");
                record
            }
            Ok(None) => {
                self.metrics.record("store", "read", "not_found");
                debug!(id, "Record absent from store");
                return Ok(None);
            }
            Err(e) => {
                self.metrics.record("store", "read", "error");
                error!(id, error = %e, "Store read failed");
                return Err(e);
            }
        };

        self.populate(&key, &record).await;
        Ok(Some(Fetched {
            record,
            origin: Origin::Store,
        }))
    }

    /// 解码请求体并写入记录
    ///
    /// 请求体中的 `id` 从不参与存储，以路径中的 `id` 为准
    #[instrument(skip(self, body), level = "debug", fields(body_len = body.len()))]
    pub async fn upsert(&self, id: i64, body: &[u8]) -> Result<Upserted> {
        let body: RecordBody = serde_json::from_slice(body)
            .map_err(|e| DataError::InvalidRequest(format!("malformed record body: {}", e)))?;
        if let Some(body_id) = body.id {
            if body_id != id {
                debug!(path_id = id, body_id, "Body id ignored in favour of path id");
            }
        }
        self.upsert_record(Record::new(id, body.name)).await
    }

    /// 写入记录：先落库，再写穿缓存，最后按影响行数分类
    ///
    /// 落库与写穿在独立任务中执行，调用方被取消（例如客户端断开）时仍会完成缓存写入
    #[instrument(skip(self, record), level = "debug", fields(id = record.id))]
    pub async fn upsert_record(&self, record: Record) -> Result<Upserted> {
        let this = self.clone();
        tokio::spawn(async move { this.write_through(record).await }.in_current_span())
            .await
            .map_err(|e| DataError::Internal(format!("upsert task failed: {}", e)))?
    }

    async fn write_through(&self, record: Record) -> Result<Upserted> {
        let start = Instant::now();
        let written = bounded(self.store_timeout, "store upsert", self.store.upsert(&record)).await;
        self.metrics
            .record_duration("store", "upsert", start.elapsed().as_secs_f64());

        let rows = match written {
            Ok(rows) => rows,
            Err(e) => {
                self.metrics.record("store", "upsert", "error");
                error!(id = record.id, error = %e, "Store upsert failed");
                return Err(e);
            }
        };

        self.populate(&record.cache_key(), &record).await;

        let status = match classify(record.id, rows) {
            Ok(status) => status,
            Err(e) => {
                self.metrics.record("store", "upsert", "unexpected_rows");
                error!(id = record.id, rows = rows.0, "Unexpected upsert row count");
                return Err(e);
            }
        };
        self.metrics.record(
            "store",
            "upsert",
            if status.is_created() {
                "created"
            } else {
                "updated"
            },
        );
        Ok(Upserted { record, status })
    }

    /// 读缓存；未命中返回 `Ok(None)`，连接失败或超时返回错误
    async fn cache_get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match bounded(self.cache_timeout, "cache get", self.cache.get(key)).await {
            Ok(Some(bytes)) => {
                self.metrics.record("cache", "get", "hit");
                Ok(Some(bytes))
            }
            Ok(None) => {
                self.metrics.record("cache", "get", "miss");
                Ok(None)
            }
            Err(e) => {
                self.metrics.record("cache", "get", "error");
                error!(key, error = %e, "Cache read failed");
                Err(e)
            }
        }
    }

    fn decode_entry(&self, id: i64, key: &str, bytes: &[u8]) -> Result<Record> {
        let record: Record =
            self.serializer
                .deserialize(bytes)
                .map_err(|e| DataError::CorruptCacheEntry {
                    key: key.to_string(),
                    reason: e.to_string(),
                })?;
        if record.id != id {
            return Err(DataError::CorruptCacheEntry {
                key: key.to_string(),
                reason: format!("entry holds id {}", record.id),
            });
        }
        Ok(record)
    }

    /// 尽力写入缓存，失败只记录日志
    async fn populate(&self, key: &str, record: &Record) {
        let bytes = match self.serializer.serialize(record) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.metrics.record("cache", "set", "error");
                warn!(key, error = %e, "Failed to encode cache entry");
                return;
            }
        };
        match bounded(self.cache_timeout, "cache set", self.cache.set(key, bytes)).await {
            Ok(()) => self.metrics.record("cache", "set", "ok"),
            Err(e) => {
                self.metrics.record("cache", "set", "error");
                warn!(key, error = %e, "Cache write failed, store remains authoritative");
            }
        }
    }
}

/// 1 行为新建，2 行为更新，其它值一律视为错误
fn classify(id: i64, rows: RowsTouched) -> Result<WriteStatus> {
    match rows {
        RowsTouched::INSERTED => Ok(WriteStatus::Created),
        RowsTouched::UPDATED => Ok(WriteStatus::Updated),
        RowsTouched(rows) => Err(DataError::UnexpectedRowCount { id, rows }),
    }
}

async fn bounded<T, F>(limit: Duration, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(DataError::Timeout(format!("{} exceeded {:?}", what, limit))),
    }
}
