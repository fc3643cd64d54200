//! oxdata - 旁路缓存记录服务
//!
//! 以 HTTP 暴露按 id 读写的记录，数据落在读写分离的关系型数据库中，
//! 前面挂一层 Redis 旁路缓存：读取时未命中回源并回填，写入时落库后写穿缓存。

#![doc(html_root_url = "https://docs.rs/oxdata/0.1.2")]

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod metrics;
pub mod model;
pub mod serialization;
pub mod server;
pub mod store;
pub mod telemetry;
pub mod utils;

// Re-export commonly used items
pub use config::AppConfig;
pub use coordinator::{Coordinator, Fetched, Upserted};
pub use error::{DataError, Result};
pub use model::{Origin, Record, WriteStatus};

/// oxdata 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
