//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了记录的数据模型以及缓存键的推导规则。

use serde::{Deserialize, Serialize};

/// 缓存键前缀
pub const CACHE_KEY_PREFIX: &str = "data";

/// 记录
///
/// 以调用方指定的 `id` 为唯一标识，没有版本号与时间戳。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub name: String,
}

impl Record {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// 该记录对应的缓存键
    pub fn cache_key(&self) -> String {
        cache_key(self.id)
    }
}

/// PUT 请求体
///
/// `id` 字段可选，且从不参与存储：路径中的 id 才是权威来源。
#[derive(Debug, Clone, Deserialize)]
pub struct RecordBody {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
}

/// 由记录 id 推导缓存键：`data:<id>`
pub fn cache_key(id: i64) -> String {
    format!("{}:{}", CACHE_KEY_PREFIX, id)
}

/// 记录的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// 命中缓存
    Cache,
    /// 缓存未命中，从存储读取
    Store,
}

impl Origin {
    pub fn is_cache_hit(&self) -> bool {
        matches!(self, Origin::Cache)
    }
}

/// upsert 的分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    Created,
    Updated,
}

impl WriteStatus {
    pub fn is_created(&self) -> bool {
        matches!(self, WriteStatus::Created)
    }
}

/// GET 响应体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetResponse {
    pub data: Record,
    pub cache_hit: bool,
}

/// PUT 响应体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutResponse {
    pub data: Record,
    pub created: bool,
}
