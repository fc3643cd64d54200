//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! Redis集成测试
//!
//! 需要可达的 Redis（默认 `redis://127.0.0.1:6379`，可用 `REDIS_URL` 覆盖），否则跳过

#[path = "../common/mod.rs"]
mod common;

use common::{is_redis_available, redis_url, setup_logging, TestDb};
use oxdata::cache::{LookasideCache, RedisCache};
use oxdata::config::{CacheConfig, CacheMode};
use oxdata::coordinator::Coordinator;
use oxdata::model::{cache_key, Origin, WriteStatus};
use secrecy::SecretString;
use std::sync::Arc;

fn standalone_config() -> CacheConfig {
    CacheConfig {
        mode: CacheMode::Standalone,
        connection_string: SecretString::new(redis_url().into()),
        ..CacheConfig::default()
    }
}

/// 随机 id，避免与其它测试或残留数据冲突
fn random_id() -> i64 {
    (uuid::Uuid::new_v4().as_u128() as i64).wrapping_abs()
}

#[tokio::test]
async fn test_standalone_get_set_ping() {
    setup_logging();
    if !is_redis_available().await {
        println!("跳过测试: Redis不可用");
        return;
    }

    let cache = RedisCache::connect(&standalone_config()).await.unwrap();
    cache.ping().await.unwrap();

    let key = cache_key(random_id());
    assert_eq!(cache.get(&key).await.unwrap(), None);

    cache.set(&key, b"first".to_vec()).await.unwrap();
    cache.set(&key, b"second".to_vec()).await.unwrap();
    assert_eq!(cache.get(&key).await.unwrap(), Some(b"second".to_vec()));
}

#[tokio::test]
async fn test_ttl_is_applied_when_configured() {
    setup_logging();
    if !is_redis_available().await {
        println!("跳过测试: Redis不可用");
        return;
    }

    let config = CacheConfig {
        ttl_secs: Some(1),
        ..standalone_config()
    };
    let cache = RedisCache::connect(&config).await.unwrap();
    let key = cache_key(random_id());
    cache.set(&key, b"short-lived".to_vec()).await.unwrap();
    assert!(cache.get(&key).await.unwrap().is_some());

    tokio::time::sleep(std::time::Duration::from_millis(2100)).await;
    assert_eq!(cache.get(&key).await.unwrap(), None);
}

#[tokio::test]
async fn test_coordinator_round_trip_through_redis() {
    setup_logging();
    if !is_redis_available().await {
        println!("跳过测试: Redis不可用");
        return;
    }

    let db = TestDb::new();
    let cache = RedisCache::connect(&standalone_config()).await.unwrap();
    let coordinator = Coordinator::new(Arc::new(db.store().await), Arc::new(cache.clone()));

    let id = random_id();
    let upserted = coordinator.upsert(id, br#"{"name":"via redis"}"#).await.unwrap();
    assert_eq!(upserted.status, WriteStatus::Created);

    let stored = cache.get(&cache_key(id)).await.unwrap().unwrap();
    assert_eq!(
        stored,
        format!(r#"{{"id":{},"name":"via redis"}}"#, id).into_bytes()
    );

    let fetched = coordinator.fetch(id).await.unwrap().unwrap();
    assert_eq!(fetched.origin, Origin::Cache);
    assert_eq!(fetched.record.name, "via redis");
}

#[tokio::test]
async fn test_unreachable_redis_times_out() {
    let config = CacheConfig {
        connection_string: SecretString::new("redis://10.255.255.1:6379".to_string().into()),
        connection_timeout_ms: 200,
        ..CacheConfig::default()
    };
    assert!(RedisCache::connect(&config).await.is_err());
}
