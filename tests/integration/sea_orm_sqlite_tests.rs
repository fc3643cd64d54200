//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! SeaORM SQLite测试

#[path = "../common/mod.rs"]
mod common;

use common::{setup_logging, TestDb};
use oxdata::config::{StoreConfig, UpsertStrategy};
use oxdata::error::DataError;
use oxdata::model::Record;
use oxdata::store::{DatabaseType, RecordStore, RowsTouched, SeaRecordStore};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use secrecy::SecretString;
use std::sync::Arc;

async fn open(dsn: &str) -> Arc<DatabaseConnection> {
    let mut opt = ConnectOptions::new(dsn.to_string());
    opt.max_connections(1)
        .min_connections(0)
        .connect_timeout(std::time::Duration::from_secs(10))
        .sqlx_logging(false);
    Arc::new(Database::connect(opt).await.expect("connect"))
}

mod read_write_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_row_is_none() {
        setup_logging();
        let db = TestDb::new();
        let store = db.store().await;
        assert_eq!(store.read_by_id(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_insert_then_update_row_counts() {
        let db = TestDb::new();
        let store = db.store().await;

        assert_eq!(
            store.upsert(&Record::new(1, "a")).await.unwrap(),
            RowsTouched::INSERTED
        );
        assert_eq!(
            store.upsert(&Record::new(1, "b")).await.unwrap(),
            RowsTouched::UPDATED
        );
        assert_eq!(
            store.upsert(&Record::new(1, "b")).await.unwrap(),
            RowsTouched::UPDATED
        );
        assert_eq!(
            store.read_by_id(1).await.unwrap(),
            Some(Record::new(1, "b"))
        );
    }

    #[tokio::test]
    async fn test_separate_read_and_write_pools_see_the_same_data() {
        let db = TestDb::new();
        db.store().await;

        let read = open(&db.dsn).await;
        let write = open(&db.dsn).await;
        let store = SeaRecordStore::from_connections(read, write, "data", None).unwrap();

        store.upsert(&Record::new(5, "five")).await.unwrap();
        assert_eq!(
            store.read_by_id(5).await.unwrap(),
            Some(Record::new(5, "five"))
        );
        store.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_in_memory_database_shares_one_pool() {
        let config = StoreConfig {
            read_dsn: SecretString::new("sqlite::memory:".to_string().into()),
            write_dsn: SecretString::new("sqlite::memory:".to_string().into()),
            bootstrap_schema: true,
            ..StoreConfig::default()
        };
        let store = SeaRecordStore::connect(&config).await.unwrap();
        assert!(format!("{:?}", store).contains("shared_pool: true"));

        store.upsert(&Record::new(1, "mem")).await.unwrap();
        assert_eq!(
            store.read_by_id(1).await.unwrap(),
            Some(Record::new(1, "mem"))
        );
    }
}

mod concurrency_tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_distinct_ids_with_default_pool() {
        let db = TestDb::new();
        let store = Arc::new(db.store().await);

        let tasks = (1..=40).map(|id| {
            let store = store.clone();
            tokio::spawn(async move { store.upsert(&Record::new(id, "v")).await })
        });
        for result in futures::future::join_all(tasks).await {
            assert_eq!(result.unwrap().unwrap(), RowsTouched::INSERTED);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_writers_on_one_id_insert_once() {
        let db = TestDb::new();
        let store = Arc::new(db.store().await);

        for id in 1..=20 {
            let tasks = (0..8).map(|writer| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .upsert(&Record::new(id, format!("writer-{}", writer)))
                        .await
                })
            });
            let rows: Vec<RowsTouched> = futures::future::join_all(tasks)
                .await
                .into_iter()
                .map(|result| result.unwrap().unwrap())
                .collect();
            assert_eq!(
                rows.iter().filter(|r| **r == RowsTouched::INSERTED).count(),
                1
            );
            assert_eq!(
                rows.iter().filter(|r| **r == RowsTouched::UPDATED).count(),
                7
            );
        }
    }
}

mod configuration_tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_defaults_to_existence_check() {
        let db = TestDb::new();
        let store = db.store().await;
        assert_eq!(store.db_type(), DatabaseType::SQLite);
        assert_eq!(store.strategy(), UpsertStrategy::ExistenceCheck);
    }

    #[tokio::test]
    async fn test_native_row_count_is_rejected_for_sqlite() {
        let db = TestDb::new();
        let conn = open(&db.dsn).await;
        let err = SeaRecordStore::from_connections(
            conn.clone(),
            conn,
            "data",
            Some(UpsertStrategy::NativeRowCount),
        )
        .unwrap_err();
        assert!(matches!(err, DataError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_unsafe_table_name_is_rejected() {
        let db = TestDb::new();
        let conn = open(&db.dsn).await;
        let err =
            SeaRecordStore::from_connections(conn.clone(), conn, "data; DROP TABLE x", None)
                .unwrap_err();
        assert!(matches!(err, DataError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_mixed_backends_are_rejected() {
        let config = StoreConfig {
            read_dsn: SecretString::new("sqlite::memory:".to_string().into()),
            write_dsn: SecretString::new("postgres://u:p@127.0.0.1:1/db".to_string().into()),
            ..StoreConfig::default()
        };
        let err = SeaRecordStore::connect(&config).await.unwrap_err();
        assert!(matches!(err, DataError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_missing_table_is_a_store_failure() {
        let db = TestDb::new();
        let conn = open(&db.dsn).await;
        let store = SeaRecordStore::from_connections(conn.clone(), conn, "absent", None).unwrap();
        assert!(store.read_by_id(1).await.is_err());
        assert!(store.upsert(&Record::new(1, "a")).await.is_err());
    }
}
