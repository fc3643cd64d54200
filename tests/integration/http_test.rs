//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! HTTP 接口测试

#[path = "../common/mod.rs"]
mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use common::{memory_coordinator, TestDb, UnreachableCache};
use oxdata::cache::{LookasideCache, MemoryCache};
use oxdata::coordinator::Coordinator;
use oxdata::model::{GetResponse, PutResponse, Record};
use oxdata::server::{router, AppState};
use std::sync::Arc;
use tower::ServiceExt;

async fn app(db: &TestDb, lenient: bool) -> (Router, MemoryCache) {
    let (coordinator, cache) = memory_coordinator(db).await;
    (router(AppState::new(coordinator, lenient)), cache)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn put(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_get_missing_record_is_plain_404() {
    let db = TestDb::new();
    let (app, _) = app(&db, false).await;

    let (status, body) = send(&app, get("/data/1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, b"Not Found");
}

#[tokio::test]
async fn test_put_creates_then_updates() {
    let db = TestDb::new();
    let (app, _) = app(&db, false).await;

    let (status, body) = send(&app, put("/data/4", r#"{"id":4,"name":"four"}"#)).await;
    assert_eq!(status, StatusCode::CREATED);
    let created: PutResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(created.data, Record::new(4, "four"));
    assert!(created.created);

    let (status, body) = send(&app, put("/data/4", r#"{"id":4,"name":"FOUR"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    let updated: PutResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(updated.data, Record::new(4, "FOUR"));
    assert!(!updated.created);
}

#[tokio::test]
async fn test_get_after_put_is_a_cache_hit() {
    let db = TestDb::new();
    let (app, cache) = app(&db, false).await;
    send(&app, put("/data/8", r#"{"name":"eight"}"#)).await;

    let (status, body) = send(&app, get("/data/8")).await;
    assert_eq!(status, StatusCode::OK);
    let got: GetResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(got.data, Record::new(8, "eight"));
    assert!(got.cache_hit);

    cache.remove("data:8").await;
    let (_, body) = send(&app, get("/data/8")).await;
    let got: GetResponse = serde_json::from_slice(&body).unwrap();
    assert!(!got.cache_hit);
}

#[tokio::test]
async fn test_body_id_is_ignored() {
    let db = TestDb::new();
    let (app, _) = app(&db, false).await;

    let (status, body) = send(&app, put("/data/5", r#"{"id":99,"name":"x"}"#)).await;
    assert_eq!(status, StatusCode::CREATED);
    let created: PutResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(created.data.id, 5);

    let (status, _) = send(&app, get("/data/99")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_integer_id_is_rejected_in_strict_mode() {
    let db = TestDb::new();
    let (app, _) = app(&db, false).await;

    let (status, body) = send(&app, get("/data/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "invalid_path_parameter");

    let (status, _) = send(&app, put("/data/abc", r#"{"name":"x"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_integer_id_maps_to_zero_in_lenient_mode() {
    let db = TestDb::new();
    let (app, _) = app(&db, true).await;

    let (status, _) = send(&app, get("/data/abc")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, put("/data/abc", r#"{"name":"zero"}"#)).await;
    assert_eq!(status, StatusCode::CREATED);
    let created: PutResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(created.data, Record::new(0, "zero"));
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let db = TestDb::new();
    let (app, _) = app(&db, false).await;

    for body in ["{not json", r#"{"id":1}"#, r#"{"name":7}"#] {
        let (status, _) = send(&app, put("/data/1", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
    }
    let (status, _) = send(&app, get("/data/1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_corrupt_cache_entry_is_500() {
    let db = TestDb::new();
    let (app, cache) = app(&db, false).await;
    cache.set("data:9", b"not a record".to_vec()).await.unwrap();

    let (status, body) = send(&app, get("/data/9")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "internal_error");
}

#[tokio::test]
async fn test_unreachable_cache_is_500_on_read_only() {
    let db = TestDb::new();
    let coordinator = Coordinator::new(Arc::new(db.store().await), Arc::new(UnreachableCache));
    let app = router(AppState::new(Arc::new(coordinator), false));

    let (status, _) = send(&app, put("/data/3", r#"{"name":"c"}"#)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, get("/data/3")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "internal_error");
}

#[tokio::test]
async fn test_readyz_and_metrics() {
    let db = TestDb::new();
    let (app, _) = app(&db, false).await;

    let (status, body) = send(&app, get("/readyz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");

    send(&app, get("/data/1")).await;
    let (status, body) = send(&app, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains(
        "oxdata_requests_total{layer=\"cache\",operation=\"get\",result=\"miss\"} 1"
    ));
}
