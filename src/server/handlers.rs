//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! HTTP 处理函数

use super::error::ApiError;
use super::extract::RecordId;
use super::AppState;
use crate::model::{GetResponse, PutResponse};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

/// `GET /data/:id`
pub async fn get_data(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> Result<Json<GetResponse>, ApiError> {
    let fetched = state.coordinator.fetch(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(GetResponse {
        cache_hit: fetched.origin.is_cache_hit(),
        data: fetched.record,
    }))
}

/// `PUT /data/:id`
///
/// 新建返回 201，更新返回 200
pub async fn put_data(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    body: Bytes,
) -> Result<Response, ApiError> {
    let upserted = state.coordinator.upsert(id, &body).await?;
    let status = if upserted.status.is_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let body = PutResponse {
        created: upserted.status.is_created(),
        data: upserted.record,
    };
    Ok((status, Json(body)).into_response())
}

/// `GET /readyz`
pub async fn readyz() -> &'static str {
    "OK"
}

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.coordinator.metrics().render(),
    )
}
