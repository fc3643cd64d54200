//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 路径参数提取器

use super::AppState;
use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

/// 路径中的记录 id
///
/// 严格模式下无法解析为 i64 的值返回 400；宽松模式下按 0 处理
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordId(pub i64);

/// 路径参数解析失败
#[derive(Debug)]
pub struct RecordIdError {
    pub path_param: String,
    pub message: String,
}

impl std::fmt::Display for RecordIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid record id '{}': {}", self.path_param, self.message)
    }
}

impl std::error::Error for RecordIdError {}

impl IntoResponse for RecordIdError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": "invalid_path_parameter",
            "message": self.to_string(),
            "path_param": self.path_param,
        });
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

/// 解析路径中的 id
pub fn parse_record_id(raw: &str, lenient: bool) -> Result<i64, RecordIdError> {
    match raw.parse::<i64>() {
        Ok(id) => Ok(id),
        Err(_) if lenient => {
            tracing::debug!(raw, "Unparseable record id treated as 0");
            Ok(0)
        }
        Err(e) => Err(RecordIdError {
            path_param: raw.to_string(),
            message: e.to_string(),
        }),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RecordId {
    type Rejection = RecordIdError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|e| RecordIdError {
                path_param: parts.uri.path().to_string(),
                message: format!("Failed to extract id from path: {}", e),
            })?;

        parse_record_id(&raw, state.lenient_path_ids).map(RecordId)
    }
}
