//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! HTTP 错误映射

use crate::error::DataError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// 处理函数返回的错误
#[derive(Debug)]
pub enum ApiError {
    /// 存储中不存在该记录
    NotFound,
    Data(DataError),
}

impl From<DataError> for ApiError {
    fn from(err: DataError) -> Self {
        ApiError::Data(err)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Data(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Data(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            ApiError::NotFound => (status, "Not Found").into_response(),
            ApiError::Data(e) if e.is_client_error() => {
                let body = serde_json::json!({
                    "error": "invalid_request",
                    "message": e.to_string(),
                });
                (status, Json(body)).into_response()
            }
            ApiError::Data(e) => {
                // 内部细节只进日志
                tracing::error!(error = %e, "Request failed");
                let body = serde_json::json!({
                    "error": "internal_error",
                    "message": "internal server error",
                });
                (status, Json(body)).into_response()
            }
        }
    }
}
