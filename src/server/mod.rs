//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了 HTTP 服务的路由与启动逻辑。

use crate::coordinator::Coordinator;
use axum::{body::Body, http::Request, routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod error;
pub mod extract;
pub mod handlers;

pub use error::ApiError;
pub use extract::RecordId;

/// 处理函数共享的状态
#[derive(Clone, Debug)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub lenient_path_ids: bool,
}

impl AppState {
    pub fn new(coordinator: Arc<Coordinator>, lenient_path_ids: bool) -> Self {
        Self {
            coordinator,
            lenient_path_ids,
        }
    }
}

/// 构建路由
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/data/:id", get(handlers::get_data).put(handlers::put_data))
        .route("/readyz", get(handlers::readyz))
        .route("/metrics", get(handlers::metrics))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                let request_id = uuid::Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    method = %req.method(),
                    uri = %req.uri(),
                    %request_id,
                )
            }),
        )
        .with_state(state)
}

/// 在给定监听器上提供服务，直到 `shutdown` 被取消
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "HTTP server listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    info!("HTTP server stopped");
    Ok(())
}
