//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了服务的日志与链路追踪初始化。

use crate::config::TelemetryConfig;
use crate::error::{DataError, Result};
use opentelemetry::global;
use opentelemetry::trace::TracerProvider;
use opentelemetry_sdk::trace::TracerProvider as SdkTracerProvider;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 追踪守卫，drop 时关闭全局 tracer provider
#[must_use = "dropping the guard shuts tracing down"]
#[derive(Debug)]
pub struct TelemetryGuard {
    _private: (),
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        global::shutdown_tracer_provider();
    }
}

/// 初始化日志与 OpenTelemetry Tracing
///
/// 此函数应该在应用程序启动时调用一次。过滤规则优先取 `RUST_LOG`，
/// 未设置时使用配置中的 `log_filter`。
///
/// 未配置导出器时 provider 只负责生成 trace id，span 随日志输出。
pub fn init_tracing(config: &TelemetryConfig) -> Result<TelemetryGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .map_err(|e| DataError::ConfigError(format!("Invalid log filter: {}", e)))?;

    let provider = SdkTracerProvider::builder().build();
    global::set_tracer_provider(provider.clone());
    let tracer = provider.tracer(config.service_name.clone());
    let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(telemetry)
        .try_init()
        .map_err(|e| DataError::ConfigError(format!("Tracing already initialised: {}", e)))?;

    Ok(TelemetryGuard { _private: () })
}
