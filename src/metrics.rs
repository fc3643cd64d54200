//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了服务的指标收集功能，以 Prometheus 文本格式导出。

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::Arc;

/// 指标收集器
///
/// 由协调器与 HTTP 层共享，克隆后指向同一组计数器
#[derive(Clone, Debug, Default)]
pub struct Metrics {
    /// 请求总数统计
    /// key: (layer, op, result)
    requests_total: Arc<DashMap<(String, String, String), u64>>,
    /// 操作耗时
    /// key: (layer, op) -> (total_duration_secs, count)
    operation_duration: Arc<DashMap<(String, String), (f64, u64)>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录请求指标
    ///
    /// # 参数
    ///
    /// * `layer` - 所在层（cache/store/http）
    /// * `op` - 操作类型（get/set/upsert）
    /// * `result` - 操作结果（hit/miss/error/created/updated）
    pub fn record(&self, layer: &str, op: &str, result: &str) {
        *self
            .requests_total
            .entry((layer.to_string(), op.to_string(), result.to_string()))
            .or_insert(0) += 1;
    }

    /// 记录操作耗时
    pub fn record_duration(&self, layer: &str, op: &str, duration_secs: f64) {
        let mut entry = self
            .operation_duration
            .entry((layer.to_string(), op.to_string()))
            .or_insert((0.0, 0));
        entry.0 += duration_secs;
        entry.1 += 1;
    }

    /// 读取单个计数器，不存在时为 0
    pub fn count(&self, layer: &str, op: &str, result: &str) -> u64 {
        self.requests_total
            .get(&(layer.to_string(), op.to_string(), result.to_string()))
            .map(|v| *v)
            .unwrap_or(0)
    }

    /// 将所有指标格式化为 Prometheus 文本格式
    pub fn render(&self) -> String {
        let mut requests: Vec<_> = self
            .requests_total
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        requests.sort();

        let mut durations: Vec<_> = self
            .operation_duration
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        durations.sort_by(|a, b| a.0.cmp(&b.0));

        let mut output = String::new();
        output.push_str("# TYPE oxdata_requests_total counter\n");
        for ((layer, op, result), v) in requests {
            let _ = writeln!(
                output,
                "oxdata_requests_total{{layer=\"{}\",operation=\"{}\",result=\"{}\"}} {}",
                layer, op, result, v
            );
        }
        output.push_str("# TYPE oxdata_operation_duration_seconds summary\n");
        for ((layer, op), (total, count)) in durations {
            let _ = writeln!(
                output,
                "oxdata_operation_duration_seconds_sum{{layer=\"{}\",operation=\"{}\"}} {}",
                layer, op, total
            );
            let _ = writeln!(
                output,
                "oxdata_operation_duration_seconds_count{{layer=\"{}\",operation=\"{}\"}} {}",
                layer, op, count
            );
        }
        output
    }
}
