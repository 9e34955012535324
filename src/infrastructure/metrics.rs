//! 指标上下文 - 基础设施层
//!
//! 由宿主进程显式创建，在调用协调器时传入；不存在全局注册表。

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// 协调器上报指标的接口
pub trait MetricsSink: Send + Sync {
    /// 一个条目成功完成
    fn record_success(&self);
    /// 一个条目最终失败
    fn record_failure(&self);
    /// 一个条目从开始到结束（含重试）的耗时
    fn observe_call_duration(&self, elapsed: Duration);
}

/// 什么都不记录
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record_success(&self) {}
    fn record_failure(&self) {}
    fn observe_call_duration(&self, _elapsed: Duration) {}
}

/// 单调递增计数器
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// 耗时摘要：次数 + 总和（微秒精度）
#[derive(Debug, Default)]
pub struct Summary {
    count: AtomicU64,
    sum_micros: AtomicU64,
}

impl Summary {
    pub fn observe(&self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum_micros.fetch_add(micros, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum_seconds(&self) -> f64 {
        self.sum_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0
    }

    /// 开始计时，guard 释放时记录一次
    pub fn start_timer(&self) -> SummaryTimer<'_> {
        SummaryTimer {
            summary: self,
            started: Instant::now(),
        }
    }
}

/// 计时 guard
pub struct SummaryTimer<'a> {
    summary: &'a Summary,
    started: Instant,
}

impl Drop for SummaryTimer<'_> {
    fn drop(&mut self) {
        self.summary.observe(self.started.elapsed());
    }
}

/// 分析流程使用的指标集合
#[derive(Debug, Default)]
pub struct AnalysisMetrics {
    /// 处理过的批次数
    pub batches_processed: Counter,
    /// 成功分析的条目数
    pub items_analyzed: Counter,
    /// 失败的条目数
    pub analysis_errors: Counter,
    /// 每个条目的分析耗时
    pub analysis_duration: Summary,
    /// 每个批次的整体耗时
    pub request_time: Summary,
}

/// 指标快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub batches_processed: u64,
    pub items_analyzed: u64,
    pub analysis_errors: u64,
    pub analysis_duration_count: u64,
    pub analysis_duration_sum_seconds: f64,
    pub request_time_count: u64,
    pub request_time_sum_seconds: f64,
}

impl AnalysisMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_processed: self.batches_processed.get(),
            items_analyzed: self.items_analyzed.get(),
            analysis_errors: self.analysis_errors.get(),
            analysis_duration_count: self.analysis_duration.count(),
            analysis_duration_sum_seconds: self.analysis_duration.sum_seconds(),
            request_time_count: self.request_time.count(),
            request_time_sum_seconds: self.request_time.sum_seconds(),
        }
    }

    /// 输出 Prometheus 文本格式
    pub fn render_prometheus(&self) -> String {
        let mut out = String::new();
        write_counter(
            &mut out,
            "batches_processed_total",
            "Total number of batches processed",
            self.batches_processed.get(),
        );
        write_counter(
            &mut out,
            "items_analyzed_total",
            "Total number of items analyzed",
            self.items_analyzed.get(),
        );
        write_counter(
            &mut out,
            "analysis_errors_total",
            "Total number of analysis errors",
            self.analysis_errors.get(),
        );
        write_summary(
            &mut out,
            "analysis_duration_seconds",
            "Time spent analyzing each item",
            &self.analysis_duration,
        );
        write_summary(
            &mut out,
            "request_processing_seconds",
            "Time spent processing request",
            &self.request_time,
        );
        out
    }
}

impl MetricsSink for AnalysisMetrics {
    fn record_success(&self) {
        self.items_analyzed.inc();
    }

    fn record_failure(&self) {
        self.analysis_errors.inc();
    }

    fn observe_call_duration(&self, elapsed: Duration) {
        self.analysis_duration.observe(elapsed);
    }
}

fn write_counter(out: &mut String, name: &str, help: &str, value: u64) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} counter");
    let _ = writeln!(out, "{name} {value}");
}

fn write_summary(out: &mut String, name: &str, help: &str, summary: &Summary) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} summary");
    let _ = writeln!(out, "{name}_count {}", summary.count());
    let _ = writeln!(out, "{name}_sum {}", summary.sum_seconds());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_updates_counters() {
        let metrics = AnalysisMetrics::new();
        metrics.record_success();
        metrics.record_success();
        metrics.record_failure();
        metrics.observe_call_duration(Duration::from_millis(1500));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.items_analyzed, 2);
        assert_eq!(snapshot.analysis_errors, 1);
        assert_eq!(snapshot.analysis_duration_count, 1);
        assert!((snapshot.analysis_duration_sum_seconds - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_timer_observes_on_drop() {
        let metrics = AnalysisMetrics::new();
        {
            let _timer = metrics.request_time.start_timer();
        }
        assert_eq!(metrics.request_time.count(), 1);
    }

    #[test]
    fn test_render_prometheus() {
        let metrics = AnalysisMetrics::new();
        metrics.batches_processed.inc();
        metrics.record_failure();

        let text = metrics.render_prometheus();
        assert!(text.contains("# TYPE batches_processed_total counter"));
        assert!(text.contains("batches_processed_total 1"));
        assert!(text.contains("analysis_errors_total 1"));
        assert!(text.contains("request_processing_seconds_count 0"));
    }

    #[test]
    fn test_instances_are_independent() {
        let a = AnalysisMetrics::new();
        let b = AnalysisMetrics::new();
        a.record_success();
        assert_eq!(a.items_analyzed.get(), 1);
        assert_eq!(b.items_analyzed.get(), 0);
    }
}
