//! 基础设施层
//!
//! 持有跨条目共享的资源，只暴露能力

pub mod metrics;

pub use metrics::{AnalysisMetrics, Counter, MetricsSink, MetricsSnapshot, NoopMetrics, Summary};
