//! # Fanout Analyze
//!
//! 把一批互不相关的条目（文档页面、简历）并发地交给 LLM 处理，
//! 单个条目失败不会影响同批的其他条目。
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 远程服务的薄封装，只负责一次请求
//! - `LlmClient` - OpenAI 兼容的聊天/视觉模型
//! - `GuardrailClient` - 内容安全检查
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 只处理单个页面或单份简历
//! - `PageAnalyzer` - guardrail → 视觉模型生成测试用例
//! - `ResumeAnalyzer` - 简历评估并解析 JSON
//! - `ReportWriter` - 报告落盘
//!
//! ### ③ 编排层（Orchestration）
//! - `orchestrator/fanout` - 扇出协调器：并发上限、重试、超时、隔离
//! - `orchestrator/retry` - 重试策略
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/page_batch` - 页面批次 → 测试用例报告
//! - `workflow/resume_batch` - 简历批次 → 排名表
//!
//! ### 基础设施（Infrastructure）
//! - `infrastructure/metrics` - 显式传入的指标上下文
//!
//! ## 模块结构

pub mod app;
pub mod cli;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::{App, RunSummary};
pub use config::Config;
pub use error::{AppError, AppResult, CallError, ErrorClass};
pub use infrastructure::{AnalysisMetrics, MetricsSink, NoopMetrics};
pub use models::{Batch, BatchOutcomes, Outcome, WorkItem};
pub use orchestrator::{FanoutCoordinator, FanoutSettings, RetryDelay, RetryPolicy};
