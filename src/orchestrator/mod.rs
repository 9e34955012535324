//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 把一批互不相关的工作项扇出到远程服务，并收回每一项的结果。
//!
//! ## 模块划分
//!
//! ### `fanout` - 扇出协调器
//! - 每个工作项一个 tokio 任务
//! - 用 Semaphore 限制同时在途的调用数
//! - 单项失败、超时、panic 都只影响自己
//! - 按提交顺序返回结果，并把指标记到调用方传入的上下文
//!
//! ### `retry` - 重试策略
//! - 最大重试次数、固定/指数退避
//! - 哪些错误类别允许重试
//!
//! ## 层次关系
//!
//! ```text
//! workflow (页面批次 / 简历批次)
//!     ↓
//! orchestrator::FanoutCoordinator (处理 Batch<K, I>)
//!     ↓
//! services (能力层：page_analyzer / resume_analyzer)
//!     ↓
//! clients (LLM / guardrail)
//! ```
//!
//! 编排层不做任何业务判断，只认识 `CallError::class()`。

pub mod fanout;
pub mod retry;

pub use fanout::{FanoutCoordinator, FanoutSettings, DEADLINE_EXCEEDED};
pub use retry::{RetryDelay, RetryPolicy};
