//! 业务能力层（Service Layer）
//!
//! 每个服务只处理"一个"页面或"一份"简历，不出现批次，不关心重试和并发。
//! 批次调度交给 `orchestrator`，流程拼装交给 `workflow`。

pub mod page_analyzer;
pub mod prompts;
pub mod report_writer;
pub mod resume_analyzer;

pub use page_analyzer::{PageAnalyzer, BLOCKED_BY_GUARDRAILS};
pub use report_writer::ReportWriter;
pub use resume_analyzer::{parse_assessment, ResumeAnalyzer};
