//! 流程层（Workflow Layer）
//!
//! 把 services 的单条目能力装配成一次完整的批次运行：
//! 构建 `Batch` → 交给 `FanoutCoordinator` → 把结果渲染成报告。

pub mod page_batch;
pub mod resume_batch;

pub use page_batch::{analyze_pages, render_page_report, PAGE_FAILED_TEXT};
pub use resume_batch::{match_resumes, rank_resumes, render_resume_json, render_resume_table};
