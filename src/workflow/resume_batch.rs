//! 简历批次流程
//!
//! 同一份职位描述对所有简历并发评估，失败的简历以 0 分参与排名。

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::info;

use crate::error::{AppError, AppResult};
use crate::infrastructure::AnalysisMetrics;
use crate::models::resume::format_percentage;
use crate::models::{Batch, BatchOutcomes, Outcome, RankedResume, ResumeAssessment, ResumeCandidate, WorkItem};
use crate::orchestrator::FanoutCoordinator;
use crate::services::ResumeAnalyzer;
use crate::utils::logging::truncate_text;

const NOT_AVAILABLE: &str = "N/A";

/// 评估所有简历，以简历名作为标识符
pub async fn match_resumes(
    coordinator: &FanoutCoordinator,
    analyzer: Arc<ResumeAnalyzer>,
    job_description: String,
    resumes: Vec<ResumeCandidate>,
    metrics: &AnalysisMetrics,
) -> AppResult<BatchOutcomes<String, ResumeAssessment>> {
    let batch = Batch::new(
        resumes
            .into_iter()
            .map(|resume| WorkItem::new(resume.name.clone(), resume)),
    )?;

    metrics.batches_processed.inc();
    let _timer = metrics.request_time.start_timer();

    let job_description: Arc<str> = job_description.into();
    let outcomes = coordinator
        .run(
            batch,
            move |item: Arc<WorkItem<String, ResumeCandidate>>| {
                let analyzer = analyzer.clone();
                let job_description = job_description.clone();
                async move { analyzer.analyze(&job_description, item.input()).await }
            },
            metrics,
        )
        .await;

    info!(
        "📑 简历评估结束: 成功 {} 份，失败 {} 份",
        outcomes.succeeded(),
        outcomes.failed()
    );
    Ok(outcomes)
}

/// 按匹配度降序排名，同分保持提交顺序，名次从 1 开始
pub fn rank_resumes(outcomes: &BatchOutcomes<String, ResumeAssessment>) -> Vec<RankedResume> {
    let mut rows: Vec<RankedResume> = outcomes
        .iter()
        .map(|outcome| match outcome {
            Outcome::Success { id, payload } => RankedResume {
                rank: 0,
                resume_name: id.clone(),
                matched_percentage: payload.matched_percentage,
                reason: payload.reason.clone(),
                skills_to_improve: payload.skills_to_improve.clone(),
                irrelevant: payload.irrelevant.clone(),
                matched_keywords: payload.keywords.clone(),
                failed: false,
            },
            Outcome::Failure { id, reason } => RankedResume {
                rank: 0,
                resume_name: id.clone(),
                matched_percentage: 0.0,
                reason: format!("Processing error: {reason}"),
                skills_to_improve: NOT_AVAILABLE.to_string(),
                irrelevant: NOT_AVAILABLE.to_string(),
                matched_keywords: NOT_AVAILABLE.to_string(),
                failed: true,
            },
        })
        .collect();

    rows.sort_by(|a, b| b.matched_percentage.total_cmp(&a.matched_percentage));
    for (pos, row) in rows.iter_mut().enumerate() {
        row.rank = pos + 1;
    }
    rows
}

/// 纯文本排名表
pub fn render_resume_table(rows: &[RankedResume]) -> String {
    let name_width = rows
        .iter()
        .map(|row| row.resume_name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Resume Name".len());

    let mut table = String::new();
    let _ = writeln!(
        table,
        "{:<4}  {:<name_width$}  {:>8}  Reason",
        "#", "Resume Name", "Match"
    );
    let _ = writeln!(table, "{}", "-".repeat(4 + 2 + name_width + 2 + 8 + 2 + 6));
    for row in rows {
        let _ = writeln!(
            table,
            "{:<4}  {:<name_width$}  {:>8}  {}",
            row.rank,
            row.resume_name,
            format_percentage(row.matched_percentage),
            truncate_text(&row.reason, 80)
        );
    }
    table
}

/// JSON 数组格式的排名结果
pub fn render_resume_json(rows: &[RankedResume]) -> AppResult<String> {
    serde_json::to_string_pretty(rows).map_err(|e| AppError::Other(format!("序列化排名结果失败: {e}")))
}
