//! 页面批次流程
//!
//! 把一份文档的所有页面交给协调器，每页一次视觉模型调用，最后按页码拼出测试用例报告。

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::info;

use crate::error::AppResult;
use crate::infrastructure::AnalysisMetrics;
use crate::models::{Batch, BatchOutcomes, Outcome, PageImage, WorkItem};
use crate::orchestrator::FanoutCoordinator;
use crate::services::{PageAnalyzer, BLOCKED_BY_GUARDRAILS};

/// 失败页面在报告中的占位文本
pub const PAGE_FAILED_TEXT: &str = "Failed to analyze this page.";

/// 分析所有页面
///
/// 每次调用计一个批次，并记录整批耗时。
pub async fn analyze_pages(
    coordinator: &FanoutCoordinator,
    analyzer: Arc<PageAnalyzer>,
    pages: Vec<PageImage>,
    metrics: &AnalysisMetrics,
) -> AppResult<BatchOutcomes<u32, String>> {
    let batch = Batch::new(
        pages
            .into_iter()
            .map(|page| WorkItem::new(page.page_number, page)),
    )?;

    metrics.batches_processed.inc();
    let _timer = metrics.request_time.start_timer();

    let outcomes = coordinator
        .run(
            batch,
            move |item: Arc<WorkItem<u32, PageImage>>| {
                let analyzer = analyzer.clone();
                async move { analyzer.analyze(item.input()).await }
            },
            metrics,
        )
        .await;

    info!(
        "📄 页面分析结束: 成功 {} 页，失败 {} 页",
        outcomes.succeeded(),
        outcomes.failed()
    );
    Ok(outcomes)
}

/// 渲染页面报告
///
/// 被 guardrail 拦截的页面原样写出拦截原因，其他失败统一写占位文本。
pub fn render_page_report(outcomes: &BatchOutcomes<u32, String>) -> String {
    let mut report = format!(
        "Test cases generated at {}\n\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    for outcome in outcomes.iter() {
        let body = match outcome {
            Outcome::Success { payload, .. } => payload.as_str(),
            Outcome::Failure { reason, .. } if reason == BLOCKED_BY_GUARDRAILS => reason.as_str(),
            Outcome::Failure { .. } => PAGE_FAILED_TEXT,
        };
        let _ = write!(report, "Page {}:\n{}\n\n", outcome.id(), body);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::fakes::{FnModel, KeywordGuard};
    use crate::clients::{ChatRequest, ContentGuard};
    use crate::error::CallError;
    use crate::orchestrator::{FanoutSettings, RetryPolicy};

    fn coordinator() -> FanoutCoordinator {
        FanoutCoordinator::new(FanoutSettings {
            retry: RetryPolicy::none(),
            ..Default::default()
        })
    }

    fn pages(count: u32) -> Vec<PageImage> {
        (1..=count)
            .map(|n| PageImage::new(n, format!("page-{n}.png"), vec![1, 2, 3]))
            .collect()
    }

    #[tokio::test]
    async fn test_pages_report_in_order_with_failure_placeholder() {
        let model = Arc::new(FnModel::new(|req: &ChatRequest| {
            if req.user.contains("page 2 of") {
                Err(CallError::Api {
                    status: Some(400),
                    message: "bad image".to_string(),
                })
            } else {
                Ok("TC ok".to_string())
            }
        }));
        let analyzer = Arc::new(PageAnalyzer::new(model, None));
        let metrics = AnalysisMetrics::new();

        let outcomes = analyze_pages(&coordinator(), analyzer, pages(3), &metrics)
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes.failed(), 1);

        let report = render_page_report(&outcomes);
        assert!(report.starts_with("Test cases generated at "));
        let body = report.split_once("\n\n").unwrap().1;
        assert_eq!(
            body,
            "Page 1:\nTC ok\n\nPage 2:\nFailed to analyze this page.\n\nPage 3:\nTC ok\n\n"
        );
    }

    #[tokio::test]
    async fn test_blocked_page_shows_guardrail_reason() {
        let model = Arc::new(FnModel::new(|req: &ChatRequest| {
            if req.user.contains("page 3 of") {
                Err(CallError::Network("connection reset".to_string()))
            } else {
                Ok("TC ok".to_string())
            }
        }));
        let guard: Arc<dyn ContentGuard> = Arc::new(KeywordGuard("page 2 of"));
        let analyzer = Arc::new(PageAnalyzer::new(model, Some(guard)));
        let metrics = AnalysisMetrics::new();

        let outcomes = analyze_pages(&coordinator(), analyzer, pages(3), &metrics)
            .await
            .unwrap();
        let body = render_page_report(&outcomes).split_once("\n\n").unwrap().1.to_string();
        assert_eq!(
            body,
            "Page 1:\nTC ok\n\nPage 2:\nContent blocked by guardrails\n\nPage 3:\nFailed to analyze this page.\n\n"
        );
    }

    #[tokio::test]
    async fn test_metrics_count_one_batch() {
        let model = Arc::new(FnModel::new(|_req: &ChatRequest| Ok("ok".to_string())));
        let analyzer = Arc::new(PageAnalyzer::new(model, None));
        let metrics = AnalysisMetrics::new();

        analyze_pages(&coordinator(), analyzer, pages(4), &metrics)
            .await
            .unwrap();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.batches_processed, 1);
        assert_eq!(snapshot.items_analyzed, 4);
        assert_eq!(snapshot.analysis_errors, 0);
        assert_eq!(snapshot.analysis_duration_count, 4);
        assert_eq!(snapshot.request_time_count, 1);
    }

    #[tokio::test]
    async fn test_no_pages_is_empty_report() {
        let model = Arc::new(FnModel::new(|_req: &ChatRequest| Ok("ok".to_string())));
        let analyzer = Arc::new(PageAnalyzer::new(model, None));
        let metrics = AnalysisMetrics::new();

        let outcomes = analyze_pages(&coordinator(), analyzer, Vec::new(), &metrics)
            .await
            .unwrap();
        assert!(outcomes.is_empty());
        assert!(!render_page_report(&outcomes).contains("Page "));
    }
}
