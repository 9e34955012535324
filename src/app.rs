//! 应用入口
//!
//! 持有客户端、协调器和指标上下文，按子命令装配一次完整的运行。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::{Commands, PagesArgs, ResumesArgs};
use crate::clients::{ChatModel, ContentGuard, GuardrailClient, LlmClient};
use crate::config::Config;
use crate::infrastructure::AnalysisMetrics;
use crate::models::{
    attach_similarities, load_distances, load_page_images, load_resumes, load_text_file,
    skip_preceding_pages,
};
use crate::orchestrator::FanoutCoordinator;
use crate::services::{PageAnalyzer, ReportWriter, ResumeAnalyzer};
use crate::utils::logging;
use crate::workflow::{
    analyze_pages, match_resumes, rank_resumes, render_page_report, render_resume_json,
    render_resume_table,
};

/// 应用主结构
pub struct App {
    config: Config,
    coordinator: FanoutCoordinator,
    model: Arc<dyn ChatModel>,
    guard: Option<Arc<dyn ContentGuard>>,
    metrics: AnalysisMetrics,
}

/// 一次运行的汇总
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub output_path: PathBuf,
}

impl App {
    /// 用真实客户端初始化
    pub fn initialize(config: Config) -> Self {
        let model: Arc<dyn ChatModel> = Arc::new(LlmClient::new(&config));
        let guard = GuardrailClient::from_config(&config)
            .map(|client| Arc::new(client) as Arc<dyn ContentGuard>);
        if guard.is_some() {
            info!("🛡️ 已启用 guardrail 检查");
        }
        Self::with_clients(config, model, guard)
    }

    /// 使用给定的客户端（测试时传入内存实现）
    pub fn with_clients(
        config: Config,
        model: Arc<dyn ChatModel>,
        guard: Option<Arc<dyn ContentGuard>>,
    ) -> Self {
        Self {
            coordinator: FanoutCoordinator::from_config(&config),
            config,
            model,
            guard,
            metrics: AnalysisMetrics::new(),
        }
    }

    pub fn metrics(&self) -> &AnalysisMetrics {
        &self.metrics
    }

    /// 执行子命令
    pub async fn run(&self, command: Commands) -> Result<RunSummary> {
        let summary = match command {
            Commands::Pages(args) => {
                logging::log_startup(&self.config, "页面测试用例生成");
                self.run_pages(args).await?
            }
            Commands::Resumes(args) => {
                logging::log_startup(&self.config, "简历匹配");
                self.run_resumes(args).await?
            }
        };

        self.write_metrics().await?;
        logging::print_final_stats(
            summary.succeeded,
            summary.failed,
            summary.succeeded + summary.failed,
            &summary.output_path.display().to_string(),
        );
        Ok(summary)
    }

    async fn run_pages(&self, args: PagesArgs) -> Result<RunSummary> {
        let pages = load_page_images(&args.dir)
            .await
            .with_context(|| format!("加载页面图片失败: {}", args.dir.display()))?;
        let pages = skip_preceding_pages(pages, args.start_page)?;
        logging::log_items_loaded("页面", pages.len());

        let output_path = self.output_path(args.output);
        if pages.is_empty() {
            warn!("⚠️ 没有找到待处理的页面");
        }

        let mut analyzer = PageAnalyzer::new(self.model.clone(), self.guard.clone());
        if let Some(prompt_file) = &self.config.page_prompt_file {
            let template = load_text_file(prompt_file)
                .await
                .context("加载页面提示词失败")?;
            analyzer = analyzer.with_prompt_template(template);
        }

        let outcomes = analyze_pages(&self.coordinator, Arc::new(analyzer), pages, &self.metrics).await?;

        ReportWriter::new(&output_path)
            .write(&render_page_report(&outcomes))
            .await?;

        Ok(RunSummary {
            succeeded: outcomes.succeeded(),
            failed: outcomes.failed(),
            output_path,
        })
    }

    async fn run_resumes(&self, args: ResumesArgs) -> Result<RunSummary> {
        let job_description = load_text_file(&args.job)
            .await
            .context("加载职位描述失败")?;
        let mut resumes = load_resumes(&args.dir)
            .await
            .with_context(|| format!("加载简历失败: {}", args.dir.display()))?;
        if let Some(path) = &args.distances {
            let distances = load_distances(path).await.context("加载距离表失败")?;
            resumes = attach_similarities(resumes, &distances);
        }
        logging::log_items_loaded("简历", resumes.len());

        let output_path = self.output_path(args.output);
        if resumes.is_empty() {
            warn!("⚠️ 没有找到待处理的简历");
        }

        let analyzer = Arc::new(ResumeAnalyzer::new(self.model.clone()));
        let outcomes = match_resumes(
            &self.coordinator,
            analyzer,
            job_description,
            resumes,
            &self.metrics,
        )
        .await?;

        let rows = rank_resumes(&outcomes);
        let table = render_resume_table(&rows);
        info!("\n{}", table);

        let content = if args.json {
            render_resume_json(&rows)?
        } else {
            table
        };
        ReportWriter::new(&output_path).write(&content).await?;

        Ok(RunSummary {
            succeeded: outcomes.succeeded(),
            failed: outcomes.failed(),
            output_path,
        })
    }

    fn output_path(&self, requested: Option<PathBuf>) -> PathBuf {
        requested.unwrap_or_else(|| PathBuf::from(&self.config.output_file))
    }

    async fn write_metrics(&self) -> Result<()> {
        let Some(path) = &self.config.metrics_file else {
            return Ok(());
        };
        ReportWriter::new(Path::new(path))
            .write(&self.metrics.render_prometheus())
            .await
            .context("写入指标文件失败")?;
        Ok(())
    }
}
