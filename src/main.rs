use anyhow::{Context, Result};
use clap::Parser;
use fanout_analyze::cli::Cli;
use fanout_analyze::utils::logging;
use fanout_analyze::{App, Config};
use tracing::{error, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load(cli.config.as_deref())?;

    // 初始化日志
    let verbose = if config.verbose_logging { cli.verbose.max(1) } else { cli.verbose };
    logging::init(verbose);

    config.validate().context("配置校验失败")?;

    // 初始化并运行应用
    let summary = App::initialize(config).run(cli.command).await.inspect_err(|e| {
        error!("❌ 运行失败: {:#}", e);
    })?;

    if summary.failed > 0 {
        warn!("⚠️ 有 {} 个条目处理失败，详见报告", summary.failed);
    }
    Ok(())
}
