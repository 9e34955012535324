/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化 tracing 订阅器
///
/// `RUST_LOG` 优先；否则按 verbose 级别选择 info / debug / trace。
/// 重复调用不会 panic。
pub fn init(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config, mode: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {}", mode);
    match config.max_in_flight() {
        Some(limit) => info!("📊 最大并发数: {}", limit),
        None => info!("📊 最大并发数: 不限制"),
    }
    info!(
        "🔁 最大重试次数: {} (间隔 {}ms{})",
        config.max_retries,
        config.retry_delay_ms,
        if config.exponential_backoff {
            ", 指数退避"
        } else {
            ""
        }
    );
    info!("🤖 模型: {}", config.llm_model_name);
    info!("{}", "=".repeat(60));
}

/// 记录条目加载信息
pub fn log_items_loaded(kind: &str, total: usize) {
    info!("✓ 找到 {} 个待处理的{}", total, kind);
}

/// 记录批次开始信息
pub fn log_batch_start(total: usize, max_in_flight: Option<usize>) {
    info!("\n{}", "=".repeat(60));
    match max_in_flight {
        Some(limit) => info!("📦 开始处理批次: 共 {} 个条目，最多 {} 个并发", total, limit),
        None => info!("📦 开始处理批次: 共 {} 个条目，全部并发", total),
    }
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_batch_complete(success: usize, total: usize, elapsed: Duration) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 批次完成: 成功 {}/{}，耗时 {:.2}s",
        success,
        total,
        elapsed.as_secs_f64()
    );
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(success: usize, failed: usize, total: usize, output_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", output_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("abcdefghij", 4), "abcd...");
        // 按字符而不是字节截断
        assert_eq!(truncate_text("需求文档分析", 2), "需求...");
    }
}
