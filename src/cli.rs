//! 命令行参数

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

/// 批量调用 LLM 分析文档页面或简历
#[derive(Debug, Parser)]
#[command(name = "fanout-analyze", version, about = "Fan out document pages or resumes to an LLM")]
pub struct Cli {
    /// TOML 配置文件（环境变量会覆盖其中的值）
    #[arg(global = true, short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// 提高日志级别（-v, -vv）
    #[arg(global = true, short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// 为每一页需求文档生成测试用例
    Pages(PagesArgs),
    /// 按职位描述给简历打分排名
    Resumes(ResumesArgs),
}

#[derive(Debug, Args)]
pub struct PagesArgs {
    /// 存放页面 PNG 的目录
    #[arg(long, value_name = "DIR")]
    pub dir: PathBuf,
    /// 从第几页开始（之前的页面忽略）
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub start_page: u32,
    /// 报告输出路径，缺省使用配置中的 output_file
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ResumesArgs {
    /// 职位描述文件
    #[arg(long, value_name = "FILE")]
    pub job: PathBuf,
    /// 存放简历（.txt / .md）的目录
    #[arg(long, value_name = "DIR")]
    pub dir: PathBuf,
    /// 报告输出路径，缺省使用配置中的 output_file
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
    /// 输出 JSON 而不是文本表格
    #[arg(long)]
    pub json: bool,
    /// 向量检索距离表（JSON：简历文件名 → L2 距离），提供时由距离换算匹配度
    #[arg(long, value_name = "FILE")]
    pub distances: Option<PathBuf>,
}
