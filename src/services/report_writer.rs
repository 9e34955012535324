//! 报告写入服务 - 业务能力层
//!
//! 只负责"把渲染好的文本落盘"，不关心报告怎么生成

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};

/// 报告写入服务
///
/// 职责：
/// - 覆盖写入报告文件，必要时创建父目录
/// - 不解析、不修改报告内容
pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 写入报告
    pub async fn write(&self, content: &str) -> AppResult<()> {
        let path_str = self.path.display().to_string();
        debug!("写入报告: {} ({} 字节)", path_str, content.len());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::file_write_failed(parent.display().to_string(), e))?;
        }

        fs::write(&self.path, content)
            .await
            .map_err(|e| AppError::file_write_failed(path_str.clone(), e))?;

        info!("💾 结果已写入: {}", path_str);
        Ok(())
    }
}
