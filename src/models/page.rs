//! 文档页面

use crate::error::ConfigError;

/// 一页已经渲染好的文档图片
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// 页码（从 1 开始）
    pub page_number: u32,
    /// 来源文件名（仅用于日志）
    pub source: String,
    /// PNG 数据
    pub png: Vec<u8>,
}

impl PageImage {
    pub fn new(page_number: u32, source: impl Into<String>, png: Vec<u8>) -> Self {
        Self {
            page_number,
            source: source.into(),
            png,
        }
    }
}

/// 丢弃 `start_page` 之前的页面，剩余页面从 1 重新编号
///
/// `start_page` 为 0 或 1 时保留全部页面；超出总页数时返回错误。
pub fn skip_preceding_pages(
    pages: Vec<PageImage>,
    start_page: u32,
) -> Result<Vec<PageImage>, ConfigError> {
    if start_page > 1 && start_page as usize > pages.len() {
        return Err(ConfigError::InvalidValue {
            key: "start_page".to_string(),
            reason: format!("Invalid start page number: {} (共 {} 页)", start_page, pages.len()),
        });
    }

    let skip = start_page.saturating_sub(1) as usize;
    Ok(pages
        .into_iter()
        .skip(skip)
        .zip(1u32..)
        .map(|(page, number)| PageImage {
            page_number: number,
            ..page
        })
        .collect())
}
