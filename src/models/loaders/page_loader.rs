use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tokio::fs;

use crate::error::{AppError, AppResult, FileError};
use crate::models::page::PageImage;

fn page_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+").expect("static regex"))
}

/// 文件名中的第一个数字，用于排序
fn page_sort_key(path: &Path) -> (Option<u64>, String) {
    let stem = path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let number = page_number_pattern()
        .find(&stem)
        .and_then(|m| m.as_str().parse().ok());
    (number, stem)
}

/// 从文件夹中加载所有 PNG 页面
///
/// 按文件名中的第一个数字排序（没有数字的排在后面，按名称排序），
/// 页码按排序后的顺序从 1 开始编号。
pub async fn load_page_images(folder_path: &Path) -> AppResult<Vec<PageImage>> {
    let path_str = folder_path.display().to_string();
    if !folder_path.is_dir() {
        return Err(FileError::DirectoryNotFound { path: path_str }.into());
    }

    let mut entries = fs::read_dir(folder_path)
        .await
        .map_err(|e| AppError::file_read_failed(&path_str, e))?;

    let mut files: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file_read_failed(&path_str, e))?
    {
        let path = entry.path();
        let is_png = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if is_png {
            files.push(path);
        }
    }

    files.sort_by_key(|path| {
        let (number, stem) = page_sort_key(path);
        (number.is_none(), number, stem)
    });

    let mut pages = Vec::with_capacity(files.len());
    for (path, page_number) in files.into_iter().zip(1u32..) {
        let png = fs::read(&path)
            .await
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        let source = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        tracing::debug!("已加载第 {} 页: {} ({} 字节)", page_number, source, png.len());
        pages.push(PageImage::new(page_number, source, png));
    }

    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pages_sorted_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["page-10.png", "page-2.png", "page-1.png", "cover.png", "notes.txt"] {
            std::fs::write(dir.path().join(name), name.as_bytes()).unwrap();
        }

        let pages = load_page_images(dir.path()).await.unwrap();
        let sources: Vec<&str> = pages.iter().map(|p| p.source.as_str()).collect();
        assert_eq!(sources, vec!["page-1.png", "page-2.png", "page-10.png", "cover.png"]);
        assert_eq!(pages[2].page_number, 3);
        assert_eq!(pages[0].png, b"page-1.png".to_vec());
    }

    #[tokio::test]
    async fn test_missing_folder() {
        let err = load_page_images(Path::new("/no/such/pages")).await.unwrap_err();
        assert!(matches!(err, AppError::File(FileError::DirectoryNotFound { .. })));
    }
}
