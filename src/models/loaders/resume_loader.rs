use std::collections::HashMap;
use std::path::Path;

use tokio::fs;

use crate::error::{AppError, AppResult, FileError};
use crate::models::resume::{similarity_from_distance, ResumeCandidate};

/// 读取整个文本文件
pub async fn load_text_file(path: &Path) -> AppResult<String> {
    let path_str = path.display().to_string();
    if !path.exists() {
        return Err(FileError::NotFound { path: path_str }.into());
    }
    fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path_str, e))
}

/// 从文件夹中加载所有简历（`.txt` / `.md`），按文件名排序
///
/// 内容为空或无法读取（包括非 UTF-8 编码）的文件会被跳过，不影响其他简历。
pub async fn load_resumes(folder_path: &Path) -> AppResult<Vec<ResumeCandidate>> {
    let path_str = folder_path.display().to_string();
    if !folder_path.is_dir() {
        return Err(FileError::DirectoryNotFound { path: path_str }.into());
    }

    let mut entries = fs::read_dir(folder_path)
        .await
        .map_err(|e| AppError::file_read_failed(&path_str, e))?;

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file_read_failed(&path_str, e))?
    {
        let path = entry.path();
        let is_text = matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("txt") | Some("md")
        );
        if is_text {
            paths.push(path);
        }
    }
    paths.sort();

    let mut resumes = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let text = match load_text_file(&path).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("⚠️ 无法读取简历，跳过: {} ({})", name, e);
                continue;
            }
        };
        if text.trim().is_empty() {
            tracing::warn!("⚠️ 简历内容为空，跳过: {}", name);
            continue;
        }
        resumes.push(ResumeCandidate::new(name, text));
    }

    Ok(resumes)
}

/// 读取向量检索得到的距离表：`{"简历文件名": L2 距离}`
pub async fn load_distances(path: &Path) -> AppResult<HashMap<String, f64>> {
    let content = load_text_file(path).await?;
    serde_json::from_str(&content).map_err(|source| {
        FileError::JsonParseFailed {
            path: path.display().to_string(),
            source,
        }
        .into()
    })
}

/// 把距离换算成相似度并附加到简历上，距离表中没有的简历保持不变
pub fn attach_similarities(
    resumes: Vec<ResumeCandidate>,
    distances: &HashMap<String, f64>,
) -> Vec<ResumeCandidate> {
    resumes
        .into_iter()
        .map(|resume| match distances.get(&resume.name) {
            Some(&distance) => {
                let similarity = similarity_from_distance(distance);
                tracing::debug!("[{}] 距离 {} → 相似度 {:.2}%", resume.name, distance, similarity);
                resume.with_similarity(similarity)
            }
            None => {
                tracing::warn!("⚠️ 距离表中没有该简历，由模型估计匹配度: {}", resume.name);
                resume
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_resumes_skips_empty_and_other_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bob.md"), "# Bob\nGo developer").unwrap();
        std::fs::write(dir.path().join("alice.txt"), "Alice - Rust engineer").unwrap();
        std::fs::write(dir.path().join("empty.txt"), "   \n").unwrap();
        std::fs::write(dir.path().join("photo.png"), [0u8, 1, 2]).unwrap();

        let resumes = load_resumes(dir.path()).await.unwrap();
        let names: Vec<&str> = resumes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["alice.txt", "bob.md"]);
        assert!(resumes[0].similarity.is_none());
    }

    #[tokio::test]
    async fn test_load_resumes_skips_non_utf8_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.txt"), "Rust, tokio").unwrap();
        std::fs::write(dir.path().join("latin1.txt"), [0x43, 0x56, 0xe9, 0x20, 0x52, 0xe9]).unwrap();

        let resumes = load_resumes(dir.path()).await.unwrap();
        let names: Vec<&str> = resumes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["good.txt"]);
    }

    #[tokio::test]
    async fn test_load_resumes_missing_dir() {
        let err = load_resumes(Path::new("/no/such/resumes")).await.unwrap_err();
        assert!(matches!(err, AppError::File(FileError::DirectoryNotFound { .. })));
    }

    #[tokio::test]
    async fn test_distances_become_similarities() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("distances.json");
        std::fs::write(&path, r#"{"alice.txt": 0.25, "ghost.txt": 0.0}"#).unwrap();

        let distances = load_distances(&path).await.unwrap();
        let resumes = attach_similarities(
            vec![
                ResumeCandidate::new("alice.txt", "Rust"),
                ResumeCandidate::new("bob.md", "Go"),
            ],
            &distances,
        );

        assert_eq!(resumes[0].similarity, Some(50.0));
        assert_eq!(resumes[1].similarity, None);
    }

    #[tokio::test]
    async fn test_distances_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("distances.json");
        std::fs::write(&path, "[1, 2").unwrap();

        let err = load_distances(&path).await.unwrap_err();
        assert!(matches!(err, AppError::File(FileError::JsonParseFailed { .. })));
    }

    #[tokio::test]
    async fn test_load_text_file_missing() {
        let err = load_text_file(Path::new("/no/such/job.txt")).await.unwrap_err();
        assert!(matches!(err, AppError::File(FileError::NotFound { .. })));
    }
}
