//! 简历分析服务 - 业务能力层
//!
//! 只处理单份简历：构建提示词 → 调用模型 → 解析 JSON 评估结果

use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{debug, warn};

use crate::clients::{ChatModel, ChatRequest};
use crate::error::CallError;
use crate::models::{ResumeAssessment, ResumeCandidate};
use crate::services::prompts::{build_resume_prompt, RESUME_MAX_TOKENS, RESUME_SYSTEM_PROMPT};
use crate::utils::logging::truncate_text;

/// 简历分析服务
pub struct ResumeAnalyzer {
    model: Arc<dyn ChatModel>,
}

impl ResumeAnalyzer {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// 评估单份简历
    ///
    /// # 参数
    /// - `job_description`: 职位描述
    /// - `resume`: 待评估的简历
    pub async fn analyze(
        &self,
        job_description: &str,
        resume: &ResumeCandidate,
    ) -> Result<ResumeAssessment, CallError> {
        if resume.text.trim().is_empty() {
            return Err(CallError::InvalidInput(format!("简历内容为空: {}", resume.name)));
        }

        let prompt = build_resume_prompt(job_description, &resume.text, resume.similarity);
        let request = ChatRequest::text(prompt, RESUME_MAX_TOKENS).with_system(RESUME_SYSTEM_PROMPT);

        let response = self.model.complete(&request).await?;
        debug!("[{}] 模型响应: {}", resume.name, truncate_text(&response, 120));

        parse_assessment(&response).inspect_err(|e| {
            warn!("[{}] ⚠️ 无法解析模型响应: {}", resume.name, e);
        })
    }
}

fn json_object_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("static regex"))
}

/// 从模型回复中提取 JSON 对象并解析
///
/// 模型偶尔会在 JSON 外面包一层 ```json 代码块或者说明文字，这里取第一个 `{` 到最后一个 `}`。
pub fn parse_assessment(response: &str) -> Result<ResumeAssessment, CallError> {
    let json = json_object_pattern()
        .find(response)
        .map(|m| m.as_str())
        .ok_or_else(|| {
            CallError::MalformedResponse(format!(
                "响应中没有 JSON 对象: {}",
                truncate_text(response, 80)
            ))
        })?;

    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::fakes::FnModel;

    #[test]
    fn test_parse_plain_json() {
        let assessment = parse_assessment(
            r#"{"Matched Percentage": "91.00%", "Reason": "Great fit", "Skills To Improve": "N/A", "Irrelevant": "N/A", "Keywords": ["Rust"]}"#,
        )
        .unwrap();
        assert_eq!(assessment.matched_percentage, 91.0);
        assert_eq!(assessment.keywords, "Rust");
    }

    #[test]
    fn test_parse_fenced_json() {
        let response = "Here is the analysis:\n```json\n{\"Matched Percentage\": \"40%\", \"Reason\": \"Junior\"}\n```";
        let assessment = parse_assessment(response).unwrap();
        assert_eq!(assessment.matched_percentage, 40.0);
        assert_eq!(assessment.reason, "Junior");
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        let err = parse_assessment("I cannot help with that.").unwrap_err();
        assert!(matches!(err, CallError::MalformedResponse(_)));

        let err = parse_assessment("{not json}").unwrap_err();
        assert!(matches!(err, CallError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_nan_percentage_is_malformed() {
        let err = parse_assessment(r#"{"Matched Percentage": "NaN%", "Reason": "?"}"#).unwrap_err();
        assert!(matches!(err, CallError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_analyze_uses_similarity_and_system_prompt() {
        let model = Arc::new(FnModel::new(|_req: &ChatRequest| {
            Ok(r#"{"Matched Percentage": "55.00%"}"#.to_string())
        }));
        let analyzer = ResumeAnalyzer::new(model.clone());
        let resume = ResumeCandidate::new("alice.txt", "Rust, tokio, Postgres").with_similarity(55.0);

        let assessment = analyzer.analyze("Backend engineer", &resume).await.unwrap();
        assert_eq!(assessment.matched_percentage, 55.0);

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests[0].system.as_deref(), Some(RESUME_SYSTEM_PROMPT));
        assert_eq!(requests[0].max_tokens, RESUME_MAX_TOKENS);
        assert!(requests[0].user.contains("Return matched percentage: 55.00%."));
    }
}
