//! 页面分析服务 - 业务能力层
//!
//! 只处理单个页面：guardrail 检查 → 视觉模型生成测试用例。
//! 不出现批次、不关心重试。

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use tracing::{debug, info, warn};

use crate::clients::{ChatModel, ChatRequest, ContentGuard, GuardVerdict};
use crate::error::CallError;
use crate::models::PageImage;
use crate::services::prompts::{render_page_prompt, PAGE_ANALYSIS_PROMPT, PAGE_MAX_TOKENS};

/// 被 guardrail 拦截时的失败原因
pub const BLOCKED_BY_GUARDRAILS: &str = "Content blocked by guardrails";

/// 页面分析服务
pub struct PageAnalyzer {
    model: Arc<dyn ChatModel>,
    guard: Option<Arc<dyn ContentGuard>>,
    prompt_template: String,
}

impl PageAnalyzer {
    /// 使用默认提示词
    pub fn new(model: Arc<dyn ChatModel>, guard: Option<Arc<dyn ContentGuard>>) -> Self {
        Self {
            model,
            guard,
            prompt_template: PAGE_ANALYSIS_PROMPT.to_string(),
        }
    }

    /// 替换提示词模板（支持 `{page_num}` 占位符）
    pub fn with_prompt_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = template.into();
        self
    }

    /// 分析单个页面
    ///
    /// # 返回
    /// 模型生成的文本；被拦截、输入为空、模型出错时返回对应的 `CallError`
    pub async fn analyze(&self, page: &PageImage) -> Result<String, CallError> {
        if page.png.is_empty() {
            return Err(CallError::InvalidInput(format!(
                "第 {} 页图片为空 ({})",
                page.page_number, page.source
            )));
        }

        let prompt = render_page_prompt(&self.prompt_template, page.page_number);

        if let Some(guard) = &self.guard {
            match guard.check(&prompt).await? {
                GuardVerdict::Pass => debug!("[page {}] guardrail 通过", page.page_number),
                GuardVerdict::Blocked { findings } => {
                    warn!(
                        "[page {}] 🚫 被 guardrail 拦截: {}",
                        page.page_number,
                        findings.join(", ")
                    );
                    return Err(CallError::Blocked(BLOCKED_BY_GUARDRAILS.to_string()));
                }
            }
        }

        let data_url = format!("data:image/png;base64,{}", BASE64_STANDARD.encode(&page.png));
        let request = ChatRequest::text(prompt, PAGE_MAX_TOKENS).with_image(data_url);

        let content = self.model.complete(&request).await?;
        info!("[page {}] ✓ 分析完成 ({} 字符)", page.page_number, content.chars().count());
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::fakes::{FnModel, KeywordGuard};

    fn page(number: u32) -> PageImage {
        PageImage::new(number, format!("page-{number}.png"), vec![0x89, 0x50, 0x4e, 0x47])
    }

    #[tokio::test]
    async fn test_analyze_sends_image_and_prompt() {
        let model = Arc::new(FnModel::new(|_req: &ChatRequest| Ok("TC-3-1 ...".to_string())));
        let analyzer = PageAnalyzer::new(model.clone(), None);

        let content = analyzer.analyze(&page(3)).await.unwrap();
        assert_eq!(content, "TC-3-1 ...");

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_tokens, PAGE_MAX_TOKENS);
        assert!(requests[0].user.contains("page 3 of"));
        assert_eq!(requests[0].images, vec!["data:image/png;base64,iVBORw==".to_string()]);
    }

    #[tokio::test]
    async fn test_blocked_page_skips_model() {
        let model = Arc::new(FnModel::new(|_req: &ChatRequest| Ok("unused".to_string())));
        let guard: Arc<dyn ContentGuard> = Arc::new(KeywordGuard("secret"));
        let analyzer =
            PageAnalyzer::new(model.clone(), Some(guard)).with_prompt_template("secret page {page_num}");

        let err = analyzer.analyze(&page(1)).await.unwrap_err();
        assert_eq!(err, CallError::Blocked(BLOCKED_BY_GUARDRAILS.to_string()));
        assert!(model.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_image_is_invalid() {
        let model = Arc::new(FnModel::new(|_req: &ChatRequest| Ok("unused".to_string())));
        let analyzer = PageAnalyzer::new(model, None);

        let err = analyzer
            .analyze(&PageImage::new(2, "blank.png", Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, CallError::InvalidInput(_)));
    }
}
