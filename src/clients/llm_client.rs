/// LLM API 客户端
///
/// 使用 `async-openai` 调用兼容 OpenAI API 的服务，只负责一次请求、一次响应
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrl,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::clients::ChatModel;
use crate::config::Config;
use crate::error::CallError;

/// 一次聊天请求
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system: Option<String>,
    pub user: String,
    /// 图片 URL（可以是 data URL）
    pub images: Vec<String>,
    pub max_tokens: u32,
}

impl ChatRequest {
    pub fn text(user: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: None,
            user: user.into(),
            images: Vec::new(),
            max_tokens,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.images.push(url.into());
        self
    }
}

/// LLM 客户端
///
/// 内部的 `Client` 可以在多个任务之间共享
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn build_messages(
        &self,
        request: &ChatRequest,
    ) -> Result<Vec<ChatCompletionRequestMessage>, OpenAIError> {
        let mut messages = Vec::new();

        if let Some(sys_msg) = &request.system {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg.as_str())
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = if request.images.is_empty() {
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.user.as_str())
                .build()?
        } else {
            // Vision API：图片在前，文字在后
            let mut content_parts: Vec<ChatCompletionRequestUserMessageContentPart> =
                Vec::with_capacity(request.images.len() + 1);

            for url in &request.images {
                content_parts.push(ChatCompletionRequestUserMessageContentPart::ImageUrl(
                    ChatCompletionRequestMessageContentPartImage {
                        image_url: ImageUrl {
                            url: url.clone(),
                            detail: Some(ImageDetail::Auto),
                        },
                    },
                ));
            }
            content_parts.push(ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText {
                    text: request.user.clone(),
                },
            ));

            ChatCompletionRequestUserMessageArgs::default()
                .content(ChatCompletionRequestUserMessageContent::Array(content_parts))
                .build()?
        };
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        Ok(messages)
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, CallError> {
        debug!(
            "调用 LLM API，模型: {}，用户消息长度: {} 字符，图片 {} 张",
            self.model_name,
            request.user.len(),
            request.images.len()
        );

        let messages = self.build_messages(request)?;
        let completion = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .max_tokens(request.max_tokens)
            .build()?;

        let response = self.client.chat().create(completion).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            CallError::from(e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|content| content.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(CallError::MalformedResponse(format!(
                "LLM 返回内容为空 (模型: {})",
                self.model_name
            )));
        }

        Ok(content)
    }
}

impl From<OpenAIError> for CallError {
    fn from(err: OpenAIError) -> Self {
        match err {
            OpenAIError::ApiError(api) => classify_api_message(&api.to_string()),
            OpenAIError::Reqwest(e) => match e.status() {
                Some(status) => CallError::from_status(status.as_u16(), e.to_string()),
                None => CallError::Network(e.to_string()),
            },
            OpenAIError::InvalidArgument(msg) => CallError::InvalidInput(msg),
            err @ OpenAIError::JSONDeserialize(..) => CallError::MalformedResponse(err.to_string()),
            other => CallError::Other(other.to_string()),
        }
    }
}

/// 根据服务端错误信息判断是否属于限流/过载
fn classify_api_message(message: &str) -> CallError {
    let lower = message.to_lowercase();
    let throttled = ["rate limit", "rate_limit", "too many requests", "throttl"]
        .iter()
        .any(|needle| lower.contains(needle));
    if throttled {
        return CallError::RateLimited {
            message: message.to_string(),
        };
    }

    let overloaded = ["overloaded", "server_error", "internal error", "service unavailable"]
        .iter()
        .any(|needle| lower.contains(needle));
    if overloaded {
        return CallError::Server {
            status: 503,
            message: message.to_string(),
        };
    }

    CallError::Api {
        status: None,
        message: message.to_string(),
    }
}
