//! 远程服务客户端
//!
//! 每个客户端只负责"发一次请求、拿一次响应"，不关心批次和重试。
//! 上层通过 trait 使用它们，测试时可以替换成内存实现。

use async_trait::async_trait;

use crate::error::CallError;

pub mod guardrail_client;
pub mod llm_client;

pub use guardrail_client::{GuardVerdict, GuardrailClient};
pub use llm_client::{ChatRequest, LlmClient};

/// 聊天模型
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// 返回第一条回复的文本（已 trim）
    async fn complete(&self, request: &ChatRequest) -> Result<String, CallError>;
}

/// 内容安全检查
#[async_trait]
pub trait ContentGuard: Send + Sync {
    async fn check(&self, text: &str) -> Result<GuardVerdict, CallError>;
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::sync::Mutex;

    use super::*;

    /// 用闭包决定回复内容，同时记录所有请求
    pub struct FnModel<F> {
        respond: F,
        pub requests: Mutex<Vec<ChatRequest>>,
    }

    impl<F> FnModel<F>
    where
        F: Fn(&ChatRequest) -> Result<String, CallError> + Send + Sync,
    {
        pub fn new(respond: F) -> Self {
            Self {
                respond,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl<F> ChatModel for FnModel<F>
    where
        F: Fn(&ChatRequest) -> Result<String, CallError> + Send + Sync,
    {
        async fn complete(&self, request: &ChatRequest) -> Result<String, CallError> {
            self.requests.lock().unwrap().push(request.clone());
            (self.respond)(request)
        }
    }

    /// 按文本内容决定是否拦截
    pub struct KeywordGuard(pub &'static str);

    #[async_trait]
    impl ContentGuard for KeywordGuard {
        async fn check(&self, text: &str) -> Result<GuardVerdict, CallError> {
            if text.contains(self.0) {
                Ok(GuardVerdict::Blocked {
                    findings: vec![self.0.to_string()],
                })
            } else {
                Ok(GuardVerdict::Pass)
            }
        }
    }
}
