/// Guardrail 客户端
///
/// 在调用模型之前评估输入文本，任何一项评估为 FAIL 即视为拦截
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clients::ContentGuard;
use crate::config::Config;
use crate::error::CallError;

/// 评估结论
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardVerdict {
    Pass,
    Blocked { findings: Vec<String> },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EvaluationRequest<'a> {
    input_text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct EvaluationResponse {
    #[serde(default)]
    results: Vec<EvaluationResult>,
}

#[derive(Debug, Deserialize)]
struct EvaluationResult {
    #[serde(default)]
    evaluation: String,
    #[serde(default)]
    name: Option<String>,
}

impl EvaluationResponse {
    fn verdict(self) -> GuardVerdict {
        let findings: Vec<String> = self
            .results
            .into_iter()
            .filter(|result| result.evaluation.eq_ignore_ascii_case("FAIL"))
            .map(|result| result.name.unwrap_or_else(|| "unnamed".to_string()))
            .collect();
        if findings.is_empty() {
            GuardVerdict::Pass
        } else {
            GuardVerdict::Blocked { findings }
        }
    }
}

/// Guardrail HTTP 客户端
pub struct GuardrailClient {
    http: Client,
    endpoint: String,
    guardrail_id: Option<String>,
    token: Option<String>,
}

impl GuardrailClient {
    /// 未配置 endpoint 时返回 None，表示不做 guardrail 检查
    pub fn from_config(config: &Config) -> Option<Self> {
        let endpoint = config.guardrail_endpoint.as_ref()?;
        Some(Self {
            http: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            guardrail_id: config.guardrail_id.clone(),
            token: config.guardrail_token.clone(),
        })
    }

    fn evaluation_url(&self, guardrail_id: &str) -> String {
        format!("{}/guardrails/{}/evaluations", self.endpoint, guardrail_id)
    }
}

#[async_trait]
impl ContentGuard for GuardrailClient {
    async fn check(&self, text: &str) -> Result<GuardVerdict, CallError> {
        let guardrail_id = self
            .guardrail_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| CallError::MissingConfig("GUARDRAIL_ID".to_string()))?;

        let url = self.evaluation_url(guardrail_id);
        debug!("调用 guardrail: {}", url);

        let mut request = self
            .http
            .post(&url)
            .header("Accept", "application/json")
            .json(&EvaluationRequest { input_text: text });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CallError::from_status(status.as_u16(), body));
        }

        let body: EvaluationResponse = response.json().await?;
        Ok(body.verdict())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_pass() {
        let body: EvaluationResponse = serde_json::from_str(
            r#"{"results": [{"evaluation": "PASS", "name": "pii"}, {"evaluation": "PASS"}]}"#,
        )
        .unwrap();
        assert_eq!(body.verdict(), GuardVerdict::Pass);
    }

    #[test]
    fn test_verdict_blocked() {
        let body: EvaluationResponse = serde_json::from_str(
            r#"{"results": [{"evaluation": "PASS", "name": "pii"}, {"evaluation": "FAIL", "name": "prompt-attack"}]}"#,
        )
        .unwrap();
        assert_eq!(
            body.verdict(),
            GuardVerdict::Blocked {
                findings: vec!["prompt-attack".to_string()]
            }
        );
    }

    #[test]
    fn test_empty_results_pass() {
        let body: EvaluationResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(body.verdict(), GuardVerdict::Pass);
    }

    #[test]
    fn test_client_requires_endpoint() {
        assert!(GuardrailClient::from_config(&Config::default()).is_none());

        let config = Config {
            guardrail_endpoint: Some("https://guard.example.com/".to_string()),
            ..Config::default()
        };
        let client = GuardrailClient::from_config(&config).unwrap();
        assert_eq!(
            client.evaluation_url("gr-1"),
            "https://guard.example.com/guardrails/gr-1/evaluations"
        );
    }

    #[tokio::test]
    async fn test_missing_guardrail_id_is_permanent() {
        let config = Config {
            guardrail_endpoint: Some("http://127.0.0.1:9".to_string()),
            ..Config::default()
        };
        let client = GuardrailClient::from_config(&config).unwrap();
        let err = client.check("prompt").await.unwrap_err();
        assert_eq!(err, CallError::MissingConfig("GUARDRAIL_ID".to_string()));
    }
}
