use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, FileError};
use crate::orchestrator::retry::{RetryDelay, RetryPolicy};

/// 程序配置
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// 同时在途的远程调用上限（0 表示不限制）
    pub max_in_flight: usize,
    /// 单个条目的最大重试次数
    pub max_retries: u32,
    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,
    /// 是否使用指数退避（否则固定间隔）
    pub exponential_backoff: bool,
    /// 指数退避的上限（毫秒）
    pub max_retry_delay_ms: u64,
    /// 单次调用超时（秒，0 表示不设超时）
    pub call_timeout_secs: u64,
    /// 整批截止时间（秒，0 表示不设截止）
    pub batch_deadline_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 结果输出文件
    pub output_file: String,
    /// 指标导出文件（Prometheus 文本格式）
    pub metrics_file: Option<String>,
    /// 自定义页面提示词文件，支持 `{page_num}` 占位符
    pub page_prompt_file: Option<PathBuf>,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- Guardrail 配置 ---
    pub guardrail_endpoint: Option<String>,
    pub guardrail_id: Option<String>,
    pub guardrail_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_in_flight: 8,
            max_retries: 2,
            retry_delay_ms: 1000,
            exponential_backoff: false,
            max_retry_delay_ms: 30_000,
            call_timeout_secs: 120,
            batch_deadline_secs: 0,
            verbose_logging: false,
            output_file: "analysis_results.txt".to_string(),
            metrics_file: None,
            page_prompt_file: None,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o".to_string(),
            guardrail_endpoint: None,
            guardrail_id: None,
            guardrail_token: None,
        }
    }
}

impl Config {
    /// 默认值 + 环境变量
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// 从 TOML 文件加载，缺省字段使用默认值
    pub fn from_file(path: &Path) -> Result<Self, FileError> {
        let path_str = path.display().to_string();
        if !path.exists() {
            return Err(FileError::NotFound { path: path_str });
        }
        let content = std::fs::read_to_string(path).map_err(|source| FileError::ReadFailed {
            path: path_str.clone(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| FileError::TomlParseFailed {
            path: path_str,
            source,
        })
    }

    /// 加载顺序：默认值 → 配置文件（可选）→ 环境变量
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(base.with_env_overrides(|key| std::env::var(key).ok())?)
    }

    /// 用环境变量覆盖配置项
    ///
    /// # 参数
    /// - `lookup`: 变量读取函数，测试时可以替换为内存表
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MAX_IN_FLIGHT") {
            self.max_in_flight = parse_var("MAX_IN_FLIGHT", &v, "usize")?;
        }
        if let Some(v) = lookup("MAX_RETRIES") {
            self.max_retries = parse_var("MAX_RETRIES", &v, "u32")?;
        }
        if let Some(v) = lookup("RETRY_DELAY_MS") {
            self.retry_delay_ms = parse_var("RETRY_DELAY_MS", &v, "u64")?;
        }
        if let Some(v) = lookup("EXPONENTIAL_BACKOFF") {
            self.exponential_backoff = parse_var("EXPONENTIAL_BACKOFF", &v, "bool")?;
        }
        if let Some(v) = lookup("CALL_TIMEOUT_SECS") {
            self.call_timeout_secs = parse_var("CALL_TIMEOUT_SECS", &v, "u64")?;
        }
        if let Some(v) = lookup("BATCH_DEADLINE_SECS") {
            self.batch_deadline_secs = parse_var("BATCH_DEADLINE_SECS", &v, "u64")?;
        }
        if let Some(v) = lookup("VERBOSE_LOGGING") {
            self.verbose_logging = parse_var("VERBOSE_LOGGING", &v, "bool")?;
        }
        if let Some(v) = lookup("OUTPUT_FILE") {
            self.output_file = v;
        }
        if let Some(v) = lookup("METRICS_FILE") {
            self.metrics_file = Some(v);
        }
        if let Some(v) = lookup("PAGE_PROMPT_FILE") {
            self.page_prompt_file = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("LLM_API_KEY") {
            self.llm_api_key = v;
        }
        if let Some(v) = lookup("LLM_API_BASE_URL") {
            self.llm_api_base_url = v;
        }
        if let Some(v) = lookup("LLM_MODEL_NAME") {
            self.llm_model_name = v;
        }
        if let Some(v) = lookup("GUARDRAIL_ENDPOINT") {
            self.guardrail_endpoint = Some(v);
        }
        if let Some(v) = lookup("GUARDRAIL_ID") {
            self.guardrail_id = Some(v);
        }
        if let Some(v) = lookup("GUARDRAIL_TOKEN") {
            self.guardrail_token = Some(v);
        }
        Ok(self)
    }

    /// 启动前校验
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm_api_key.trim().is_empty() {
            return Err(ConfigError::MissingValue {
                key: "LLM_API_KEY".to_string(),
            });
        }
        if self.llm_model_name.trim().is_empty() {
            return Err(ConfigError::MissingValue {
                key: "LLM_MODEL_NAME".to_string(),
            });
        }
        if self.exponential_backoff && self.max_retry_delay_ms < self.retry_delay_ms {
            return Err(ConfigError::InvalidValue {
                key: "max_retry_delay_ms".to_string(),
                reason: format!(
                    "必须不小于 retry_delay_ms ({} < {})",
                    self.max_retry_delay_ms, self.retry_delay_ms
                ),
            });
        }
        Ok(())
    }

    /// 由配置构建重试策略
    pub fn retry_policy(&self) -> RetryPolicy {
        let base = Duration::from_millis(self.retry_delay_ms);
        let delay = if self.exponential_backoff {
            RetryDelay::Exponential {
                base,
                max: Duration::from_millis(self.max_retry_delay_ms),
            }
        } else {
            RetryDelay::Fixed(base)
        };
        RetryPolicy::new(self.max_retries, delay)
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        (self.call_timeout_secs > 0).then(|| Duration::from_secs(self.call_timeout_secs))
    }

    pub fn batch_deadline(&self) -> Option<Duration> {
        (self.batch_deadline_secs > 0).then(|| Duration::from_secs(self.batch_deadline_secs))
    }

    pub fn max_in_flight(&self) -> Option<usize> {
        (self.max_in_flight > 0).then_some(self.max_in_flight)
    }
}

fn parse_var<T: std::str::FromStr>(
    var_name: &str,
    value: &str,
    expected_type: &str,
) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.to_string(),
            expected_type: expected_type.to_string(),
        })
}
