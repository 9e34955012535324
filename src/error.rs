use std::time::Duration;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 远程调用错误
    #[error("调用错误: {0}")]
    Call(#[from] CallError),
    /// 批次构建错误
    #[error("批次错误: {0}")]
    Batch(#[from] BatchError),
    /// 其他错误
    #[error("错误: {0}")]
    Other(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 必填配置缺失
    #[error("缺少必填配置 {key}")]
    MissingValue { key: String },
    /// 配置值非法
    #[error("配置 {key} 非法: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// JSON 解析失败
    #[error("JSON解析失败 ({path}): {source}")]
    JsonParseFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// 批次构建错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    /// 同一批次中出现重复的标识符
    #[error("批次中存在重复的标识符: {id}")]
    DuplicateId { id: String },
}

/// 错误分类，决定一次失败是否值得重试
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// 限流、过载、网络抖动，可以重试
    Transient,
    /// 输入非法、配置缺失，重试无意义
    Permanent,
    /// 其他未知错误，按 Permanent 处理
    Unknown,
}

/// 单次远程调用的错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallError {
    /// 请求频率限制
    #[error("请求频率限制: {message}")]
    RateLimited { message: String },
    /// 单次调用超时
    #[error("调用超时 ({}ms)", .after.as_millis())]
    Timeout { after: Duration },
    /// 网络请求失败
    #[error("网络请求失败: {0}")]
    Network(String),
    /// 服务端 5xx
    #[error("服务端错误 (status {status}): {message}")]
    Server { status: u16, message: String },
    /// 其他 API 错误响应
    #[error("API返回错误响应 (status {status:?}): {message}")]
    Api { status: Option<u16>, message: String },
    /// 输入非法
    #[error("输入非法: {0}")]
    InvalidInput(String),
    /// 缺少必需的配置
    #[error("缺少配置: {0}")]
    MissingConfig(String),
    /// 内容被 guardrail 拦截
    #[error("{0}")]
    Blocked(String),
    /// 响应无法解析
    #[error("响应无法解析: {0}")]
    MalformedResponse(String),
    /// 其他错误
    #[error("{0}")]
    Other(String),
}

impl CallError {
    /// 错误分类
    pub fn class(&self) -> ErrorClass {
        match self {
            CallError::RateLimited { .. }
            | CallError::Timeout { .. }
            | CallError::Network(_)
            | CallError::Server { .. } => ErrorClass::Transient,
            CallError::Api { .. }
            | CallError::InvalidInput(_)
            | CallError::MissingConfig(_)
            | CallError::Blocked(_)
            | CallError::MalformedResponse(_) => ErrorClass::Permanent,
            CallError::Other(_) => ErrorClass::Unknown,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }

    /// 根据 HTTP 状态码构建错误
    ///
    /// 429 视为限流，408 视为超时类网络错误，5xx 视为服务端错误，其余为 API 错误。
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            429 => CallError::RateLimited { message },
            408 => CallError::Network(format!("请求超时 (408): {}", message)),
            500..=599 => CallError::Server { status, message },
            _ => CallError::Api {
                status: Some(status),
                message,
            },
        }
    }
}

impl From<reqwest::Error> for CallError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return CallError::from_status(status.as_u16(), err.to_string());
        }
        if err.is_decode() {
            return CallError::MalformedResponse(err.to_string());
        }
        if err.is_builder() {
            return CallError::InvalidInput(err.to_string());
        }
        CallError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for CallError {
    fn from(err: serde_json::Error) -> Self {
        CallError::MalformedResponse(err.to_string())
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
