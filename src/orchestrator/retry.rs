//! 重试策略
//!
//! 把散落在各个调用点的"失败 → 等待 → 再试"循环收拢成一份可配置的策略：
//! 最多重试几次、每次等待多久、哪些错误类别值得重试。

use std::time::Duration;

use crate::error::ErrorClass;

/// 重试间隔策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDelay {
    /// 固定间隔
    Fixed(Duration),
    /// 指数退避：base, 2*base, 4*base ... 不超过 max
    Exponential { base: Duration, max: Duration },
}

/// 重试策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    delay: RetryDelay,
    retryable: Vec<ErrorClass>,
}

impl RetryPolicy {
    /// 只对 Transient 错误重试
    pub fn new(max_retries: u32, delay: RetryDelay) -> Self {
        Self {
            max_retries,
            delay,
            retryable: vec![ErrorClass::Transient],
        }
    }

    /// 固定间隔重试
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self::new(max_retries, RetryDelay::Fixed(delay))
    }

    /// 不重试
    pub fn none() -> Self {
        Self::fixed(0, Duration::ZERO)
    }

    /// 替换可重试的错误类别
    pub fn with_retryable(mut self, classes: impl IntoIterator<Item = ErrorClass>) -> Self {
        self.retryable = classes.into_iter().collect();
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// 单个条目最多调用次数（首次 + 重试）
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn is_retryable(&self, class: ErrorClass) -> bool {
        self.retryable.contains(&class)
    }

    /// 已经调用了 `attempts_made` 次且最近一次以 `class` 失败，是否还要再试
    pub fn should_retry(&self, class: ErrorClass, attempts_made: u32) -> bool {
        self.is_retryable(class) && attempts_made <= self.max_retries
    }

    /// 第 `retry_number` 次重试（从 1 开始）前的等待时间
    pub fn delay_before(&self, retry_number: u32) -> Duration {
        match self.delay {
            RetryDelay::Fixed(delay) => delay,
            RetryDelay::Exponential { base, max } => {
                let shift = retry_number.saturating_sub(1).min(31);
                base.checked_mul(1u32 << shift).unwrap_or(max).min(max)
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(2, Duration::from_secs(1))
    }
}
