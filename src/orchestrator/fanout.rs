//! 扇出请求协调器 - 编排层
//!
//! ## 职责
//!
//! 给定一批互相独立的条目（一页文档、一份简历），为每个条目发起一次远程调用，
//! 各自收集结果，返回完整的结果集。某个条目失败只会得到一个 `Failure`，
//! 不会中断同批的其他条目。
//!
//! ## 核心功能
//!
//! 1. **并发调度**：每个条目一个 tokio 任务，全部同时调度
//! 2. **并发上限**：可选的 Semaphore，限制同时在途的调用数
//! 3. **重试**：按 [`RetryPolicy`] 对可重试的错误类别重试
//! 4. **超时**：单次调用超时 + 整批截止时间
//! 5. **隔离**：任务 panic、超时、错误都转成该条目的 `Failure`
//! 6. **指标**：每个条目结束时上报成功/失败和耗时

use std::any::Any;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, timeout_at, Instant};
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::error::{CallError, ErrorClass};
use crate::infrastructure::MetricsSink;
use crate::models::{Batch, BatchOutcomes, ItemId, ItemState, Outcome, OutcomeRecord, WorkItem};
use crate::orchestrator::retry::RetryPolicy;
use crate::utils::logging;

/// 截止时间到达时写入的失败原因
pub const DEADLINE_EXCEEDED: &str = "batch deadline exceeded";

/// 协调器参数
#[derive(Debug, Clone, Default)]
pub struct FanoutSettings {
    /// 同时在途的调用上限，`None` 表示不限制
    pub max_in_flight: Option<usize>,
    pub retry: RetryPolicy,
    /// 单次调用超时，超时按 Transient 处理
    pub call_timeout: Option<Duration>,
    /// 整批截止时间，到点仍未完成的条目记为失败
    pub batch_deadline: Option<Duration>,
}

impl FanoutSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_in_flight: config.max_in_flight(),
            retry: config.retry_policy(),
            call_timeout: config.call_timeout(),
            batch_deadline: config.batch_deadline(),
        }
    }
}

/// 扇出请求协调器
///
/// 不持有任何远程连接，调用方把"如何处理一个条目"作为闭包传进来。
#[derive(Debug, Clone, Default)]
pub struct FanoutCoordinator {
    settings: FanoutSettings,
}

/// 一次 run 内所有任务共享的只读参数
struct RunContext {
    limiter: Option<Arc<Semaphore>>,
    retry: RetryPolicy,
    call_timeout: Option<Duration>,
}

impl FanoutCoordinator {
    pub fn new(settings: FanoutSettings) -> Self {
        Self { settings }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(FanoutSettings::from_config(config))
    }

    /// 处理一个批次
    ///
    /// # 参数
    /// - `batch`: 待处理的条目
    /// - `call`: 处理单个条目的异步操作，重试时会被再次调用
    /// - `metrics`: 指标上下文
    ///
    /// # 返回
    /// 与 `batch` 一一对应的结果集（按提交顺序），永远不会因为单个条目失败而提前返回
    pub async fn run<K, I, P, F, Fut>(
        &self,
        batch: Batch<K, I>,
        call: F,
        metrics: &dyn MetricsSink,
    ) -> BatchOutcomes<K, P>
    where
        K: ItemId,
        I: Send + Sync + 'static,
        P: Send + 'static,
        F: Fn(Arc<WorkItem<K, I>>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<P, CallError>> + Send + 'static,
    {
        let items = batch.into_items();
        let total = items.len();
        if total == 0 {
            return BatchOutcomes::from_records(Vec::new());
        }

        let started = Instant::now();
        let deadline = self.settings.batch_deadline.map(|limit| started + limit);
        logging::log_batch_start(total, self.settings.max_in_flight);

        let ctx = Arc::new(RunContext {
            limiter: self
                .settings
                .max_in_flight
                .map(|limit| Arc::new(Semaphore::new(limit.max(1)))),
            retry: self.settings.retry.clone(),
            call_timeout: self.settings.call_timeout,
        });
        let call = Arc::new(call);

        // 为每个条目创建任务
        let handles: Vec<_> = items
            .into_iter()
            .map(|item| {
                let id = item.id().clone();
                let attempts = Arc::new(AtomicU32::new(0));
                let handle = tokio::spawn(drive_item(
                    item,
                    Arc::clone(&call),
                    Arc::clone(&ctx),
                    Arc::clone(&attempts),
                ));
                (id, handle, attempts)
            })
            .collect();

        // 等待全部任务结束，结果按提交顺序排列
        let records = join_all(handles.into_iter().map(|(id, handle, attempts)| {
            await_item(id, handle, attempts, deadline, started, metrics)
        }))
        .await;

        let outcomes = BatchOutcomes::from_records(records);
        logging::log_batch_complete(outcomes.succeeded(), outcomes.len(), started.elapsed());
        outcomes
    }
}

/// 单个条目的完整生命周期：Pending → InFlight → {Succeeded | Retrying → InFlight | Failed}
async fn drive_item<K, I, P, F, Fut>(
    item: Arc<WorkItem<K, I>>,
    call: Arc<F>,
    ctx: Arc<RunContext>,
    attempts: Arc<AtomicU32>,
) -> OutcomeRecord<K, P>
where
    K: ItemId,
    F: Fn(Arc<WorkItem<K, I>>) -> Fut,
    Fut: Future<Output = Result<P, CallError>>,
{
    let started = Instant::now();
    let id = item.id().clone();
    let max_attempts = ctx.retry.max_attempts();
    let mut state = ItemState::Pending;

    loop {
        // 每次调用持有一个 permit，等待重试期间释放
        let permit = match &ctx.limiter {
            Some(limiter) => match Arc::clone(limiter).acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(e) => {
                    transition(&id, &mut state, ItemState::Failed);
                    return OutcomeRecord {
                        outcome: Outcome::Failure {
                            id,
                            reason: e.to_string(),
                        },
                        attempts: attempts.load(Ordering::Relaxed),
                        elapsed: started.elapsed(),
                    };
                }
            },
            None => None,
        };

        // 拿到 permit 才算一次真正的调用
        let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
        transition(&id, &mut state, ItemState::InFlight);
        let result = match ctx.call_timeout {
            Some(limit) => timeout(limit, call(Arc::clone(&item)))
                .await
                .unwrap_or_else(|_| Err(CallError::Timeout { after: limit })),
            None => call(Arc::clone(&item)).await,
        };
        drop(permit);

        match result {
            Ok(payload) => {
                transition(&id, &mut state, ItemState::Succeeded);
                return OutcomeRecord {
                    outcome: Outcome::Success { id, payload },
                    attempts: attempt,
                    elapsed: started.elapsed(),
                };
            }
            Err(err) => {
                let class = err.class();
                if ctx.retry.should_retry(class, attempt) {
                    let delay = ctx.retry.delay_before(attempt);
                    warn!(
                        "[{}] ⚠️ 第 {}/{} 次调用失败: {}，{}ms 后重试",
                        id,
                        attempt,
                        max_attempts,
                        err,
                        delay.as_millis()
                    );
                    transition(&id, &mut state, ItemState::Retrying);
                    if !delay.is_zero() {
                        sleep(delay).await;
                    }
                    continue;
                }

                match class {
                    ErrorClass::Unknown => {
                        error!("[{}] ❌ 未知错误 (第 {} 次调用): {}", id, attempt, err)
                    }
                    _ => warn!("[{}] ❌ 调用失败 (第 {} 次调用): {}", id, attempt, err),
                }
                transition(&id, &mut state, ItemState::Failed);
                return OutcomeRecord {
                    outcome: Outcome::Failure {
                        id,
                        reason: err.to_string(),
                    },
                    attempts: attempt,
                    elapsed: started.elapsed(),
                };
            }
        }
    }
}

/// 等待单个任务，把 panic / 截止时间也转成结果
async fn await_item<K: ItemId, P>(
    id: K,
    mut handle: JoinHandle<OutcomeRecord<K, P>>,
    attempts: Arc<AtomicU32>,
    deadline: Option<Instant>,
    started: Instant,
    metrics: &dyn MetricsSink,
) -> OutcomeRecord<K, P> {
    let joined = match deadline {
        Some(deadline) => match timeout_at(deadline, &mut handle).await {
            Ok(joined) => Some(joined),
            Err(_) => {
                handle.abort();
                None
            }
        },
        None => Some((&mut handle).await),
    };

    let record = match joined {
        Some(Ok(record)) => record,
        Some(Err(join_error)) => {
            let reason = if join_error.is_panic() {
                format!("task panicked: {}", panic_message(join_error.into_panic()))
            } else {
                "task cancelled".to_string()
            };
            error!("[{}] ❌ 任务异常结束: {}", id, reason);
            OutcomeRecord {
                outcome: Outcome::Failure { id, reason },
                attempts: attempts.load(Ordering::Relaxed),
                elapsed: started.elapsed(),
            }
        }
        None => {
            warn!("[{}] ⏰ 批次截止时间已到，放弃该条目", id);
            OutcomeRecord {
                outcome: Outcome::Failure {
                    id,
                    reason: DEADLINE_EXCEEDED.to_string(),
                },
                attempts: attempts.load(Ordering::Relaxed),
                elapsed: started.elapsed(),
            }
        }
    };

    if record.outcome.is_success() {
        metrics.record_success();
    } else {
        metrics.record_failure();
    }
    metrics.observe_call_duration(record.elapsed);
    record
}

fn transition<K: ItemId>(id: &K, state: &mut ItemState, next: ItemState) {
    debug_assert!(!state.is_terminal(), "[{}] 终态之后不应再转换: {} → {}", id, state, next);
    debug!("[{}] {} → {}", id, state, next);
    *state = next;
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
