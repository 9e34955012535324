//! 批处理的数据模型：WorkItem / Batch / Outcome

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use crate::error::BatchError;

/// 条目标识符需要满足的约束
pub trait ItemId: Clone + Eq + Hash + fmt::Display + fmt::Debug + Send + Sync + 'static {}

impl<T> ItemId for T where T: Clone + Eq + Hash + fmt::Display + fmt::Debug + Send + Sync + 'static {}

/// 一个可独立处理的条目（一页 PDF、一份简历）
///
/// 提交后不可变，调用方在重试之间拿到的是同一份数据。
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem<K, I> {
    id: K,
    input: I,
}

impl<K, I> WorkItem<K, I> {
    pub fn new(id: K, input: I) -> Self {
        Self { id, input }
    }

    pub fn id(&self) -> &K {
        &self.id
    }

    pub fn input(&self) -> &I {
        &self.input
    }
}

/// 一次用户操作提交的全部条目，保持提交顺序
#[derive(Debug)]
pub struct Batch<K, I> {
    items: Vec<Arc<WorkItem<K, I>>>,
}

impl<K: ItemId, I> Batch<K, I> {
    /// 构建批次，标识符必须互不相同
    pub fn new(items: impl IntoIterator<Item = WorkItem<K, I>>) -> Result<Self, BatchError> {
        let mut seen = std::collections::HashSet::new();
        let mut collected = Vec::new();
        for item in items {
            if !seen.insert(item.id.clone()) {
                return Err(BatchError::DuplicateId {
                    id: item.id.to_string(),
                });
            }
            collected.push(Arc::new(item));
        }
        Ok(Self { items: collected })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn into_items(self) -> Vec<Arc<WorkItem<K, I>>> {
        self.items
    }
}

/// 单个条目的处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Pending,
    InFlight,
    Retrying,
    Succeeded,
    Failed,
}

impl ItemState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ItemState::Succeeded | ItemState::Failed)
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemState::Pending => "pending",
            ItemState::InFlight => "in-flight",
            ItemState::Retrying => "retrying",
            ItemState::Succeeded => "succeeded",
            ItemState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// 单个条目的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<K, P> {
    Success { id: K, payload: P },
    Failure { id: K, reason: String },
}

impl<K, P> Outcome<K, P> {
    pub fn id(&self) -> &K {
        match self {
            Outcome::Success { id, .. } | Outcome::Failure { id, .. } => id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn payload(&self) -> Option<&P> {
        match self {
            Outcome::Success { payload, .. } => Some(payload),
            Outcome::Failure { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Success { .. } => None,
            Outcome::Failure { reason, .. } => Some(reason),
        }
    }
}

/// 结果 + 调用次数 + 耗时
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeRecord<K, P> {
    pub outcome: Outcome<K, P>,
    pub attempts: u32,
    pub elapsed: Duration,
}

/// 一个批次的完整结果集
///
/// 按提交顺序保存，同时可以按标识符查找。
#[derive(Debug)]
pub struct BatchOutcomes<K, P> {
    records: Vec<OutcomeRecord<K, P>>,
    index: HashMap<K, usize>,
}

impl<K: ItemId, P> BatchOutcomes<K, P> {
    pub(crate) fn from_records(records: Vec<OutcomeRecord<K, P>>) -> Self {
        let index = records
            .iter()
            .enumerate()
            .map(|(pos, record)| (record.outcome.id().clone(), pos))
            .collect();
        Self { records, index }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &K) -> Option<&Outcome<K, P>> {
        self.record(id).map(|record| &record.outcome)
    }

    pub fn record(&self, id: &K) -> Option<&OutcomeRecord<K, P>> {
        self.index.get(id).map(|&pos| &self.records[pos])
    }

    /// 按提交顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &Outcome<K, P>> {
        self.records.iter().map(|record| &record.outcome)
    }

    pub fn records(&self) -> &[OutcomeRecord<K, P>] {
        &self.records
    }

    pub fn succeeded(&self) -> usize {
        self.iter().filter(|outcome| outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }
}
