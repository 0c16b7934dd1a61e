use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub type TaskId = usize;
pub type WorkerId = u64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Map,
    Reduce,
}

/// Names a task across phases; map and reduce ids overlap.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TaskRef {
    pub kind: TaskKind,
    pub id: TaskId,
}

impl TaskRef {
    pub fn map(id: TaskId) -> Self {
        TaskRef {
            kind: TaskKind::Map,
            id,
        }
    }

    pub fn reduce(id: TaskId) -> Self {
        TaskRef {
            kind: TaskKind::Reduce,
            id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub kind: TaskKind,
    pub id: TaskId,
    /// Input file; only map tasks have one.
    pub source: Option<PathBuf>,
    pub owner: Option<WorkerId>,
    pub leased_at: Option<Instant>,
    pub finished_at: Option<Instant>,
}

impl Task {
    pub fn map(id: TaskId, source: PathBuf) -> Self {
        Task {
            kind: TaskKind::Map,
            id,
            source: Some(source),
            owner: None,
            leased_at: None,
            finished_at: None,
        }
    }

    pub fn reduce(id: TaskId) -> Self {
        Task {
            kind: TaskKind::Reduce,
            id,
            source: None,
            owner: None,
            leased_at: None,
            finished_at: None,
        }
    }

    pub fn key(&self) -> TaskRef {
        TaskRef {
            kind: self.kind,
            id: self.id,
        }
    }

    pub fn is_expired(&self, now: Instant, timeout: Duration) -> bool {
        match self.leased_at {
            Some(t) => now.saturating_duration_since(t) > timeout,
            None => false,
        }
    }
}

/// Tasks in insertion order, addressable by kind and id.
///
/// Not synchronized; the coordinator holds every list behind one lock.
#[derive(Debug, Default)]
pub struct TaskList {
    // Sequence numbers only grow, so the first entry is the oldest push.
    order: BTreeMap<u64, Task>,
    index: HashMap<TaskRef, u64>,
    next_seq: u64,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: TaskRef) -> Option<&Task> {
        self.index.get(&key).and_then(|seq| self.order.get(seq))
    }

    pub fn remove(&mut self, key: TaskRef) -> Option<Task> {
        let seq = self.index.remove(&key)?;
        self.order.remove(&seq)
    }

    pub fn push_back(&mut self, task: Task) {
        debug_assert!(
            !self.index.contains_key(&task.key()),
            "{:?} already listed",
            task.key()
        );
        let seq = self.next_seq;
        self.next_seq += 1;
        self.index.insert(task.key(), seq);
        self.order.insert(seq, task);
    }

    pub fn pop_front(&mut self) -> Option<Task> {
        let (_, task) = self.order.pop_first()?;
        self.index.remove(&task.key());
        Some(task)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.order.values()
    }

    /// Removes and returns, oldest first, every task whose lease is older than `timeout`.
    pub fn take_expired(&mut self, now: Instant, timeout: Duration) -> Vec<Task> {
        let expired: Vec<TaskRef> = self
            .iter()
            .filter(|t| t.is_expired(now, timeout))
            .map(Task::key)
            .collect();
        expired
            .into_iter()
            .filter_map(|key| self.remove(key))
            .collect()
    }
}
