//! Bounded in-memory workflow record store.

use std::collections::{BTreeMap, HashMap, VecDeque};

use foresight_core::agents::AgentKind;
use foresight_core::workflows::{
    AggregatedResult, WorkflowKind, WorkflowParams, WorkflowSnapshot, WorkflowStatus,
};
use parking_lot::Mutex;
use tracing::warn;

use crate::agents::agent::AgentOutput;

/// Mutable state of one workflow run.
#[derive(Clone, Debug)]
pub struct WorkflowRecord {
    /// Generated id (`wf_` + UUID v7).
    pub id: String,
    /// Workflow type.
    pub workflow_type: WorkflowKind,
    /// Caller-supplied parameters.
    pub params: WorkflowParams,
    /// Current status.
    pub status: WorkflowStatus,
    /// Progress in [0, 100].
    pub progress: u8,
    /// Whether a parallel stage continued past partial failures.
    pub degraded: bool,
    /// ISO 8601 submission timestamp.
    pub started_at: String,
    /// Successful outputs so far, keyed by producing agent.
    pub outputs: BTreeMap<AgentKind, AgentOutput>,
    /// Terminal result, set on Completed.
    pub result: Option<AggregatedResult>,
    /// Failure description, set on Failed.
    pub error: Option<String>,
}

impl WorkflowRecord {
    /// A fresh Pending record.
    #[must_use]
    pub fn new(id: String, workflow_type: WorkflowKind, params: WorkflowParams) -> Self {
        Self {
            id,
            workflow_type,
            params,
            status: WorkflowStatus::Pending,
            progress: 0,
            degraded: false,
            started_at: chrono::Utc::now().to_rfc3339(),
            outputs: BTreeMap::new(),
            result: None,
            error: None,
        }
    }

    /// Move to `next` if the state machine allows it. Illegal transitions
    /// are dropped with a warning rather than corrupting the record.
    pub fn transition(&mut self, next: WorkflowStatus) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            warn!(
                workflow = %self.id,
                from = ?self.status,
                to = ?next,
                "illegal status transition ignored"
            );
            false
        }
    }

    /// Wire-format view of this record.
    #[must_use]
    pub fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            id: self.id.clone(),
            workflow_type: self.workflow_type,
            status: self.status,
            progress: self.progress,
            degraded: self.degraded,
            started_at: self.started_at.clone(),
            result: self.result.clone(),
            error: self.error.clone(),
        }
    }
}

struct RegistryInner {
    records: HashMap<String, WorkflowRecord>,
    /// Insertion order, oldest first. Drives eviction and recency listing.
    order: VecDeque<String>,
}

/// Bounded store of workflow records.
///
/// Capacity is enforced at insert: the oldest record is evicted,
/// preferring terminal records so an old still-running workflow is not
/// silently forgotten while younger finished ones remain.
pub struct WorkflowRegistry {
    inner: Mutex<RegistryInner>,
    capacity: usize,
}

impl WorkflowRegistry {
    /// Create a registry holding at most `capacity` records.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                records: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    /// Insert a new record, evicting if at capacity.
    pub fn create(&self, record: WorkflowRecord) {
        let mut inner = self.inner.lock();
        while inner.order.len() >= self.capacity {
            evict_one(&mut inner);
        }
        inner.order.push_back(record.id.clone());
        let _ = inner.records.insert(record.id.clone(), record);
    }

    /// Clone of the record, if present.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<WorkflowRecord> {
        self.inner.lock().records.get(id).cloned()
    }

    /// Mutate a record in place under the lock.
    ///
    /// Returns false if the record was evicted or never existed.
    pub fn update(&self, id: &str, mutate: impl FnOnce(&mut WorkflowRecord)) -> bool {
        let mut inner = self.inner.lock();
        match inner.records.get_mut(id) {
            Some(record) => {
                mutate(record);
                true
            }
            None => false,
        }
    }

    /// Snapshots of the `limit` most recent workflows, most recent first.
    #[must_use]
    pub fn list_recent(&self, limit: usize) -> Vec<WorkflowSnapshot> {
        let inner = self.inner.lock();
        inner
            .order
            .iter()
            .rev()
            .take(limit)
            .filter_map(|id| inner.records.get(id))
            .map(WorkflowRecord::snapshot)
            .collect()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().order.is_empty()
    }
}

/// Evict the oldest terminal record, or the oldest record outright if
/// every stored workflow is still live.
fn evict_one(inner: &mut RegistryInner) {
    let position = inner
        .order
        .iter()
        .position(|id| {
            inner
                .records
                .get(id)
                .is_none_or(|r| r.status.is_terminal())
        })
        .unwrap_or(0);

    if let Some(id) = inner.order.remove(position) {
        if let Some(record) = inner.records.remove(&id) {
            if !record.status.is_terminal() {
                warn!(workflow = %id, status = ?record.status, "evicting non-terminal workflow");
            }
        }
    }
}
