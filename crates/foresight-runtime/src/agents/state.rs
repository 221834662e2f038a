//! Observable per-agent state.
//!
//! Agent state is process-wide: one handle per [`AgentKind`], reused by
//! every workflow and reset to Idle between them. Mutation happens only
//! on behalf of a running stage, under the lock, never across an await.

use std::collections::VecDeque;

use foresight_core::agents::{
    AgentKind, AgentStatus, Collaboration, Thought, push_bounded,
};
use foresight_core::workflows::AgentSnapshot;
use parking_lot::Mutex;

struct StateInner {
    status: AgentStatus,
    current_task: Option<String>,
    thoughts: VecDeque<Thought>,
    collaborations: VecDeque<Collaboration>,
}

/// Lock-guarded observable state for one agent.
pub struct AgentStateHandle {
    kind: AgentKind,
    thought_cap: usize,
    collaboration_cap: usize,
    inner: Mutex<StateInner>,
}

impl AgentStateHandle {
    /// Create the state handle for `kind` with the given buffer caps.
    #[must_use]
    pub fn new(kind: AgentKind, thought_cap: usize, collaboration_cap: usize) -> Self {
        Self {
            kind,
            thought_cap: thought_cap.max(1),
            collaboration_cap: collaboration_cap.max(1),
            inner: Mutex::new(StateInner {
                status: AgentStatus::Idle,
                current_task: None,
                thoughts: VecDeque::new(),
                collaborations: VecDeque::new(),
            }),
        }
    }

    /// The agent this state belongs to.
    #[must_use]
    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    /// Set status and current task.
    pub fn set_status(&self, status: AgentStatus, current_task: Option<String>) {
        let mut inner = self.inner.lock();
        inner.status = status;
        inner.current_task = current_task;
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> AgentStatus {
        self.inner.lock().status
    }

    /// Append a thought, evicting the oldest beyond the cap.
    pub fn record_thought(&self, thought: Thought) {
        let mut inner = self.inner.lock();
        let cap = self.thought_cap;
        push_bounded(&mut inner.thoughts, thought, cap);
    }

    /// Append a collaboration record, evicting the oldest beyond the cap.
    pub fn record_collaboration(&self, collaboration: Collaboration) {
        let mut inner = self.inner.lock();
        let cap = self.collaboration_cap;
        push_bounded(&mut inner.collaborations, collaboration, cap);
    }

    /// Number of buffered thoughts.
    #[must_use]
    pub fn thought_count(&self) -> usize {
        self.inner.lock().thoughts.len()
    }

    /// Reset to Idle between workflows. Buffers persist; agents are
    /// never destroyed, only their activity indicators clear.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.status = AgentStatus::Idle;
        inner.current_task = None;
    }

    /// Point-in-time snapshot for observers.
    #[must_use]
    pub fn snapshot(&self) -> AgentSnapshot {
        let inner = self.inner.lock();
        AgentSnapshot {
            agent: self.kind,
            status: inner.status,
            current_task: inner.current_task.clone(),
            thought_count: inner.thoughts.len(),
            last_thought: inner.thoughts.back().map(|t| t.content.clone()),
        }
    }
}
