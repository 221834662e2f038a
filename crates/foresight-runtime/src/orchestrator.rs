//! Workflow submission, tracking, and cancellation.

use std::collections::HashMap;
use std::sync::Arc;

use foresight_core::insight::InsightFeed;
use foresight_core::workflows::{
    SystemSnapshot, WorkflowKind, WorkflowParams, WorkflowSnapshot,
};
use foresight_llm::Provider;
use foresight_settings::ForesightSettings;
use metrics::{counter, gauge};
use parking_lot::Mutex;
use tokio::sync::{Semaphore, broadcast};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::agents::roster::AgentRoster;
use crate::emitter::EventEmitter;
use crate::errors::RuntimeError;
use crate::workflow::executor;
use crate::workflow::registry::{WorkflowRecord, WorkflowRegistry};

/// Number of recent workflows/insights included in a system snapshot.
const SNAPSHOT_LIMIT: usize = 20;

/// Central coordinator: owns the roster, registry, emitter, and insight
/// feed, and enforces the global provider-call concurrency cap.
pub struct Orchestrator {
    roster: Arc<AgentRoster>,
    registry: Arc<WorkflowRegistry>,
    emitter: Arc<EventEmitter>,
    insights: Arc<InsightFeed>,
    active: Arc<Mutex<HashMap<String, CancellationToken>>>,
    shutdown: CancellationToken,
}

impl Orchestrator {
    /// Build the engine against a provider.
    #[must_use]
    pub fn new(provider: Arc<dyn Provider>, settings: &ForesightSettings) -> Self {
        let emitter = Arc::new(EventEmitter::with_capacity(
            settings.orchestrator.event_channel_capacity,
        ));
        let insights = Arc::new(InsightFeed::new(settings.orchestrator.insight_feed_capacity));
        let call_limits = Arc::new(Semaphore::new(
            settings.orchestrator.max_concurrent_calls.max(1),
        ));
        let roster = Arc::new(AgentRoster::new(
            provider,
            Arc::clone(&emitter),
            Arc::clone(&insights),
            call_limits,
            settings,
        ));
        Self {
            roster,
            registry: Arc::new(WorkflowRegistry::new(settings.orchestrator.registry_capacity)),
            emitter,
            insights,
            active: Arc::new(Mutex::new(HashMap::new())),
            shutdown: CancellationToken::new(),
        }
    }

    /// Submit a workflow. Returns the generated id immediately; execution
    /// proceeds on a spawned task.
    #[instrument(skip(self, params), fields(kind = %kind, topic = %params.topic))]
    pub fn submit(
        &self,
        kind: WorkflowKind,
        params: WorkflowParams,
    ) -> Result<String, RuntimeError> {
        if params.topic.trim().is_empty() {
            return Err(RuntimeError::Validation("topic must not be empty".into()));
        }

        let id = format!("wf_{}", Uuid::now_v7().simple());
        self.registry
            .create(WorkflowRecord::new(id.clone(), kind, params.clone()));

        let cancel = self.shutdown.child_token();
        let _ = self.active.lock().insert(id.clone(), cancel.clone());
        counter!("workflows_submitted_total", "kind" => kind.id()).increment(1);
        gauge!("workflows_active").increment(1.0);
        info!(workflow = %id, "workflow submitted");

        let roster = Arc::clone(&self.roster);
        let registry = Arc::clone(&self.registry);
        let emitter = Arc::clone(&self.emitter);
        let active = Arc::clone(&self.active);
        let task_id = id.clone();
        tokio::spawn(async move {
            executor::run(
                task_id.clone(),
                kind,
                params,
                roster,
                registry,
                emitter,
                cancel,
            )
            .await;
            let _ = active.lock().remove(&task_id);
            gauge!("workflows_active").decrement(1.0);
        });

        Ok(id)
    }

    /// Cancel a running workflow. Returns false if the workflow is
    /// unknown or already terminal.
    pub fn cancel(&self, id: &str) -> bool {
        let token = self.active.lock().get(id).cloned();
        match token {
            Some(token) => {
                info!(workflow = %id, "cancelling workflow");
                counter!("workflows_cancelled_total").increment(1);
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Snapshot of one workflow.
    pub fn status(&self, id: &str) -> Result<WorkflowSnapshot, RuntimeError> {
        self.registry
            .get(id)
            .map(|r| r.snapshot())
            .ok_or_else(|| RuntimeError::WorkflowNotFound(id.to_string()))
    }

    /// Full record of one workflow, including per-agent outputs.
    pub fn record(&self, id: &str) -> Result<WorkflowRecord, RuntimeError> {
        self.registry
            .get(id)
            .ok_or_else(|| RuntimeError::WorkflowNotFound(id.to_string()))
    }

    /// The `limit` most recent workflows, most recent first.
    #[must_use]
    pub fn list_recent(&self, limit: usize) -> Vec<WorkflowSnapshot> {
        self.registry.list_recent(limit)
    }

    /// Full system snapshot for a newly connected observer.
    #[must_use]
    pub fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot {
            agents: self.roster.snapshots(),
            workflows: self.registry.list_recent(SNAPSHOT_LIMIT),
            insights: self.insights.recent(SNAPSHOT_LIMIT),
        }
    }

    /// Subscribe to the live event stream.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<foresight_core::events::ForesightEvent> {
        self.emitter.subscribe()
    }

    /// The shared event emitter.
    #[must_use]
    pub fn emitter(&self) -> &Arc<EventEmitter> {
        &self.emitter
    }

    /// Cancel every in-flight workflow. Used on server shutdown.
    pub fn shutdown(&self) {
        info!("orchestrator shutting down");
        self.shutdown.cancel();
    }
}

// --- Orchestrator integration tests ---
