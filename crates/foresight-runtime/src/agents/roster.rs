//! The process-wide agent roster.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use foresight_core::agents::{AgentKind, AgentStatus};
use foresight_core::events::{BaseEvent, ForesightEvent};
use foresight_core::insight::InsightFeed;
use foresight_core::workflows::AgentSnapshot;
use foresight_llm::Provider;
use foresight_settings::ForesightSettings;
use tokio::sync::Semaphore;

use crate::agents::agent::Agent;
use crate::agents::state::AgentStateHandle;
use crate::emitter::EventEmitter;

/// All six agents, built once at startup and shared across workflows.
pub struct AgentRoster {
    agents: HashMap<AgentKind, Arc<Agent>>,
}

impl AgentRoster {
    /// Build the roster against a provider and shared infrastructure.
    #[must_use]
    pub fn new(
        provider: Arc<dyn Provider>,
        emitter: Arc<EventEmitter>,
        insights: Arc<InsightFeed>,
        call_limits: Arc<Semaphore>,
        settings: &ForesightSettings,
    ) -> Self {
        let call_timeout = Duration::from_secs(settings.provider.call_timeout_secs);
        let agents = AgentKind::ALL
            .into_iter()
            .map(|kind| {
                let state = Arc::new(AgentStateHandle::new(
                    kind,
                    settings.orchestrator.thought_buffer,
                    settings.orchestrator.collaboration_buffer,
                ));
                let agent = Agent::new(
                    kind,
                    Arc::clone(&provider),
                    state,
                    Arc::clone(&emitter),
                    Arc::clone(&insights),
                    Arc::clone(&call_limits),
                    settings.orchestrator.retry,
                    call_timeout,
                    settings.provider.temperature,
                    settings.provider.max_tokens,
                );
                (kind, Arc::new(agent))
            })
            .collect();
        Self { agents }
    }

    /// Look up an agent. The roster is total over [`AgentKind`].
    #[must_use]
    pub fn agent(&self, kind: AgentKind) -> Arc<Agent> {
        Arc::clone(&self.agents[&kind])
    }

    /// Snapshots of every agent, in roster order.
    #[must_use]
    pub fn snapshots(&self) -> Vec<AgentSnapshot> {
        AgentKind::ALL
            .into_iter()
            .map(|kind| self.agents[&kind].state().snapshot())
            .collect()
    }

    /// Reset every agent to Idle and announce the change.
    ///
    /// Called when a workflow reaches a terminal state so dashboards do
    /// not show stale Thinking/Error badges from the previous run.
    pub fn reset_all(&self, emitter: &EventEmitter) {
        for kind in AgentKind::ALL {
            self.agents[&kind].state().reset();
            let _ = emitter.emit(ForesightEvent::AgentStatusChanged {
                base: BaseEvent::for_agent_only(kind),
                status: AgentStatus::Idle,
            });
        }
    }
}
