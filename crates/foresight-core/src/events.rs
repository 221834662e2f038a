//! Event types broadcast to live observers.
//!
//! Every state change in the engine is published as a [`ForesightEvent`]:
//! agent lifecycle (`agent:*`), workflow lifecycle (`workflow:*`), insight
//! feed additions (`insight:new`), and the `system:state` snapshot sent to
//! a newly connected subscriber in place of event replay.
//!
//! Events are transient and never persisted. The wire format is
//! `{type, agent?, workflow?, ...data, timestamp}`: the [`BaseEvent`]
//! scope fields are flattened into each variant.

use serde::{Deserialize, Serialize};

use crate::agents::{AgentKind, AgentStatus};
use crate::insight::Insight;
use crate::workflows::{AggregatedResult, SystemSnapshot, WorkflowKind};

/// Scope and timestamp fields shared by every event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseEvent {
    /// Agent this event concerns, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentKind>,
    /// Workflow this event concerns, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow: Option<String>,
    /// ISO 8601 timestamp.
    pub timestamp: String,
}

impl BaseEvent {
    /// Broadcast-scoped event (no agent, no workflow).
    #[must_use]
    pub fn broadcast() -> Self {
        Self {
            agent: None,
            workflow: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Event scoped to an agent working inside a workflow.
    #[must_use]
    pub fn for_agent(agent: AgentKind, workflow: impl Into<String>) -> Self {
        Self {
            agent: Some(agent),
            workflow: Some(workflow.into()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Event scoped to an agent outside any workflow (roster resets).
    #[must_use]
    pub fn for_agent_only(agent: AgentKind) -> Self {
        Self {
            agent: Some(agent),
            workflow: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Event scoped to a workflow.
    #[must_use]
    pub fn for_workflow(workflow: impl Into<String>) -> Self {
        Self {
            agent: None,
            workflow: Some(workflow.into()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

macro_rules! foresight_events {
    (
        $(
            $(#[doc = $doc:literal])*
            $variant:ident {
                $(
                    $(#[$fmeta:meta])*
                    $field:ident : $ty:ty
                ),* $(,)?
            } => $rename:literal,
        )*
    ) => {
        /// A state change broadcast to subscribed observers.
        #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "type")]
        pub enum ForesightEvent {
            $(
                $(#[doc = $doc])*
                #[serde(rename = $rename)]
                $variant {
                    /// Scope and timestamp.
                    #[serde(flatten)]
                    base: BaseEvent,
                    $(
                        $(#[$fmeta])*
                        $field: $ty,
                    )*
                },
            )*
        }

        impl ForesightEvent {
            /// Get the base event fields.
            #[must_use]
            pub fn base(&self) -> &BaseEvent {
                match self {
                    $(Self::$variant { base, .. } => base,)*
                }
            }

            /// Get the event type string (for type discrimination).
            #[must_use]
            pub fn event_type(&self) -> &str {
                match self {
                    $(Self::$variant { .. } => $rename,)*
                }
            }
        }

        /// Number of `ForesightEvent` variants (compile-time constant for tests).
        #[cfg(test)]
        pub(crate) const VARIANT_COUNT: usize = [$($rename),*].len();
    };
}

foresight_events! {
    // -- Agent lifecycle --

    /// Agent began working on a task (status moved to thinking/analyzing).
    AgentThinking {
        task: String,
    } => "agent:thinking",

    /// Agent recorded a thought after a successful model call.
    AgentThought {
        content: String,
        confidence: f64,
    } => "agent:thought",

    /// Agent status changed outside the thinking/thought pair.
    AgentStatusChanged {
        status: AgentStatus,
    } => "agent:status",

    /// Agent invocation failed (after retries were exhausted, or fatally).
    AgentError {
        message: String,
    } => "agent:error",

    /// Agent consumed another agent's output.
    AgentCollaboration {
        #[serde(rename = "with")]
        partner: AgentKind,
        message: String,
    } => "agent:collaboration",

    // -- Insight feed --

    /// A new insight entered the global feed.
    InsightAdded {
        insight: Insight,
    } => "insight:new",

    // -- Workflow lifecycle --

    /// Workflow began executing its stage graph.
    WorkflowStarted {
        #[serde(rename = "workflowType")]
        workflow_type: WorkflowKind,
        topic: String,
    } => "workflow:started",

    /// A stage completed.
    WorkflowProgress {
        progress: u8,
        #[serde(rename = "completedStages")]
        completed_stages: usize,
        #[serde(rename = "totalStages")]
        total_stages: usize,
    } => "workflow:progress",

    /// Workflow reached Completed.
    WorkflowCompleted {
        result: AggregatedResult,
        degraded: bool,
    } => "workflow:completed",

    /// Workflow reached Failed.
    WorkflowFailed {
        error: String,
    } => "workflow:failed",

    // -- Snapshot --

    /// Current system state, sent to a new subscriber on connect.
    SystemState {
        #[serde(flatten)]
        snapshot: SystemSnapshot,
    } => "system:state",
}

impl ForesightEvent {
    /// The agent this event concerns, if any.
    #[must_use]
    pub fn agent(&self) -> Option<AgentKind> {
        self.base().agent
    }

    /// The workflow this event concerns, if any.
    #[must_use]
    pub fn workflow(&self) -> Option<&str> {
        self.base().workflow.as_deref()
    }
}

/// A named subscription scope used to route events to observers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventChannel {
    /// Every event.
    All,
    /// Events concerning one agent.
    Agent(AgentKind),
    /// Events concerning one workflow.
    Workflow(String),
}

impl EventChannel {
    /// Parse a channel name: `"all"`, `"agent:<id>"`, or `"workflow:<id>"`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        if name == "all" {
            return Some(Self::All);
        }
        if let Some(id) = name.strip_prefix("agent:") {
            return id.parse().ok().map(Self::Agent);
        }
        if let Some(id) = name.strip_prefix("workflow:") {
            if id.is_empty() {
                return None;
            }
            return Some(Self::Workflow(id.to_string()));
        }
        None
    }

    /// Whether an event should be delivered on this channel.
    #[must_use]
    pub fn matches(&self, event: &ForesightEvent) -> bool {
        match self {
            Self::All => true,
            Self::Agent(kind) => event.agent() == Some(*kind),
            Self::Workflow(id) => event.workflow() == Some(id.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thinking(agent: AgentKind, workflow: &str) -> ForesightEvent {
        ForesightEvent::AgentThinking {
            base: BaseEvent::for_agent(agent, workflow),
            task: "scanning".into(),
        }
    }

    #[test]
    fn variant_count_is_stable() {
        assert_eq!(VARIANT_COUNT, 11);
    }

    #[test]
    fn wire_format_flattens_base() {
        let event = thinking(AgentKind::TrendScanner, "wf_1");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "agent:thinking");
        assert_eq!(json["agent"], "trend_scanner");
        assert_eq!(json["workflow"], "wf_1");
        assert_eq!(json["task"], "scanning");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn broadcast_scope_omits_empty_fields() {
        let event = ForesightEvent::WorkflowProgress {
            base: BaseEvent::for_workflow("wf_1"),
            progress: 50,
            completed_stages: 1,
            total_stages: 2,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("agent").is_none());
        assert_eq!(json["workflow"], "wf_1");
    }

    #[test]
    fn collaboration_uses_with_key() {
        let event = ForesightEvent::AgentCollaboration {
            base: BaseEvent::for_agent(AgentKind::Synthesis, "wf_1"),
            partner: AgentKind::TrendScanner,
            message: "receiving weak signals".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["with"], "trend_scanner");
    }

    #[test]
    fn events_round_trip_through_json() {
        let event = ForesightEvent::WorkflowFailed {
            base: BaseEvent::for_workflow("wf_9"),
            error: "synthesis stage failed".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: ForesightEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    // --- Channel routing ---

    #[test]
    fn parse_channel_names() {
        assert_eq!(EventChannel::parse("all"), Some(EventChannel::All));
        assert_eq!(
            EventChannel::parse("agent:trend_scanner"),
            Some(EventChannel::Agent(AgentKind::TrendScanner))
        );
        assert_eq!(
            EventChannel::parse("workflow:wf_1"),
            Some(EventChannel::Workflow("wf_1".into()))
        );
        assert_eq!(EventChannel::parse("agent:bogus"), None);
        assert_eq!(EventChannel::parse("workflow:"), None);
        assert_eq!(EventChannel::parse("everything"), None);
    }

    #[test]
    fn all_channel_matches_everything() {
        let channel = EventChannel::All;
        assert!(channel.matches(&thinking(AgentKind::TechImpact, "wf_1")));
        assert!(channel.matches(&ForesightEvent::WorkflowFailed {
            base: BaseEvent::for_workflow("wf_2"),
            error: "x".into(),
        }));
    }

    #[test]
    fn agent_channel_filters_by_agent() {
        let channel = EventChannel::Agent(AgentKind::TrendScanner);
        assert!(channel.matches(&thinking(AgentKind::TrendScanner, "wf_1")));
        assert!(!channel.matches(&thinking(AgentKind::TechImpact, "wf_1")));
    }

    #[test]
    fn workflow_channel_filters_by_workflow() {
        let channel = EventChannel::Workflow("wf_1".into());
        assert!(channel.matches(&thinking(AgentKind::TrendScanner, "wf_1")));
        assert!(!channel.matches(&thinking(AgentKind::TrendScanner, "wf_2")));
    }

    #[test]
    fn event_type_matches_serde_tag() {
        let event = thinking(AgentKind::AiFuturist, "wf_1");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.event_type());
    }
}
