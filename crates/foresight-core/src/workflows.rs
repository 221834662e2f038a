//! Workflow vocabulary: kinds, declarative stage graphs, status state
//! machine, submission parameters, and snapshot wire types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::agents::{AgentKind, AgentStatus};
use crate::insight::Insight;

/// The four supported analysis workflows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    /// Multi-agent analysis of an emerging trend.
    TrendAnalysis,
    /// Future scenario construction for a domain.
    ScenarioCreation,
    /// Assessment of the emerging AI/agent economy for an industry.
    AiEconomyAssessment,
    /// Cross-domain knowledge synthesis.
    KnowledgeSynthesis,
}

impl WorkflowKind {
    /// Every workflow kind.
    pub const ALL: [Self; 4] = [
        Self::TrendAnalysis,
        Self::ScenarioCreation,
        Self::AiEconomyAssessment,
        Self::KnowledgeSynthesis,
    ];

    /// Stable string id (wire format).
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::TrendAnalysis => "trend_analysis",
            Self::ScenarioCreation => "scenario_creation",
            Self::AiEconomyAssessment => "ai_economy_assessment",
            Self::KnowledgeSynthesis => "knowledge_synthesis",
        }
    }

    /// The declarative stage graph for this workflow.
    ///
    /// Every graph terminates in an [`Stage::Aggregate`] synthesis stage
    /// that receives all upstream outputs.
    #[must_use]
    pub fn stages(self) -> Vec<Stage> {
        use AgentKind::{
            AiFuturist, CustomerInsight, OrgTransformation, Synthesis, TechImpact, TrendScanner,
        };
        match self {
            Self::TrendAnalysis | Self::KnowledgeSynthesis => vec![
                Stage::Sequential(TrendScanner),
                Stage::Parallel(vec![AiFuturist, CustomerInsight, TechImpact, OrgTransformation]),
                Stage::Aggregate(Synthesis),
            ],
            Self::ScenarioCreation => vec![
                Stage::Parallel(vec![AiFuturist, TechImpact, CustomerInsight, OrgTransformation]),
                Stage::Aggregate(Synthesis),
            ],
            Self::AiEconomyAssessment => vec![
                Stage::Sequential(AiFuturist),
                Stage::Sequential(TrendScanner),
                Stage::Sequential(OrgTransformation),
                Stage::Aggregate(Synthesis),
            ],
        }
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for WorkflowKind {
    type Err = UnknownWorkflowKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.id() == s)
            .ok_or_else(|| UnknownWorkflowKind(s.to_string()))
    }
}

/// Error for a workflow type string that is not supported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownWorkflowKind(pub String);

impl fmt::Display for UnknownWorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown workflow type: {}", self.0)
    }
}

impl std::error::Error for UnknownWorkflowKind {}

/// One step of a workflow definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Invoke one agent and await it before proceeding.
    Sequential(AgentKind),
    /// Invoke all agents concurrently; join before proceeding.
    Parallel(Vec<AgentKind>),
    /// Terminal synthesis stage receiving every prior output.
    Aggregate(AgentKind),
}

impl Stage {
    /// Agents invoked by this stage.
    #[must_use]
    pub fn agents(&self) -> Vec<AgentKind> {
        match self {
            Self::Sequential(a) | Self::Aggregate(a) => vec![*a],
            Self::Parallel(agents) => agents.clone(),
        }
    }
}

/// Workflow execution status.
///
/// Transitions are monotonic: `Pending → Running → {Completed | Failed}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Accepted, not yet executing.
    Pending,
    /// Stage graph executing.
    Running,
    /// All stages succeeded (possibly degraded).
    Completed,
    /// A fatal stage failure or cancellation occurred.
    Failed,
}

impl WorkflowStatus {
    /// Whether this status is terminal.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `next` is a legal successor of `self`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Running, Self::Completed | Self::Failed)
        )
    }
}

/// How deep the analysis should go.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisDepth {
    /// Fast, shallow pass.
    Quick,
    /// Full analysis (default).
    #[default]
    Comprehensive,
}

/// Caller-supplied workflow parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowParams {
    /// Topic under analysis. Must be non-empty.
    pub topic: String,
    /// Analysis depth.
    #[serde(default)]
    pub depth: AnalysisDepth,
    /// Optional timeframe hint (e.g. `"5_years"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<String>,
    /// Optional focus areas.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub focus_areas: Vec<String>,
}

impl WorkflowParams {
    /// Build parameters for `topic` with defaults everywhere else.
    #[must_use]
    pub fn for_topic(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            depth: AnalysisDepth::default(),
            timeframe: None,
            focus_areas: Vec::new(),
        }
    }
}

/// The synthesized terminal output of a workflow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedResult {
    /// Executive summary produced by the aggregation agent.
    pub summary: String,
    /// Heuristic overall confidence in [0, 1].
    pub confidence: f64,
}

/// Point-in-time view of a workflow record (wire type).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSnapshot {
    /// Generated workflow id.
    pub id: String,
    /// Workflow type.
    pub workflow_type: WorkflowKind,
    /// Current status.
    pub status: WorkflowStatus,
    /// Progress in [0, 100], proportional to completed stages.
    pub progress: u8,
    /// Whether any parallel stage continued past partial failures.
    pub degraded: bool,
    /// ISO 8601 submission timestamp.
    pub started_at: String,
    /// Terminal result, present once Completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AggregatedResult>,
    /// Human-readable failure description, present once Failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Point-in-time view of one agent (wire type).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSnapshot {
    /// Agent id.
    pub agent: AgentKind,
    /// Current status.
    pub status: AgentStatus,
    /// What the agent is doing right now, if anything.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_task: Option<String>,
    /// Number of buffered thoughts.
    pub thought_count: usize,
    /// Most recent thought content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_thought: Option<String>,
}

/// Full system snapshot delivered to a newly connected observer in place
/// of event replay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSnapshot {
    /// Current state of every agent, in roster order.
    pub agents: Vec<AgentSnapshot>,
    /// Recent workflow records, most recent first.
    pub workflows: Vec<WorkflowSnapshot>,
    /// Recent insights, most recent first.
    pub insights: Vec<Insight>,
}
