//! Runtime error types.

use foresight_core::agents::AgentKind;
use thiserror::Error;

/// An agent invocation failure as seen by the orchestrator.
///
/// Transient provider failures are retried inside the agent and never
/// surface here unless the retry budget is exhausted.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AgentError {
    /// A fatal provider failure (auth, malformed request, undecodable
    /// response). Never retried.
    #[error("{agent} failed: {message}")]
    Fatal {
        /// The failing agent.
        agent: AgentKind,
        /// Human-readable description.
        message: String,
    },

    /// A transient failure that persisted through every retry.
    #[error("{agent} exhausted retries: {message}")]
    ExhaustedRetries {
        /// The failing agent.
        agent: AgentKind,
        /// Description of the last failure.
        message: String,
    },

    /// The workflow was cancelled while this agent was in flight.
    #[error("{agent} cancelled")]
    Cancelled {
        /// The cancelled agent.
        agent: AgentKind,
    },
}

impl AgentError {
    /// The agent this failure belongs to.
    #[must_use]
    pub fn agent(&self) -> AgentKind {
        match self {
            Self::Fatal { agent, .. }
            | Self::ExhaustedRetries { agent, .. }
            | Self::Cancelled { agent } => *agent,
        }
    }
}

/// Orchestrator-level errors.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The submission was rejected before a workflow record was created.
    #[error("validation failed: {0}")]
    Validation(String),

    /// No workflow record exists for the id.
    #[error("unknown workflow: {0}")]
    WorkflowNotFound(String),
}
