//! # foresight-runtime
//!
//! Workflow orchestration engine: agent invocation, stage-graph execution,
//! and event broadcasting.
//!
//! - **Agents**: process-wide roster, one [`agents::agent::Agent`] per
//!   [`foresight_core::agents::AgentKind`]. Each invocation drives the
//!   status lifecycle, retries transient provider failures with backoff,
//!   and records bounded thought/collaboration history.
//! - **Workflow**: declarative stage graphs executed sequentially with
//!   parallel fan-out/join and the partial-failure (degraded) policy.
//! - **Registry**: injected bounded in-memory store of workflow records.
//! - **Orchestrator**: submission, per-workflow cancellation, global
//!   provider-call concurrency cap, snapshot construction.
//! - **Emitter**: non-blocking broadcast of [`foresight_core::events::ForesightEvent`]
//!   to subscribed observers.
//!
//! ## Crate Position
//!
//! Aggregation layer. Depends on: foresight-core, foresight-llm,
//! foresight-settings. Depended on by: foresight-server.

#![deny(unsafe_code)]

pub mod agents;
pub mod emitter;
pub mod errors;
pub mod orchestrator;
pub mod workflow;

// Re-export main public API
pub use agents::agent::{Agent, AgentOutput, StageContext};
pub use agents::roster::AgentRoster;
pub use emitter::EventEmitter;
pub use errors::{AgentError, RuntimeError};
pub use orchestrator::Orchestrator;
pub use workflow::registry::{WorkflowRecord, WorkflowRegistry};
