//! # foresight-core
//!
//! Foundation vocabulary for the foresight multi-agent analysis engine.
//!
//! This crate provides the shared types all other foresight crates depend on:
//!
//! - **Agents**: [`agents::AgentKind`] closed roster enum, [`agents::AgentStatus`],
//!   bounded [`agents::Thought`] / [`agents::Collaboration`] records
//! - **Workflows**: [`workflows::WorkflowKind`] with declarative stage graphs,
//!   [`workflows::WorkflowStatus`] state machine, snapshot wire types
//! - **Events**: [`events::ForesightEvent`] broadcast to live observers,
//!   [`events::EventChannel`] subscription scopes
//! - **Retry**: [`retry::RetryConfig`] and backoff calculation
//! - **Insights**: [`insight::Insight`] and the bounded [`insight::InsightFeed`]
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other foresight crates.

#![deny(unsafe_code)]

pub mod agents;
pub mod events;
pub mod insight;
pub mod retry;
pub mod workflows;
