//! # foresight-server
//!
//! Axum HTTP + WebSocket surface over the orchestration engine.
//!
//! - **[`routes`]**: the REST API (workflow submission, status, listing,
//!   cancellation, agent states) and router assembly.
//! - **[`ws`]**: live event streaming with channel filtering and the
//!   `system:state` snapshot sent to each new connection.
//! - **[`metrics`]**: Prometheus recorder install and `/metrics` render.
//! - **[`errors`]**: the API error type mapped onto HTTP responses.
//!
//! ## Crate Position
//!
//! Outermost crate. Depends on every other foresight crate. The binary
//! entry point lives in `main.rs`.

#![deny(unsafe_code)]

pub mod errors;
pub mod metrics;
pub mod routes;
pub mod ws;

use std::sync::Arc;

use foresight_runtime::Orchestrator;
use metrics_exporter_prometheus::PrometheusHandle;

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    /// The orchestration engine.
    pub orchestrator: Arc<Orchestrator>,
    /// Handle rendering the `/metrics` endpoint.
    pub metrics: PrometheusHandle,
}
