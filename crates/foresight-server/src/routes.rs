//! HTTP API handlers and router assembly.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use foresight_core::workflows::{
    AgentSnapshot, WorkflowKind, WorkflowParams, WorkflowSnapshot,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::errors::ApiError;
use crate::{AppState, ws};

/// Default and maximum page sizes for workflow listing.
const DEFAULT_LIST_LIMIT: usize = 20;
const MAX_LIST_LIMIT: usize = 100;

/// Workflow submission body. Parameters sit at the top level next to
/// the workflow type: `{"workflowType": "...", "topic": "...", ...}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    /// Which workflow to run.
    pub workflow_type: WorkflowKind,
    /// Parameters passed through to every stage.
    #[serde(flatten)]
    pub params: WorkflowParams,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<usize>,
}

/// Assemble the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/workflows", post(submit_workflow).get(list_workflows))
        .route("/api/workflows/{id}", get(workflow_status))
        .route("/api/workflows/{id}/cancel", post(cancel_workflow))
        .route("/api/agents", get(agent_states))
        .route("/ws", get(ws::upgrade))
        .route("/metrics", get(render_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// `POST /api/workflows`: accept a workflow and return its initial
/// snapshot. Execution continues in the background.
async fn submit_workflow(
    State(state): State<AppState>,
    Json(body): Json<SubmitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = state.orchestrator.submit(body.workflow_type, body.params)?;
    let snapshot = state.orchestrator.status(&id)?;
    Ok((StatusCode::ACCEPTED, Json(snapshot)))
}

/// `GET /api/workflows/{id}`
async fn workflow_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WorkflowSnapshot>, ApiError> {
    Ok(Json(state.orchestrator.status(&id)?))
}

/// `GET /api/workflows`: recent workflows, most recent first.
async fn list_workflows(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<WorkflowSnapshot>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);
    Json(state.orchestrator.list_recent(limit))
}

/// `POST /api/workflows/{id}/cancel`: request cancellation. `cancelled`
/// is false when the workflow already reached a terminal state.
async fn cancel_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    // 404 for ids the registry has never seen
    let _ = state.orchestrator.status(&id)?;
    let cancelled = state.orchestrator.cancel(&id);
    Ok(Json(json!({ "id": id, "cancelled": cancelled })))
}

/// `GET /api/agents`: current state of every agent, in roster order.
async fn agent_states(State(state): State<AppState>) -> Json<Vec<AgentSnapshot>> {
    Json(state.orchestrator.snapshot().agents)
}

/// `GET /metrics`: Prometheus text format.
async fn render_metrics(State(state): State<AppState>) -> String {
    state.metrics.render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use foresight_llm::{CompletionRequest, CompletionResponse, Provider, ProviderResult};
    use foresight_runtime::Orchestrator;
    use foresight_settings::ForesightSettings;
    use http_body_util::BodyExt;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::ServiceExt;

    struct EchoProvider;

    #[async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> ProviderResult<CompletionResponse> {
            Ok(CompletionResponse {
                text: "Findings.\nCONFIDENCE: 80%".into(),
                model: "echo-1".into(),
            })
        }
    }

    fn app() -> (Router, AppState) {
        let mut settings = ForesightSettings::default();
        settings.orchestrator.retry.base_delay_ms = 1;
        settings.orchestrator.retry.max_delay_ms = 2;
        let state = AppState {
            orchestrator: Arc::new(Orchestrator::new(Arc::new(EchoProvider), &settings)),
            metrics: PrometheusBuilder::new().build_recorder().handle(),
        };
        (router(state.clone()), state)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn submit_returns_accepted_snapshot() {
        let (app, _state) = app();
        let response = app
            .oneshot(post_json(
                "/api/workflows",
                json!({ "workflowType": "trend_analysis", "topic": "spatial computing" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = body_json(response).await;
        assert!(body["id"].as_str().unwrap().starts_with("wf_"));
        assert_eq!(body["workflowType"], "trend_analysis");
        assert_eq!(body["progress"], 0);
    }

    #[tokio::test]
    async fn submit_rejects_empty_topic() {
        let (app, _state) = app();
        let response = app
            .oneshot(post_json(
                "/api/workflows",
                json!({ "workflowType": "trend_analysis", "topic": "  " }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("topic"));
    }

    #[tokio::test]
    async fn submit_rejects_unknown_workflow_type() {
        let (app, _state) = app();
        let response = app
            .oneshot(post_json(
                "/api/workflows",
                json!({ "workflowType": "moonshot_planning", "topic": "x" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn status_of_unknown_workflow_is_404() {
        let (app, _state) = app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/workflows/wf_missing")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cancel_of_unknown_workflow_is_404() {
        let (app, _state) = app();
        let response = app
            .oneshot(post_json("/api/workflows/wf_missing/cancel", json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn listing_includes_submitted_workflow() {
        let (app, state) = app();
        let id = state
            .orchestrator
            .submit(
                WorkflowKind::ScenarioCreation,
                WorkflowParams::for_topic("circular manufacturing"),
            )
            .unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/workflows?limit=5")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body[0]["id"], id);
    }

    #[tokio::test]
    async fn cancel_after_completion_reports_false() {
        let (app, state) = app();
        let id = state
            .orchestrator
            .submit(
                WorkflowKind::ScenarioCreation,
                WorkflowParams::for_topic("urban mobility"),
            )
            .unwrap();
        // EchoProvider resolves instantly; wait for the terminal state
        for _ in 0..200 {
            if state.orchestrator.status(&id).unwrap().status.is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let response = app
            .oneshot(post_json(&format!("/api/workflows/{id}/cancel"), json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["cancelled"], false);
    }

    #[tokio::test]
    async fn agents_endpoint_lists_the_full_roster() {
        let (app, _state) = app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/agents")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let agents = body.as_array().unwrap();
        assert_eq!(agents.len(), 6);
        assert_eq!(agents[0]["agent"], "trend_scanner");
        assert_eq!(agents[0]["status"], "idle");
    }

    #[tokio::test]
    async fn metrics_endpoint_renders_text() {
        let (app, _state) = app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
