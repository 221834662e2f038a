//! Live event streaming over WebSocket.
//!
//! Each connection gets a `system:state` snapshot first, then the
//! filtered event stream. Delivery is best-effort: a client that cannot
//! keep up lags its broadcast receiver and loses the skipped events
//! rather than slowing the engine down.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use foresight_core::events::{BaseEvent, EventChannel, ForesightEvent};
use metrics::{counter, gauge};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::AppState;
use crate::metrics::{
    EVENTS_DROPPED_TOTAL, WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_DISCONNECTIONS_TOTAL,
};

/// Connection query parameters.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Initial channel: `all`, `agent:<id>`, or `workflow:<id>`.
    /// Unrecognized values fall back to `all`.
    channel: Option<String>,
}

/// `GET /ws` upgrade handler.
pub async fn upgrade(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    let channel = query
        .channel
        .as_deref()
        .and_then(EventChannel::parse)
        .unwrap_or(EventChannel::All);
    ws.on_upgrade(move |socket| stream_events(socket, state, channel))
}

async fn stream_events(mut socket: WebSocket, state: AppState, mut channel: EventChannel) {
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);

    // Subscribe before snapshotting so nothing falls in the gap.
    let mut rx = state.orchestrator.subscribe();
    let snapshot = ForesightEvent::SystemState {
        base: BaseEvent::broadcast(),
        snapshot: state.orchestrator.snapshot(),
    };

    if send_event(&mut socket, &snapshot).await.is_ok() {
        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Ok(event) => {
                        if channel.matches(&event)
                            && send_event(&mut socket, &event).await.is_err()
                        {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        counter!(EVENTS_DROPPED_TOTAL).increment(skipped);
                        warn!(skipped, "slow websocket client dropped events");
                    }
                    Err(RecvError::Closed) => break,
                },
                incoming = socket.recv() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(next) = parse_subscribe(text.as_str()) {
                            debug!(channel = ?next, "client switched channel");
                            channel = next;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(error = %e, "websocket receive error");
                        break;
                    }
                },
            }
        }
    }

    counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
}

async fn send_event(socket: &mut WebSocket, event: &ForesightEvent) -> Result<(), axum::Error> {
    match serde_json::to_string(event) {
        Ok(json) => socket.send(Message::Text(json.into())).await,
        Err(e) => {
            // An unserializable event is a bug, not a connection problem.
            warn!(event_type = event.event_type(), error = %e, "failed to serialize event");
            Ok(())
        }
    }
}

/// Parse a `{"subscribe": "<channel>"}` control frame.
fn parse_subscribe(text: &str) -> Option<EventChannel> {
    #[derive(Deserialize)]
    struct Subscribe {
        subscribe: String,
    }
    serde_json::from_str::<Subscribe>(text)
        .ok()
        .and_then(|s| EventChannel::parse(&s.subscribe))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use foresight_core::agents::AgentKind;
    use foresight_core::workflows::{WorkflowKind, WorkflowParams, WorkflowStatus};
    use foresight_llm::{
        CompletionRequest, CompletionResponse, Provider, ProviderError, ProviderResult,
    };
    use foresight_runtime::Orchestrator;
    use foresight_settings::ForesightSettings;
    use futures::StreamExt;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tokio::sync::Semaphore;

    /// Provider whose calls block until the test hands out permits.
    struct GatedProvider {
        gate: Arc<Semaphore>,
    }

    #[async_trait]
    impl Provider for GatedProvider {
        fn name(&self) -> &str {
            "gated"
        }

        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> ProviderResult<CompletionResponse> {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|_| ProviderError::Unknown {
                    message: "gate closed".into(),
                })?;
            permit.forget();
            Ok(CompletionResponse {
                text: "Findings.\nCONFIDENCE: 70%".into(),
                model: "gated-1".into(),
            })
        }
    }

    #[tokio::test]
    async fn connecting_mid_workflow_gets_snapshot_then_live_events() {
        let gate = Arc::new(Semaphore::new(0));
        let mut settings = ForesightSettings::default();
        settings.orchestrator.retry.base_delay_ms = 1;
        settings.orchestrator.retry.max_delay_ms = 2;
        let state = AppState {
            orchestrator: Arc::new(Orchestrator::new(
                Arc::new(GatedProvider { gate: gate.clone() }),
                &settings,
            )),
            metrics: PrometheusBuilder::new().build_recorder().handle(),
        };
        let app = crate::routes::router(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let id = state
            .orchestrator
            .submit(
                WorkflowKind::TrendAnalysis,
                WorkflowParams::for_topic("ambient computing"),
            )
            .unwrap();
        // First stage is gated, so the run holds at Running / progress 0.
        for _ in 0..200 {
            if state.orchestrator.status(&id).unwrap().status == WorkflowStatus::Running {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let reference = state.orchestrator.status(&id).unwrap();
        assert_eq!(reference.status, WorkflowStatus::Running);

        let (mut socket, _response) =
            tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
                .await
                .unwrap();

        // The very first frame is the system:state snapshot, and it agrees
        // with the registry at connect time.
        let first = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("no snapshot frame")
            .unwrap()
            .unwrap();
        let frame: serde_json::Value = serde_json::from_str(first.to_text().unwrap()).unwrap();
        assert_eq!(frame["type"], "system:state");
        assert_eq!(frame["agents"].as_array().unwrap().len(), 6);
        let entry = frame["workflows"]
            .as_array()
            .unwrap()
            .iter()
            .find(|w| w["id"] == id.as_str())
            .expect("running workflow missing from snapshot")
            .clone();
        assert_eq!(entry["status"], "running");
        assert_eq!(
            entry["progress"].as_u64().unwrap(),
            u64::from(reference.progress)
        );

        // Unblock the provider; the live stream follows the snapshot and
        // never repeats it.
        gate.add_permits(64);
        loop {
            let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
                .await
                .expect("event stream stalled")
                .unwrap()
                .unwrap();
            let Ok(text) = message.to_text() else {
                continue;
            };
            let event: serde_json::Value = serde_json::from_str(text).unwrap();
            assert_ne!(event["type"], "system:state");
            if event["type"] == "workflow:completed" && event["workflow"] == id.as_str() {
                break;
            }
        }
    }

    #[test]
    fn subscribe_frames_parse_to_channels() {
        assert_eq!(
            parse_subscribe(r#"{"subscribe": "all"}"#),
            Some(EventChannel::All)
        );
        assert_eq!(
            parse_subscribe(r#"{"subscribe": "agent:synthesis"}"#),
            Some(EventChannel::Agent(AgentKind::Synthesis))
        );
        assert_eq!(
            parse_subscribe(r#"{"subscribe": "workflow:wf_42"}"#),
            Some(EventChannel::Workflow("wf_42".into()))
        );
    }

    #[test]
    fn malformed_subscribe_frames_are_ignored() {
        assert_eq!(parse_subscribe("not json"), None);
        assert_eq!(parse_subscribe(r#"{"subscribe": "everything"}"#), None);
        assert_eq!(parse_subscribe(r#"{"other": "all"}"#), None);
    }
}
