//! Drives one workflow's stage graph to a terminal state.

use std::collections::BTreeMap;
use std::sync::Arc;

use foresight_core::agents::AgentKind;
use foresight_core::events::{BaseEvent, ForesightEvent};
use foresight_core::workflows::{
    AggregatedResult, Stage, WorkflowKind, WorkflowParams, WorkflowStatus,
};
use metrics::counter;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::agents::agent::{AgentOutput, StageContext};
use crate::agents::roster::AgentRoster;
use crate::emitter::EventEmitter;
use crate::errors::AgentError;
use crate::workflow::registry::WorkflowRegistry;

/// Error string recorded when a workflow is cancelled mid-flight.
pub const CANCELLED_ERROR: &str = "cancelled";

/// Execute the stage graph for one workflow record.
///
/// Always leaves the record in a terminal state: Completed (possibly
/// degraded) or Failed. Spawned by the orchestrator; never panics back
/// into the caller.
#[instrument(skip_all, fields(workflow = %id, kind = %kind))]
pub async fn run(
    id: String,
    kind: WorkflowKind,
    params: WorkflowParams,
    roster: Arc<AgentRoster>,
    registry: Arc<WorkflowRegistry>,
    emitter: Arc<EventEmitter>,
    cancel: CancellationToken,
) {
    let _ = registry.update(&id, |r| {
        let _ = r.transition(WorkflowStatus::Running);
    });
    let _ = emitter.emit(ForesightEvent::WorkflowStarted {
        base: BaseEvent::for_workflow(&id),
        workflow_type: kind,
        topic: params.topic.clone(),
    });

    let stages = kind.stages();
    let total = stages.len();
    let mut outputs: BTreeMap<AgentKind, AgentOutput> = BTreeMap::new();
    let mut degraded = false;
    let mut result = None;

    for (index, stage) in stages.into_iter().enumerate() {
        if cancel.is_cancelled() {
            finish_failed(&id, &registry, &emitter, &roster, CANCELLED_ERROR);
            return;
        }

        let ctx = StageContext {
            workflow_id: id.clone(),
            workflow_type: kind,
            params: params.clone(),
            upstream: outputs.clone(),
        };

        match execute_stage(&stage, &ctx, &roster, &cancel).await {
            StageOutcome::Complete {
                produced,
                partial_failures,
            } => {
                if partial_failures {
                    degraded = true;
                }
                if let Stage::Aggregate(_) = stage {
                    if let Some(out) = produced.first() {
                        result = Some(AggregatedResult {
                            summary: out.text.clone(),
                            confidence: out.confidence,
                        });
                    }
                }
                for out in produced {
                    let _ = outputs.insert(out.agent, out);
                }
            }
            StageOutcome::Cancelled => {
                finish_failed(&id, &registry, &emitter, &roster, CANCELLED_ERROR);
                return;
            }
            StageOutcome::Failed(message) => {
                finish_failed(&id, &registry, &emitter, &roster, &message);
                return;
            }
        }

        let completed = index + 1;
        let progress = progress_for(completed, total);
        let _ = registry.update(&id, |r| {
            r.progress = progress;
            r.degraded = degraded;
            r.outputs.clone_from(&outputs);
        });
        let _ = emitter.emit(ForesightEvent::WorkflowProgress {
            base: BaseEvent::for_workflow(&id),
            progress,
            completed_stages: completed,
            total_stages: total,
        });
    }

    // Every stage graph terminates in an aggregate stage, so a run that
    // gets here has a result.
    let result = result.unwrap_or_else(|| AggregatedResult {
        summary: String::new(),
        confidence: 0.0,
    });
    let _ = registry.update(&id, |r| {
        r.degraded = degraded;
        r.result = Some(result.clone());
        let _ = r.transition(WorkflowStatus::Completed);
    });
    counter!("workflows_completed_total", "kind" => kind.id()).increment(1);
    info!(degraded, "workflow completed");
    let _ = emitter.emit(ForesightEvent::WorkflowCompleted {
        base: BaseEvent::for_workflow(&id),
        result,
        degraded,
    });
    roster.reset_all(&emitter);
}

enum StageOutcome {
    /// Stage finished with at least one successful output.
    Complete {
        produced: Vec<AgentOutput>,
        partial_failures: bool,
    },
    /// The workflow's cancellation token fired.
    Cancelled,
    /// The stage failed fatally; the workflow must fail.
    Failed(String),
}

async fn execute_stage(
    stage: &Stage,
    ctx: &StageContext,
    roster: &AgentRoster,
    cancel: &CancellationToken,
) -> StageOutcome {
    match stage {
        // A single-agent stage has no fallback: its failure fails the run.
        Stage::Sequential(kind) | Stage::Aggregate(kind) => {
            match roster.agent(*kind).invoke(ctx, cancel).await {
                Ok(out) => StageOutcome::Complete {
                    produced: vec![out],
                    partial_failures: false,
                },
                Err(AgentError::Cancelled { .. }) => StageOutcome::Cancelled,
                Err(e) => StageOutcome::Failed(e.to_string()),
            }
        }
        Stage::Parallel(kinds) => {
            let invocations = kinds.iter().map(|kind| {
                let agent = roster.agent(*kind);
                async move { agent.invoke(ctx, cancel).await }
            });
            let results = futures::future::join_all(invocations).await;

            let mut produced = Vec::new();
            let mut failures = Vec::new();
            for result in results {
                match result {
                    Ok(out) => produced.push(out),
                    Err(AgentError::Cancelled { .. }) => return StageOutcome::Cancelled,
                    Err(e) => failures.push(e),
                }
            }

            if produced.is_empty() {
                let first = failures
                    .first()
                    .map_or_else(|| "empty parallel stage".to_string(), ToString::to_string);
                return StageOutcome::Failed(first);
            }
            if !failures.is_empty() {
                warn!(
                    workflow = %ctx.workflow_id,
                    failed = failures.len(),
                    succeeded = produced.len(),
                    "parallel stage degraded"
                );
            }
            StageOutcome::Complete {
                partial_failures: !failures.is_empty(),
                produced,
            }
        }
    }
}

fn finish_failed(
    id: &str,
    registry: &WorkflowRegistry,
    emitter: &EventEmitter,
    roster: &AgentRoster,
    error: &str,
) {
    let _ = registry.update(id, |r| {
        r.error = Some(error.to_string());
        let _ = r.transition(WorkflowStatus::Failed);
    });
    counter!("workflows_failed_total").increment(1);
    warn!(error, "workflow failed");
    let _ = emitter.emit(ForesightEvent::WorkflowFailed {
        base: BaseEvent::for_workflow(id),
        error: error.to_string(),
    });
    roster.reset_all(emitter);
}

/// Progress proportional to completed stages, in [0, 100].
fn progress_for(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    u8::try_from(completed * 100 / total).unwrap_or(100)
}
