//! One agent invocation: status lifecycle, prompt construction, the
//! transient-retry loop, and event emission.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use foresight_core::agents::{AgentKind, AgentStatus, Collaboration, Thought, parse_confidence};
use foresight_core::events::{BaseEvent, ForesightEvent};
use foresight_core::insight::{Insight, InsightFeed};
use foresight_core::retry::RetryConfig;
use foresight_core::workflows::{AnalysisDepth, WorkflowKind, WorkflowParams};
use foresight_llm::{CompletionRequest, Provider, ProviderError};
use metrics::{counter, gauge};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::agents::state::AgentStateHandle;
use crate::emitter::EventEmitter;
use crate::errors::AgentError;

/// Max characters of model output carried into a thought/insight summary.
const SUMMARY_LIMIT: usize = 200;

/// Stage-specific invocation context.
#[derive(Clone, Debug)]
pub struct StageContext {
    /// Workflow driving this invocation.
    pub workflow_id: String,
    /// Workflow type.
    pub workflow_type: WorkflowKind,
    /// Caller-supplied parameters.
    pub params: WorkflowParams,
    /// Outputs of every prior stage, keyed by producing agent.
    pub upstream: BTreeMap<AgentKind, AgentOutput>,
}

/// A successful invocation's output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentOutput {
    /// Producing agent.
    pub agent: AgentKind,
    /// Full response text.
    pub text: String,
    /// Heuristic confidence in [0, 1].
    pub confidence: f64,
    /// Model that produced the response.
    pub model: String,
}

/// A stateful wrapper around one LLM completion call.
///
/// Shared process-wide: the same `Agent` serves every workflow that
/// names its kind. Outputs are workflow-scoped (returned to the caller);
/// only the observable status/thought state is shared.
pub struct Agent {
    kind: AgentKind,
    provider: Arc<dyn Provider>,
    state: Arc<AgentStateHandle>,
    emitter: Arc<EventEmitter>,
    insights: Arc<InsightFeed>,
    call_limits: Arc<Semaphore>,
    retry: RetryConfig,
    call_timeout: Duration,
    temperature: f64,
    max_tokens: u32,
}

impl Agent {
    /// Wire up an agent. Called once per kind by the roster.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        kind: AgentKind,
        provider: Arc<dyn Provider>,
        state: Arc<AgentStateHandle>,
        emitter: Arc<EventEmitter>,
        insights: Arc<InsightFeed>,
        call_limits: Arc<Semaphore>,
        retry: RetryConfig,
        call_timeout: Duration,
        temperature: f64,
        max_tokens: u32,
    ) -> Self {
        Self {
            kind,
            provider,
            state,
            emitter,
            insights,
            call_limits,
            retry,
            call_timeout,
            temperature,
            max_tokens,
        }
    }

    /// The agent's kind.
    #[must_use]
    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    /// Shared observable state.
    #[must_use]
    pub fn state(&self) -> &Arc<AgentStateHandle> {
        &self.state
    }

    /// Invoke the agent for one stage.
    ///
    /// Transient provider failures are retried with exponential backoff
    /// and are externally invisible; fatal failures and exhausted retries
    /// surface as [`AgentError`] after an `agent:error` event.
    #[instrument(skip_all, fields(agent = %self.kind, workflow = %ctx.workflow_id))]
    pub async fn invoke(
        &self,
        ctx: &StageContext,
        cancel: &CancellationToken,
    ) -> Result<AgentOutput, AgentError> {
        self.record_collaborations(ctx);

        // Agents digesting upstream output analyze; first-stage agents think.
        let working = if ctx.upstream.is_empty() {
            AgentStatus::Thinking
        } else {
            AgentStatus::Analyzing
        };
        let task = self.kind.task_description(&ctx.params.topic);
        self.state.set_status(working, Some(task.clone()));
        let _ = self.emitter.emit(ForesightEvent::AgentThinking {
            base: BaseEvent::for_agent(self.kind, &ctx.workflow_id),
            task,
        });

        let request = CompletionRequest {
            system: self.system_prompt(),
            prompt: self.user_prompt(ctx),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut last_transient = String::new();
        for attempt in 0..self.retry.max_attempts {
            if attempt > 0 {
                let delay = self.retry.jittered_delay_for(attempt - 1);
                debug!(attempt, ?delay, "backing off before retry");
                tokio::select! {
                    () = cancel.cancelled() => return Err(self.cancelled()),
                    () = tokio::time::sleep(delay) => {}
                }
            }

            match self.call_once(&request, &ctx.workflow_id, cancel).await {
                Ok(response) => return Ok(self.succeed(ctx, &response.text, response.model)),
                Err(CallFailure::Cancelled) => return Err(self.cancelled()),
                Err(CallFailure::Provider(e)) if e.is_transient() => {
                    warn!(attempt, error = %e, "transient provider failure");
                    counter!("provider_retries_total", "agent" => self.kind.id()).increment(1);
                    last_transient = e.to_string();
                }
                Err(CallFailure::Provider(e)) => {
                    return Err(self.fail(&ctx.workflow_id, AgentError::Fatal {
                        agent: self.kind,
                        message: e.to_string(),
                    }));
                }
            }
        }

        Err(self.fail(&ctx.workflow_id, AgentError::ExhaustedRetries {
            agent: self.kind,
            message: last_transient,
        }))
    }

    /// One provider attempt, bounded by the global call cap, the per-call
    /// timeout, and the workflow's cancellation token. Cancellation drops
    /// the in-flight HTTP future rather than waiting it out.
    async fn call_once(
        &self,
        request: &CompletionRequest,
        workflow_id: &str,
        cancel: &CancellationToken,
    ) -> Result<foresight_llm::CompletionResponse, CallFailure> {
        let permit = tokio::select! {
            () = cancel.cancelled() => return Err(CallFailure::Cancelled),
            permit = self.call_limits.acquire() => permit.map_err(|_| CallFailure::Cancelled)?,
        };

        gauge!("provider_calls_in_flight").increment(1.0);
        let outcome = tokio::select! {
            () = cancel.cancelled() => Err(CallFailure::Cancelled),
            result = tokio::time::timeout(self.call_timeout, self.provider.complete(request)) => {
                match result {
                    Ok(Ok(response)) => Ok(response),
                    Ok(Err(e)) => Err(CallFailure::Provider(e)),
                    Err(_) => Err(CallFailure::Provider(ProviderError::Timeout)),
                }
            }
        };
        gauge!("provider_calls_in_flight").decrement(1.0);
        drop(permit);

        if matches!(outcome, Err(CallFailure::Cancelled)) {
            debug!(workflow_id, "provider call abandoned on cancellation");
        }
        outcome
    }

    /// Record and announce collaborations for consumed upstream outputs.
    fn record_collaborations(&self, ctx: &StageContext) {
        if ctx.upstream.is_empty() {
            return;
        }
        self.state.set_status(AgentStatus::Collaborating, None);
        for source in ctx.upstream.keys() {
            let message = format!("receiving {} output for {}", source, ctx.params.topic);
            self.state
                .record_collaboration(Collaboration::now(*source, message.clone()));
            let _ = self.emitter.emit(ForesightEvent::AgentCollaboration {
                base: BaseEvent::for_agent(self.kind, &ctx.workflow_id),
                partner: *source,
                message,
            });
        }
    }

    /// Record the thought + insight, reset status, emit events.
    fn succeed(&self, ctx: &StageContext, text: &str, model: String) -> AgentOutput {
        let confidence = parse_confidence(text, self.kind.default_confidence());
        let summary = summarize(text);

        self.state.record_thought(Thought::now(&summary, confidence));
        self.state.set_status(AgentStatus::Idle, None);
        let _ = self.emitter.emit(ForesightEvent::AgentThought {
            base: BaseEvent::for_agent(self.kind, &ctx.workflow_id),
            content: summary.clone(),
            confidence,
        });

        let insight = Insight::new(self.kind, summary, confidence);
        self.insights.push(insight.clone());
        let _ = self.emitter.emit(ForesightEvent::InsightAdded {
            base: BaseEvent::for_agent(self.kind, &ctx.workflow_id),
            insight,
        });

        AgentOutput {
            agent: self.kind,
            text: text.to_string(),
            confidence,
            model,
        }
    }

    /// Mark the error state and emit `agent:error`.
    fn fail(&self, workflow_id: &str, error: AgentError) -> AgentError {
        counter!("agent_errors_total", "agent" => self.kind.id()).increment(1);
        self.state.set_status(AgentStatus::Error, None);
        let _ = self.emitter.emit(ForesightEvent::AgentError {
            base: BaseEvent::for_agent(self.kind, workflow_id),
            message: error.to_string(),
        });
        error
    }

    /// Cancellation resets to Idle without an error event. The workflow
    /// announces the terminal state, not each abandoned agent.
    fn cancelled(&self) -> AgentError {
        self.state.set_status(AgentStatus::Idle, None);
        AgentError::Cancelled { agent: self.kind }
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are {name}, an AI analysis agent.\n\n\
             Role: {role}\n\
             Goal: {goal}\n\n\
             {instructions}\n\n\
             Guidelines:\n\
             1. Stay focused on your role and goal\n\
             2. Think step-by-step through problems\n\
             3. Be specific and actionable\n\
             4. Express uncertainty when appropriate\n\
             5. End your response with a line `CONFIDENCE: NN%` estimating \
             how confident you are in your findings",
            name = self.kind.role(),
            role = self.kind.role(),
            goal = self.kind.goal(),
            instructions = self.kind.instructions(),
        )
    }

    fn user_prompt(&self, ctx: &StageContext) -> String {
        let mut prompt = String::new();
        let _ = writeln!(prompt, "{}", self.kind.task_description(&ctx.params.topic));
        let _ = writeln!(prompt, "\nTopic: {}", ctx.params.topic);
        let depth = match ctx.params.depth {
            AnalysisDepth::Quick => "quick",
            AnalysisDepth::Comprehensive => "comprehensive",
        };
        let _ = writeln!(prompt, "Analysis depth: {depth}");
        if let Some(timeframe) = &ctx.params.timeframe {
            let _ = writeln!(prompt, "Timeframe: {timeframe}");
        }
        if !ctx.params.focus_areas.is_empty() {
            let _ = writeln!(prompt, "Focus areas: {}", ctx.params.focus_areas.join(", "));
        }
        for (source, output) in &ctx.upstream {
            let _ = writeln!(prompt, "\n## Findings from {source}\n{}", output.text);
        }
        prompt
    }
}

enum CallFailure {
    Provider(ProviderError),
    Cancelled,
}

/// First non-empty line of a response, truncated on a char boundary.
fn summarize(text: &str) -> String {
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default();
    match line.char_indices().nth(SUMMARY_LIMIT) {
        Some((idx, _)) => line[..idx].to_string(),
        None => line.to_string(),
    }
}
