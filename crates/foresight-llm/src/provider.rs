//! The provider trait and error taxonomy.
//!
//! Agents treat the model as an opaque text-completion service: one
//! structured prompt in, text out. Failures are classified so the agent
//! retry loop can distinguish transient conditions (worth backing off
//! and retrying) from fatal ones (propagate immediately).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// A structured completion request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// System prompt (agent identity + instructions).
    pub system: String,
    /// User prompt (task + stage context).
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Output token budget.
    pub max_tokens: u32,
}

/// A completion response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated text.
    pub text: String,
    /// Model that produced it.
    pub model: String,
}

/// Provider failure taxonomy.
///
/// [`is_transient`](Self::is_transient) decides retry eligibility:
/// rate limits, timeouts, and transient network failures are retried
/// with backoff; everything else aborts the call immediately.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Upstream rate limit hit.
    #[error("rate limited by provider")]
    RateLimited {
        /// Server-suggested wait, when the response carried one.
        retry_after_ms: Option<u64>,
    },

    /// The call exceeded its deadline.
    #[error("provider call timed out")]
    Timeout,

    /// Connection-level failure likely to resolve on retry.
    #[error("transient network error: {message}")]
    TransientNetwork {
        /// Underlying error description.
        message: String,
    },

    /// The request was malformed or rejected. Not retried.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Provider-reported rejection reason.
        message: String,
    },

    /// Authentication or authorization failure. Not retried.
    #[error("authentication failed: {message}")]
    Auth {
        /// Provider-reported reason.
        message: String,
    },

    /// Response body could not be decoded. Not retried.
    #[error("failed to decode provider response")]
    Json(#[from] serde_json::Error),

    /// Unclassifiable failure. Not retried.
    #[error("provider error: {message}")]
    Unknown {
        /// Underlying error description.
        message: String,
    },
}

impl ProviderError {
    /// Whether the agent retry loop should retry this failure.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Timeout | Self::TransientNetwork { .. }
        )
    }
}

/// An opaque text-completion service.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Perform one completion call.
    async fn complete(&self, request: &CompletionRequest) -> ProviderResult<CompletionResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(ProviderError::RateLimited { retry_after_ms: None }.is_transient());
        assert!(ProviderError::Timeout.is_transient());
        assert!(
            ProviderError::TransientNetwork {
                message: "reset".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn fatal_classification() {
        assert!(
            !ProviderError::Auth {
                message: "bad key".into()
            }
            .is_transient()
        );
        assert!(
            !ProviderError::InvalidRequest {
                message: "bad body".into()
            }
            .is_transient()
        );
        assert!(
            !ProviderError::Unknown {
                message: "?".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn errors_render_human_readable() {
        let err = ProviderError::TransientNetwork {
            message: "connection reset".into(),
        };
        assert_eq!(err.to_string(), "transient network error: connection reset");
    }
}
