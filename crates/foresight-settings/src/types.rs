//! Settings type definitions with compiled defaults.

use foresight_core::retry::RetryConfig;
use serde::{Deserialize, Serialize};

/// Root settings object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForesightSettings {
    /// HTTP/WebSocket server settings.
    pub server: ServerSettings,
    /// LLM provider settings.
    pub provider: ProviderSettings,
    /// Orchestration engine settings.
    pub orchestrator: OrchestratorSettings,
}

/// HTTP/WebSocket server settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8900,
        }
    }
}

/// LLM provider settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderSettings {
    /// API base URL (no trailing slash).
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// Bearer token. Usually supplied via `FORESIGHT_PROVIDER_API_KEY`.
    pub api_key: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Output token budget per call.
    pub max_tokens: u32,
    /// Hard per-call deadline in seconds.
    pub call_timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4.1-mini".to_string(),
            api_key: String::new(),
            temperature: 0.1,
            max_tokens: 1_024,
            call_timeout_secs: 60,
        }
    }
}

/// Orchestration engine settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrchestratorSettings {
    /// Global cap on simultaneous in-flight provider calls.
    pub max_concurrent_calls: usize,
    /// Retry policy for transient provider failures.
    pub retry: RetryConfig,
    /// Workflow registry capacity (oldest evicted beyond this).
    pub registry_capacity: usize,
    /// Per-agent thought ring-buffer capacity.
    pub thought_buffer: usize,
    /// Per-agent collaboration ring-buffer capacity.
    pub collaboration_buffer: usize,
    /// Global insight feed capacity.
    pub insight_feed_capacity: usize,
    /// Broadcast channel capacity for the event emitter.
    pub event_channel_capacity: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            max_concurrent_calls: 4,
            retry: RetryConfig::default(),
            registry_capacity: 256,
            thought_buffer: 20,
            collaboration_buffer: 10,
            insight_feed_capacity: 100,
            event_channel_capacity: 1_024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = ForesightSettings::default();
        assert_eq!(settings.server.port, 8900);
        assert_eq!(settings.orchestrator.max_concurrent_calls, 4);
        assert_eq!(settings.orchestrator.thought_buffer, 20);
        assert_eq!(settings.orchestrator.collaboration_buffer, 10);
        assert_eq!(settings.orchestrator.retry.max_attempts, 3);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: ForesightSettings =
            serde_json::from_str(r#"{"server": {"port": 9000}}"#).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.provider.model, "gpt-4.1-mini");
    }
}
