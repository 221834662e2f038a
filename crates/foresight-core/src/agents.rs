//! The fixed agent roster and per-agent observable state vocabulary.
//!
//! Agents are a closed set: [`AgentKind`] enumerates every specialist the
//! engine knows about, so stage graphs are exhaustiveness-checked at
//! compile time instead of dispatching on strings.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The six specialist agents, identified by stable snake_case ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Emerging trends and weak-signal scanner.
    TrendScanner,
    /// AI and agentic-systems futurist.
    AiFuturist,
    /// Customer behavior evolution analyst.
    CustomerInsight,
    /// Emerging technology impact evaluator.
    TechImpact,
    /// Organizational transformation strategist.
    OrgTransformation,
    /// Scenario synthesizer and strategic advisor.
    Synthesis,
}

impl AgentKind {
    /// Every agent, in roster order.
    pub const ALL: [Self; 6] = [
        Self::TrendScanner,
        Self::AiFuturist,
        Self::CustomerInsight,
        Self::TechImpact,
        Self::OrgTransformation,
        Self::Synthesis,
    ];

    /// Stable string id (wire format, channel names, output maps).
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::TrendScanner => "trend_scanner",
            Self::AiFuturist => "ai_futurist",
            Self::CustomerInsight => "customer_insight",
            Self::TechImpact => "tech_impact",
            Self::OrgTransformation => "org_transformation",
            Self::Synthesis => "synthesis",
        }
    }

    /// Role line used in the system prompt.
    #[must_use]
    pub fn role(self) -> &'static str {
        match self {
            Self::TrendScanner => "Emerging Trends and Weak Signal Scanner",
            Self::AiFuturist => "AI and Agentic Systems Futurist",
            Self::CustomerInsight => "Customer Behavior Evolution Analyst",
            Self::TechImpact => "Emerging Technology Impact Evaluator",
            Self::OrgTransformation => "Organizational Transformation Strategist",
            Self::Synthesis => "Future Scenario Synthesizer and Strategic Advisor",
        }
    }

    /// Goal line used in the system prompt.
    #[must_use]
    pub fn goal(self) -> &'static str {
        match self {
            Self::TrendScanner => {
                "Identify weak signals and emerging patterns that will shape future customer experiences"
            }
            Self::AiFuturist => {
                "Anticipate how AI and autonomous agents will reshape products, services, and markets"
            }
            Self::CustomerInsight => {
                "Predict how customer behaviors and expectations will evolve over time"
            }
            Self::TechImpact => {
                "Evaluate which emerging technologies will matter, when, and for whom"
            }
            Self::OrgTransformation => {
                "Model how organizations must change structure and process to stay competitive"
            }
            Self::Synthesis => {
                "Weave the other agents' findings into coherent scenarios and strategic recommendations"
            }
        }
    }

    /// Instruction block appended to the system prompt.
    #[must_use]
    pub fn instructions(self) -> &'static str {
        match self {
            Self::TrendScanner => {
                "Scan for weak signals across research, patents, startup activity, and cultural \
                 movements. Classify each signal (convergence, divergence, acceleration, reversal, \
                 emergence, recurrence) and state how confident you are that it matters."
            }
            Self::AiFuturist => {
                "Analyze the AI and agentic-systems implications of the topic. Focus on capability \
                 trajectories, human-agent collaboration patterns, and second-order market effects."
            }
            Self::CustomerInsight => {
                "Analyze how the topic shifts customer behavior, expectations, and trust. Ground \
                 claims in observable behavior changes rather than stated preferences."
            }
            Self::TechImpact => {
                "Evaluate the enabling and disrupted technologies behind the topic. Map maturity, \
                 adoption barriers, and realistic timelines."
            }
            Self::OrgTransformation => {
                "Assess what the topic demands of organizational structure, skills, and operating \
                 models, and how ready typical organizations are for it."
            }
            Self::Synthesis => {
                "You receive the findings of every other agent. Produce an executive summary, the \
                 key cross-domain insights, and concrete strategic recommendations. Resolve \
                 conflicts between inputs explicitly rather than averaging them away."
            }
        }
    }

    /// Human-readable `currentTask` line for a stage working on `topic`.
    #[must_use]
    pub fn task_description(self, topic: &str) -> String {
        match self {
            Self::TrendScanner => format!("Scanning for weak signals: {topic}"),
            Self::AiFuturist => format!("Analyzing AI implications: {topic}"),
            Self::CustomerInsight => format!("Analyzing behavior shifts: {topic}"),
            Self::TechImpact => format!("Evaluating technology impact: {topic}"),
            Self::OrgTransformation => format!("Assessing transformation readiness: {topic}"),
            Self::Synthesis => format!("Synthesizing insights: {topic}"),
        }
    }

    /// Fallback confidence when the model does not report one.
    ///
    /// Confidence values in this system are an agent-level heuristic, not
    /// a calibrated model probability. See [`parse_confidence`].
    #[must_use]
    pub fn default_confidence(self) -> f64 {
        match self {
            Self::Synthesis => 0.75,
            _ => 0.7,
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for AgentKind {
    type Err = UnknownAgent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.id() == s)
            .ok_or_else(|| UnknownAgent(s.to_string()))
    }
}

/// Error for an agent id that is not in the roster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownAgent(pub String);

impl fmt::Display for UnknownAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown agent id: {}", self.0)
    }
}

impl std::error::Error for UnknownAgent {}

/// Observable status of an agent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Not working on anything.
    #[default]
    Idle,
    /// Building context / waiting on the model.
    Thinking,
    /// Processing upstream outputs.
    Analyzing,
    /// Consuming another agent's output.
    Collaborating,
    /// Last invocation failed.
    Error,
}

/// A recorded thought: summarized model output plus heuristic confidence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thought {
    /// Summarized content.
    pub content: String,
    /// Heuristic confidence in [0, 1].
    pub confidence: f64,
    /// ISO 8601 timestamp.
    pub timestamp: String,
}

impl Thought {
    /// Build a thought stamped with the current UTC time.
    #[must_use]
    pub fn now(content: impl Into<String>, confidence: f64) -> Self {
        Self {
            content: content.into(),
            confidence: confidence.clamp(0.0, 1.0),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A recorded exchange with another agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collaboration {
    /// The other agent's id.
    #[serde(rename = "with")]
    pub with_agent: String,
    /// What was exchanged.
    pub message: String,
    /// ISO 8601 timestamp.
    pub timestamp: String,
}

impl Collaboration {
    /// Build a collaboration record stamped with the current UTC time.
    #[must_use]
    pub fn now(with_agent: AgentKind, message: impl Into<String>) -> Self {
        Self {
            with_agent: with_agent.id().to_string(),
            message: message.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Push onto the back of a ring buffer, evicting from the front at `cap`.
pub fn push_bounded<T>(buf: &mut VecDeque<T>, item: T, cap: usize) {
    while buf.len() >= cap.max(1) {
        let _ = buf.pop_front();
    }
    buf.push_back(item);
}

/// Extract a heuristic confidence value from a model response.
///
/// Looks for a `CONFIDENCE: NN%` (or `CONFIDENCE: 0.NN`) line; values above
/// 1 are treated as percentages. Falls back to `default` when absent or
/// unparseable. The result is an explicit heuristic, not a statistically
/// meaningful quantity.
#[must_use]
pub fn parse_confidence(response: &str, default: f64) -> f64 {
    for line in response.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("CONFIDENCE:") {
            let raw = rest.trim().trim_end_matches('%');
            if let Ok(mut value) = raw.parse::<f64>() {
                if value > 1.0 {
                    value /= 100.0;
                }
                return value.clamp(0.0, 1.0);
            }
        }
    }
    default.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_ids_round_trip() {
        for kind in AgentKind::ALL {
            assert_eq!(kind.id().parse::<AgentKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_agent_id_rejected() {
        let err = "quant_oracle".parse::<AgentKind>().unwrap_err();
        assert_eq!(err.0, "quant_oracle");
    }

    #[test]
    fn kind_serializes_as_snake_case_id() {
        let json = serde_json::to_string(&AgentKind::TrendScanner).unwrap();
        assert_eq!(json, "\"trend_scanner\"");
    }

    #[test]
    fn push_bounded_never_exceeds_cap() {
        let mut buf = VecDeque::new();
        for i in 0..1000 {
            push_bounded(&mut buf, i, 20);
            assert!(buf.len() <= 20);
        }
        // Oldest entries evicted first
        assert_eq!(buf.front(), Some(&980));
        assert_eq!(buf.back(), Some(&999));
    }

    #[test]
    fn thought_clamps_confidence() {
        assert_eq!(Thought::now("t", 1.7).confidence, 1.0);
        assert_eq!(Thought::now("t", -0.2).confidence, 0.0);
    }

    // --- Confidence parsing ---

    #[test]
    fn parses_percent_confidence() {
        let response = "Key finding.\nCONFIDENCE: 85%";
        assert!((parse_confidence(response, 0.5) - 0.85).abs() < f64::EPSILON);
    }

    #[test]
    fn parses_fractional_confidence() {
        let response = "CONFIDENCE: 0.4";
        assert!((parse_confidence(response, 0.5) - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn bare_number_treated_as_percentage() {
        let response = "CONFIDENCE: 60";
        assert!((parse_confidence(response, 0.5) - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_confidence_uses_default() {
        assert!((parse_confidence("no marker here", 0.7) - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn garbage_confidence_uses_default() {
        assert!((parse_confidence("CONFIDENCE: high", 0.7) - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn confidence_always_in_unit_interval() {
        assert_eq!(parse_confidence("CONFIDENCE: 450%", 0.5), 1.0);
        assert_eq!(parse_confidence("CONFIDENCE: -3", 0.5), 0.0);
    }
}
