//! Discrete units of agent output surfaced to observers, kept in a
//! bounded most-recent-first feed.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::agents::AgentKind;

/// Default feed capacity.
pub const DEFAULT_FEED_CAPACITY: usize = 100;

/// A discrete unit of agent output. Immutable after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    /// Unique insight id (UUID v7).
    pub id: String,
    /// Producing agent.
    pub agent: AgentKind,
    /// Insight content.
    pub content: String,
    /// Heuristic confidence in [0, 1].
    pub confidence: f64,
    /// ISO 8601 timestamp.
    pub timestamp: String,
    /// Ids of related insights. No producer cross-links insights today,
    /// so this is always empty and stays off the wire.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<String>,
}

impl Insight {
    /// Build a new insight stamped with the current UTC time.
    /// `related` starts empty; nothing in the engine populates it.
    #[must_use]
    pub fn new(agent: AgentKind, content: impl Into<String>, confidence: f64) -> Self {
        Self {
            id: format!("ins_{}", uuid::Uuid::now_v7().simple()),
            agent,
            content: content.into(),
            confidence: confidence.clamp(0.0, 1.0),
            timestamp: chrono::Utc::now().to_rfc3339(),
            related: Vec::new(),
        }
    }
}

/// Bounded global insight feed, most recent first.
///
/// Shared across workflows; producers push, observers read recent slices
/// for snapshots. Entries beyond capacity are silently discarded.
pub struct InsightFeed {
    entries: Mutex<VecDeque<Insight>>,
    capacity: usize,
}

impl InsightFeed {
    /// Create a feed with the given capacity (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Add an insight at the front of the feed.
    pub fn push(&self, insight: Insight) {
        let mut entries = self.entries.lock();
        entries.push_front(insight);
        entries.truncate(self.capacity);
    }

    /// The `limit` most recent insights, most recent first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<Insight> {
        self.entries.lock().iter().take(limit).cloned().collect()
    }

    /// Number of buffered insights.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the feed is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for InsightFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}
