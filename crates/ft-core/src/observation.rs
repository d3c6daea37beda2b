//! Browser-tab observations pending consumption by the tracker.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A transient record of a browser tab seen as foreground content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabObservation {
    /// Tab URL; the identity key for deduplication.
    pub url: String,
    /// Tab title as reported by the browser.
    pub title: String,
    /// When the tab was last sighted.
    pub seen_at: NaiveDateTime,
}

/// Observations keyed by URL, awaiting the next tracker tick.
///
/// Repeated pings for the same URL keep only the latest sighting. The tracker
/// consumes the whole map at once via [`PendingTabs::drain`], so an
/// observation is processed exactly once.
#[derive(Debug, Default)]
pub struct PendingTabs {
    tabs: HashMap<String, TabObservation>,
}

impl PendingTabs {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a sighting, replacing any earlier sighting of the same URL.
    pub fn upsert(&mut self, observation: TabObservation) {
        self.tabs.insert(observation.url.clone(), observation);
    }

    /// Takes and clears all pending observations.
    ///
    /// Results are ordered by sighting time, then URL, so downstream
    /// processing is deterministic.
    pub fn drain(&mut self) -> Vec<TabObservation> {
        let mut observations: Vec<TabObservation> = self.tabs.drain().map(|(_, o)| o).collect();
        observations.sort_by(|a, b| a.seen_at.cmp(&b.seen_at).then_with(|| a.url.cmp(&b.url)));
        observations
    }

    /// Number of distinct URLs pending.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    /// True when nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}

/// Whether a foreground label names a browser known to report tabs.
///
/// Matching is a case-insensitive substring check against the configured
/// signatures (e.g. `firefox`, `mozilla`).
#[must_use]
pub fn is_tab_browser(label: &str, signatures: &[String]) -> bool {
    let label = label.to_lowercase();
    signatures
        .iter()
        .any(|signature| label.contains(&signature.to_lowercase()))
}
