//! Runtime configuration for a [`Corral`](crate::Corral).

use serde::{Deserialize, Serialize};

/// Behavior switches shared by every region of a corral.
///
/// Missing fields deserialize to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorralConfig {
    /// Evaluate a region against the predicate as soon as it is created.
    pub evaluate_on_create: bool,
    /// Invoke a new subscriber immediately if its event already holds.
    pub replay_late_subscribers: bool,
    /// Per-stream buffer capacity before events are dropped.
    pub stream_capacity: usize,
}

impl Default for CorralConfig {
    fn default() -> Self {
        Self {
            evaluate_on_create: true,
            replay_late_subscribers: true,
            stream_capacity: 1024,
        }
    }
}
