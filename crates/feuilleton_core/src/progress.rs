//! Progress reporting and run report types.

use crate::{ValidationReport, Violation};
use serde::{Deserialize, Serialize};

/// Per-item state transitions reported during a run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Generation call in flight
    Writing,
    /// Body produced, persisting through the item store
    Persisting,
    /// Item finished (generated or already done)
    Complete,
    /// Item failed and was skipped
    Error,
}

/// A progress event, sent over a channel at every item state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Position of the current item in the run, 1-based
    pub ordinal: usize,
    /// Total items in the run
    pub total: usize,
    /// Item identifier
    pub item_id: String,
    /// Item title
    pub title: String,
    /// New state
    pub status: ItemStatus,
    /// Failure reason, when `status` is `Error`
    #[serde(default)]
    pub error: Option<String>,
}

/// A recoverable per-item failure recorded against the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    /// Item identifier
    pub item_id: String,
    /// Item title
    pub title: String,
    /// Human-readable reason
    pub reason: String,
}

/// Outcome of a sequencer run.
///
/// Advisory findings (violations) are carried here for the caller to
/// surface as a review list; they never abort a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Items generated and persisted during this run
    pub completed_count: usize,
    /// Items that failed and were skipped
    pub failed_count: usize,
    /// Items already holding a body and skipped without a generation call
    pub skipped_existing: usize,
    /// Total characters of body text produced
    pub total_chars: usize,
    /// Per-item failures, in run order
    pub failures: Vec<ItemFailure>,
    /// Deceased-entity mentions detected in freshly generated text
    pub violations: Vec<Violation>,
    /// Boundary validation reports for partitions entered during the run
    pub boundary_reports: Vec<ValidationReport>,
}
