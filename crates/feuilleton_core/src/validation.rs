//! Boundary validation data types.
//!
//! The validator itself lives in the continuity engine; these are the
//! plain records it derives and reports. Validation is advisory: a
//! report never aborts a run, it is returned for the caller (or a
//! human) to act on.

use serde::{Deserialize, Serialize};

/// Severity of a validation issue.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Advisory only
    Low,
    /// Worth review
    Medium,
    /// Blocks acceptance
    High,
}

/// What kind of boundary problem was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// An outline re-narrates an event the previous partition completed
    #[display("repeated_event")]
    RepeatedEvent,
    /// An outline pre-empts the next partition's opening
    #[display("future_leak")]
    FutureLeak,
    /// An outline is nearly identical to a sibling or earlier outline
    #[display("near_duplicate")]
    NearDuplicate,
    /// No outline covers one of this partition's must-complete events
    #[display("uncovered_event")]
    UncoveredEvent,
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Problem class
    pub kind: IssueKind,
    /// Severity; only `High` blocks acceptance
    pub severity: Severity,
    /// Index of the offending outline in the validated batch, when
    /// attributable to one outline
    pub outline_index: Option<usize>,
    /// Human-readable description
    pub message: String,
}

/// Outcome of validating a batch of outlines against a boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Partition the validated outlines belong to
    pub partition_id: String,
    /// False iff at least one high-severity error exists
    pub is_valid: bool,
    /// Blocking findings
    pub errors: Vec<ValidationIssue>,
    /// Non-blocking findings
    pub warnings: Vec<ValidationIssue>,
}

/// The event constraints of one partition relative to its neighbors.
/// Derived at validation time, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boundary {
    /// Partition the boundary belongs to
    pub partition_id: String,
    /// Events this partition must complete
    pub must_complete: Vec<String>,
    /// Events the previous partition completed (forbidden to repeat)
    pub forbidden_previous: Vec<String>,
    /// Starting events of the next partition (forbidden to pre-empt)
    pub forbidden_next: Vec<String>,
}
