//! Continuity orchestration engine for serialized long-form generation.
//!
//! Given a hierarchy of content units (work -> partitions -> ordered
//! items), this crate drives generation of each item's body through an
//! external [`GenerationDriver`](feuilleton_interface::GenerationDriver)
//! while preserving narrative continuity across items that individually
//! exceed any single context window:
//!
//! - the [`Sequencer`] orders items across partition boundaries, resumes
//!   from an arbitrary item, and classifies failures as fatal-and-stop
//!   vs. skip-and-continue;
//! - the [`SummaryManager`] maintains a bounded rolling summary of
//!   everything generated so far;
//! - the [`EntityRegistry`] and [`HeuristicScanner`] track recurring
//!   entities and flag any non-flashback mention of a deceased one;
//! - the [`BoundaryValidator`] flags outlines that re-narrate the
//!   previous partition or leak the next partition's opening;
//! - the [`PacingAnalyzer`] scores recent items and emits a steering
//!   hint for the next prompt.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod boundary;
mod extraction;
mod pacing;
mod prompt;
mod registry;
mod retry;
mod scanner;
mod sequencer;
mod summary;
mod text;

pub use boundary::BoundaryValidator;
pub use feuilleton_core::{Boundary, IssueKind, Severity, ValidationIssue, ValidationReport};
pub use extraction::{extract_json, parse_json};
pub use pacing::{PacingAnalyzer, PacingArc, PacingSuggestion, Trend};
pub use prompt::{
    BODY_HEADER, CLASSIFY_HEADER, PACING_HEADER, PartitionHandoff, SEED_HEADER, SUMMARY_HEADER,
};
pub use registry::EntityRegistry;
pub use retry::call_with_retry;
pub use scanner::{ContentScanner, HeuristicScanner};
pub use sequencer::Sequencer;
pub use summary::{RefreshTrigger, SummaryManager};
pub use text::{containment, similarity, strip_tags, tokenize};
