//! Sequencer error types.

/// Specific error conditions for sequencing a run across items.
///
/// These are the fatal conditions of a run: skipping past them would
/// silently break chronological continuity, so the run halts instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum SequenceErrorKind {
    /// An item has no outline, or an outline too short to generate from
    #[display("Item '{}' ({}) has a missing or too-short outline", title, item_id)]
    MissingOutline {
        /// Item identifier
        item_id: String,
        /// Item title, for the run-terminating message
        title: String,
    },
    /// The item immediately before the resume point has no body
    #[display(
        "Cannot resume at item '{}': the preceding item '{}' has no body",
        item_id,
        previous_id
    )]
    BrokenResume {
        /// The requested resume item
        item_id: String,
        /// The preceding item that lacks a body
        previous_id: String,
    },
    /// The requested resume item is not in the run
    #[display("Resume item '{}' not found in the item sequence", _0)]
    ResumeItemNotFound(String),
    /// The run was given no items
    #[display("The item sequence is empty")]
    EmptyRun,
}

/// Error type for sequencer operations.
///
/// # Examples
///
/// ```
/// use feuilleton_error::{SequenceError, SequenceErrorKind};
///
/// let err = SequenceError::new(SequenceErrorKind::EmptyRun);
/// assert!(format!("{}", err).contains("empty"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Sequence Error: {} at line {} in {}", kind, line, file)]
pub struct SequenceError {
    /// The specific error condition
    pub kind: SequenceErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl SequenceError {
    /// Create a new SequenceError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: SequenceErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
