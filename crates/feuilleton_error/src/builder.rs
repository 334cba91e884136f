//! Errors from fallible builder construction.
//!
//! `derive_builder` generates one error enum per builder with an
//! uninitialized-field and a validation variant; this module gives them
//! a single shape to fold into so builder failures travel the normal
//! [`FeuilletonErrorKind`](crate::FeuilletonErrorKind) path.

/// Specific builder error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum BuilderErrorKind {
    /// A required field was never set
    #[display("Field '{}' was never set", _0)]
    UninitializedField(String),

    /// Cross-field validation rejected the built value
    #[display("Invalid value: {}", _0)]
    Validation(String),
}

/// Builder error with location tracking.
///
/// # Examples
///
/// ```
/// use feuilleton_error::{BuilderError, BuilderErrorKind, FeuilletonError};
///
/// let err = BuilderError::new(BuilderErrorKind::Validation(
///     "summary_interval must be at least 1".into(),
/// ));
/// let folded: FeuilletonError = err.into();
/// assert!(format!("{}", folded).contains("summary_interval"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Builder Error: {} at line {} in {}", kind, line, file)]
pub struct BuilderError {
    kind: BuilderErrorKind,
    line: u32,
    file: &'static str,
}

impl BuilderError {
    /// Create a new builder error with caller location tracking.
    #[track_caller]
    pub fn new(kind: BuilderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &BuilderErrorKind {
        &self.kind
    }
}

/// Convert from a `derive_builder` validation message.
impl From<String> for BuilderError {
    #[track_caller]
    fn from(msg: String) -> Self {
        Self::new(BuilderErrorKind::Validation(msg))
    }
}
