//! Generation service error types.

/// Specific error conditions for calls to the external generation service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum GenerationErrorKind {
    /// The service reported a failure (network error, 5xx, refusal)
    #[display("Generation service failure: {}", _0)]
    Service(String),
    /// The call exceeded its timeout budget
    #[display("Generation call timed out after {}s", _0)]
    Timeout(u64),
    /// All retry attempts failed
    #[display("Retries exhausted after {} attempts: {}", attempts, reason)]
    RetryExhausted {
        /// Number of attempts made, including the initial call
        attempts: u32,
        /// Reason reported by the final attempt
        reason: String,
    },
    /// The service returned an empty body
    #[display("Generation service returned an empty response")]
    EmptyResponse,
    /// The response could not be parsed into the expected shape
    #[display("Malformed response: {}", _0)]
    Malformed(String),
}

impl GenerationErrorKind {
    /// Whether a call that failed with this kind may succeed on retry.
    ///
    /// Service failures and timeouts are transient; malformed or empty
    /// responses indicate a prompt problem that a retry will not fix.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Service(_) | Self::Timeout(_))
    }
}

/// Error type for generation service calls.
///
/// # Examples
///
/// ```
/// use feuilleton_error::{GenerationError, GenerationErrorKind};
///
/// let err = GenerationError::new(GenerationErrorKind::Timeout(180));
/// assert!(format!("{}", err).contains("timed out"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Generation Error: {} at line {} in {}", kind, line, file)]
pub struct GenerationError {
    /// The specific error condition
    pub kind: GenerationErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl GenerationError {
    /// Create a new GenerationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GenerationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
