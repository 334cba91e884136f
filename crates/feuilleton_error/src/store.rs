//! Item store error types.

/// Item store error with source location.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Store Error: {} at line {} in {}", message, line, file)]
pub struct StoreError {
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl StoreError {
    /// Create a new StoreError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use feuilleton_error::StoreError;
    ///
    /// let err = StoreError::new("Item store unavailable");
    /// assert!(err.message.contains("unavailable"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
