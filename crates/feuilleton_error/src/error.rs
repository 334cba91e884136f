//! Top-level error wrapper types.

use crate::{BuilderError, ConfigError, GenerationError, SequenceError, StoreError};

/// This is the foundation error enum. Each Feuilleton crate folds its
/// concern-specific error into one of these variants.
///
/// # Examples
///
/// ```
/// use feuilleton_error::{FeuilletonError, StoreError};
///
/// let store_err = StoreError::new("Persist failed");
/// let err: FeuilletonError = store_err.into();
/// assert!(format!("{}", err).contains("Store Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum FeuilletonErrorKind {
    /// Generation service error
    #[from(GenerationError)]
    Generation(GenerationError),
    /// Sequencer error (fatal run conditions)
    #[from(SequenceError)]
    Sequence(SequenceError),
    /// Item store error
    #[from(StoreError)]
    Store(StoreError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Builder error
    #[from(BuilderError)]
    Builder(BuilderError),
}

/// Feuilleton error with kind discrimination.
///
/// # Examples
///
/// ```
/// use feuilleton_error::{FeuilletonResult, ConfigError};
///
/// fn might_fail() -> FeuilletonResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Feuilleton Error: {}", _0)]
pub struct FeuilletonError(Box<FeuilletonErrorKind>);

impl FeuilletonError {
    /// Create a new error from a kind.
    pub fn new(kind: FeuilletonErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &FeuilletonErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to FeuilletonErrorKind
impl<T> From<T> for FeuilletonError
where
    T: Into<FeuilletonErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Feuilleton operations.
///
/// # Examples
///
/// ```
/// use feuilleton_error::{FeuilletonResult, StoreError};
///
/// fn persist() -> FeuilletonResult<()> {
///     Err(StoreError::new("404 Not Found"))?
/// }
/// ```
pub type FeuilletonResult<T> = std::result::Result<T, FeuilletonError>;
