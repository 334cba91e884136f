//! Request types for the external generation service.

use feuilleton_error::{BuilderError, BuilderErrorKind};
use serde::{Deserialize, Serialize};

/// A single prompt sent to the generation service.
///
/// # Examples
///
/// ```
/// use feuilleton_core::CompletionRequest;
///
/// let request = CompletionRequest::builder()
///     .prompt("Write the next chapter.".to_string())
///     .max_tokens(Some(4096))
///     .temperature(Some(0.8))
///     .build()
///     .unwrap();
///
/// assert!(request.prompt.contains("chapter"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default, derive_builder::Builder)]
#[builder(default)]
pub struct CompletionRequest {
    /// The assembled prompt text
    pub prompt: String,
    /// Maximum number of tokens to generate
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0.0 to 1.0)
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// Start building a request.
    pub fn builder() -> CompletionRequestBuilder {
        CompletionRequestBuilder::default()
    }

    /// Convenience constructor for auxiliary calls that only carry a prompt.
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: None,
            temperature: None,
        }
    }
}

/// Fold `derive_builder` failures into the shared builder error.
impl From<CompletionRequestBuilderError> for BuilderError {
    #[track_caller]
    fn from(err: CompletionRequestBuilderError) -> Self {
        match err {
            CompletionRequestBuilderError::UninitializedField(field) => {
                BuilderError::new(BuilderErrorKind::UninitializedField(field.to_string()))
            }
            CompletionRequestBuilderError::ValidationError(reason) => {
                BuilderError::new(BuilderErrorKind::Validation(reason))
            }
        }
    }
}

/// Distinguishes long body-generation calls from short auxiliary calls
/// (summary refresh, event classification, pacing scoring) so each gets
/// the right timeout budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum CallProfile {
    /// Item body generation (minutes)
    Body,
    /// Summary, classification, and pacing calls (seconds)
    Auxiliary,
}
