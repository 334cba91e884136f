//! Run configuration for the continuity engine.
//!
//! The configuration system supports:
//! - Bundled defaults (include_str! from feuilleton.toml)
//! - User overrides (./feuilleton.toml)
//! - Automatic merging with user values taking precedence
//!
//! The struct is immutable for the duration of a run: it is passed into
//! the sequencer at run start and never consulted globally.

use config::{Config, File, FileFormat};
use feuilleton_error::{BuilderError, BuilderErrorKind, ConfigError, FeuilletonResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../feuilleton.toml");

/// Tunables for a sequencer run.
///
/// The similarity and overlap thresholds are empirically chosen, not
/// derived; they are configuration precisely so callers can tune them.
///
/// # Examples
///
/// ```
/// use feuilleton_core::ContinuityConfig;
///
/// let config = ContinuityConfig::default();
/// assert_eq!(config.summary_interval, 10);
///
/// let tuned = ContinuityConfig::builder()
///     .summary_interval(5u32)
///     .build()
///     .unwrap();
/// assert_eq!(tuned.summary_interval, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_builder::Builder)]
#[serde(default)]
#[builder(default, build_fn(validate = "Self::validate"))]
pub struct ContinuityConfig {
    /// Items between interval-triggered summary refreshes
    pub summary_interval: u32,
    /// Trailing completed items used to seed the summary on resume
    pub resume_window: usize,
    /// Trailing items summarized on a partition transition
    pub handoff_window: usize,
    /// Characters of the previous partition's final item passed as
    /// hand-off context
    pub handoff_tail_chars: usize,
    /// Minimum body length (chars) for an item to count as done
    pub min_completed_chars: usize,
    /// Minimum outline length (chars) required to generate
    pub min_outline_chars: usize,
    /// Character radius around a death phrase in which the entity name
    /// must occur
    pub death_window_chars: usize,
    /// Character radius inspected around a deceased entity's name
    pub violation_window_chars: usize,
    /// Pairwise outline similarity above which a near-duplicate is a
    /// hard error
    pub near_duplicate_error: f32,
    /// Pairwise outline similarity above which a near-duplicate is a
    /// warning
    pub near_duplicate_warn: f32,
    /// Token-overlap ratio required to match a long event phrase
    pub event_overlap_ratio: f32,
    /// Events with at most this many tokens require full token overlap
    pub short_event_tokens: usize,
    /// Sliding window of emotion points consulted by the pacing analyzer
    pub pacing_window: usize,
    /// Timeout for body generation calls, seconds
    pub body_timeout_secs: u64,
    /// Timeout for summary/classification/pacing calls, seconds
    pub aux_timeout_secs: u64,
    /// Retries after the initial attempt of a generation call
    pub max_retries: usize,
    /// Initial backoff between retries, milliseconds
    pub retry_backoff_ms: u64,
    /// Token cap for body generation calls
    pub max_body_tokens: Option<u32>,
    /// Sampling temperature for body generation calls
    pub temperature: Option<f32>,
}

impl Default for ContinuityConfig {
    fn default() -> Self {
        Self {
            summary_interval: 10,
            resume_window: 10,
            handoff_window: 8,
            handoff_tail_chars: 600,
            min_completed_chars: 300,
            min_outline_chars: 10,
            death_window_chars: 50,
            violation_window_chars: 20,
            near_duplicate_error: 0.7,
            near_duplicate_warn: 0.5,
            event_overlap_ratio: 0.72,
            short_event_tokens: 3,
            pacing_window: 5,
            body_timeout_secs: 180,
            aux_timeout_secs: 30,
            max_retries: 2,
            retry_backoff_ms: 500,
            max_body_tokens: Some(4096),
            temperature: Some(0.8),
        }
    }
}

impl ContinuityConfigBuilder {
    /// Reject threshold combinations the validator cannot act on.
    fn validate(&self) -> Result<(), String> {
        let defaults = ContinuityConfig::default();
        let warn = self.near_duplicate_warn.unwrap_or(defaults.near_duplicate_warn);
        let error = self.near_duplicate_error.unwrap_or(defaults.near_duplicate_error);
        if warn > error {
            return Err(format!(
                "near_duplicate_warn ({warn}) must not exceed near_duplicate_error ({error})"
            ));
        }
        if self.summary_interval == Some(0) {
            return Err("summary_interval must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Fold `derive_builder` failures into the shared builder error.
impl From<ContinuityConfigBuilderError> for BuilderError {
    #[track_caller]
    fn from(err: ContinuityConfigBuilderError) -> Self {
        match err {
            ContinuityConfigBuilderError::UninitializedField(field) => {
                BuilderError::new(BuilderErrorKind::UninitializedField(field.to_string()))
            }
            ContinuityConfigBuilderError::ValidationError(reason) => {
                BuilderError::new(BuilderErrorKind::Validation(reason))
            }
        }
    }
}

impl ContinuityConfig {
    /// Start building a configuration from defaults.
    pub fn builder() -> ContinuityConfigBuilder {
        ContinuityConfigBuilder::default()
    }

    /// Load configuration by merging bundled defaults with an optional
    /// `./feuilleton.toml` user override.
    ///
    /// # Errors
    ///
    /// Returns an error if the user file exists but cannot be parsed, or
    /// if merged values fail to deserialize.
    #[tracing::instrument]
    pub fn load() -> FeuilletonResult<Self> {
        debug!("Loading continuity configuration");
        let merged = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::with_name("feuilleton").required(false))
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?;

        let parsed: Self = merged
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to deserialize configuration: {}", e)))?;
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_defaults_match_default_impl() {
        let from_toml: ContinuityConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(from_toml, ContinuityConfig::default());
    }

    #[test]
    fn builder_overrides_single_field() {
        let config = ContinuityConfig::builder()
            .near_duplicate_error(0.8f32)
            .build()
            .unwrap();
        assert_eq!(config.near_duplicate_error, 0.8);
        assert_eq!(config.summary_interval, 10);
    }

    #[test]
    fn builder_rejects_inverted_duplicate_thresholds() {
        use feuilleton_error::FeuilletonError;

        let err = ContinuityConfig::builder()
            .near_duplicate_warn(0.9f32)
            .near_duplicate_error(0.6f32)
            .build()
            .map_err(BuilderError::from)
            .unwrap_err();
        assert!(matches!(err.kind(), BuilderErrorKind::Validation(_)));

        let folded: FeuilletonError = err.into();
        assert!(folded.to_string().contains("near_duplicate_warn"));
    }

    #[test]
    fn builder_rejects_zero_summary_interval() {
        let err = ContinuityConfig::builder()
            .summary_interval(0u32)
            .build()
            .map_err(BuilderError::from)
            .unwrap_err();
        assert!(err.to_string().contains("summary_interval"));
    }
}
