//! Timeout and retry wrapper around generation calls.
//!
//! Every call to the external service is bounded by a per-profile
//! timeout and a small retry budget with exponential backoff and
//! jitter. Transient failures (service errors, timeouts) retry;
//! malformed or empty responses fail immediately.

use feuilleton_core::{CallProfile, CompletionRequest, ContinuityConfig};
use feuilleton_error::{
    FeuilletonError, FeuilletonErrorKind, FeuilletonResult, GenerationError, GenerationErrorKind,
};
use feuilleton_interface::GenerationDriver;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_retry2::{Retry, RetryError, strategy::ExponentialBackoff, strategy::jitter};
use tracing::warn;

/// Whether this failure may succeed on another attempt.
fn is_transient(err: &FeuilletonError) -> bool {
    match err.kind() {
        FeuilletonErrorKind::Generation(g) => g.kind.is_retryable(),
        _ => false,
    }
}

/// Issue one generation call with the configured timeout and retry
/// budget for its profile.
///
/// # Errors
///
/// Returns the permanent error as-is, or `RetryExhausted` once the
/// retry budget is spent on transient failures.
#[tracing::instrument(skip(driver, req, config), fields(%profile, prompt_chars = req.prompt.chars().count()))]
pub async fn call_with_retry<D: GenerationDriver + ?Sized>(
    driver: &D,
    req: &CompletionRequest,
    profile: CallProfile,
    config: &ContinuityConfig,
) -> FeuilletonResult<String> {
    let timeout_secs = match profile {
        CallProfile::Body => config.body_timeout_secs,
        CallProfile::Auxiliary => config.aux_timeout_secs,
    };
    let timeout = Duration::from_secs(timeout_secs);

    let strategy = ExponentialBackoff::from_millis(config.retry_backoff_ms)
        .factor(2)
        .max_delay(Duration::from_secs(30))
        .map(jitter)
        .take(config.max_retries);

    let attempts = AtomicU32::new(0);

    let result = Retry::spawn(strategy, || {
        let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
        async move {
            let outcome = tokio::time::timeout(timeout, driver.complete(req)).await;
            let call_result: FeuilletonResult<String> = match outcome {
                Ok(inner) => inner,
                Err(_) => Err(GenerationError::new(GenerationErrorKind::Timeout(timeout_secs)).into()),
            };
            match call_result {
                Ok(text) if text.trim().is_empty() => Err(RetryError::Permanent(
                    FeuilletonError::from(GenerationError::new(GenerationErrorKind::EmptyResponse)),
                )),
                Ok(text) => Ok(text),
                Err(e) if is_transient(&e) => {
                    warn!(attempt, error = %e, "Transient generation failure, will retry");
                    Err(RetryError::Transient {
                        err: e,
                        retry_after: None,
                    })
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Permanent generation failure");
                    Err(RetryError::Permanent(e))
                }
            }
        }
    })
    .await;

    result.map_err(|e| {
        let attempted = attempts.load(Ordering::Relaxed);
        if is_transient(&e) && attempted > 1 {
            GenerationError::new(GenerationErrorKind::RetryExhausted {
                attempts: attempted,
                reason: e.to_string(),
            })
            .into()
        } else {
            e
        }
    })
}
