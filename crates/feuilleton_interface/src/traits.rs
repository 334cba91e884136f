//! Trait definitions for external collaborators.

use async_trait::async_trait;
use feuilleton_core::{CompletionRequest, EntityUpdate};
use feuilleton_error::FeuilletonResult;

/// The external generation service.
///
/// This is the minimal surface the engine requires: one prompt in, one
/// text out. Any non-success must surface as a typed error with a
/// human-readable reason; the engine performs no provider-specific
/// handling.
#[async_trait]
pub trait GenerationDriver: Send + Sync {
    /// Produce text for the given request.
    async fn complete(&self, req: &CompletionRequest) -> FeuilletonResult<String>;

    /// Provider name (e.g., "anthropic", "openai", "gemini").
    fn provider_name(&self) -> &'static str;

    /// Model identifier (e.g., "claude-3-5-sonnet-20241022").
    fn model_name(&self) -> &str;
}

/// The external item store that persists produced bodies.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Persist a produced body against an item.
    async fn persist(&self, item_id: &str, content: &str) -> FeuilletonResult<()>;
}

/// Optional hook invoked whenever the rolling summary refreshes.
#[async_trait]
pub trait SummarySink: Send + Sync {
    /// Persist the refreshed summary text.
    async fn persist_summary(&self, text: &str) -> FeuilletonResult<()>;
}

/// Optional hook invoked on entity registry reconciliation.
#[async_trait]
pub trait EntitySink: Send + Sync {
    /// Persist a batch of registry changes.
    async fn persist_entity_updates(&self, updates: &[EntityUpdate]) -> FeuilletonResult<()>;
}
