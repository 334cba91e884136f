//! Rolling summary management.
//!
//! One bounded summary per work, replaced whole on each refresh. The
//! manager buffers recently produced items, decides when a refresh is
//! due (interval first, then event triggers, to bound call volume), and
//! delegates the actual synthesis to the generation service. A failed
//! refresh leaves the previous summary untouched.

use crate::extraction::{extract_json, parse_json};
use crate::prompt;
use crate::registry::EntityRegistry;
use crate::retry::call_with_retry;
use feuilleton_core::{CallProfile, CompletionRequest, ContinuityConfig, Item};
use feuilleton_error::FeuilletonResult;
use feuilleton_interface::GenerationDriver;
use serde::Deserialize;

/// Characters of each buffered item carried into the refresh prompt.
const BUFFER_EXCERPT_CHARS: usize = 800;

/// Why a refresh fired.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum RefreshTrigger {
    /// The configured item interval elapsed
    #[display("interval")]
    Interval,
    /// An event classification forced it ("death", "plot_turn", ...)
    #[display("event:{}", _0)]
    Event(String),
    /// The run crossed into a new partition
    #[display("partition_transition")]
    PartitionTransition,
    /// End-of-run reconciliation
    #[display("final")]
    Final,
}

/// Classification answer for the event trigger.
#[derive(Debug, Deserialize)]
struct EventClassification {
    #[serde(default)]
    death: bool,
    #[serde(default)]
    power_shift: bool,
    #[serde(default)]
    plot_turn: bool,
    #[serde(default)]
    new_arc: bool,
}

impl EventClassification {
    fn trigger_reason(&self) -> Option<&'static str> {
        if self.death {
            Some("death")
        } else if self.power_shift {
            Some("power_shift")
        } else if self.plot_turn {
            Some("plot_turn")
        } else if self.new_arc {
            Some("new_arc")
        } else {
            None
        }
    }
}

/// One buffered item awaiting the next refresh.
#[derive(Debug, Clone)]
struct BufferedItem {
    ordinal: u32,
    title: String,
    excerpt: String,
}

/// Owns the rolling summary and its append-then-flush buffer.
#[derive(Debug)]
pub struct SummaryManager {
    config: ContinuityConfig,
    summary: String,
    last_refresh_ordinal: u32,
    buffer: Vec<BufferedItem>,
}

impl SummaryManager {
    /// Create a manager, optionally seeded with a persisted summary and
    /// the ordinal it was last refreshed at.
    pub fn new(config: ContinuityConfig, existing: Option<(String, u32)>) -> Self {
        let (summary, last_refresh_ordinal) = existing.unwrap_or_default();
        Self {
            config,
            summary,
            last_refresh_ordinal,
            buffer: Vec::new(),
        }
    }

    /// Current summary text.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Ordinal of the item at the last refresh.
    pub fn last_refresh_ordinal(&self) -> u32 {
        self.last_refresh_ordinal
    }

    /// Number of items buffered since the last refresh.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Append one produced item to the buffer.
    pub fn push(&mut self, item: &Item, body: &str, ordinal: u32) {
        self.buffer.push(BufferedItem {
            ordinal,
            title: item.title.clone(),
            excerpt: body.chars().take(BUFFER_EXCERPT_CHARS).collect(),
        });
    }

    /// Interval trigger: fires when enough items have passed since the
    /// last refresh. Checked before the event classification call so
    /// auxiliary call volume stays bounded.
    pub fn interval_due(&self, ordinal: u32) -> bool {
        ordinal.saturating_sub(self.last_refresh_ordinal) >= self.config.summary_interval
    }

    /// Event trigger: a lightweight classification call over the latest
    /// item's text. Failures are log-only and return `None`.
    #[tracing::instrument(skip(self, driver, body))]
    pub async fn classify_event<D: GenerationDriver + ?Sized>(
        &self,
        driver: &D,
        body: &str,
    ) -> Option<RefreshTrigger> {
        let req = CompletionRequest::from_prompt(prompt::classification_prompt(body));
        let response =
            match call_with_retry(driver, &req, CallProfile::Auxiliary, &self.config).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, "Event classification failed, skipping trigger");
                    return None;
                }
            };
        let parsed: EventClassification = match extract_json(&response).and_then(|j| parse_json(&j))
        {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable event classification, skipping trigger");
                return None;
            }
        };
        parsed
            .trigger_reason()
            .map(|reason| RefreshTrigger::Event(reason.to_string()))
    }

    /// Refresh the summary through the generation service.
    ///
    /// On success the summary is replaced, the buffer is flushed, and
    /// the refresh ordinal advances. On failure everything is left as
    /// it was; the caller logs and continues.
    ///
    /// A `PartitionTransition` refresh consumes only the trailing
    /// hand-off window of the buffer; every refresh clears the buffer.
    #[tracing::instrument(skip(self, driver, registry), fields(%trigger, buffered = self.buffer.len()))]
    pub async fn refresh<D: GenerationDriver + ?Sized>(
        &mut self,
        driver: &D,
        registry: &EntityRegistry,
        trigger: RefreshTrigger,
        ordinal: u32,
    ) -> FeuilletonResult<&str> {
        if self.buffer.is_empty() {
            tracing::debug!("Nothing buffered, refresh skipped");
            return Ok(self.summary());
        }

        let window = match trigger {
            RefreshTrigger::PartitionTransition => self.config.handoff_window,
            _ => self.buffer.len(),
        };
        let start = self.buffer.len().saturating_sub(window);
        let recent: String = self.buffer[start..]
            .iter()
            .map(|b| format!("[{}] {}\n{}", b.ordinal, b.title, b.excerpt))
            .collect::<Vec<_>>()
            .join("\n\n");

        let req = CompletionRequest::from_prompt(prompt::summary_prompt(
            &self.summary,
            &recent,
            &registry.status_lines(),
            &trigger.to_string(),
        ));
        let new_summary =
            call_with_retry(driver, &req, CallProfile::Auxiliary, &self.config).await?;

        self.summary = new_summary;
        self.last_refresh_ordinal = ordinal;
        self.buffer.clear();
        tracing::info!(ordinal, "Rolling summary refreshed");
        Ok(self.summary())
    }

    /// Seed the summary on resume from the tail of already-produced
    /// items. Falls back to a local digest if the generation call
    /// fails, so the resumed run always starts with a non-empty summary.
    #[tracing::instrument(skip_all, fields(tail_len = tail.len()))]
    pub async fn seed_from_tail<D: GenerationDriver + ?Sized>(
        &mut self,
        driver: &D,
        tail: &[&Item],
    ) {
        if tail.is_empty() {
            return;
        }
        let digest: String = tail
            .iter()
            .map(|item| {
                let excerpt: String = item.content.chars().take(BUFFER_EXCERPT_CHARS).collect();
                format!("[{}] {}\n{}", item.ordinal, item.title, excerpt)
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let req = CompletionRequest::from_prompt(prompt::seed_prompt(&digest));
        match call_with_retry(driver, &req, CallProfile::Auxiliary, &self.config).await {
            Ok(text) => self.summary = text,
            Err(e) => {
                tracing::warn!(error = %e, "Seed synthesis failed, using local digest");
                self.summary = digest;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use feuilleton_error::{GenerationError, GenerationErrorKind};

    struct ScriptedDriver {
        response: Option<String>,
    }

    #[async_trait]
    impl GenerationDriver for ScriptedDriver {
        async fn complete(&self, _req: &CompletionRequest) -> FeuilletonResult<String> {
            match &self.response {
                Some(text) => Ok(text.clone()),
                None => Err(GenerationError::new(GenerationErrorKind::Malformed(
                    "scripted failure".to_string(),
                ))
                .into()),
            }
        }

        fn provider_name(&self) -> &'static str {
            "scripted"
        }

        fn model_name(&self) -> &str {
            "scripted-1"
        }
    }

    fn fast_config() -> ContinuityConfig {
        ContinuityConfig {
            max_retries: 1,
            retry_backoff_ms: 1,
            ..ContinuityConfig::default()
        }
    }

    fn item(ordinal: u32) -> Item {
        Item {
            id: format!("i{ordinal}"),
            partition_id: "p1".into(),
            partition_ordinal: Some(1),
            ordinal,
            title: format!("Item {ordinal}"),
            outline: "outline".into(),
            content: String::new(),
            word_count: 0,
        }
    }

    #[test]
    fn interval_fires_exactly_at_threshold() {
        let config = ContinuityConfig::default();
        let manager = SummaryManager::new(config, None);
        assert!(!manager.interval_due(9));
        assert!(manager.interval_due(10));
    }

    #[test]
    fn interval_respects_prior_refresh_ordinal() {
        let config = ContinuityConfig::default();
        let manager = SummaryManager::new(config, Some(("old summary".into(), 7)));
        assert!(!manager.interval_due(16));
        assert!(manager.interval_due(17));
    }

    #[test]
    fn buffer_grows_per_push() {
        let mut manager = SummaryManager::new(ContinuityConfig::default(), None);
        manager.push(&item(1), "第一章正文", 1);
        manager.push(&item(2), "第二章正文", 2);
        assert_eq!(manager.buffered(), 2);
    }

    #[test]
    fn classification_reason_priority() {
        let parsed = EventClassification {
            death: true,
            power_shift: true,
            plot_turn: false,
            new_arc: false,
        };
        assert_eq!(parsed.trigger_reason(), Some("death"));

        let none = EventClassification {
            death: false,
            power_shift: false,
            plot_turn: false,
            new_arc: false,
        };
        assert_eq!(none.trigger_reason(), None);
    }

    #[tokio::test]
    async fn refresh_replaces_summary_and_flushes_buffer() {
        let driver = ScriptedDriver {
            response: Some("概要：新的旅程开始了。".to_string()),
        };
        let registry = EntityRegistry::new(vec![]);
        let mut manager = SummaryManager::new(fast_config(), Some(("旧概要".into(), 3)));
        manager.push(&item(4), "第四章正文", 4);
        manager.push(&item(5), "第五章正文", 5);

        let refreshed = manager
            .refresh(&driver, &registry, RefreshTrigger::Interval, 5)
            .await
            .unwrap()
            .to_string();
        assert_eq!(refreshed, "概要：新的旅程开始了。");
        assert_eq!(manager.buffered(), 0);
        assert_eq!(manager.last_refresh_ordinal(), 5);
    }

    #[tokio::test]
    async fn failed_refresh_leaves_state_untouched() {
        let driver = ScriptedDriver { response: None };
        let registry = EntityRegistry::new(vec![]);
        let mut manager = SummaryManager::new(fast_config(), Some(("旧概要".into(), 3)));
        manager.push(&item(4), "第四章正文", 4);

        assert!(manager
            .refresh(&driver, &registry, RefreshTrigger::Interval, 4)
            .await
            .is_err());
        assert_eq!(manager.summary(), "旧概要");
        assert_eq!(manager.buffered(), 1);
        assert_eq!(manager.last_refresh_ordinal(), 3);
    }

    #[tokio::test]
    async fn empty_buffer_refresh_is_a_no_op() {
        let driver = ScriptedDriver { response: None };
        let registry = EntityRegistry::new(vec![]);
        let mut manager = SummaryManager::new(fast_config(), Some(("旧概要".into(), 3)));

        let unchanged = manager
            .refresh(&driver, &registry, RefreshTrigger::Final, 9)
            .await
            .unwrap()
            .to_string();
        assert_eq!(unchanged, "旧概要");
        assert_eq!(manager.last_refresh_ordinal(), 3);
    }
}
