//! The run loop: ordered item generation with continuity reconciliation.
//!
//! The [`Sequencer`] walks a work's items in chronological order across
//! partition boundaries, generates each missing body through the
//! [`GenerationDriver`], and threads the continuity state (rolling
//! summary, entity registry, pacing series) through every call. Failure
//! policy is two-class: conditions that would silently break
//! chronology (missing outline, broken resume chain) halt the run;
//! everything else is recorded against the item and the run continues.

use crate::boundary::BoundaryValidator;
use crate::pacing::PacingAnalyzer;
use crate::prompt::{self, PartitionHandoff};
use crate::registry::EntityRegistry;
use crate::retry::call_with_retry;
use crate::scanner::{ContentScanner, HeuristicScanner};
use crate::summary::{RefreshTrigger, SummaryManager};
use feuilleton_core::{
    Boundary, CallProfile, CompletionRequest, ContinuityConfig, Entity, Item, ItemFailure,
    ItemStatus, Partition, ProgressEvent, RunReport, ValidationReport, Work,
};
use feuilleton_error::{FeuilletonError, FeuilletonResult, SequenceError, SequenceErrorKind};
use feuilleton_interface::{EntitySink, GenerationDriver, ItemStore, SummarySink};
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// Drives generation of a work's items in order.
///
/// Construction is builder-style: required collaborators in [`new`],
/// optional ones layered on with `with_*` methods.
///
/// [`new`]: Sequencer::new
pub struct Sequencer<D, S> {
    driver: D,
    store: S,
    config: ContinuityConfig,
    scanner: Box<dyn ContentScanner>,
    validator: BoundaryValidator,
    summary_sink: Option<Box<dyn SummarySink>>,
    entity_sink: Option<Box<dyn EntitySink>>,
    progress: Option<UnboundedSender<ProgressEvent>>,
    cancel: CancellationToken,
}

impl<D, S> Sequencer<D, S>
where
    D: GenerationDriver,
    S: ItemStore,
{
    /// Create a sequencer with the default heuristic scanner.
    pub fn new(driver: D, store: S, config: ContinuityConfig) -> Self {
        let scanner = HeuristicScanner::new(
            config.death_window_chars,
            config.violation_window_chars,
        );
        Self {
            driver,
            store,
            validator: BoundaryValidator::new(config.clone()),
            scanner: Box::new(scanner),
            summary_sink: None,
            entity_sink: None,
            progress: None,
            cancel: CancellationToken::new(),
            config,
        }
    }

    /// Replace the content scanner.
    pub fn with_scanner(mut self, scanner: Box<dyn ContentScanner>) -> Self {
        self.scanner = scanner;
        self
    }

    /// Persist refreshed summaries through `sink`.
    pub fn with_summary_sink(mut self, sink: Box<dyn SummarySink>) -> Self {
        self.summary_sink = Some(sink);
        self
    }

    /// Persist entity updates through `sink`.
    pub fn with_entity_sink(mut self, sink: Box<dyn EntitySink>) -> Self {
        self.entity_sink = Some(sink);
        self
    }

    /// Send a [`ProgressEvent`] at every item state transition.
    pub fn with_progress(mut self, tx: UnboundedSender<ProgressEvent>) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Token for cooperative cancellation. Cancelling lets the item in
    /// flight finish, then the run reconciles state and returns its
    /// report.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run generation over `items`, optionally resuming at
    /// `start_item_id`.
    ///
    /// Items already holding a body are skipped without a generation
    /// call but still feed the continuity state, so re-running a
    /// partially generated work is idempotent. Recoverable per-item
    /// failures are recorded in the report; the final summary refresh
    /// and sink flush happen even when the run ends early.
    ///
    /// # Errors
    ///
    /// Fatal sequence conditions (`EmptyRun`, `ResumeItemNotFound`,
    /// `BrokenResume`, `MissingOutline`) abort the run.
    #[tracing::instrument(skip_all, fields(work_id = %work.id, items = items.len(), resume = start_item_id.is_some()))]
    pub async fn run(
        &self,
        work: &Work,
        partitions: &[Partition],
        items: Vec<Item>,
        entities: Vec<Entity>,
        start_item_id: Option<&str>,
    ) -> FeuilletonResult<RunReport> {
        if items.is_empty() {
            return Err(SequenceError::new(SequenceErrorKind::EmptyRun).into());
        }
        let mut items = items;
        order_items(partitions, &mut items);

        let start_index = self.resolve_start(&items, start_item_id)?;

        let mut registry = EntityRegistry::new(entities);
        let mut summary = SummaryManager::new(
            self.config.clone(),
            Some((String::new(), start_index as u32)),
        );
        let mut pacing = PacingAnalyzer::new(self.config.clone());

        if start_index > 0 {
            self.replay_prefix(&items[..start_index], &mut registry);
            let tail_start = start_index.saturating_sub(self.config.resume_window);
            let tail: Vec<&Item> = items[tail_start..start_index]
                .iter()
                .filter(|i| i.is_completed(self.config.min_completed_chars))
                .collect();
            summary.seed_from_tail(&self.driver, &tail).await;
        }

        let mut report = RunReport::default();
        let mut fatal: Option<FeuilletonError> = None;
        let total = items.len();
        let mut current_partition: Option<String> = None;
        let mut current_boundary: Option<Boundary> = None;
        let mut last_body: Option<String> = None;
        let mut last_ordinal = start_index as u32;

        for (position, item) in items.iter().enumerate().skip(start_index) {
            if self.cancel.is_cancelled() {
                tracing::info!(position, "Run cancelled, reconciling");
                break;
            }
            let seq_ordinal = (position + 1) as u32;

            let mut handoff = None;
            if current_partition.as_deref() != Some(item.partition_id.as_str()) {
                if current_partition.is_some() {
                    if let Err(e) = summary
                        .refresh(
                            &self.driver,
                            &registry,
                            RefreshTrigger::PartitionTransition,
                            last_ordinal,
                        )
                        .await
                    {
                        tracing::warn!(error = %e, "Partition refresh failed, carrying stale summary");
                    } else {
                        self.flush_sinks(&summary, &mut registry).await;
                    }
                    if let Some(tail) = last_body.as_deref() {
                        handoff = Some(PartitionHandoff {
                            partition_title: partition_title(partitions, &item.partition_id),
                            previous_tail: tail_chars(tail, self.config.handoff_tail_chars),
                        });
                    }
                }
                if let Some((boundary, validation)) =
                    self.validate_partition(partitions, &items, &item.partition_id)
                {
                    report.boundary_reports.push(validation);
                    current_boundary = Some(boundary);
                } else {
                    current_boundary = None;
                }
                current_partition = Some(item.partition_id.clone());
            }

            // Already written: no generation call, but the body still
            // feeds the continuity state so later prompts see it.
            if item.is_completed(self.config.min_completed_chars) {
                report.skipped_existing += 1;
                self.absorb_body(&mut registry, &item.id, &item.content);
                summary.push(item, &item.content, seq_ordinal);
                self.maybe_refresh(&mut summary, &mut registry, None, seq_ordinal)
                    .await;
                last_body = Some(item.content.clone());
                last_ordinal = seq_ordinal;
                self.emit(position, total, item, ItemStatus::Complete, None);
                continue;
            }

            if !item.has_usable_outline(self.config.min_outline_chars) {
                let err = SequenceError::new(SequenceErrorKind::MissingOutline {
                    item_id: item.id.clone(),
                    title: item.title.clone(),
                });
                self.emit(position, total, item, ItemStatus::Error, Some(err.to_string()));
                fatal = Some(err.into());
                break;
            }

            self.emit(position, total, item, ItemStatus::Writing, None);
            let exclusion = hard_constraints(&registry, current_boundary.as_ref());
            let hint = pacing.hint();
            let req = CompletionRequest {
                prompt: prompt::body_prompt(
                    work,
                    item,
                    summary.summary(),
                    &registry.roster_block(),
                    exclusion.as_deref(),
                    hint.as_deref(),
                    handoff.as_ref(),
                ),
                max_tokens: self.config.max_body_tokens,
                temperature: self.config.temperature,
            };

            let body = match call_with_retry(&self.driver, &req, CallProfile::Body, &self.config)
                .await
            {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(item_id = %item.id, error = %e, "Item generation failed, skipping");
                    self.record_failure(&mut report, position, total, item, e.to_string());
                    continue;
                }
            };

            let violations =
                self.scanner
                    .detect_violations(&item.id, &body, &registry.deceased());
            for violation in &violations {
                tracing::warn!(
                    item_id = %item.id,
                    entity = %violation.name,
                    context = %violation.context,
                    "Deceased entity mentioned outside flashback"
                );
            }
            report.violations.extend(violations);

            self.emit(position, total, item, ItemStatus::Persisting, None);
            if let Err(e) = self.store.persist(&item.id, &body).await {
                tracing::warn!(item_id = %item.id, error = %e, "Persist failed, skipping item");
                self.record_failure(&mut report, position, total, item, e.to_string());
                continue;
            }

            self.absorb_body(&mut registry, &item.id, &body);
            summary.push(item, &body, seq_ordinal);
            self.maybe_refresh(&mut summary, &mut registry, Some(&body), seq_ordinal)
                .await;
            pacing.record_point(&self.driver, &body, seq_ordinal).await;

            report.completed_count += 1;
            report.total_chars += body.chars().count();
            last_body = Some(body);
            last_ordinal = seq_ordinal;
            self.emit(position, total, item, ItemStatus::Complete, None);
        }

        // Reconcile on every exit path so nothing buffered is lost.
        if summary.buffered() > 0 {
            if let Err(e) = summary
                .refresh(&self.driver, &registry, RefreshTrigger::Final, last_ordinal)
                .await
            {
                tracing::warn!(error = %e, "Final summary refresh failed");
            }
        }
        self.flush_sinks(&summary, &mut registry).await;

        match fatal {
            Some(err) => Err(err),
            None => {
                tracing::info!(
                    completed = report.completed_count,
                    failed = report.failed_count,
                    skipped = report.skipped_existing,
                    chars = report.total_chars,
                    "Run finished"
                );
                Ok(report)
            }
        }
    }

    /// Resolve the resume point and check the chain right before it.
    fn resolve_start(&self, items: &[Item], start_item_id: Option<&str>) -> FeuilletonResult<usize> {
        let Some(id) = start_item_id else {
            return Ok(0);
        };
        let index = items.iter().position(|i| i.id == id).ok_or_else(|| {
            SequenceError::new(SequenceErrorKind::ResumeItemNotFound(id.to_string()))
        })?;
        if index > 0 {
            let previous = &items[index - 1];
            if !previous.is_completed(self.config.min_completed_chars) {
                return Err(SequenceError::new(SequenceErrorKind::BrokenResume {
                    item_id: id.to_string(),
                    previous_id: previous.id.clone(),
                })
                .into());
            }
        }
        Ok(index)
    }

    /// Rebuild registry state from items written in earlier runs. Their
    /// updates were already persisted back then, so the buffer is
    /// discarded.
    fn replay_prefix(&self, prefix: &[Item], registry: &mut EntityRegistry) {
        for item in prefix {
            if item.is_completed(self.config.min_completed_chars) {
                self.absorb_body(registry, &item.id, &item.content);
            }
        }
        let _ = registry.take_updates();
    }

    /// Feed one body's appearance and death findings into the registry.
    fn absorb_body(&self, registry: &mut EntityRegistry, item_id: &str, body: &str) {
        let scan = self.scanner.scan_appearances(body, &registry.living());
        registry.apply_scan(item_id, &scan);
        for candidate in self.scanner.scan_deaths(body, &registry.living()) {
            registry.apply_death(item_id, &candidate);
        }
    }

    /// Refresh the rolling summary when the interval is due or (for
    /// freshly generated text) a major event is classified. Refresh
    /// failures are log-only.
    async fn maybe_refresh(
        &self,
        summary: &mut SummaryManager,
        registry: &mut EntityRegistry,
        fresh_body: Option<&str>,
        ordinal: u32,
    ) {
        let trigger = if summary.interval_due(ordinal) {
            Some(RefreshTrigger::Interval)
        } else if let Some(body) = fresh_body {
            summary.classify_event(&self.driver, body).await
        } else {
            None
        };
        let Some(trigger) = trigger else {
            return;
        };
        match summary.refresh(&self.driver, registry, trigger, ordinal).await {
            Ok(_) => self.flush_sinks(summary, registry).await,
            Err(e) => {
                tracing::warn!(error = %e, "Summary refresh failed, continuing with stale summary");
            }
        }
    }

    /// Push the current summary and any buffered entity updates out to
    /// the configured sinks. Sink failures are log-only.
    async fn flush_sinks(&self, summary: &SummaryManager, registry: &mut EntityRegistry) {
        if let Some(sink) = &self.summary_sink {
            if !summary.summary().is_empty() {
                if let Err(e) = sink.persist_summary(summary.summary()).await {
                    tracing::warn!(error = %e, "Summary sink persist failed");
                }
            }
        }
        let updates = registry.take_updates();
        if updates.is_empty() {
            return;
        }
        if let Some(sink) = &self.entity_sink {
            if let Err(e) = sink.persist_entity_updates(&updates).await {
                tracing::warn!(error = %e, "Entity sink persist failed");
            }
        }
    }

    /// Advisory boundary validation on entering a partition. The built
    /// boundary is handed back so body prompts can carry its hard
    /// constraints.
    fn validate_partition(
        &self,
        partitions: &[Partition],
        items: &[Item],
        partition_id: &str,
    ) -> Option<(Boundary, ValidationReport)> {
        let index = partitions.iter().position(|p| p.id == partition_id)?;
        let partition = &partitions[index];
        let prev = index.checked_sub(1).map(|i| &partitions[i]);
        let next = partitions.get(index + 1);
        let boundary = self.validator.build_boundary(partition, prev, next);

        let outlines: Vec<String> = items
            .iter()
            .filter(|i| i.partition_id == partition_id)
            .map(|i| i.outline.clone())
            .collect();
        let prev_outlines: Vec<String> = prev
            .map(|p| {
                items
                    .iter()
                    .filter(|i| i.partition_id == p.id)
                    .map(|i| i.outline.clone())
                    .collect()
            })
            .unwrap_or_default();

        let report = self
            .validator
            .validate(&outlines, &boundary, &[], &prev_outlines);
        Some((boundary, report))
    }

    fn record_failure(
        &self,
        report: &mut RunReport,
        position: usize,
        total: usize,
        item: &Item,
        reason: String,
    ) {
        report.failed_count += 1;
        report.failures.push(ItemFailure {
            item_id: item.id.clone(),
            title: item.title.clone(),
            reason: reason.clone(),
        });
        self.emit(position, total, item, ItemStatus::Error, Some(reason));
    }

    fn emit(
        &self,
        position: usize,
        total: usize,
        item: &Item,
        status: ItemStatus,
        error: Option<String>,
    ) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(ProgressEvent {
                ordinal: position + 1,
                total,
                item_id: item.id.clone(),
                title: item.title.clone(),
                status,
                error,
            });
        }
    }
}

/// Stable chronological order: partitions with a declared ordinal come
/// first, sorted by it; partitions without one follow in list order.
/// Ranking by position in that resolved order keeps declared and
/// fallback ranks on one scale, so items never interleave across
/// partitions. Items of an unlisted partition sort last, grouped by
/// their own declared partition ordinal. Ties keep encounter order.
fn order_items(partitions: &[Partition], items: &mut [Item]) {
    let mut resolved: Vec<usize> = (0..partitions.len()).collect();
    resolved.sort_by_key(|&i| (partitions[i].ordinal.is_none(), partitions[i].ordinal, i));
    let partition_rank: HashMap<&str, u32> = resolved
        .iter()
        .enumerate()
        .map(|(rank, &i)| (partitions[i].id.as_str(), rank as u32))
        .collect();
    items.sort_by_key(|item| match partition_rank.get(item.partition_id.as_str()) {
        Some(&rank) => (rank, 0, item.ordinal),
        None => (
            u32::MAX,
            item.partition_ordinal.unwrap_or(u32::MAX),
            item.ordinal,
        ),
    });
}

/// Combine the deceased-entity exclusion list with the current
/// partition's boundary constraints into one block for the body prompt.
fn hard_constraints(registry: &EntityRegistry, boundary: Option<&Boundary>) -> Option<String> {
    let mut lines = Vec::new();
    if let Some(clause) = registry.exclusion_clause() {
        lines.push(clause);
    }
    if let Some(boundary) = boundary {
        for event in &boundary.forbidden_next {
            lines.push(format!(
                "- Do NOT narrate \"{event}\"; it belongs to a later part of the story."
            ));
        }
        for event in &boundary.forbidden_previous {
            lines.push(format!(
                "- \"{event}\" has already been narrated; do not repeat it."
            ));
        }
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn partition_title(partitions: &[Partition], partition_id: &str) -> String {
    partitions
        .iter()
        .find(|p| p.id == partition_id)
        .map(|p| p.title.clone())
        .unwrap_or_else(|| partition_id.to_string())
}

/// Last `n` characters of `text`, on char boundaries.
fn tail_chars(text: &str, n: usize) -> String {
    let count = text.chars().count();
    text.chars().skip(count.saturating_sub(n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, partition_id: &str, ordinal: u32) -> Item {
        Item {
            id: id.to_string(),
            partition_id: partition_id.to_string(),
            partition_ordinal: None,
            ordinal,
            title: id.to_string(),
            outline: String::new(),
            content: String::new(),
            word_count: 0,
        }
    }

    fn partition(id: &str, ordinal: Option<u32>) -> Partition {
        Partition {
            id: id.to_string(),
            ordinal,
            title: id.to_string(),
            summary: String::new(),
            main_plot: None,
            key_events: Vec::new(),
            key_points: None,
        }
    }

    #[test]
    fn items_order_by_partition_then_ordinal() {
        let partitions = vec![partition("p1", Some(1)), partition("p2", Some(2))];
        let mut items = vec![
            item("c3", "p2", 1),
            item("c1", "p1", 1),
            item("c2", "p1", 2),
        ];
        order_items(&partitions, &mut items);
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn partition_list_position_breaks_missing_ordinals() {
        let partitions = vec![partition("pa", None), partition("pb", None)];
        let mut items = vec![item("c2", "pb", 1), item("c1", "pa", 1)];
        order_items(&partitions, &mut items);
        assert_eq!(items[0].id, "c1");
        assert_eq!(items[1].id, "c2");
    }

    #[test]
    fn mixed_declared_and_missing_ordinals_never_interleave() {
        // A declared ordinal of 0 must not collide with the list-index
        // fallback of an undeclared partition.
        let partitions = vec![partition("pa", None), partition("pb", Some(0))];
        let mut items = vec![
            item("a1", "pa", 1),
            item("b1", "pb", 1),
            item("a2", "pa", 2),
            item("b2", "pb", 2),
        ];
        order_items(&partitions, &mut items);
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "b2", "a1", "a2"]);
    }

    #[test]
    fn unknown_partition_sorts_last_in_encounter_order() {
        let partitions = vec![partition("p1", Some(1))];
        let mut items = vec![
            item("stray-b", "px", 2),
            item("c1", "p1", 1),
            item("stray-a", "px", 1),
        ];
        order_items(&partitions, &mut items);
        assert_eq!(items[0].id, "c1");
        assert_eq!(items[1].id, "stray-a");
        assert_eq!(items[2].id, "stray-b");
    }

    #[test]
    fn tail_respects_char_boundaries() {
        assert_eq!(tail_chars("进入废土城", 2), "土城");
        assert_eq!(tail_chars("ab", 5), "ab");
    }
}
