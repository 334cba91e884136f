//! Cross-partition boundary validation.
//!
//! A partition's outlines must not re-narrate events the previous
//! partition already completed, and must not pre-empt the next
//! partition's opening. This module derives a [`Boundary`] (never
//! persisted) from a partition and its neighbors, then checks a batch
//! of outlines against it with keyword-overlap and text-similarity
//! scoring. The validator is advisory: it reports, the caller decides.

use crate::text::{containment, similarity, tokenize};
use feuilleton_core::{
    Boundary, ContinuityConfig, IssueKind, Partition, Severity, ValidationIssue, ValidationReport,
};
use std::collections::HashSet;

/// Action vocabulary used to pick candidate event clauses out of
/// partition summaries when no explicit key-event list exists.
const ACTION_KEYWORDS: &[&str] = &[
    // combat
    "战斗", "激战", "厮杀", "击败", "击杀", "决战", "battle", "fight", "defeat", "duel",
    // advancement
    "突破", "晋升", "觉醒", "进阶", "breakthrough", "ascend", "awaken", "promoted",
    // revelation
    "发现", "揭露", "揭开", "真相", "身世", "reveal", "discover", "uncover", "secret",
    // alliance / betrayal
    "结盟", "联手", "背叛", "反目", "alliance", "betray", "ally", "betrayal",
    // travel
    "前往", "启程", "远行", "跋涉", "journey", "travel", "set out",
    // death
    "死", "陨落", "牺牲", "阵亡", "death", "dies", "perish", "slain",
];

/// Transition vocabulary marking a partition's opening moves. Leaking
/// one of these from the next partition is the most damaging class of
/// boundary failure, so they are extracted and weighted separately.
const TRANSITION_KEYWORDS: &[&str] = &[
    "进入", "抵达", "来到", "初到", "离开", "启程", "出发", "加入", "遇到", "遇见", "相遇",
    "开始", "踏上", "enter", "arrive", "reach", "depart", "leave", "begin", "join",
    "encounter", "meet", "set out", "set foot",
];

/// Clause separators for heuristic event extraction.
const CLAUSE_SEPARATORS: &[char] = &['。', '！', '？', '；', '，', '、', '.', '!', '?', ';', ',', '\n'];

/// Maximum heuristic events extracted per partition.
const MAX_EXTRACTED_EVENTS: usize = 6;

/// Validates outlines against partition boundaries.
#[derive(Debug, Clone)]
pub struct BoundaryValidator {
    config: ContinuityConfig,
}

impl BoundaryValidator {
    /// Create a validator with the given tunables.
    pub fn new(config: ContinuityConfig) -> Self {
        Self { config }
    }

    /// Derive the boundary for `partition` from its neighbors.
    #[tracing::instrument(skip_all, fields(partition_id = %partition.id))]
    pub fn build_boundary(
        &self,
        partition: &Partition,
        prev: Option<&Partition>,
        next: Option<&Partition>,
    ) -> Boundary {
        let boundary = Boundary {
            partition_id: partition.id.clone(),
            must_complete: declared_or_extracted_events(partition),
            forbidden_previous: prev.map(declared_or_extracted_events).unwrap_or_default(),
            forbidden_next: next.map(starting_events).unwrap_or_default(),
        };
        tracing::debug!(
            must_complete = boundary.must_complete.len(),
            forbidden_previous = boundary.forbidden_previous.len(),
            forbidden_next = boundary.forbidden_next.len(),
            "Boundary built"
        );
        boundary
    }

    /// Validate freshly produced outlines against a boundary, sibling
    /// outlines, and the previous partition's outlines.
    ///
    /// Outlines within the batch are also cross-checked against each
    /// other; `sibling_outlines` carries outlines produced outside the
    /// batch. `is_valid` is false only when at least one high-severity
    /// error exists; warnings never block acceptance.
    #[tracing::instrument(skip_all, fields(partition_id = %boundary.partition_id, outline_count = outlines.len()))]
    pub fn validate(
        &self,
        outlines: &[String],
        boundary: &Boundary,
        sibling_outlines: &[String],
        prev_partition_outlines: &[String],
    ) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let outline_tokens: Vec<HashSet<String>> =
            outlines.iter().map(|o| tokenize(o)).collect();

        for (index, tokens) in outline_tokens.iter().enumerate() {
            for event in &boundary.forbidden_previous {
                if self.event_matches(event, tokens, self.config.event_overlap_ratio) {
                    errors.push(ValidationIssue {
                        kind: IssueKind::RepeatedEvent,
                        severity: Severity::High,
                        outline_index: Some(index),
                        message: format!(
                            "Outline {} re-narrates an event already completed by the previous partition: \"{}\"",
                            index, event
                        ),
                    });
                }
            }
            for event in &boundary.forbidden_next {
                // Opening leaks are the most damaging class, so the
                // overlap bar is lowered relative to generic events.
                let ratio = (self.config.event_overlap_ratio - 0.1).max(0.5);
                if self.event_matches(event, tokens, ratio) {
                    errors.push(ValidationIssue {
                        kind: IssueKind::FutureLeak,
                        severity: Severity::High,
                        outline_index: Some(index),
                        message: format!(
                            "Outline {} pre-empts the next partition's starting event: \"{}\"",
                            index, event
                        ),
                    });
                }
            }
        }

        // Must-complete coverage: purely advisory
        for event in &boundary.must_complete {
            let covered = outline_tokens
                .iter()
                .any(|tokens| self.event_matches(event, tokens, self.config.event_overlap_ratio));
            if !covered {
                warnings.push(ValidationIssue {
                    kind: IssueKind::UncoveredEvent,
                    severity: Severity::Low,
                    outline_index: None,
                    message: format!("No outline covers the key event: \"{}\"", event),
                });
            }
        }

        // Pairwise near-duplicate cross-check against siblings and the
        // previous partition's outlines
        let reference: Vec<&String> = sibling_outlines
            .iter()
            .chain(prev_partition_outlines.iter())
            .collect();
        for (index, tokens) in outline_tokens.iter().enumerate() {
            for other in &reference {
                self.check_duplicate(
                    index,
                    similarity(tokens, &tokenize(other)),
                    &mut errors,
                    &mut warnings,
                );
            }
            // Within the batch itself, each outline is checked against
            // the ones before it so the duplicate, not the original,
            // gets flagged.
            for earlier in &outline_tokens[..index] {
                self.check_duplicate(
                    index,
                    similarity(tokens, earlier),
                    &mut errors,
                    &mut warnings,
                );
            }
        }

        let is_valid = !errors.iter().any(|e| e.severity == Severity::High);
        if !is_valid {
            tracing::warn!(
                errors = errors.len(),
                warnings = warnings.len(),
                "Boundary validation failed"
            );
        }
        ValidationReport {
            partition_id: boundary.partition_id.clone(),
            is_valid,
            errors,
            warnings,
        }
    }

    /// Classify one similarity score against the duplicate thresholds.
    fn check_duplicate(
        &self,
        index: usize,
        ratio: f32,
        errors: &mut Vec<ValidationIssue>,
        warnings: &mut Vec<ValidationIssue>,
    ) {
        if ratio > self.config.near_duplicate_error {
            errors.push(ValidationIssue {
                kind: IssueKind::NearDuplicate,
                severity: Severity::High,
                outline_index: Some(index),
                message: format!(
                    "Outline {} is a near-duplicate (similarity {:.2}) of an existing outline",
                    index, ratio
                ),
            });
        } else if ratio > self.config.near_duplicate_warn {
            warnings.push(ValidationIssue {
                kind: IssueKind::NearDuplicate,
                severity: Severity::Medium,
                outline_index: Some(index),
                message: format!(
                    "Outline {} overlaps heavily (similarity {:.2}) with an existing outline",
                    index, ratio
                ),
            });
        }
    }

    /// Matching policy for a candidate event phrase against an outline
    /// token set: short events require full token overlap; longer events
    /// require `ratio` overlap plus at least one core action-word match.
    fn event_matches(&self, event: &str, outline_tokens: &HashSet<String>, ratio: f32) -> bool {
        let event_tokens = tokenize(event);
        if event_tokens.is_empty() {
            return false;
        }
        let overlap = containment(&event_tokens, outline_tokens);
        if event_tokens.len() <= self.config.short_event_tokens {
            return overlap >= 1.0;
        }
        if overlap < ratio {
            return false;
        }
        // A long event must share an action word, not just scenery
        let core_words = core_action_words(event);
        if core_words.is_empty() {
            return true;
        }
        core_words
            .iter()
            .any(|word| outline_tokens.iter().any(|t| t.contains(*word) || word.contains(t.as_str())))
    }
}

/// Action keywords present in an event phrase.
fn core_action_words(event: &str) -> Vec<&'static str> {
    ACTION_KEYWORDS
        .iter()
        .chain(TRANSITION_KEYWORDS.iter())
        .filter(|kw| event.contains(**kw))
        .copied()
        .collect()
}

/// Explicit key events if declared, else short clauses from the
/// summary/main-plot that carry an action keyword.
fn declared_or_extracted_events(partition: &Partition) -> Vec<String> {
    if !partition.key_events.is_empty() {
        return partition.key_events.clone();
    }
    let mut source = partition.summary.clone();
    if let Some(plot) = &partition.main_plot {
        source.push('\n');
        source.push_str(plot);
    }
    extract_events(&source, ACTION_KEYWORDS)
}

/// Starting events of the next partition: its leading key events
/// filtered by transition keywords, falling back to transition clauses
/// from its summary.
fn starting_events(partition: &Partition) -> Vec<String> {
    if !partition.key_events.is_empty() {
        let transitional: Vec<String> = partition
            .key_events
            .iter()
            .filter(|ev| TRANSITION_KEYWORDS.iter().any(|kw| ev.contains(kw)))
            .cloned()
            .collect();
        if !transitional.is_empty() {
            return transitional;
        }
        // No explicitly transitional event: the first key event is the
        // partition's opening by construction
        return partition.key_events.iter().take(1).cloned().collect();
    }
    extract_events(&partition.summary, TRANSITION_KEYWORDS)
}

/// Short clauses from `source` containing one of `keywords`.
fn extract_events(source: &str, keywords: &[&str]) -> Vec<String> {
    source
        .split(CLAUSE_SEPARATORS)
        .map(str::trim)
        .filter(|clause| !clause.is_empty() && clause.chars().count() <= 40)
        .filter(|clause| keywords.iter().any(|kw| clause.contains(kw)))
        .map(str::to_string)
        .take(MAX_EXTRACTED_EVENTS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partition(id: &str, key_events: &[&str], summary: &str) -> Partition {
        Partition {
            id: id.to_string(),
            ordinal: None,
            title: id.to_string(),
            summary: summary.to_string(),
            main_plot: None,
            key_events: key_events.iter().map(|s| s.to_string()).collect(),
            key_points: None,
        }
    }

    fn validator() -> BoundaryValidator {
        BoundaryValidator::new(ContinuityConfig::default())
    }

    #[test]
    fn future_leak_on_full_token_overlap() {
        let current = partition("p2", &["寻找水源"], "");
        let next = partition("p3", &["进入废土城"], "");
        let boundary = validator().build_boundary(&current, None, Some(&next));

        let leaking = vec!["沈柯一行人终于进入废土城，见到了城主。".to_string()];
        let report = validator().validate(&leaking, &boundary, &[], &[]);
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.kind == IssueKind::FutureLeak));
    }

    #[test]
    fn partial_token_overlap_does_not_leak() {
        let current = partition("p2", &["寻找水源"], "");
        let next = partition("p3", &["进入废土城"], "");
        let boundary = validator().build_boundary(&current, None, Some(&next));

        // Shares only the "城" fragment, not the opening move
        let safe = vec!["众人远远眺望一座城的轮廓，继续寻找水源。".to_string()];
        let report = validator().validate(&safe, &boundary, &[], &[]);
        assert!(report.is_valid);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn repeated_previous_event_is_an_error() {
        let prev = partition("p1", &["沈柯击败了守林人"], "");
        let current = partition("p2", &[], "队伍穿越荒原");
        let boundary = validator().build_boundary(&current, Some(&prev), None);

        let repeating = vec!["沈柯再次回到树林，击败了守林人。".to_string()];
        let report = validator().validate(&repeating, &boundary, &[], &[]);
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.kind == IssueKind::RepeatedEvent));
    }

    #[test]
    fn near_duplicate_outline_is_an_error_and_overlap_a_warning() {
        let current = partition("p2", &[], "");
        let boundary = validator().build_boundary(&current, None, None);

        let outline = "沈柯夜探古庙，发现了壁画背后的暗门。".to_string();
        let report = validator().validate(
            &[outline.clone()],
            &boundary,
            &[outline.clone()],
            &[],
        );
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.kind == IssueKind::NearDuplicate));

        let half_similar = "沈柯夜探古庙，却扑了个空。他决定天亮后再来。".to_string();
        let report = validator().validate(&[half_similar], &boundary, &[outline], &[]);
        assert!(report.is_valid);
    }

    #[test]
    fn near_duplicates_inside_the_batch_flag_the_later_outline() {
        let current = partition("p2", &[], "");
        let boundary = validator().build_boundary(&current, None, None);

        let outlines = vec![
            "沈柯夜探古庙，发现了壁画背后的暗门。".to_string(),
            "队伍在山谷中扎营休整。".to_string(),
            "沈柯夜探古庙，发现了壁画背后的暗门。".to_string(),
        ];
        let report = validator().validate(&outlines, &boundary, &[], &[]);
        assert!(!report.is_valid);
        let duplicate = report
            .errors
            .iter()
            .find(|e| e.kind == IssueKind::NearDuplicate)
            .unwrap();
        assert_eq!(duplicate.outline_index, Some(2));
    }

    #[test]
    fn uncovered_key_event_is_only_a_warning() {
        let current = partition("p2", &["沈柯突破第三境"], "");
        let boundary = validator().build_boundary(&current, None, None);

        let report = validator().validate(
            &["队伍在山谷中扎营休整。".to_string()],
            &boundary,
            &[],
            &[],
        );
        assert!(report.is_valid);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.kind == IssueKind::UncoveredEvent));
    }

    #[test]
    fn heuristic_extraction_picks_action_clauses() {
        let p = partition(
            "p1",
            &[],
            "沈柯在废墟中发现了旧时代的地图，随后击败了拦路的掠夺者，队伍继续向北。",
        );
        let events = declared_or_extracted_events(&p);
        assert!(events.iter().any(|e| e.contains("发现")));
        assert!(events.iter().any(|e| e.contains("击败")));
        assert!(!events.iter().any(|e| e.contains("继续向北")));
    }
}
