//! Heuristic content scanning: appearances, deaths, and deceased-entity
//! violations.
//!
//! The scanner is a pluggable strategy behind [`ContentScanner`] so the
//! keyword/window heuristics can be swapped for a stronger classifier
//! without touching the sequencer.

use crate::text::{char_window, strip_tags};
use feuilleton_core::{
    AppearanceScan, DeathCandidate, DeathConfidence, Entity, EntityStatus, Violation,
};

/// Death-indicating phrases, grouped by type. Confidence is derived from
/// how many distinct types occur in one item.
const DEATH_PHRASES: &[(&str, &[&str])] = &[
    (
        "perish",
        &["死了", "死去", "已死", "身亡", "丧命", "毙命", "died", "is dead", "was dead"],
    ),
    (
        "breath",
        &["咽气", "断气", "气绝", "breathed his last", "breathed her last", "drew a final breath"],
    ),
    (
        "fall",
        &["陨落", "阵亡", "战死", "倒在血泊", "fell in battle", "was slain", "was killed"],
    ),
    (
        "passing",
        &["去世", "离世", "与世长辞", "passed away", "no more of this world"],
    ),
    (
        "corpse",
        &["尸体", "遗体", "冰冷的身体", "lifeless body", "cold body", "corpse"],
    ),
];

/// Retrospective framing markers. A deceased entity's name inside a
/// window containing one of these is a flashback mention, not a
/// violation.
const FLASHBACK_MARKERS: &[&str] = &[
    "回忆", "回想", "想起", "记得", "记忆", "梦见", "梦中", "当年", "曾经", "生前", "昔日",
    "仿佛看到", "remember", "remembered", "recalled", "memory", "memories", "flashback",
    "dreamed", "dreamt", "in his dream", "in her dream", "used to", "back then", "once",
];

/// Strategy interface for text analysis over generated bodies.
///
/// Implementations are pure text passes; they never call the generation
/// service and never mutate content.
pub trait ContentScanner: Send + Sync {
    /// Detect which of the given entities appear in the text.
    fn scan_appearances(&self, text: &str, entities: &[Entity]) -> AppearanceScan;

    /// Detect death-indicating language near entity names.
    fn scan_deaths(&self, text: &str, entities: &[Entity]) -> Vec<DeathCandidate>;

    /// Report non-flashback mentions of deceased entities.
    fn detect_violations(&self, item_id: &str, text: &str, deceased: &[Entity]) -> Vec<Violation>;
}

/// The shipped keyword/window heuristic scanner.
#[derive(Debug, Clone)]
pub struct HeuristicScanner {
    /// Character radius around a death phrase for name co-occurrence
    death_window: usize,
    /// Character radius inspected around a deceased name
    violation_window: usize,
}

impl HeuristicScanner {
    /// Create a scanner with the given co-occurrence windows.
    pub fn new(death_window: usize, violation_window: usize) -> Self {
        Self {
            death_window,
            violation_window,
        }
    }
}

impl Default for HeuristicScanner {
    fn default() -> Self {
        Self::new(50, 20)
    }
}

impl ContentScanner for HeuristicScanner {
    #[tracing::instrument(skip(self, text, entities), fields(text_chars = text.chars().count(), entity_count = entities.len()))]
    fn scan_appearances(&self, text: &str, entities: &[Entity]) -> AppearanceScan {
        let plain = strip_tags(text);
        let mut scan = AppearanceScan::default();
        for entity in entities {
            if entity.name.is_empty() || !plain.contains(&entity.name) {
                continue;
            }
            scan.appeared.push(entity.id.clone());
            if entity.status == EntityStatus::Pending {
                scan.newly_active.push(entity.id.clone());
            }
        }
        tracing::debug!(
            appeared = scan.appeared.len(),
            newly_active = scan.newly_active.len(),
            "Appearance scan complete"
        );
        scan
    }

    #[tracing::instrument(skip(self, text, entities), fields(entity_count = entities.len()))]
    fn scan_deaths(&self, text: &str, entities: &[Entity]) -> Vec<DeathCandidate> {
        let plain = strip_tags(text);
        let mut candidates = Vec::new();

        for entity in entities {
            if entity.status == EntityStatus::Deceased || entity.name.is_empty() {
                continue;
            }
            let mut hit_types: Vec<String> = Vec::new();
            for (phrase_type, phrases) in DEATH_PHRASES {
                let near_name = phrases.iter().any(|phrase| {
                    plain.match_indices(phrase).any(|(idx, m)| {
                        char_window(&plain, idx, m.len(), self.death_window).contains(&entity.name)
                    })
                });
                if near_name {
                    hit_types.push((*phrase_type).to_string());
                }
            }
            if hit_types.is_empty() {
                continue;
            }
            let confidence = if hit_types.len() >= 3 {
                DeathConfidence::High
            } else {
                DeathConfidence::Medium
            };
            tracing::debug!(
                entity = %entity.name,
                types = hit_types.len(),
                %confidence,
                "Death candidate detected"
            );
            candidates.push(DeathCandidate {
                entity_id: entity.id.clone(),
                name: entity.name.clone(),
                phrase_types: hit_types,
                confidence,
            });
        }
        candidates
    }

    #[tracing::instrument(skip(self, text, deceased), fields(deceased_count = deceased.len()))]
    fn detect_violations(&self, item_id: &str, text: &str, deceased: &[Entity]) -> Vec<Violation> {
        let plain = strip_tags(text);
        let mut violations = Vec::new();

        for entity in deceased {
            if entity.name.is_empty() {
                continue;
            }
            for (idx, m) in plain.match_indices(&entity.name) {
                let window = char_window(&plain, idx, m.len(), self.violation_window);
                let retrospective = FLASHBACK_MARKERS
                    .iter()
                    .any(|marker| window.contains(marker));
                if retrospective {
                    continue;
                }
                violations.push(Violation {
                    entity_id: entity.id.clone(),
                    name: entity.name.clone(),
                    item_id: item_id.to_string(),
                    context: window,
                });
            }
        }
        if !violations.is_empty() {
            tracing::warn!(
                item_id,
                count = violations.len(),
                "Deceased entity mentions detected outside flashbacks"
            );
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feuilleton_core::EntityRole;

    fn entity(name: &str, status: EntityStatus) -> Entity {
        Entity {
            id: format!("id-{name}"),
            name: name.to_string(),
            role: EntityRole::Secondary,
            status,
            death_item: None,
            appearances: vec![],
            relations: vec![],
        }
    }

    #[test]
    fn pending_entity_is_newly_active_on_first_mention() {
        let scanner = HeuristicScanner::default();
        let entities = vec![
            entity("沈柯", EntityStatus::Pending),
            entity("老猎人", EntityStatus::Active),
        ];
        let scan = scanner.scan_appearances("沈柯推开门，老猎人坐在火边。", &entities);
        assert_eq!(scan.appeared.len(), 2);
        assert_eq!(scan.newly_active, vec!["id-沈柯".to_string()]);
    }

    #[test]
    fn death_requires_name_near_phrase() {
        let scanner = HeuristicScanner::default();
        let entities = vec![entity("老猎人", EntityStatus::Active)];

        // Phrase far from the name: padding pushes it outside the window
        let padding = "山风呼啸，".repeat(30);
        let far = format!("老猎人走了。{}远处有人死了。", padding);
        assert!(scanner.scan_deaths(&far, &entities).is_empty());

        let near = "老猎人中箭，当场毙命。";
        let candidates = scanner.scan_deaths(near, &entities);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].confidence, DeathConfidence::Medium);
    }

    #[test]
    fn three_phrase_types_give_high_confidence() {
        let scanner = HeuristicScanner::default();
        let entities = vec![entity("老猎人", EntityStatus::Active)];
        let text = "老猎人毙命于此。老猎人已经断气。众人抬走老猎人的尸体。";
        let candidates = scanner.scan_deaths(text, &entities);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].confidence, DeathConfidence::High);
        assert!(candidates[0].phrase_types.len() >= 3);
    }

    #[test]
    fn flashback_mention_is_not_a_violation() {
        let scanner = HeuristicScanner::default();
        let deceased = vec![entity("老猎人", EntityStatus::Deceased)];

        let flashback = "沈柯想起老猎人教他辨认兽迹的日子。";
        assert!(scanner.detect_violations("i9", flashback, &deceased).is_empty());

        let fresh = "老猎人推门而入，抖落一身雪。";
        let violations = scanner.detect_violations("i9", fresh, &deceased);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].item_id, "i9");
        assert!(violations[0].context.contains("老猎人"));
    }

    #[test]
    fn deceased_entities_are_skipped_by_death_scan() {
        let scanner = HeuristicScanner::default();
        let entities = vec![entity("老猎人", EntityStatus::Deceased)];
        assert!(scanner.scan_deaths("老猎人死了。", &entities).is_empty());
    }
}
