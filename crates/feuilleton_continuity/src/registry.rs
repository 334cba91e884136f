//! In-memory entity registry.
//!
//! The registry is the single source of truth for who is allowed to act
//! in the next generation request. It owns the entity state for the
//! duration of a run and buffers changes for bulk reconciliation
//! through the entity update hook.

use feuilleton_core::{
    AppearanceScan, DeathCandidate, DeathConfidence, Entity, EntityStatus, EntityUpdate,
    EntityUpdateKind,
};
use std::collections::HashMap;

/// Maximum entities listed in the prompt roster.
const ROSTER_CAP: usize = 12;

/// Registry of recurring entities for one run.
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    entities: HashMap<String, Entity>,
    /// Insertion order, for deterministic rosters and snapshots
    order: Vec<String>,
    pending_updates: Vec<EntityUpdate>,
}

impl EntityRegistry {
    /// Build a registry from the entities supplied by the caller.
    pub fn new(entities: Vec<Entity>) -> Self {
        let order: Vec<String> = entities.iter().map(|e| e.id.clone()).collect();
        let entities = entities.into_iter().map(|e| (e.id.clone(), e)).collect();
        Self {
            entities,
            order,
            pending_updates: Vec::new(),
        }
    }

    /// All entities in insertion order.
    pub fn snapshot(&self) -> Vec<Entity> {
        self.order
            .iter()
            .filter_map(|id| self.entities.get(id))
            .cloned()
            .collect()
    }

    /// Entities not yet deceased, in insertion order.
    pub fn living(&self) -> Vec<Entity> {
        self.snapshot()
            .into_iter()
            .filter(|e| e.status != EntityStatus::Deceased)
            .collect()
    }

    /// Deceased entities, in insertion order.
    pub fn deceased(&self) -> Vec<Entity> {
        self.snapshot()
            .into_iter()
            .filter(|e| e.status == EntityStatus::Deceased)
            .collect()
    }

    /// Apply an appearance scan for one item: record appearances and
    /// promote pending entities to active.
    #[tracing::instrument(skip(self, scan), fields(appeared = scan.appeared.len()))]
    pub fn apply_scan(&mut self, item_id: &str, scan: &AppearanceScan) {
        for id in &scan.appeared {
            let Some(entity) = self.entities.get_mut(id) else {
                continue;
            };
            if entity.appearances.last().map(String::as_str) != Some(item_id) {
                entity.appearances.push(item_id.to_string());
                self.pending_updates.push(EntityUpdate {
                    entity_id: entity.id.clone(),
                    name: entity.name.clone(),
                    update: EntityUpdateKind::AppearanceRecorded {
                        item_id: item_id.to_string(),
                    },
                });
            }
        }
        for id in &scan.newly_active {
            let Some(entity) = self.entities.get_mut(id) else {
                continue;
            };
            if entity.status == EntityStatus::Pending {
                entity.status = EntityStatus::Active;
                tracing::debug!(entity = %entity.name, "Entity activated");
                self.pending_updates.push(EntityUpdate {
                    entity_id: entity.id.clone(),
                    name: entity.name.clone(),
                    update: EntityUpdateKind::Activated,
                });
            }
        }
    }

    /// Apply a death candidate. Only high-confidence candidates change
    /// status; deceased is terminal, repeat detections are ignored.
    #[tracing::instrument(skip(self, candidate), fields(entity = %candidate.name, confidence = %candidate.confidence))]
    pub fn apply_death(&mut self, item_id: &str, candidate: &DeathCandidate) {
        if candidate.confidence != DeathConfidence::High {
            tracing::debug!("Ignoring death candidate below high confidence");
            return;
        }
        let Some(entity) = self.entities.get_mut(&candidate.entity_id) else {
            return;
        };
        if entity.status == EntityStatus::Deceased {
            return;
        }
        entity.status = EntityStatus::Deceased;
        entity.death_item = Some(item_id.to_string());
        tracing::info!(entity = %entity.name, item_id, "Entity marked deceased");
        self.pending_updates.push(EntityUpdate {
            entity_id: entity.id.clone(),
            name: entity.name.clone(),
            update: EntityUpdateKind::Died {
                item_id: item_id.to_string(),
            },
        });
    }

    /// Short roster of living entities for the generation prompt.
    pub fn roster_block(&self) -> String {
        self.living()
            .iter()
            .take(ROSTER_CAP)
            .map(|e| format!("- {} ({}, {})", e.name, e.role, e.status))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Explicit exclusion list of deceased entities with their death
    /// items. Included verbatim in every generation prompt.
    pub fn exclusion_clause(&self) -> Option<String> {
        let deceased = self.deceased();
        if deceased.is_empty() {
            return None;
        }
        let lines: Vec<String> = deceased
            .iter()
            .map(|e| {
                let died = e
                    .death_item
                    .as_deref()
                    .unwrap_or("an earlier item");
                format!(
                    "- {} is DEAD (died in {}). They must NOT appear, speak, or act except inside an explicit memory or flashback.",
                    e.name, died
                )
            })
            .collect();
        Some(lines.join("\n"))
    }

    /// Entity status lines for the rolling summary prompt, with an
    /// explicit terminal marker for deaths.
    pub fn status_lines(&self) -> String {
        self.snapshot()
            .iter()
            .map(|e| match (&e.status, &e.death_item) {
                (EntityStatus::Deceased, Some(item)) => {
                    format!("- {}: [DECEASED in {}]", e.name, item)
                }
                (EntityStatus::Deceased, None) => format!("- {}: [DECEASED]", e.name),
                (status, _) => format!("- {}: {}", e.name, status),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Drain the buffered registry changes for reconciliation.
    pub fn take_updates(&mut self) -> Vec<EntityUpdate> {
        std::mem::take(&mut self.pending_updates)
    }
}
