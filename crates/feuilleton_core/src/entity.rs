//! Entity types for recurring named participants.

use serde::{Deserialize, Serialize};

/// Role tag for a tracked entity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum EntityRole {
    /// A protagonist-side principal
    Primary,
    /// An opposing principal
    Antagonist,
    /// Everyone else worth tracking
    Secondary,
}

/// Lifecycle status of a tracked entity.
///
/// Transitions: `Pending -> Active` on first detected appearance,
/// `Active -> Deceased` on detected death. `Deceased` is terminal: the
/// scanner rejects any new non-flashback mention of a deceased entity in
/// subsequently generated text.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    /// Declared but not yet seen in generated text
    Pending,
    /// Appearing in the work
    Active,
    /// Dead; must not reappear outside flashbacks
    Deceased,
}

/// A directed relation from one entity to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Identifier of the target entity
    pub target: String,
    /// Relation label ("mentor", "rival", "sworn enemy")
    pub label: String,
}

/// A recurring named participant tracked across items.
///
/// # Examples
///
/// ```
/// use feuilleton_core::{Entity, EntityRole, EntityStatus};
///
/// let entity = Entity {
///     id: "e1".to_string(),
///     name: "Shen Ke".to_string(),
///     role: EntityRole::Primary,
///     status: EntityStatus::Pending,
///     death_item: None,
///     appearances: vec![],
///     relations: vec![],
/// };
/// assert_eq!(entity.status, EntityStatus::Pending);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Entity identifier
    pub id: String,
    /// Display name as it appears in text
    pub name: String,
    /// Role tag
    pub role: EntityRole,
    /// Lifecycle status
    pub status: EntityStatus,
    /// Item where the entity died, once deceased
    #[serde(default)]
    pub death_item: Option<String>,
    /// Ordered item identifiers where the entity appeared
    #[serde(default)]
    pub appearances: Vec<String>,
    /// Relations to other entities
    #[serde(default)]
    pub relations: Vec<Relation>,
}

/// The kind of change recorded during registry reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityUpdateKind {
    /// A pending entity made its first appearance
    Activated,
    /// An appearance was recorded against an item
    AppearanceRecorded {
        /// Item where the appearance was detected
        item_id: String,
    },
    /// The entity died
    Died {
        /// Item where the death was detected
        item_id: String,
    },
}

/// A single registry change, pushed through the entity update hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityUpdate {
    /// Entity identifier
    pub entity_id: String,
    /// Entity display name
    pub name: String,
    /// What changed
    pub update: EntityUpdateKind,
}
