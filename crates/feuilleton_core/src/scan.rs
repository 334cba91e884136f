//! Finding types produced by the content scanner.
//!
//! These are plain data records: the scanner reports, the caller (or a
//! human) decides. Nothing here mutates content.

use serde::{Deserialize, Serialize};

/// Result of an appearance scan over one item's text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppearanceScan {
    /// Identifiers of entities whose name occurred in the text
    pub appeared: Vec<String>,
    /// Subset of `appeared` that were `Pending` and are now first seen
    pub newly_active: Vec<String>,
}

/// Confidence of a heuristic death detection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum DeathConfidence {
    /// 1-2 distinct death-phrase types near the name
    Medium,
    /// 3 or more distinct death-phrase types in the item
    High,
}

/// A heuristic death detection for one entity in one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathCandidate {
    /// Entity identifier
    pub entity_id: String,
    /// Entity display name
    pub name: String,
    /// Distinct death-phrase types found near the name
    pub phrase_types: Vec<String>,
    /// Detection confidence
    pub confidence: DeathConfidence,
}

/// A non-flashback mention of a deceased entity in freshly generated
/// text. Advisory: reported with context, never auto-corrected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Entity identifier
    pub entity_id: String,
    /// Entity display name
    pub name: String,
    /// Item where the mention occurred
    pub item_id: String,
    /// Contextual snippet around the mention
    pub context: String,
}
