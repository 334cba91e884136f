//! Work, partition, and item types for serialized works.

use serde::{Deserialize, Serialize};

/// The top-level serialized work (a novel, a season, a campaign log).
///
/// # Examples
///
/// ```
/// use feuilleton_core::Work;
///
/// let work = Work {
///     id: "w1".to_string(),
///     title: "Wasteland Chronicle".to_string(),
///     synopsis: None,
/// };
/// assert_eq!(work.title, "Wasteland Chronicle");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Work {
    /// Work identifier, assigned by the external store
    pub id: String,
    /// Work title
    pub title: String,
    /// Optional one-paragraph synopsis
    #[serde(default)]
    pub synopsis: Option<String>,
}

/// A major ordered division of a work (volume-equivalent).
///
/// Ordinals are unique and totally ordered within a work when present;
/// sequencing falls back to encounter order when they are sparse or
/// missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    /// Partition identifier
    pub id: String,
    /// Ordinal position within the work, when the store supplies one
    #[serde(default)]
    pub ordinal: Option<u32>,
    /// Partition title
    pub title: String,
    /// Human-written summary of what this partition covers
    #[serde(default)]
    pub summary: String,
    /// Optional structured main-plot description
    #[serde(default)]
    pub main_plot: Option<String>,
    /// Ordered list of key events (3-6 short phrases expected)
    #[serde(default)]
    pub key_events: Vec<String>,
    /// Optional precomputed key points
    #[serde(default)]
    pub key_points: Option<String>,
}

/// An ordered content unit within a partition (chapter-equivalent).
///
/// Items are created with an empty body by the external CRUD layer; the
/// sequencer writes the body exactly once per generation attempt
/// (overwritten on regeneration) and never deletes items.
///
/// # Examples
///
/// ```
/// use feuilleton_core::Item;
///
/// let item = Item {
///     id: "i1".to_string(),
///     partition_id: "p1".to_string(),
///     partition_ordinal: Some(1),
///     ordinal: 3,
///     title: "Into the Ruins".to_string(),
///     outline: "The survivors breach the outer wall.".to_string(),
///     content: String::new(),
///     word_count: 0,
/// };
/// assert!(!item.is_completed(100));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Item identifier
    pub id: String,
    /// Parent partition identifier
    pub partition_id: String,
    /// Ordinal of the parent partition, when the store supplies one
    #[serde(default)]
    pub partition_ordinal: Option<u32>,
    /// Ordinal position within the partition
    pub ordinal: u32,
    /// Item title
    pub title: String,
    /// Outline text driving generation
    #[serde(default)]
    pub outline: String,
    /// Produced body text (possibly empty)
    #[serde(default)]
    pub content: String,
    /// Word count of the body
    #[serde(default)]
    pub word_count: usize,
}

impl Item {
    /// Whether this item already holds a body long enough to be treated
    /// as done. Done items update rolling context but trigger no
    /// generation call.
    pub fn is_completed(&self, min_chars: usize) -> bool {
        self.content.chars().count() >= min_chars
    }

    /// Whether the outline is long enough to generate from.
    pub fn has_usable_outline(&self, min_chars: usize) -> bool {
        self.outline.trim().chars().count() >= min_chars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(content: &str, outline: &str) -> Item {
        Item {
            id: "i".into(),
            partition_id: "p".into(),
            partition_ordinal: None,
            ordinal: 1,
            title: "t".into(),
            outline: outline.into(),
            content: content.into(),
            word_count: 0,
        }
    }

    #[test]
    fn completion_counts_chars_not_bytes() {
        // Ten CJK chars are thirty bytes but still ten chars
        let it = item("第一章开头的十个字符", "outline text");
        assert!(it.is_completed(10));
        assert!(!it.is_completed(11));
    }

    #[test]
    fn outline_whitespace_is_not_usable() {
        let it = item("", "   \n\t  ");
        assert!(!it.has_usable_outline(1));
    }
}
