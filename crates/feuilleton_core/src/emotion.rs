//! Emotion scoring types for pacing analysis.

use serde::{Deserialize, Serialize};

/// A per-item emotional score, appended once per generated item and
/// never mutated. Consumers read a sliding window of recent points.
///
/// # Examples
///
/// ```
/// use feuilleton_core::EmotionPoint;
///
/// let point = EmotionPoint::new(12, "dread", 11, 9, -12);
/// // Scores are clamped into range on construction
/// assert_eq!(point.intensity, 10);
/// assert_eq!(point.hope, -10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionPoint {
    /// Overall item ordinal within the run
    pub ordinal: u32,
    /// Dominant emotion label
    pub emotion: String,
    /// Emotional intensity, 0-10
    pub intensity: u8,
    /// Narrative tension, 0-10
    pub tension: u8,
    /// Hope, -10..=10
    pub hope: i8,
}

impl EmotionPoint {
    /// Build a point, clamping scores into their documented ranges.
    pub fn new(ordinal: u32, emotion: impl Into<String>, intensity: i64, tension: i64, hope: i64) -> Self {
        Self {
            ordinal,
            emotion: emotion.into(),
            intensity: intensity.clamp(0, 10) as u8,
            tension: tension.clamp(0, 10) as u8,
            hope: hope.clamp(-10, 10) as i8,
        }
    }
}
