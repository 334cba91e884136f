//! Emotional pacing analysis over recent items.
//!
//! Scoring is delegated to the generation service; the arc over the
//! sliding window is computed locally and becomes a steering hint in
//! the next body prompt. Every failure here is log-only.

use crate::extraction::{extract_json, parse_json};
use crate::prompt;
use crate::retry::call_with_retry;
use feuilleton_core::{CallProfile, CompletionRequest, ContinuityConfig, EmotionPoint};
use feuilleton_interface::GenerationDriver;
use serde::Deserialize;

/// Intensity at or above which a point counts as a peak.
const PEAK_INTENSITY: u8 = 8;
/// Intensity at or below which a point counts as a valley.
const VALLEY_INTENSITY: u8 = 3;
/// High-register threshold for the suggestion rules.
const HIGH_REGISTER: u8 = 7;

/// Direction of the intensity curve over the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Trend {
    /// Net intensity gain beyond the threshold
    Rising,
    /// Net intensity loss beyond the threshold
    Falling,
    /// Movement in both directions
    Fluctuating,
    /// Barely any movement
    Stable,
}

/// Steering hint for the next generation prompt. First matching rule
/// wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum PacingSuggestion {
    /// Sustained high intensity: give the reader a breather
    #[display("Recent items have run hot; write a quieter, slower item to let the tension settle.")]
    Cooldown,
    /// Sustained low intensity: raise the stakes
    #[display("Recent items have been flat; escalate the stakes with a sharper conflict.")]
    Escalation,
    /// Sustained high tension: resolve something
    #[display("Tension has been pinned high; release it by resolving one standing threat.")]
    Release,
    /// Sustained despair: let some light in
    #[display("Hope has stayed negative; turn one thread toward hope or a small victory.")]
    HopefulTurn,
    /// No recent high point: spike one
    #[display("No recent high point; insert a minor climax within this item.")]
    MinorClimax,
}

/// Computed arc over the sliding window.
#[derive(Debug, Clone, PartialEq)]
pub struct PacingArc {
    /// Direction of the intensity curve
    pub trend: Trend,
    /// Ordinals of peak-intensity points
    pub peaks: Vec<u32>,
    /// Ordinals of valley-intensity points
    pub valleys: Vec<u32>,
    /// Steering hint, if any rule matched
    pub suggestion: Option<PacingSuggestion>,
}

/// Raw scoring answer from the service.
#[derive(Debug, Deserialize)]
struct ScoredPoint {
    emotion: String,
    intensity: i64,
    tension: i64,
    hope: i64,
}

/// Scores items and tracks the emotion-point series for one run.
#[derive(Debug)]
pub struct PacingAnalyzer {
    config: ContinuityConfig,
    points: Vec<EmotionPoint>,
}

impl PacingAnalyzer {
    /// Create an analyzer with an empty point series.
    pub fn new(config: ContinuityConfig) -> Self {
        Self {
            config,
            points: Vec::new(),
        }
    }

    /// All recorded points, in run order.
    pub fn points(&self) -> &[EmotionPoint] {
        &self.points
    }

    /// Score one item and append its point. Failures are log-only and
    /// leave the series untouched.
    #[tracing::instrument(skip(self, driver, body))]
    pub async fn record_point<D: GenerationDriver + ?Sized>(
        &mut self,
        driver: &D,
        body: &str,
        ordinal: u32,
    ) -> Option<&EmotionPoint> {
        let req = CompletionRequest::from_prompt(prompt::pacing_prompt(body));
        let response =
            match call_with_retry(driver, &req, CallProfile::Auxiliary, &self.config).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, "Pacing scoring failed, skipping point");
                    return None;
                }
            };
        let scored: ScoredPoint = match extract_json(&response).and_then(|j| parse_json(&j)) {
            Ok(scored) => scored,
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable pacing score, skipping point");
                return None;
            }
        };
        self.points.push(EmotionPoint::new(
            ordinal,
            scored.emotion,
            scored.intensity,
            scored.tension,
            scored.hope,
        ));
        self.points.last()
    }

    /// Compute the arc over the sliding window of recent points.
    pub fn arc(&self) -> PacingArc {
        let window: &[EmotionPoint] = if self.points.len() > self.config.pacing_window {
            &self.points[self.points.len() - self.config.pacing_window..]
        } else {
            &self.points
        };

        PacingArc {
            trend: trend_of(window),
            peaks: window
                .iter()
                .filter(|p| p.intensity >= PEAK_INTENSITY)
                .map(|p| p.ordinal)
                .collect(),
            valleys: window
                .iter()
                .filter(|p| p.intensity <= VALLEY_INTENSITY)
                .map(|p| p.ordinal)
                .collect(),
            suggestion: suggestion_of(window, self.config.pacing_window),
        }
    }

    /// Steering hint text for the next body prompt, if any.
    pub fn hint(&self) -> Option<String> {
        self.arc().suggestion.map(|s| s.to_string())
    }
}

/// Trend over consecutive intensity deltas: a direction wins when its
/// accumulated movement beats the other side by more than one point.
fn trend_of(window: &[EmotionPoint]) -> Trend {
    if window.len() < 2 {
        return Trend::Stable;
    }
    let mut up = 0i64;
    let mut down = 0i64;
    for pair in window.windows(2) {
        let delta = i64::from(pair[1].intensity) - i64::from(pair[0].intensity);
        if delta > 0 {
            up += delta;
        } else {
            down -= delta;
        }
    }
    if up > down + 1 {
        Trend::Rising
    } else if down > up + 1 {
        Trend::Falling
    } else if up > 0 && down > 0 {
        Trend::Fluctuating
    } else {
        Trend::Stable
    }
}

/// First-match-wins suggestion rules, evaluated only on a full window.
fn suggestion_of(window: &[EmotionPoint], full_window: usize) -> Option<PacingSuggestion> {
    if window.len() < full_window {
        return None;
    }
    if window.iter().all(|p| p.intensity >= HIGH_REGISTER) {
        Some(PacingSuggestion::Cooldown)
    } else if window.iter().all(|p| p.intensity <= VALLEY_INTENSITY) {
        Some(PacingSuggestion::Escalation)
    } else if window.iter().all(|p| p.tension >= HIGH_REGISTER) {
        Some(PacingSuggestion::Release)
    } else if window.iter().all(|p| p.hope < 0) {
        Some(PacingSuggestion::HopefulTurn)
    } else if window.iter().all(|p| p.intensity < HIGH_REGISTER) {
        Some(PacingSuggestion::MinorClimax)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer_with(points: &[(u8, u8, i8)]) -> PacingAnalyzer {
        let mut analyzer = PacingAnalyzer::new(ContinuityConfig::default());
        for (i, (intensity, tension, hope)) in points.iter().enumerate() {
            analyzer.points.push(EmotionPoint::new(
                i as u32 + 1,
                "test",
                i64::from(*intensity),
                i64::from(*tension),
                i64::from(*hope),
            ));
        }
        analyzer
    }

    #[test]
    fn rising_trend() {
        let analyzer = analyzer_with(&[(2, 5, 0), (4, 5, 0), (5, 5, 0), (6, 5, 0), (7, 5, 0)]);
        assert_eq!(analyzer.arc().trend, Trend::Rising);
    }

    #[test]
    fn fluctuating_trend() {
        let analyzer = analyzer_with(&[(2, 5, 0), (6, 5, 0), (2, 5, 0), (6, 5, 0), (2, 5, 0)]);
        assert_eq!(analyzer.arc().trend, Trend::Fluctuating);
    }

    #[test]
    fn all_hot_suggests_cooldown() {
        let analyzer = analyzer_with(&[(8, 6, 0), (9, 6, 0), (8, 6, 0), (9, 6, 0), (10, 6, 0)]);
        assert_eq!(analyzer.arc().suggestion, Some(PacingSuggestion::Cooldown));
    }

    #[test]
    fn all_flat_suggests_escalation() {
        let analyzer = analyzer_with(&[(1, 2, 0), (2, 2, 0), (3, 2, 0), (2, 2, 0), (1, 2, 0)]);
        assert_eq!(analyzer.arc().suggestion, Some(PacingSuggestion::Escalation));
    }

    #[test]
    fn no_high_point_suggests_minor_climax() {
        let analyzer = analyzer_with(&[(4, 4, 1), (5, 4, 1), (6, 4, 1), (5, 4, 1), (4, 4, 1)]);
        assert_eq!(analyzer.arc().suggestion, Some(PacingSuggestion::MinorClimax));
    }

    #[test]
    fn short_window_gives_no_suggestion() {
        let analyzer = analyzer_with(&[(9, 9, -5), (9, 9, -5)]);
        assert_eq!(analyzer.arc().suggestion, None);
    }

    #[test]
    fn peaks_and_valleys_by_ordinal() {
        let analyzer = analyzer_with(&[(9, 5, 0), (2, 5, 0), (5, 5, 0), (8, 5, 0), (3, 5, 0)]);
        let arc = analyzer.arc();
        assert_eq!(arc.peaks, vec![1, 4]);
        assert_eq!(arc.valleys, vec![2, 5]);
    }
}
