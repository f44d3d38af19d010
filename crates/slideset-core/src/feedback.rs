//! Overall feedback ranges shown on the solution screen.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SetError};

const fn default_to() -> u8 {
    100
}

/// Feedback text for a band of percentage scores.
///
/// Both bounds are inclusive percentages in `0..=100`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRange {
    /// Lower bound (inclusive).
    #[serde(default)]
    pub from: u8,

    /// Upper bound (inclusive).
    #[serde(default = "default_to")]
    pub to: u8,

    /// Text shown when the score falls inside this band.
    #[serde(default)]
    pub feedback: String,
}

impl FeedbackRange {
    /// Creates a new range.
    #[must_use]
    pub fn new(from: u8, to: u8, feedback: impl Into<String>) -> Self {
        Self {
            from,
            to,
            feedback: feedback.into(),
        }
    }

    /// Returns `true` if `percent` lies within this range.
    #[must_use]
    pub const fn contains(&self, percent: u8) -> bool {
        self.from <= percent && percent <= self.to
    }
}

/// Converts a score into a rounded percentage in `0..=100`.
///
/// An empty set (`max == 0`) counts as a full score.
#[must_use]
pub fn score_percentage(score: u32, max: u32) -> u8 {
    if max == 0 {
        return 100;
    }
    let ratio = f64::from(score.min(max)) / f64::from(max);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let percent = (ratio * 100.0).round() as u8;
    percent
}

/// Picks the feedback text for a score from the configured ranges.
///
/// The first range containing the rounded percentage wins. Returns an
/// empty string when no range matches.
///
/// # Examples
///
/// ```
/// use slideset_core::feedback::{determine_overall_feedback, FeedbackRange};
///
/// let ranges = vec![
///     FeedbackRange::new(0, 49, "Keep practicing"),
///     FeedbackRange::new(50, 100, "Well done"),
/// ];
/// assert_eq!(determine_overall_feedback(&ranges, 3, 4), "Well done");
/// assert_eq!(determine_overall_feedback(&ranges, 1, 4), "Keep practicing");
/// ```
#[must_use]
pub fn determine_overall_feedback(ranges: &[FeedbackRange], score: u32, max: u32) -> String {
    let percent = score_percentage(score, max);
    ranges
        .iter()
        .find(|range| range.contains(percent))
        .map(|range| range.feedback.clone())
        .unwrap_or_default()
}

/// Validates a feedback table.
///
/// # Errors
///
/// Returns `SetError::ConfigValidationError` if a range is inverted or
/// exceeds 100 percent.
pub fn validate_ranges(ranges: &[FeedbackRange]) -> Result<()> {
    for (i, range) in ranges.iter().enumerate() {
        if range.to > 100 {
            return Err(SetError::config_validation(
                format!("overallFeedback[{i}].to must not exceed 100"),
                "Express overallFeedback bounds as percentages between 0 and 100",
            ));
        }
        if range.from > range.to {
            return Err(SetError::config_validation(
                format!(
                    "overallFeedback[{i}] is inverted (from {} > to {})",
                    range.from, range.to
                ),
                "Swap the overallFeedback bounds so that 'from' is not greater than 'to'",
            ));
        }
    }
    Ok(())
}
