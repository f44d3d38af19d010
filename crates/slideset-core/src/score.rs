//! Score aggregation over the slides of a set.
//!
//! Nothing is cached: every call reads each question's current score.

use serde::Serialize;
use tracing::warn;

use crate::adapter::with_adapter;
use crate::error::Result;
use crate::navigator::Slide;

/// Score of the set at one moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSnapshot {
    /// Sum of the slides' current scores.
    pub score: u32,
    /// Sum of the slides' max scores.
    pub max_score: u32,
}

impl ScoreSnapshot {
    /// Returns `true` if every point was scored.
    #[must_use]
    pub const fn is_full_marks(&self) -> bool {
        self.score == self.max_score
    }
}

/// Sums scores across slides on demand.
#[derive(Debug, Clone, Copy)]
pub struct ScoreAggregator<'a> {
    slides: &'a [Slide],
}

impl<'a> ScoreAggregator<'a> {
    /// Creates an aggregator over `slides`.
    #[must_use]
    pub const fn new(slides: &'a [Slide]) -> Self {
        Self { slides }
    }

    /// Sum of every slide's current score.
    ///
    /// A slide reporting more than its max contributes its max.
    ///
    /// # Errors
    ///
    /// Returns `SetError::AdapterBusy` if a question is mutably borrowed.
    pub fn total_score(&self) -> Result<u32> {
        self.slides.iter().try_fold(0u32, |total, slide| {
            let (score, max) = with_adapter(&slide.adapter, slide.index, |a| {
                (a.score(), a.max_score())
            })?;
            if score > max {
                warn!(slide = slide.index, score, max, "Slide score exceeds its max, clamping");
            }
            Ok(total.saturating_add(score.min(max)))
        })
    }

    /// Sum of every slide's max score.
    ///
    /// # Errors
    ///
    /// Returns `SetError::AdapterBusy` if a question is mutably borrowed.
    pub fn total_max_score(&self) -> Result<u32> {
        self.slides.iter().try_fold(0u32, |total, slide| {
            let max = with_adapter(&slide.adapter, slide.index, |a| a.max_score())?;
            Ok(total.saturating_add(max))
        })
    }

    /// Both totals at once.
    ///
    /// # Errors
    ///
    /// Returns `SetError::AdapterBusy` if a question is mutably borrowed.
    pub fn snapshot(&self) -> Result<ScoreSnapshot> {
        Ok(ScoreSnapshot {
            score: self.total_score()?,
            max_score: self.total_max_score()?,
        })
    }
}
