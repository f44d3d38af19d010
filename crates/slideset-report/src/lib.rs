//! SlideSet Report Generation
//!
//! This crate provides types and utilities for generating reports from a
//! question-set session. Reports can be serialized to JSON for programmatic
//! access or rendered to Markdown for human consumption.
//!
//! # Types
//!
//! - [`Report`] - The complete report of one session
//! - [`ReportSummary`] - Score, progress and final screen of the session
//! - [`SlideRow`] - Per-slide score and answered flag
//! - [`TimelineEntry`] - A timestamped event published during the session
//!
//! # Generators
//!
//! - [`json::JsonGenerator`] - Generate JSON reports with compact or pretty formatting
//! - [`MarkdownGenerator`] - Generate human-readable Markdown reports
//!
//! # Example
//!
//! ```rust
//! use slideset_report::{Report, ReportSummary, ReportViewState, SlideRow};
//! use slideset_report::json::JsonGenerator;
//!
//! let report = Report::builder()
//!     .title("Fruit vocabulary")
//!     .summary(ReportSummary {
//!         view_state: ReportViewState::SolutionScreen,
//!         score: 2,
//!         max_score: 2,
//!         answered: 2,
//!         total_slides: 2,
//!         ..ReportSummary::default()
//!     })
//!     .slide(SlideRow::new(0, "apple", 1, 1, true))
//!     .slide(SlideRow::new(1, "pear", 1, 1, true))
//!     .build()
//!     .unwrap();
//!
//! let generator = JsonGenerator::new(&report);
//! let json = generator.generate_pretty().unwrap();
//! assert!(json.contains("Fruit vocabulary"));
//! ```

pub mod json;
mod markdown;

pub use markdown::MarkdownGenerator;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Failed to serialize the report to JSON.
    #[error("failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to read or write report files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid report data.
    #[error("invalid report data: {0}")]
    InvalidData(String),
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

// ============================================================================
// Report View State (local copy to avoid cross-crate dependency)
// ============================================================================

/// Screen the set was showing when the report was generated.
///
/// Local copy of the core `ViewState`, so this crate stays independent of
/// the coordination core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportViewState {
    /// Introduction screen.
    Intro,
    /// Question slides.
    #[default]
    Questions,
    /// Score and feedback screen.
    SolutionScreen,
}

impl ReportViewState {
    /// Returns a human-readable description of the state.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Intro => "Introduction",
            Self::Questions => "Questions",
            Self::SolutionScreen => "Solution screen",
        }
    }
}

impl std::fmt::Display for ReportViewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ============================================================================
// Report
// ============================================================================

/// Complete report of one question-set session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    /// Title of the set.
    pub title: String,

    /// Score and progress summary.
    pub summary: ReportSummary,

    /// One row per slide, in slide order.
    pub slides: Vec<SlideRow>,

    /// Chronological timeline of bus events.
    pub timeline: Vec<TimelineEntry>,
}

impl Report {
    /// Creates a new report builder.
    #[must_use]
    pub fn builder() -> ReportBuilder {
        ReportBuilder::default()
    }

    /// Serializes the report to JSON.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Serialization` if JSON serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(ReportError::from)
    }

    /// Returns the rows of slides that were not answered.
    #[must_use]
    pub fn unanswered_slides(&self) -> Vec<&SlideRow> {
        self.slides.iter().filter(|row| !row.answered).collect()
    }

    /// Returns `true` if every slide was answered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.slides.is_empty() && self.slides.iter().all(|row| row.answered)
    }
}

// ============================================================================
// ReportBuilder
// ============================================================================

/// Builder for constructing [`Report`] instances.
#[derive(Debug, Clone, Default)]
pub struct ReportBuilder {
    title: Option<String>,
    summary: Option<ReportSummary>,
    slides: Vec<SlideRow>,
    timeline: Vec<TimelineEntry>,
}

impl ReportBuilder {
    /// Sets the set title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the report summary.
    #[must_use]
    pub fn summary(mut self, summary: ReportSummary) -> Self {
        self.summary = Some(summary);
        self
    }

    /// Adds a slide row.
    #[must_use]
    pub fn slide(mut self, row: SlideRow) -> Self {
        self.slides.push(row);
        self
    }

    /// Sets all slide rows at once.
    #[must_use]
    pub fn slides(mut self, rows: Vec<SlideRow>) -> Self {
        self.slides = rows;
        self
    }

    /// Adds a timeline entry.
    #[must_use]
    pub fn timeline_entry(mut self, entry: TimelineEntry) -> Self {
        self.timeline.push(entry);
        self
    }

    /// Sets the complete timeline.
    #[must_use]
    pub fn timeline(mut self, timeline: Vec<TimelineEntry>) -> Self {
        self.timeline = timeline;
        self
    }

    /// Builds the report.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidData` if the title or summary is missing,
    /// or if the slide rows disagree with the summary's slide count.
    pub fn build(self) -> Result<Report> {
        let title = self
            .title
            .ok_or_else(|| ReportError::InvalidData("title is required".to_string()))?;

        let summary = self
            .summary
            .ok_or_else(|| ReportError::InvalidData("summary is required".to_string()))?;

        if !self.slides.is_empty() && self.slides.len() != summary.total_slides {
            return Err(ReportError::InvalidData(format!(
                "summary counts {} slides but {} rows were given",
                summary.total_slides,
                self.slides.len()
            )));
        }

        Ok(Report {
            title,
            summary,
            slides: self.slides,
            timeline: self.timeline,
        })
    }
}

// ============================================================================
// ReportSummary
// ============================================================================

/// Score and progress of the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Screen shown when the report was generated.
    pub view_state: ReportViewState,

    /// Total score.
    pub score: u32,

    /// Total max score.
    pub max_score: u32,

    /// Number of answered slides.
    pub answered: usize,

    /// Number of slides.
    pub total_slides: usize,

    /// Whether the composed result statement reported success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,

    /// Overall feedback text shown on the solution screen.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub feedback: String,
}

impl ReportSummary {
    /// Score as a rounded percentage of the max score.
    ///
    /// A set without points counts as complete.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.max_score == 0 {
            return 100;
        }
        let ratio = f64::from(self.score.min(self.max_score)) / f64::from(self.max_score);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let percent = (ratio * 100.0).round() as u32;
        percent
    }
}

// ============================================================================
// SlideRow
// ============================================================================

/// Score and status of one slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideRow {
    /// 0-based slide index.
    pub index: usize,

    /// Stable per-slide identifier.
    pub sub_content_id: String,

    /// Current score.
    pub score: u32,

    /// Max score.
    pub max_score: u32,

    /// Whether the slide was answered this episode.
    pub answered: bool,
}

impl SlideRow {
    /// Creates a slide row.
    #[must_use]
    pub fn new(
        index: usize,
        sub_content_id: impl Into<String>,
        score: u32,
        max_score: u32,
        answered: bool,
    ) -> Self {
        Self {
            index,
            sub_content_id: sub_content_id.into(),
            score,
            max_score,
            answered,
        }
    }
}

// ============================================================================
// TimelineEntry
// ============================================================================

/// A timestamped event published during the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,

    /// Script step during which the event was published (1-based, 0 for
    /// events published while the set was being built).
    pub step: u32,

    /// Event name.
    pub event: String,

    /// Optional additional details about the event.
    pub details: Option<String>,
}

impl TimelineEntry {
    /// Creates a new timeline entry.
    #[must_use]
    pub fn new(step: u32, event: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            step,
            event: event.into(),
            details: None,
        }
    }

    /// Creates a new timeline entry with details.
    #[must_use]
    pub fn with_details(step: u32, event: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            step,
            event: event.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a new timeline entry with a specific timestamp.
    #[must_use]
    pub fn at_time(timestamp: DateTime<Utc>, step: u32, event: impl Into<String>) -> Self {
        Self {
            timestamp,
            step,
            event: event.into(),
            details: None,
        }
    }
}
