//! Markdown report generation.
//!
//! [`MarkdownGenerator`] renders a [`Report`] as a Markdown document with:
//!
//! - A summary table with score and progress
//! - A table of slides
//! - A timeline of bus events
//!
//! # Example
//!
//! ```rust
//! use slideset_report::{Report, MarkdownGenerator};
//!
//! let report = Report::default();
//! let markdown = MarkdownGenerator::new(&report).generate();
//! assert!(markdown.contains("# Question Set Report"));
//! ```

use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::{Report, SlideRow, TimelineEntry};

/// Generates Markdown reports from question-set sessions.
pub struct MarkdownGenerator<'a> {
    report: &'a Report,
}

impl<'a> MarkdownGenerator<'a> {
    /// Creates a new Markdown generator for the given report.
    #[must_use]
    pub const fn new(report: &'a Report) -> Self {
        Self { report }
    }

    /// Generates the complete Markdown report.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();

        self.write_title(&mut output);
        self.write_summary(&mut output);
        self.write_slides(&mut output);
        self.write_timeline(&mut output);
        Self::write_footer(&mut output);

        output
    }

    fn write_title(&self, output: &mut String) {
        let title = &self.report.title;
        if title.is_empty() {
            let _ = writeln!(output, "# Question Set Report\n");
        } else {
            let _ = writeln!(output, "# Question Set Report: {}\n", escape_markdown(title));
        }
    }

    fn write_summary(&self, output: &mut String) {
        let summary = &self.report.summary;

        let _ = writeln!(output, "## Summary\n");
        let _ = writeln!(output, "| Metric | Value |");
        let _ = writeln!(output, "|--------|-------|");
        let _ = writeln!(output, "| Screen | {} |", summary.view_state.description());
        let _ = writeln!(
            output,
            "| Score | {} / {} ({}%) |",
            summary.score,
            summary.max_score,
            summary.percentage()
        );
        let _ = writeln!(
            output,
            "| Answered | {} of {} |",
            summary.answered, summary.total_slides
        );
        if let Some(success) = summary.success {
            let _ = writeln!(output, "| Success | {} |", if success { "yes" } else { "no" });
        }
        if !summary.feedback.is_empty() {
            let _ = writeln!(output, "| Feedback | {} |", escape_markdown(&summary.feedback));
        }
        let _ = writeln!(output);
    }

    fn write_slides(&self, output: &mut String) {
        let _ = writeln!(output, "## Slides\n");

        if self.report.slides.is_empty() {
            let _ = writeln!(output, "*No slides recorded.*\n");
            return;
        }

        let _ = writeln!(output, "| # | Question | Score | Answered |");
        let _ = writeln!(output, "|---|----------|-------|----------|");
        for row in &self.report.slides {
            Self::write_slide_row(output, row);
        }
        let _ = writeln!(output);
    }

    fn write_slide_row(output: &mut String, row: &SlideRow) {
        let number = row.index + 1;
        let id = escape_markdown(&row.sub_content_id);
        let answered = if row.answered { "&#10003;" } else { "" };
        let _ = writeln!(
            output,
            "| {number} | {id} | {} / {} | {answered} |",
            row.score, row.max_score
        );
    }

    fn write_timeline(&self, output: &mut String) {
        let _ = writeln!(output, "## Timeline\n");

        if self.report.timeline.is_empty() {
            let _ = writeln!(output, "*No events recorded.*\n");
            return;
        }

        let _ = writeln!(output, "| Time | Step | Event | Details |");
        let _ = writeln!(output, "|------|------|-------|---------|");
        for entry in &self.report.timeline {
            Self::write_timeline_entry(output, entry);
        }
        let _ = writeln!(output);
    }

    fn write_timeline_entry(output: &mut String, entry: &TimelineEntry) {
        let details = entry
            .details
            .as_deref()
            .map(escape_markdown)
            .unwrap_or_default();

        let time = format_timestamp(&entry.timestamp);
        let step = entry.step;
        let event = escape_markdown(&entry.event);
        let _ = writeln!(output, "| {time} | {step} | {event} | {details} |");
    }

    fn write_footer(output: &mut String) {
        let _ = writeln!(output, "---");
        let timestamp = format_timestamp(&Utc::now());
        let _ = writeln!(output, "*Generated by slideset at {timestamp}*");
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Escapes special Markdown characters so text is safe inside table cells.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            '*' | '_' | '`' | '#' | '[' | ']' | '(' | ')' | '!' | '\\' | '<' | '>' | '|' => {
                result.push('\\');
                result.push(ch);
            }
            '\n' => result.push_str("<br>"),
            _ => result.push(ch),
        }
    }

    result
}
