//! Localized labels and `:placeholder` template rendering.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Matches `:name` placeholders such as `:num` or `:total`.
static PLACEHOLDER: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r":([A-Za-z]+)").ok());

/// Replaces `:name` placeholders in `template` with the matching value.
///
/// Placeholders without a value are left untouched.
///
/// # Examples
///
/// ```
/// use slideset_core::l10n::render_template;
///
/// let label = render_template("Slide :num of :total", &[("num", "2"), ("total", "5")]);
/// assert_eq!(label, "Slide 2 of 5");
/// ```
#[must_use]
pub fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    let Some(re) = PLACEHOLDER.as_ref() else {
        return template.to_string();
    };

    re.replace_all(template, |caps: &Captures<'_>| {
        let name = caps.get(1).map_or("", |m| m.as_str());
        values
            .iter()
            .find(|(key, _)| *key == name)
            .map_or_else(|| caps[0].to_string(), |(_, value)| (*value).to_string())
    })
    .into_owned()
}

fn default_introduction_button() -> String {
    "Start".to_string()
}

fn default_finish_button() -> String {
    "Finish".to_string()
}

fn default_results_label() -> String {
    "Your results:".to_string()
}

fn default_show_solutions_button() -> String {
    "Show solution".to_string()
}

fn default_retry_button() -> String {
    "Retry".to_string()
}

fn default_navigation_bar_title() -> String {
    "Slide :num".to_string()
}

fn default_answered_aria() -> String {
    "Answered".to_string()
}

fn default_active_aria() -> String {
    "Currently active".to_string()
}

fn default_next_aria() -> String {
    "Next question".to_string()
}

fn default_previous_aria() -> String {
    "Previous question".to_string()
}

/// Localized labels supplied by the content author.
///
/// Storage and translation of these strings belong to the host; the core
/// only renders them into button labels and progress announcements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct L10n {
    /// Label of the button that leaves the introduction screen.
    #[serde(default = "default_introduction_button")]
    pub introduction_button_label: String,

    /// Label of the finish button on the last slide.
    #[serde(default = "default_finish_button")]
    pub finish_button_label: String,

    /// Heading of the solution screen.
    #[serde(default = "default_results_label")]
    pub solution_screen_results_label: String,

    /// Label of the show-solutions button on the solution screen.
    #[serde(default = "default_show_solutions_button")]
    pub show_solutions_button_label: String,

    /// Label of the retry button on the solution screen.
    #[serde(default = "default_retry_button")]
    pub retry_button_label: String,

    /// Progress announcer text; `:num` is the 1-based slide number.
    #[serde(default = "default_navigation_bar_title")]
    pub navigation_bar_title: String,

    /// Suffix announced for answered slides.
    #[serde(default = "default_answered_aria")]
    pub answered_slide_aria_label: String,

    /// Suffix announced for the active slide.
    #[serde(default = "default_active_aria")]
    pub active_slide_aria_label: String,

    /// Accessible label of the next button.
    #[serde(default = "default_next_aria")]
    pub next_question_aria_label: String,

    /// Accessible label of the previous button.
    #[serde(default = "default_previous_aria")]
    pub previous_question_aria_label: String,
}

impl Default for L10n {
    fn default() -> Self {
        Self {
            introduction_button_label: default_introduction_button(),
            finish_button_label: default_finish_button(),
            solution_screen_results_label: default_results_label(),
            show_solutions_button_label: default_show_solutions_button(),
            retry_button_label: default_retry_button(),
            navigation_bar_title: default_navigation_bar_title(),
            answered_slide_aria_label: default_answered_aria(),
            active_slide_aria_label: default_active_aria(),
            next_question_aria_label: default_next_aria(),
            previous_question_aria_label: default_previous_aria(),
        }
    }
}

impl L10n {
    /// Renders the progress announcer title for a 0-based slide index.
    #[must_use]
    pub fn slide_title(&self, index: usize) -> String {
        let num = (index + 1).to_string();
        render_template(&self.navigation_bar_title, &[("num", &num)])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_render_template_replaces_known_placeholders() {
        assert_eq!(render_template("Slide :num", &[("num", "3")]), "Slide 3");
    }

    #[test]
    fn test_render_template_keeps_unknown_placeholders() {
        assert_eq!(
            render_template(":num of :total", &[("num", "1")]),
            "1 of :total"
        );
    }

    #[test]
    fn test_render_template_without_placeholders() {
        assert_eq!(render_template("Finish", &[("num", "1")]), "Finish");
    }

    #[test]
    fn test_slide_title_is_one_based() {
        let l10n = L10n::default();
        assert_eq!(l10n.slide_title(0), "Slide 1");
        assert_eq!(l10n.slide_title(9), "Slide 10");
    }

    #[test]
    fn test_l10n_deserialization_with_defaults() {
        let l10n: L10n =
            serde_json::from_str(r#"{"navigationBarTitle": "Frage :num"}"#).unwrap();
        assert_eq!(l10n.slide_title(1), "Frage 2");
        assert_eq!(l10n.finish_button_label, "Finish");
    }
}
