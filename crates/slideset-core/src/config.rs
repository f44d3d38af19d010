//! Set definition types for the SlideSet core.
//!
//! A set definition is the inbound configuration of one composite
//! exercise: the ordered question list, the optional introduction screen,
//! the overall feedback table, localized labels and behaviour flags.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SetError};
use crate::feedback::{self, FeedbackRange};
use crate::l10n::L10n;

/// Default identifier used in the composite statement's object id.
fn default_id() -> String {
    "question-set".to_string()
}

/// Default value for boolean options that default to true.
const fn default_true() -> bool {
    true
}

/// Complete definition of one question set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetConfig {
    /// Stable identifier of the set, used as the statement object id.
    #[serde(default = "default_id")]
    pub id: String,

    /// Human readable title of the set.
    #[serde(default)]
    pub title: String,

    /// Ordered question slides. Order is fixed for the lifetime of the set.
    #[serde(default)]
    pub questions: Vec<QuestionConfig>,

    /// Introduction screen settings.
    #[serde(default)]
    pub introduction: IntroductionConfig,

    /// Feedback bands shown on the solution screen.
    #[serde(default)]
    pub overall_feedback: Vec<FeedbackRange>,

    /// Localized labels.
    #[serde(default)]
    pub l10n: L10n,

    /// Behaviour flags.
    #[serde(default)]
    pub behaviour: Behaviour,
}

impl Default for SetConfig {
    fn default() -> Self {
        Self {
            id: default_id(),
            title: String::new(),
            questions: Vec::new(),
            introduction: IntroductionConfig::default(),
            overall_feedback: Vec::new(),
            l10n: L10n::default(),
            behaviour: Behaviour::default(),
        }
    }
}

impl SetConfig {
    /// Loads and validates a set definition from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `SetError::ConfigParseError` if the file cannot be read or
    /// is not valid JSON, and the errors of [`SetConfig::validate`] otherwise.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SetError::config_parse(path, format!("failed to read file: {e}")))?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| SetError::config_parse(path, e.to_string()))?;
        config.validate()?;

        tracing::debug!(
            path = %path.display(),
            questions = config.questions.len(),
            "Loaded set definition"
        );
        Ok(config)
    }

    /// Parses and validates a set definition from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns `SetError::Json` on malformed input and the errors of
    /// [`SetConfig::validate`] otherwise.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the set definition.
    ///
    /// Checks that:
    /// - at least one question is configured
    /// - every question has a non-empty, unique `subContentId`
    /// - the feedback ranges are well formed
    ///
    /// # Errors
    ///
    /// Returns `SetError::NoQuestions` for an empty question list and
    /// `SetError::ConfigValidationError` for any other failed check.
    pub fn validate(&self) -> Result<()> {
        if self.questions.is_empty() {
            return Err(SetError::NoQuestions);
        }

        let mut seen = HashSet::new();
        for (i, question) in self.questions.iter().enumerate() {
            if question.sub_content_id.trim().is_empty() {
                return Err(SetError::config_validation(
                    format!("questions[{i}].subContentId must not be empty"),
                    "Give every question a stable subContentId",
                ));
            }
            if !seen.insert(question.sub_content_id.as_str()) {
                return Err(SetError::config_validation(
                    format!(
                        "questions[{i}].subContentId '{}' is used more than once",
                        question.sub_content_id
                    ),
                    "Make every question's subContentId unique within the set",
                ));
            }
        }

        feedback::validate_ranges(&self.overall_feedback)
    }

    /// Returns `true` if the set opens on the introduction screen.
    #[must_use]
    pub const fn starts_with_introduction(&self) -> bool {
        self.introduction.show_intro_page
    }

    /// Sums the declared max score of every question.
    ///
    /// Only questions naming both a library and params are considered.
    /// `resolver` returns the max score a question library declares for the
    /// given params; non-integral and unresolved scores are ignored.
    ///
    /// # Errors
    ///
    /// Returns `SetError::ConfigValidationError` if the total is negative,
    /// not finite or does not fit a `u32`.
    pub fn declared_max_score<F>(&self, resolver: F) -> Result<u32>
    where
        F: Fn(&str, &Value) -> Option<f64>,
    {
        let total: f64 = self
            .questions
            .iter()
            .filter_map(|q| match (&q.library, &q.params) {
                (Some(library), Some(params)) => resolver(library, params),
                _ => None,
            })
            .filter(|score| score.is_finite() && score.fract() == 0.0)
            .sum();

        if !total.is_finite() || total < 0.0 || total > f64::from(u32::MAX) {
            return Err(SetError::config_validation(
                format!("declared max score {total} is not a valid score"),
                "Check that every question declares a non-negative whole max score",
            ));
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let total = total as u32;
        Ok(total)
    }
}

/// Configuration of a single question slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionConfig {
    /// Library (widget type) implementing the question, e.g. `H5P.SpeakTheWords 1.3`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,

    /// Opaque parameters handed to the question widget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,

    /// Stable per-slide identifier.
    #[serde(default)]
    pub sub_content_id: String,
}

impl QuestionConfig {
    /// Creates a question with the given identifier and no library.
    #[must_use]
    pub fn new(sub_content_id: impl Into<String>) -> Self {
        Self {
            library: None,
            params: None,
            sub_content_id: sub_content_id.into(),
        }
    }

    /// Sets the library and params of this question.
    #[must_use]
    pub fn with_library(mut self, library: impl Into<String>, params: Value) -> Self {
        self.library = Some(library.into());
        self.params = Some(params);
        self
    }
}

/// Image shown on the introduction screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Path of the image relative to the content folder.
    pub path: String,
}

/// Introduction screen settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntroductionConfig {
    /// Whether the set opens on the introduction screen.
    #[serde(default)]
    pub show_intro_page: bool,

    /// Optional title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduction_title: Option<String>,

    /// Optional HTML body text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduction_text: Option<String>,

    /// Optional image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduction_image: Option<ImageRef>,
}

impl IntroductionConfig {
    /// Returns the image path if one is configured and non-empty.
    #[must_use]
    pub fn image_path(&self) -> Option<&str> {
        self.introduction_image
            .as_ref()
            .map(|image| image.path.as_str())
            .filter(|path| !path.is_empty())
    }
}

/// Behaviour flags of the set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Behaviour {
    /// Move to the solution screen as soon as every slide is answered.
    ///
    /// When disabled the learner reaches it through the finish button.
    #[serde(default = "default_true")]
    pub auto_show_solution_screen: bool,
}

impl Default for Behaviour {
    fn default() -> Self {
        Self {
            auto_show_solution_screen: default_true(),
        }
    }
}
