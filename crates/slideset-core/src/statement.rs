//! xAPI-style statements exchanged with question adapters and the host.
//!
//! Statements are modelled loosely: the fields the core reads or writes are
//! typed, everything else an adapter puts into a statement is carried through
//! untouched in the flattened `extra` maps.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Base IRI of the ADL verb vocabulary.
pub const ADL_VERB_BASE: &str = "http://adlnet.gov/expapi/verbs/";

/// Context extension recording the 1-based slide a statement came from.
pub const ENDING_POINT_EXTENSION: &str = "http://id.tincanapi.com/extension/ending-point";

/// Activity type used for interactions.
pub const INTERACTION_ACTIVITY_TYPE: &str = "http://adlnet.gov/expapi/activities/cmi.interaction";

// ============================================================================
// InteractionKind
// ============================================================================

/// Short verb carried by an adapter interaction event.
///
/// Only `interacted`, `answered` and `attempted` count as answering a slide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    /// The learner interacted with the question.
    Interacted,
    /// The learner submitted an answer.
    Answered,
    /// The learner attempted the question.
    Attempted,
    /// The question reports itself complete.
    Completed,
    /// The learner progressed within the question.
    Progressed,
    /// Any other verb, keyed by its short name.
    Other(String),
}

impl InteractionKind {
    /// Parses a short verb name, case-insensitively.
    #[must_use]
    pub fn from_short_verb(verb: &str) -> Self {
        match verb.to_lowercase().as_str() {
            "interacted" => Self::Interacted,
            "answered" => Self::Answered,
            "attempted" => Self::Attempted,
            "completed" => Self::Completed,
            "progressed" => Self::Progressed,
            other => Self::Other(other.to_string()),
        }
    }

    /// Derives the kind from a full verb IRI using its last path segment.
    ///
    /// # Examples
    ///
    /// ```
    /// use slideset_core::InteractionKind;
    ///
    /// let kind = InteractionKind::from_verb_iri("http://adlnet.gov/expapi/verbs/answered");
    /// assert_eq!(kind, InteractionKind::Answered);
    /// ```
    #[must_use]
    pub fn from_verb_iri(iri: &str) -> Self {
        let short = iri.rsplit('/').next().unwrap_or(iri);
        Self::from_short_verb(short)
    }

    /// Returns the short verb name.
    #[must_use]
    pub fn short_name(&self) -> &str {
        match self {
            Self::Interacted => "interacted",
            Self::Answered => "answered",
            Self::Attempted => "attempted",
            Self::Completed => "completed",
            Self::Progressed => "progressed",
            Self::Other(name) => name,
        }
    }

    /// Returns the full ADL verb IRI.
    #[must_use]
    pub fn verb_iri(&self) -> String {
        format!("{ADL_VERB_BASE}{}", self.short_name())
    }

    /// Returns `true` if this interaction marks its slide as answered.
    ///
    /// Decided on the short name, so an `Other` holding a known verb counts
    /// the same as the named variant.
    #[must_use]
    pub fn counts_as_answer(&self) -> bool {
        let name = self.short_name();
        ["interacted", "answered", "attempted"]
            .iter()
            .any(|verb| name.eq_ignore_ascii_case(verb))
    }
}

impl std::fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}

impl<'de> Deserialize<'de> for InteractionKind {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.trim().is_empty() {
            return Err(serde::de::Error::custom("interaction verb must not be empty"));
        }
        Ok(Self::from_short_verb(&s))
    }
}

impl Serialize for InteractionKind {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.short_name())
    }
}

// ============================================================================
// Statement
// ============================================================================

/// Verb of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verb {
    /// Verb IRI.
    pub id: String,
    /// Language map of display names.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub display: BTreeMap<String, String>,
}

impl Verb {
    /// Builds the ADL verb for an interaction kind with an `en-US` display name.
    #[must_use]
    pub fn from_kind(kind: &InteractionKind) -> Self {
        let mut display = BTreeMap::new();
        display.insert("en-US".to_string(), kind.short_name().to_string());
        Self {
            id: kind.verb_iri(),
            display,
        }
    }
}

/// Definition of the activity a statement is about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDefinition {
    /// Language map of names.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub name: BTreeMap<String, String>,
    /// Activity type IRI.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<String>,
    /// Interaction type (`compound`, `choice`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_type: Option<String>,
    /// Fields not interpreted by the core.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Object of a statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementObject {
    /// Activity IRI or identifier.
    pub id: String,
    /// Optional activity definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<ActivityDefinition>,
}

/// Score block of a statement result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    /// Lowest possible score.
    pub min: f64,
    /// Highest possible score.
    pub max: f64,
    /// Achieved score.
    pub raw: f64,
    /// `raw / max`, or 0 when `max` is 0.
    pub scaled: f64,
}

impl Score {
    /// Builds a score with a zero minimum.
    #[must_use]
    pub fn new(raw: u32, max: u32) -> Self {
        let scaled = if max == 0 {
            0.0
        } else {
            f64::from(raw) / f64::from(max)
        };
        Self {
            min: 0.0,
            max: f64::from(max),
            raw: f64::from(raw),
            scaled,
        }
    }
}

/// Result block of a statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementResult {
    /// Score achieved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
    /// Whether the attempt was successful.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    /// Whether the activity was completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion: Option<bool>,
    /// Learner response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Fields not interpreted by the core.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Context block of a statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementContext {
    /// Context extensions keyed by IRI.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, Value>,
    /// Fields not interpreted by the core.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An xAPI-style statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// What happened.
    pub verb: Verb,
    /// What it happened to.
    pub object: StatementObject,
    /// Outcome, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<StatementResult>,
    /// Context of the statement.
    #[serde(default)]
    pub context: StatementContext,
    /// When the statement was produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Fields not interpreted by the core (actor, authority, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Statement {
    /// Creates a statement with the given verb about `object_id`, stamped now.
    #[must_use]
    pub fn new(kind: &InteractionKind, object_id: impl Into<String>) -> Self {
        Self {
            verb: Verb::from_kind(kind),
            object: StatementObject {
                id: object_id.into(),
                definition: None,
            },
            result: None,
            context: StatementContext::default(),
            timestamp: Some(Utc::now()),
            extra: Map::new(),
        }
    }

    /// Attaches a scored result.
    #[must_use]
    pub fn with_score(mut self, raw: u32, max: u32) -> Self {
        let result = self.result.get_or_insert_with(StatementResult::default);
        result.score = Some(Score::new(raw, max));
        self
    }

    /// Returns the interaction kind of this statement's verb.
    #[must_use]
    pub fn kind(&self) -> InteractionKind {
        InteractionKind::from_verb_iri(&self.verb.id)
    }

    /// Records the 1-based slide number this statement came from.
    pub fn set_ending_point(&mut self, slide_number: usize) {
        self.context
            .extensions
            .insert(ENDING_POINT_EXTENSION.to_string(), Value::from(slide_number));
    }

    /// Returns the recorded 1-based slide number, if any.
    #[must_use]
    pub fn ending_point(&self) -> Option<u64> {
        self.context
            .extensions
            .get(ENDING_POINT_EXTENSION)
            .and_then(Value::as_u64)
    }

    /// Returns the raw score, if the statement carries one.
    #[must_use]
    pub fn raw_score(&self) -> Option<f64> {
        self.result
            .as_ref()
            .and_then(|result| result.score)
            .map(|score| score.raw)
    }
}

/// The composite result of one question set: its own statement plus the
/// statements of the slides that produced one, in slide order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultStatement {
    /// The set's own `answered` statement.
    pub statement: Statement,
    /// Child statements in slide order.
    #[serde(default)]
    pub children: Vec<Statement>,
}

impl ResultStatement {
    /// Returns `true` if the set was completed with full marks.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.statement
            .result
            .as_ref()
            .and_then(|result| result.success)
            .unwrap_or(false)
    }
}
