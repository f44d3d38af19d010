//! Error types for the SlideSet core.
//!
//! This module defines the error hierarchy for all core operations,
//! including configuration loading, view-state transitions, slide
//! navigation and failures raised by third-party question adapters.

use std::path::PathBuf;

/// A specialized `Result` type for SlideSet core operations.
pub type Result<T> = std::result::Result<T, SetError>;

/// Errors that can occur while running a question set.
///
/// Configuration variants carry an actionable suggestion for the content
/// author. Runtime variants describe a rejected operation; none of them
/// leaves the set in a partially mutated state.
#[derive(Debug, thiserror::Error)]
pub enum SetError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in a set definition file.
    #[error("Invalid JSON in set definition '{path}': {message}\n\nSuggestion: Validate the file with a JSON linter")]
    ConfigParseError {
        /// Path to the set definition.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Set definition validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the author.
        suggestion: String,
    },

    /// The set contains no questions, so it cannot be started.
    #[error("Cannot start question set: no questions were supplied\n\nSuggestion: Please supply at least one question")]
    NoQuestions,

    /// The number of adapters handed to the set does not match its questions.
    #[error("Adapter count mismatch: {questions} questions configured but {adapters} adapters supplied")]
    AdapterCountMismatch {
        /// Number of configured questions.
        questions: usize,
        /// Number of adapters supplied by the host.
        adapters: usize,
    },

    // ========================================================================
    // Runtime Errors
    // ========================================================================
    /// A view-state trigger was fired in a state that does not accept it.
    #[error("Invalid state transition: '{trigger}' is not allowed while {from}")]
    InvalidStateTransition {
        /// The current view state.
        from: String,
        /// The rejected trigger.
        trigger: String,
    },

    /// Navigation targeted a slide index that does not exist.
    #[error("Slide {index} is out of range (set has {total} slides)")]
    SlideOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of slides in the set.
        total: usize,
    },

    /// An adapter was already borrowed when the core needed it.
    ///
    /// Raised when an adapter invokes one of its handlers while holding a
    /// borrow of itself, and the handler chain tries to call back into it.
    #[error("Adapter for slide {slide} is busy and cannot be re-entered")]
    AdapterBusy {
        /// Index of the slide whose adapter was busy.
        slide: usize,
    },

    /// A third-party adapter reported a failure while handling an event.
    #[error("Adapter for slide {slide} failed: {message}")]
    Adapter {
        /// Index of the failing slide.
        slide: usize,
        /// Description supplied by the adapter.
        message: String,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SetError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `InvalidStateTransition` error.
    #[must_use]
    pub fn invalid_transition(
        from: impl std::fmt::Display,
        trigger: impl std::fmt::Display,
    ) -> Self {
        Self::InvalidStateTransition {
            from: from.to_string(),
            trigger: trigger.to_string(),
        }
    }

    /// Creates a new `SlideOutOfRange` error.
    #[must_use]
    pub const fn slide_out_of_range(index: usize, total: usize) -> Self {
        Self::SlideOutOfRange { index, total }
    }

    /// Creates a new `Adapter` error.
    #[must_use]
    pub fn adapter(slide: usize, message: impl Into<String>) -> Self {
        Self::Adapter {
            slide,
            message: message.into(),
        }
    }

    /// Returns `true` if the set cannot be started because of this error.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigParseError { .. }
                | Self::ConfigValidationError { .. }
                | Self::NoQuestions
                | Self::AdapterCountMismatch { .. }
        )
    }

    /// Returns `true` if this error rejected a runtime operation without
    /// changing any state.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidStateTransition { .. } | Self::SlideOutOfRange { .. }
        )
    }
}
