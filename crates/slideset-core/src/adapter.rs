//! Capability contract of third-party question widgets.
//!
//! The core never looks inside a question. It talks to each one through a
//! [`QuestionAdapter`]: a small required surface plus optional capabilities
//! that are probed before use. An adapter that does not expose a capability
//! simply has that step skipped.
//!
//! Adapters are shared between the set and the host as [`SharedAdapter`].
//! An adapter must release any borrow of itself before invoking a handler
//! registered through [`QuestionAdapter::on`], since the handler chain may
//! call back into the same adapter (to show a button, for example).

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::{Result, SetError};
use crate::statement::{InteractionKind, Statement};

/// Adapter shared between the set and the host that created it.
pub type SharedAdapter = Rc<RefCell<dyn QuestionAdapter>>;

/// Handler registered on an adapter event.
pub type AdapterHandler = Rc<dyn Fn(&AdapterEvent) -> Result<()>>;

/// Action run when an adapter-hosted button is clicked.
pub type ButtonAction = Rc<dyn Fn() -> Result<()>>;

/// Id of the button moving to the next slide.
pub const NEXT_BUTTON: &str = "next";

/// Id of the button moving to the previous slide.
pub const PREVIOUS_BUTTON: &str = "previous";

/// Id of the button on the last slide leading to the solution screen.
pub const FINISH_BUTTON: &str = "finish";

/// Kinds of events an adapter can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterEventKind {
    /// The learner interacted with the question.
    Interaction,
    /// The question wants its container re-measured.
    Resize,
}

/// Event emitted by an adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterEvent {
    /// The learner interacted with the question.
    Interaction {
        /// Kind of interaction.
        verb: InteractionKind,
        /// Statement describing the interaction, if the question produces one.
        statement: Option<Statement>,
    },
    /// The question wants its container re-measured.
    Resize {
        /// `true` when the resize was propagated down from the set itself.
        from_parent: bool,
    },
}

impl AdapterEvent {
    /// Returns the kind of this event.
    #[must_use]
    pub const fn kind(&self) -> AdapterEventKind {
        match self {
            Self::Interaction { .. } => AdapterEventKind::Interaction,
            Self::Resize { .. } => AdapterEventKind::Resize,
        }
    }
}

/// Where a question is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideContainer {
    /// 0-based slide index.
    pub index: usize,
    /// Stable per-slide identifier from the configuration.
    pub sub_content_id: String,
    /// Text of the slide's progress announcer.
    pub announcer_label: String,
}

/// Description of a button attached to a question's control bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonSpec {
    /// Button id, unique per adapter.
    pub id: String,
    /// Visible label.
    pub label: String,
    /// Whether the button is shown right away.
    pub visible: bool,
    /// Extra attributes for the rendered element.
    pub attributes: BTreeMap<String, String>,
}

impl ButtonSpec {
    /// Creates a button spec without attributes.
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>, visible: bool) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            visible,
            attributes: BTreeMap::new(),
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

// ============================================================================
// QuestionAdapter
// ============================================================================

/// Uniform wrapper around a third-party question widget.
pub trait QuestionAdapter {
    /// Current score of the question.
    fn score(&self) -> u32;

    /// Maximum score of the question. Static for the question's lifetime.
    fn max_score(&self) -> u32;

    /// Called once when the question is placed into its slide.
    fn attach(&mut self, container: &SlideContainer);

    /// Registers a handler for an event kind.
    fn on(&mut self, kind: AdapterEventKind, handler: AdapterHandler);

    /// Called when the set's container was resized by the host.
    fn parent_resized(&mut self) {}

    /// Returns the button capability, if supported.
    fn as_button_host(&mut self) -> Option<&mut dyn ButtonHost> {
        None
    }

    /// Returns the stop capability, if supported.
    fn as_stoppable(&mut self) -> Option<&mut dyn Stoppable> {
        None
    }

    /// Returns the reset capability, if supported.
    fn as_resettable(&mut self) -> Option<&mut dyn Resettable> {
        None
    }

    /// Returns the solution capability, if supported.
    fn as_solution_reveal(&mut self) -> Option<&mut dyn SolutionReveal> {
        None
    }

    /// Returns the statement capability, if supported.
    fn as_statement_source(&self) -> Option<&dyn StatementSource> {
        None
    }
}

/// Questions that host navigation buttons on their own control bar.
pub trait ButtonHost {
    /// Adds a button. Adding an id twice replaces the previous button.
    fn add_button(&mut self, spec: ButtonSpec, on_click: ButtonAction);
    /// Shows a previously added button.
    fn show_button(&mut self, id: &str);
    /// Hides a previously added button.
    fn hide_button(&mut self, id: &str);
}

/// Questions that can freeze input capture when navigated away from.
pub trait Stoppable {
    /// Stops any ongoing input capture.
    fn stop(&mut self);
}

/// Questions that can reset their own task state.
pub trait Resettable {
    /// Resets the question to its unanswered state.
    fn reset_task(&mut self);
}

/// Questions that can reveal their solution.
pub trait SolutionReveal {
    /// Shows the question's solution.
    fn show_solutions(&mut self);
}

/// Questions that describe their result as a statement.
pub trait StatementSource {
    /// Returns the question's current statement, if it has one.
    fn xapi_data(&self) -> Option<Statement>;
}

// ============================================================================
// Borrow helpers
// ============================================================================

/// Runs `f` with a mutable borrow of the adapter for `slide`.
///
/// # Errors
///
/// Returns `SetError::AdapterBusy` if the adapter is already borrowed.
pub fn with_adapter_mut<T>(
    adapter: &SharedAdapter,
    slide: usize,
    f: impl FnOnce(&mut dyn QuestionAdapter) -> T,
) -> Result<T> {
    let mut guard = adapter
        .try_borrow_mut()
        .map_err(|_| SetError::AdapterBusy { slide })?;
    Ok(f(&mut *guard))
}

/// Runs `f` with a shared borrow of the adapter for `slide`.
///
/// # Errors
///
/// Returns `SetError::AdapterBusy` if the adapter is mutably borrowed.
pub fn with_adapter<T>(
    adapter: &SharedAdapter,
    slide: usize,
    f: impl FnOnce(&dyn QuestionAdapter) -> T,
) -> Result<T> {
    let guard = adapter
        .try_borrow()
        .map_err(|_| SetError::AdapterBusy { slide })?;
    Ok(f(&*guard))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct Minimal {
        attached: bool,
    }

    impl QuestionAdapter for Minimal {
        fn score(&self) -> u32 {
            0
        }

        fn max_score(&self) -> u32 {
            2
        }

        fn attach(&mut self, _container: &SlideContainer) {
            self.attached = true;
        }

        fn on(&mut self, _kind: AdapterEventKind, _handler: AdapterHandler) {}
    }

    fn shared() -> SharedAdapter {
        Rc::new(RefCell::new(Minimal { attached: false }))
    }

    #[test]
    fn test_optional_capabilities_default_to_none() {
        let adapter = shared();
        with_adapter_mut(&adapter, 0, |a| {
            assert!(a.as_button_host().is_none());
            assert!(a.as_stoppable().is_none());
            assert!(a.as_resettable().is_none());
            assert!(a.as_solution_reveal().is_none());
        })
        .unwrap();
        assert!(with_adapter(&adapter, 0, |a| a.as_statement_source().is_none()).unwrap());
    }

    #[test]
    fn test_busy_adapter_is_reported() {
        let adapter = shared();
        let _guard = adapter.borrow_mut();

        let err = with_adapter(&adapter, 3, |a| a.max_score()).unwrap_err();
        assert!(matches!(err, SetError::AdapterBusy { slide: 3 }));
        let err = with_adapter_mut(&adapter, 3, |a| a.parent_resized()).unwrap_err();
        assert!(matches!(err, SetError::AdapterBusy { slide: 3 }));
    }

    #[test]
    fn test_button_spec_attributes() {
        let spec = ButtonSpec::new(NEXT_BUTTON, "", true)
            .with_attribute("href", "#")
            .with_attribute("aria-label", "Next question");
        assert_eq!(spec.attributes.len(), 2);
        assert_eq!(spec.attributes["href"], "#");
    }

    #[test]
    fn test_adapter_event_kind() {
        let event = AdapterEvent::Resize { from_parent: false };
        assert_eq!(event.kind(), AdapterEventKind::Resize);
        let event = AdapterEvent::Interaction {
            verb: InteractionKind::Answered,
            statement: None,
        };
        assert_eq!(event.kind(), AdapterEventKind::Interaction);
    }
}
