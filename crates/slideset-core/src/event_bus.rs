//! Event types and the synchronous publish/subscribe bus of a question set.
//!
//! One [`EventBus`] exists per question set. Every component that needs to
//! react to another component's state change subscribes here instead of
//! holding a reference upward.
//!
//! # Event Types
//!
//! - `slide_interaction` - an adapter reported an interaction on a slide
//! - `slide_statement` - an adapter emitted a statement (already enriched)
//! - `slide_changed` - the current slide changed
//! - `all_answered` - every slide has been answered (once per episode)
//! - `solution_screen_requested` - the finish control was used
//! - `view_changed` - the view state machine moved
//! - `retry` - the set is being reset
//! - `show_solutions` - every slide should reveal its solution
//! - `resize_requested` - the host should re-measure the container
//! - `focus_announcer` - the host should focus a slide's progress announcer
//! - `result_statement` - the composite statement for the episode is ready
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use slideset_core::{EventBus, EventKind, SetEvent};
//!
//! let bus = EventBus::new();
//! let resizes = Rc::new(Cell::new(0));
//!
//! let counter = Rc::clone(&resizes);
//! bus.subscribe(EventKind::ResizeRequested, move |_| {
//!     counter.set(counter.get() + 1);
//!     Ok(())
//! });
//!
//! bus.publish(&SetEvent::ResizeRequested).unwrap();
//! assert_eq!(resizes.get(), 1);
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::statement::{InteractionKind, ResultStatement, Statement};
use crate::view_state::ViewState;

// ============================================================================
// Events
// ============================================================================

/// Events published on a question set's bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum SetEvent {
    /// An adapter reported an interaction.
    SlideInteraction {
        /// Index of the slide.
        slide: usize,
        /// Interaction verb.
        verb: InteractionKind,
    },
    /// An adapter emitted a statement, tagged with its slide number.
    SlideStatement {
        /// Index of the slide.
        slide: usize,
        /// The enriched statement.
        statement: Box<Statement>,
    },
    /// The current slide changed.
    SlideChanged {
        /// Previous slide index.
        from: usize,
        /// New slide index.
        to: usize,
    },
    /// Every slide has been answered in this episode.
    AllAnswered,
    /// The learner asked for the solution screen.
    SolutionScreenRequested,
    /// The view state machine moved.
    ViewChanged {
        /// Previous state.
        from: ViewState,
        /// New state.
        to: ViewState,
    },
    /// The set is being reset for another attempt.
    Retry,
    /// Every slide should reveal its solution.
    ShowSolutions,
    /// The host should re-measure the container.
    ResizeRequested,
    /// The host should focus the progress announcer of a slide.
    FocusAnnouncer {
        /// Index of the slide.
        slide: usize,
    },
    /// The composite statement of the episode is ready.
    ResultStatement(Box<ResultStatement>),
}

impl SetEvent {
    /// Returns the kind this event is dispatched under.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::SlideInteraction { .. } => EventKind::SlideInteraction,
            Self::SlideStatement { .. } => EventKind::SlideStatement,
            Self::SlideChanged { .. } => EventKind::SlideChanged,
            Self::AllAnswered => EventKind::AllAnswered,
            Self::SolutionScreenRequested => EventKind::SolutionScreenRequested,
            Self::ViewChanged { .. } => EventKind::ViewChanged,
            Self::Retry => EventKind::Retry,
            Self::ShowSolutions => EventKind::ShowSolutions,
            Self::ResizeRequested => EventKind::ResizeRequested,
            Self::FocusAnnouncer { .. } => EventKind::FocusAnnouncer,
            Self::ResultStatement(_) => EventKind::ResultStatement,
        }
    }

    /// Returns the event name as a string.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        self.kind().as_str()
    }
}

/// Name under which listeners subscribe. Matching is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// See [`SetEvent::SlideInteraction`].
    SlideInteraction,
    /// See [`SetEvent::SlideStatement`].
    SlideStatement,
    /// See [`SetEvent::SlideChanged`].
    SlideChanged,
    /// See [`SetEvent::AllAnswered`].
    AllAnswered,
    /// See [`SetEvent::SolutionScreenRequested`].
    SolutionScreenRequested,
    /// See [`SetEvent::ViewChanged`].
    ViewChanged,
    /// See [`SetEvent::Retry`].
    Retry,
    /// See [`SetEvent::ShowSolutions`].
    ShowSolutions,
    /// See [`SetEvent::ResizeRequested`].
    ResizeRequested,
    /// See [`SetEvent::FocusAnnouncer`].
    FocusAnnouncer,
    /// See [`SetEvent::ResultStatement`].
    ResultStatement,
}

impl EventKind {
    /// Every event kind, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::SlideInteraction,
        Self::SlideStatement,
        Self::SlideChanged,
        Self::AllAnswered,
        Self::SolutionScreenRequested,
        Self::ViewChanged,
        Self::Retry,
        Self::ShowSolutions,
        Self::ResizeRequested,
        Self::FocusAnnouncer,
        Self::ResultStatement,
    ];

    /// Returns the canonical snake_case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SlideInteraction => "slide_interaction",
            Self::SlideStatement => "slide_statement",
            Self::SlideChanged => "slide_changed",
            Self::AllAnswered => "all_answered",
            Self::SolutionScreenRequested => "solution_screen_requested",
            Self::ViewChanged => "view_changed",
            Self::Retry => "retry",
            Self::ShowSolutions => "show_solutions",
            Self::ResizeRequested => "resize_requested",
            Self::FocusAnnouncer => "focus_announcer",
            Self::ResultStatement => "result_statement",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// A listener callback. Errors propagate to the caller of [`EventBus::publish`].
pub type Listener = Rc<dyn Fn(&SetEvent) -> Result<()>>;

/// Identifies one registration on an [`EventBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    kind: EventKind,
    id: u64,
}

impl SubscriptionHandle {
    /// Returns the event kind this registration listens to.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.kind
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: HashMap<EventKind, Vec<(u64, Listener)>>,
}

/// Synchronous, re-entrant publish/subscribe channel.
///
/// Cloning an `EventBus` yields another handle to the same registry.
/// Listeners run in registration order; a listener registered twice runs
/// twice. Dispatch iterates over a snapshot of the listener list taken when
/// `publish` is called, so listeners may publish, subscribe or unsubscribe
/// freely while an event is being dispatched.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Rc<RefCell<Registry>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.borrow();
        let total: usize = registry.listeners.values().map(Vec::len).sum();
        f.debug_struct("EventBus")
            .field("listeners", &total)
            .finish()
    }
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for events of `kind`. Never fails.
    pub fn subscribe<F>(&self, kind: EventKind, listener: F) -> SubscriptionHandle
    where
        F: Fn(&SetEvent) -> Result<()> + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry
            .listeners
            .entry(kind)
            .or_default()
            .push((id, Rc::new(listener)));
        SubscriptionHandle { kind, id }
    }

    /// Removes a registration. Returns `false` if it was already removed.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let mut registry = self.registry.borrow_mut();
        let Some(listeners) = registry.listeners.get_mut(&handle.kind) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != handle.id);
        listeners.len() != before
    }

    /// Dispatches `event` to every listener registered for its kind.
    ///
    /// Publishing with no listeners is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the first listener error; listeners after the failing one
    /// are not invoked for this event.
    pub fn publish(&self, event: &SetEvent) -> Result<()> {
        let snapshot: Vec<Listener> = {
            let registry = self.registry.borrow();
            registry
                .listeners
                .get(&event.kind())
                .map(|listeners| listeners.iter().map(|(_, l)| Rc::clone(l)).collect())
                .unwrap_or_default()
        };

        tracing::trace!(
            event = event.event_name(),
            listeners = snapshot.len(),
            "Publishing event"
        );

        for listener in snapshot {
            listener(event)?;
        }
        Ok(())
    }

    /// Returns the number of listeners registered for `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.registry
            .borrow()
            .listeners
            .get(&kind)
            .map_or(0, Vec::len)
    }
}
