//! View-state machine of a question set.
//!
//! This module defines the top-level screen state and the transition table
//! that is the sole authority for moving between screens.

use std::cell::Cell;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, SetError};
use crate::event_bus::{EventBus, SetEvent};
use crate::scheduler::{Deferred, Scheduler};

// ============================================================================
// ViewState
// ============================================================================

/// Screen currently shown by the set.
///
/// The state transitions through these screens:
/// - `Intro` -> `Questions` (exit introduction)
/// - `Questions` -> `SolutionScreen` (all answered or finish)
/// - `SolutionScreen` -> `Questions` (retry, or show solutions in place)
///
/// There is no terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    /// Introduction screen.
    Intro,
    /// One of the question slides.
    #[default]
    Questions,
    /// Score and feedback screen.
    SolutionScreen,
}

impl ViewState {
    /// Returns the state reached by firing `trigger`, or `None` if the
    /// trigger is not accepted in this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use slideset_core::{ViewState, ViewTrigger};
    ///
    /// assert_eq!(
    ///     ViewState::Intro.next(ViewTrigger::ExitIntroduction),
    ///     Some(ViewState::Questions)
    /// );
    /// assert_eq!(ViewState::Intro.next(ViewTrigger::Retry), None);
    /// ```
    #[must_use]
    pub const fn next(self, trigger: ViewTrigger) -> Option<Self> {
        match (self, trigger) {
            (Self::Intro, ViewTrigger::ExitIntroduction) => Some(Self::Questions),
            (Self::Questions, ViewTrigger::RequestSolutionScreen) => Some(Self::SolutionScreen),
            (Self::SolutionScreen, ViewTrigger::Retry | ViewTrigger::ShowSolutions) => {
                Some(Self::Questions)
            }
            _ => None,
        }
    }

    /// Returns `true` if `trigger` is accepted in this state.
    #[must_use]
    pub const fn accepts(self, trigger: ViewTrigger) -> bool {
        self.next(trigger).is_some()
    }
}

impl std::fmt::Display for ViewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Intro => write!(f, "showing intro"),
            Self::Questions => write!(f, "showing questions"),
            Self::SolutionScreen => write!(f, "showing solution screen"),
        }
    }
}

/// Triggers accepted by the view-state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewTrigger {
    /// Leave the introduction screen.
    ExitIntroduction,
    /// Show the solution screen.
    RequestSolutionScreen,
    /// Start a new episode.
    Retry,
    /// Reveal every slide's solution.
    ShowSolutions,
}

impl std::fmt::Display for ViewTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExitIntroduction => write!(f, "exit_introduction"),
            Self::RequestSolutionScreen => write!(f, "request_solution_screen"),
            Self::Retry => write!(f, "retry"),
            Self::ShowSolutions => write!(f, "show_solutions"),
        }
    }
}

// ============================================================================
// ViewStateMachine
// ============================================================================

/// Owns the current [`ViewState`] and applies the transition table.
///
/// Side effects on other components travel over the bus: `retry` publishes
/// [`SetEvent::Retry`] (the navigator resets on it) and `show_solutions`
/// publishes [`SetEvent::ShowSolutions`] (every slide reveals on it).
#[derive(Debug)]
pub struct ViewStateMachine {
    state: Cell<ViewState>,
    showing_solutions: Cell<bool>,
    bus: EventBus,
    scheduler: Scheduler,
}

impl ViewStateMachine {
    /// Creates a machine in `initial` state.
    #[must_use]
    pub fn new(initial: ViewState, bus: EventBus, scheduler: Scheduler) -> Self {
        Self {
            state: Cell::new(initial),
            showing_solutions: Cell::new(false),
            bus,
            scheduler,
        }
    }

    /// Returns the initial state for a set with or without an introduction.
    #[must_use]
    pub const fn initial_state(show_intro_page: bool) -> ViewState {
        if show_intro_page {
            ViewState::Intro
        } else {
            ViewState::Questions
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> ViewState {
        self.state.get()
    }

    /// Returns `true` while slides display their solutions.
    #[must_use]
    pub fn is_showing_solutions(&self) -> bool {
        self.showing_solutions.get()
    }

    /// Fires `trigger` and performs its side effects.
    ///
    /// # Errors
    ///
    /// Returns `SetError::InvalidStateTransition` without changing state if
    /// the trigger is not accepted, and any listener error raised while
    /// publishing the transition's events.
    pub fn fire(&self, trigger: ViewTrigger) -> Result<ViewState> {
        let from = self.state.get();
        let Some(to) = from.next(trigger) else {
            warn!(state = %from, %trigger, "Rejected view transition");
            return Err(SetError::invalid_transition(from, trigger));
        };

        self.state.set(to);
        info!(%from, %to, %trigger, "View state changed");

        match trigger {
            ViewTrigger::ExitIntroduction => {
                self.scheduler.defer(Deferred::FocusCurrentSlide);
            }
            ViewTrigger::RequestSolutionScreen => {}
            ViewTrigger::Retry => {
                self.showing_solutions.set(false);
                self.scheduler.defer(Deferred::FocusCurrentSlide);
            }
            ViewTrigger::ShowSolutions => {
                self.showing_solutions.set(true);
            }
        }

        self.bus.publish(&SetEvent::ViewChanged { from, to })?;
        match trigger {
            ViewTrigger::Retry => self.bus.publish(&SetEvent::Retry)?,
            ViewTrigger::ShowSolutions => self.bus.publish(&SetEvent::ShowSolutions)?,
            ViewTrigger::ExitIntroduction | ViewTrigger::RequestSolutionScreen => {}
        }

        Ok(to)
    }

    /// Leaves the introduction screen.
    pub fn exit_introduction(&self) -> Result<ViewState> {
        self.fire(ViewTrigger::ExitIntroduction)
    }

    /// Moves to the solution screen.
    pub fn request_solution_screen(&self) -> Result<ViewState> {
        self.fire(ViewTrigger::RequestSolutionScreen)
    }

    /// Starts a new episode from the solution screen.
    pub fn retry(&self) -> Result<ViewState> {
        self.fire(ViewTrigger::Retry)
    }

    /// Returns to the slides with every solution revealed.
    pub fn show_solutions(&self) -> Result<ViewState> {
        self.fire(ViewTrigger::ShowSolutions)
    }

    /// Resets the set without leaving the question slides.
    ///
    /// Used when the host resets the task while the slides are shown. No
    /// transition happens; the solutions flag is cleared and
    /// [`SetEvent::Retry`] is published.
    ///
    /// # Errors
    ///
    /// Returns `SetError::InvalidStateTransition` on any screen other than
    /// [`ViewState::Questions`], with no state change.
    pub fn retry_in_place(&self) -> Result<()> {
        self.ensure_in_place(ViewTrigger::Retry)?;
        debug!(state = %self.state.get(), "Resetting without view transition");
        self.showing_solutions.set(false);
        self.scheduler.defer(Deferred::FocusCurrentSlide);
        self.bus.publish(&SetEvent::Retry)
    }

    /// Reveals solutions without leaving the question slides.
    ///
    /// # Errors
    ///
    /// Returns `SetError::InvalidStateTransition` on any screen other than
    /// [`ViewState::Questions`], with no state change.
    pub fn show_solutions_in_place(&self) -> Result<()> {
        self.ensure_in_place(ViewTrigger::ShowSolutions)?;
        debug!(state = %self.state.get(), "Revealing solutions without view transition");
        self.showing_solutions.set(true);
        self.bus.publish(&SetEvent::ShowSolutions)
    }

    fn ensure_in_place(&self, trigger: ViewTrigger) -> Result<()> {
        let state = self.state.get();
        if state == ViewState::Questions {
            return Ok(());
        }
        warn!(%state, %trigger, "Rejected in-place action");
        Err(SetError::invalid_transition(state, trigger))
    }
}

// ============================================================================
// Tests
// ============================================================================
