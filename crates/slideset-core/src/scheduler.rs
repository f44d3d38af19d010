//! Deferred work queue.
//!
//! Focusing a progress announcer and composing the result statement must
//! happen after the current synchronous batch of state changes settles.
//! Components queue that work here; the embedder drains it by calling
//! [`QuestionSet::tick`](crate::QuestionSet::tick).

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Work deferred to the next scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    /// Focus the progress announcer of whichever slide is current when the
    /// action runs.
    FocusCurrentSlide,
    /// Compose and publish the episode's result statement.
    ComposeStatement,
}

/// FIFO queue of deferred actions shared by the components of one set.
///
/// Scheduled actions are never cancelled.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    queue: Rc<RefCell<VecDeque<Deferred>>>,
}

impl Scheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an action for the next tick.
    pub fn defer(&self, action: Deferred) {
        tracing::trace!(?action, "Deferring action");
        self.queue.borrow_mut().push_back(action);
    }

    /// Removes and returns the oldest queued action.
    pub fn pop(&self) -> Option<Deferred> {
        self.queue.borrow_mut().pop_front()
    }

    /// Returns the number of queued actions.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Returns a copy of the queued actions, oldest first.
    #[must_use]
    pub fn queued(&self) -> Vec<Deferred> {
        self.queue.borrow().iter().copied().collect()
    }
}
