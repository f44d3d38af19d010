//! A scriptable in-process question.
//!
//! [`ScriptedQuestion`] implements the whole adapter contract without any
//! widget behind it. The CLI drives sets with it and the tests use it to
//! observe what the core asks of its questions.

use std::cell::RefCell;
use std::rc::Rc;

use crate::adapter::{
    AdapterEvent, AdapterEventKind, AdapterHandler, ButtonAction, ButtonHost, ButtonSpec,
    QuestionAdapter, Resettable, SlideContainer, SolutionReveal, StatementSource, Stoppable,
};
use crate::error::Result;
use crate::statement::{InteractionKind, Statement};

/// Optional capabilities a [`ScriptedQuestion`] exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Hosts navigation buttons.
    pub buttons: bool,
    /// Can be stopped when navigated away from.
    pub stop: bool,
    /// Can reset its task.
    pub reset: bool,
    /// Can reveal its solution.
    pub solutions: bool,
    /// Describes its result as a statement.
    pub statement: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            buttons: true,
            stop: true,
            reset: true,
            solutions: true,
            statement: true,
        }
    }
}

impl Capabilities {
    /// Only the required surface.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            buttons: false,
            stop: false,
            reset: false,
            solutions: false,
            statement: false,
        }
    }
}

struct ScriptedButton {
    spec: ButtonSpec,
    visible: bool,
    action: ButtonAction,
}

/// Question whose answers are supplied by the caller.
pub struct ScriptedQuestion {
    max_score: u32,
    score: u32,
    capabilities: Capabilities,
    container: Option<SlideContainer>,
    handlers: Vec<(AdapterEventKind, AdapterHandler)>,
    buttons: Vec<ScriptedButton>,
    statement: Option<Statement>,
    stop_count: usize,
    reset_count: usize,
    solutions_shown: usize,
    parent_resizes: usize,
}

impl std::fmt::Debug for ScriptedQuestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedQuestion")
            .field("max_score", &self.max_score)
            .field("score", &self.score)
            .field("capabilities", &self.capabilities)
            .field("container", &self.container)
            .field("handlers", &self.handlers.len())
            .field("buttons", &self.buttons.len())
            .finish_non_exhaustive()
    }
}

impl ScriptedQuestion {
    /// Creates an unanswered question worth `max_score` points.
    #[must_use]
    pub fn new(max_score: u32) -> Self {
        Self {
            max_score,
            score: 0,
            capabilities: Capabilities::default(),
            container: None,
            handlers: Vec::new(),
            buttons: Vec::new(),
            statement: None,
            stop_count: 0,
            reset_count: 0,
            solutions_shown: 0,
            parent_resizes: 0,
        }
    }

    /// Restricts the optional capabilities.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Wraps the question for sharing with a set.
    #[must_use]
    pub fn shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    /// Sets the score without emitting anything.
    pub fn set_score(&mut self, score: u32) {
        self.score = score;
    }

    /// Records an answer and emits an interaction event carrying a scored
    /// statement.
    ///
    /// # Errors
    ///
    /// Returns the first handler error.
    pub fn answer(this: &Rc<RefCell<Self>>, score: u32, verb: InteractionKind) -> Result<()> {
        let statement = {
            let mut question = this.borrow_mut();
            question.score = score;
            let object_id = question
                .container
                .as_ref()
                .map_or_else(|| "scripted-question".to_string(), |c| c.sub_content_id.clone());
            let statement = Statement::new(&verb, object_id).with_score(score, question.max_score);
            question.statement = Some(statement.clone());
            statement
        };
        Self::emit(
            this,
            &AdapterEvent::Interaction {
                verb,
                statement: Some(statement),
            },
        )
    }

    /// Emits a resize request of the question's own.
    ///
    /// # Errors
    ///
    /// Returns the first handler error.
    pub fn request_resize(this: &Rc<RefCell<Self>>) -> Result<()> {
        Self::emit(this, &AdapterEvent::Resize { from_parent: false })
    }

    /// Dispatches `event` to the handlers registered for its kind.
    ///
    /// The question is not borrowed while handlers run.
    ///
    /// # Errors
    ///
    /// Returns the first handler error.
    pub fn emit(this: &Rc<RefCell<Self>>, event: &AdapterEvent) -> Result<()> {
        let kind = event.kind();
        let handlers: Vec<AdapterHandler> = this
            .borrow()
            .handlers
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, h)| Rc::clone(h))
            .collect();
        for handler in handlers {
            handler(event)?;
        }
        Ok(())
    }

    /// Clicks the button `id`. Returns `false` if there is no such visible
    /// button.
    ///
    /// # Errors
    ///
    /// Returns the button action's error.
    pub fn click(this: &Rc<RefCell<Self>>, id: &str) -> Result<bool> {
        let action = this
            .borrow()
            .buttons
            .iter()
            .find(|b| b.spec.id == id && b.visible)
            .map(|b| Rc::clone(&b.action));
        match action {
            Some(action) => {
                action()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Returns `true` if the button `id` exists and is shown.
    #[must_use]
    pub fn is_button_visible(&self, id: &str) -> bool {
        self.buttons.iter().any(|b| b.spec.id == id && b.visible)
    }

    /// Returns `true` if the button `id` was added.
    #[must_use]
    pub fn has_button(&self, id: &str) -> bool {
        self.buttons.iter().any(|b| b.spec.id == id)
    }

    /// Returns the `ButtonSpec` registered under `id`.
    #[must_use]
    pub fn button(&self, id: &str) -> Option<&ButtonSpec> {
        self.buttons.iter().find(|b| b.spec.id == id).map(|b| &b.spec)
    }

    /// The container the question was attached to.
    #[must_use]
    pub const fn container(&self) -> Option<&SlideContainer> {
        self.container.as_ref()
    }

    /// Returns `true` once the question has been attached.
    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.container.is_some()
    }

    /// Number of times the question was stopped.
    #[must_use]
    pub const fn stop_count(&self) -> usize {
        self.stop_count
    }

    /// Number of times the question was reset.
    #[must_use]
    pub const fn reset_count(&self) -> usize {
        self.reset_count
    }

    /// Number of times the question revealed its solution.
    #[must_use]
    pub const fn solutions_shown(&self) -> usize {
        self.solutions_shown
    }

    /// Number of resizes propagated from the set.
    #[must_use]
    pub const fn parent_resize_count(&self) -> usize {
        self.parent_resizes
    }
}

impl QuestionAdapter for ScriptedQuestion {
    fn score(&self) -> u32 {
        self.score
    }

    fn max_score(&self) -> u32 {
        self.max_score
    }

    fn attach(&mut self, container: &SlideContainer) {
        self.container = Some(container.clone());
    }

    fn on(&mut self, kind: AdapterEventKind, handler: AdapterHandler) {
        self.handlers.push((kind, handler));
    }

    fn parent_resized(&mut self) {
        self.parent_resizes += 1;
    }

    fn as_button_host(&mut self) -> Option<&mut dyn ButtonHost> {
        if self.capabilities.buttons {
            Some(self as &mut dyn ButtonHost)
        } else {
            None
        }
    }

    fn as_stoppable(&mut self) -> Option<&mut dyn Stoppable> {
        if self.capabilities.stop {
            Some(self as &mut dyn Stoppable)
        } else {
            None
        }
    }

    fn as_resettable(&mut self) -> Option<&mut dyn Resettable> {
        if self.capabilities.reset {
            Some(self as &mut dyn Resettable)
        } else {
            None
        }
    }

    fn as_solution_reveal(&mut self) -> Option<&mut dyn SolutionReveal> {
        if self.capabilities.solutions {
            Some(self as &mut dyn SolutionReveal)
        } else {
            None
        }
    }

    fn as_statement_source(&self) -> Option<&dyn StatementSource> {
        if self.capabilities.statement {
            Some(self as &dyn StatementSource)
        } else {
            None
        }
    }
}

impl ButtonHost for ScriptedQuestion {
    fn add_button(&mut self, spec: ButtonSpec, on_click: ButtonAction) {
        let button = ScriptedButton {
            visible: spec.visible,
            spec,
            action: on_click,
        };
        match self.buttons.iter_mut().find(|b| b.spec.id == button.spec.id) {
            Some(existing) => *existing = button,
            None => self.buttons.push(button),
        }
    }

    fn show_button(&mut self, id: &str) {
        for button in self.buttons.iter_mut().filter(|b| b.spec.id == id) {
            button.visible = true;
        }
    }

    fn hide_button(&mut self, id: &str) {
        for button in self.buttons.iter_mut().filter(|b| b.spec.id == id) {
            button.visible = false;
        }
    }
}

impl Stoppable for ScriptedQuestion {
    fn stop(&mut self) {
        self.stop_count += 1;
    }
}

impl Resettable for ScriptedQuestion {
    fn reset_task(&mut self) {
        self.score = 0;
        self.statement = None;
        self.reset_count += 1;
    }
}

impl SolutionReveal for ScriptedQuestion {
    fn show_solutions(&mut self) {
        self.solutions_shown += 1;
    }
}

impl StatementSource for ScriptedQuestion {
    fn xapi_data(&self) -> Option<Statement> {
        self.statement.clone()
    }
}
