//! The composite question set.
//!
//! [`QuestionSet`] owns one bus, one scheduler, the navigator, the view-state
//! machine and the result composer, and wires them together. Components
//! never call upward: everything flowing from a question to the set travels
//! as an event on the bus.

use std::rc::{Rc, Weak};

use serde::Serialize;
use tracing::{debug, info};

use crate::adapter::{
    with_adapter_mut, AdapterEvent, AdapterEventKind, AdapterHandler, ButtonHost, ButtonSpec,
    SharedAdapter, SlideContainer, FINISH_BUTTON, NEXT_BUTTON, PREVIOUS_BUTTON,
};
use crate::composer::ResultStatementComposer;
use crate::config::SetConfig;
use crate::error::{Result, SetError};
use crate::event_bus::{EventBus, EventKind, SetEvent};
use crate::feedback::{determine_overall_feedback, score_percentage};
use crate::navigator::{ProgressDot, Slide, SlideNavigator};
use crate::scheduler::{Deferred, Scheduler};
use crate::score::{ScoreAggregator, ScoreSnapshot};
use crate::statement::ResultStatement;
use crate::view_state::{ViewState, ViewStateMachine};

/// Content of the solution screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionSummary {
    /// Total score.
    pub score: u32,
    /// Total max score.
    pub max_score: u32,
    /// Score as a rounded percentage of the max.
    pub percentage: u8,
    /// Text of the matching feedback range, empty if none matches.
    pub feedback: String,
    /// Heading of the results.
    pub results_label: String,
}

struct Inner {
    config: SetConfig,
    bus: EventBus,
    scheduler: Scheduler,
    navigator: SlideNavigator,
    view: ViewStateMachine,
    composer: ResultStatementComposer,
}

impl Inner {
    fn last_slide(&self) -> &Slide {
        let slides = self.navigator.slides();
        &slides[slides.len() - 1]
    }

    fn with_finish_button(&self, f: impl FnOnce(&mut dyn ButtonHost)) -> Result<()> {
        let last = self.last_slide();
        with_adapter_mut(&last.adapter, last.index, |adapter| {
            if let Some(host) = adapter.as_button_host() {
                f(host);
            }
        })
    }

    fn snapshot(&self) -> Result<ScoreSnapshot> {
        ScoreAggregator::new(self.navigator.slides()).snapshot()
    }
}

/// A linear sequence of questions presented as one exercise.
///
/// The set is single-threaded. Actions deferred by the components (focusing
/// a slide, composing the result statement) run when [`QuestionSet::tick`]
/// is called, which the embedder does at the end of every batch of calls.
pub struct QuestionSet {
    inner: Rc<Inner>,
}

impl std::fmt::Debug for QuestionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionSet")
            .field("id", &self.inner.config.id)
            .field("view", &self.inner.view.state())
            .field("current", &self.inner.navigator.current())
            .field("slides", &self.inner.navigator.total())
            .finish_non_exhaustive()
    }
}

impl QuestionSet {
    /// Builds a set from its configuration and one adapter per question.
    ///
    /// # Errors
    ///
    /// Returns `SetError::NoQuestions` (or another configuration error) if
    /// the configuration is invalid, in which case nothing is constructed,
    /// and `SetError::AdapterCountMismatch` if `adapters` does not match the
    /// configured questions.
    pub fn new(config: SetConfig, adapters: Vec<SharedAdapter>) -> Result<Self> {
        Self::with_bus(config, adapters, EventBus::new())
    }

    /// Like [`QuestionSet::new`] but publishing on `bus`, so callers can
    /// subscribe before any event is published.
    pub fn with_bus(config: SetConfig, adapters: Vec<SharedAdapter>, bus: EventBus) -> Result<Self> {
        config.validate()?;
        if adapters.len() != config.questions.len() {
            return Err(SetError::AdapterCountMismatch {
                questions: config.questions.len(),
                adapters: adapters.len(),
            });
        }

        let scheduler = Scheduler::new();
        let slides: Vec<Slide> = config
            .questions
            .iter()
            .zip(adapters)
            .enumerate()
            .map(|(index, (question, adapter))| Slide {
                index,
                sub_content_id: question.sub_content_id.clone(),
                adapter,
            })
            .collect();

        let navigator = SlideNavigator::new(slides, bus.clone(), scheduler.clone())?;
        let initial = ViewStateMachine::initial_state(config.starts_with_introduction());
        let view = ViewStateMachine::new(initial, bus.clone(), scheduler.clone());
        let composer =
            ResultStatementComposer::new(config.id.clone(), config.title.clone(), scheduler.clone());

        let inner = Rc::new(Inner {
            config,
            bus,
            scheduler,
            navigator,
            view,
            composer,
        });

        Self::subscribe(&inner);
        Self::attach_slides(&inner)?;

        info!(
            id = %inner.config.id,
            slides = inner.navigator.total(),
            view = %initial,
            "Question set ready"
        );
        Ok(Self { inner })
    }

    // ========================================================================
    // Wiring
    // ========================================================================

    fn subscribe(inner: &Rc<Inner>) {
        let bus = &inner.bus;

        let weak = Rc::downgrade(inner);
        bus.subscribe(EventKind::SlideInteraction, move |event| {
            let (Some(inner), SetEvent::SlideInteraction { slide, verb }) = (weak.upgrade(), event)
            else {
                return Ok(());
            };
            inner.navigator.mark_answered(*slide, verb).map(|_| ())
        });

        let weak = Rc::downgrade(inner);
        bus.subscribe(EventKind::AllAnswered, move |_| {
            let Some(inner) = weak.upgrade() else {
                return Ok(());
            };
            inner.with_finish_button(|host| host.show_button(FINISH_BUTTON))?;
            inner.composer.schedule_once();
            if inner.config.behaviour.auto_show_solution_screen
                && inner.view.state() == ViewState::Questions
            {
                inner.view.request_solution_screen()?;
            }
            Ok(())
        });

        let weak = Rc::downgrade(inner);
        bus.subscribe(EventKind::SolutionScreenRequested, move |_| {
            let Some(inner) = weak.upgrade() else {
                return Ok(());
            };
            inner.view.request_solution_screen().map(|_| ())
        });

        let weak = Rc::downgrade(inner);
        bus.subscribe(EventKind::ViewChanged, move |event| {
            let (Some(inner), SetEvent::ViewChanged { to, .. }) = (weak.upgrade(), event) else {
                return Ok(());
            };
            if *to == ViewState::SolutionScreen && !inner.view.is_showing_solutions() {
                inner.composer.schedule_once();
            }
            Ok(())
        });

        let weak = Rc::downgrade(inner);
        bus.subscribe(EventKind::Retry, move |_| {
            let Some(inner) = weak.upgrade() else {
                return Ok(());
            };
            inner.navigator.reset()?;
            inner.with_finish_button(|host| host.hide_button(FINISH_BUTTON))?;
            inner.composer.rearm();
            inner.bus.publish(&SetEvent::ResizeRequested)
        });

        let weak = Rc::downgrade(inner);
        bus.subscribe(EventKind::ShowSolutions, move |_| {
            let Some(inner) = weak.upgrade() else {
                return Ok(());
            };
            for slide in inner.navigator.slides() {
                with_adapter_mut(&slide.adapter, slide.index, |adapter| {
                    if let Some(reveal) = adapter.as_solution_reveal() {
                        reveal.show_solutions();
                    }
                })?;
            }
            inner.bus.publish(&SetEvent::ResizeRequested)
        });
    }

    fn attach_slides(inner: &Rc<Inner>) -> Result<()> {
        let total = inner.navigator.total();
        for slide in inner.navigator.slides() {
            let index = slide.index;
            let container = SlideContainer {
                index,
                sub_content_id: slide.sub_content_id.clone(),
                announcer_label: inner.config.l10n.slide_title(index),
            };
            let on_interaction = Self::interaction_handler(&inner.bus, index);
            let on_resize = Self::resize_handler(&inner.bus);

            with_adapter_mut(&slide.adapter, index, |adapter| {
                adapter.attach(&container);
                adapter.on(AdapterEventKind::Interaction, on_interaction);
                adapter.on(AdapterEventKind::Resize, on_resize);
                if let Some(host) = adapter.as_button_host() {
                    Self::add_navigation_buttons(inner, host, index, total);
                }
            })?;
            debug!(slide = index, id = %slide.sub_content_id, "Slide attached");
        }
        Ok(())
    }

    fn interaction_handler(bus: &EventBus, index: usize) -> AdapterHandler {
        let bus = bus.clone();
        Rc::new(move |event| {
            let AdapterEvent::Interaction { verb, statement } = event else {
                return Ok(());
            };
            if let Some(statement) = statement {
                let mut statement = statement.clone();
                statement.set_ending_point(index + 1);
                bus.publish(&SetEvent::SlideStatement {
                    slide: index,
                    statement: Box::new(statement),
                })?;
            }
            bus.publish(&SetEvent::SlideInteraction {
                slide: index,
                verb: verb.clone(),
            })
        })
    }

    fn resize_handler(bus: &EventBus) -> AdapterHandler {
        let bus = bus.clone();
        Rc::new(move |event| match event {
            AdapterEvent::Resize { from_parent: false } => bus.publish(&SetEvent::ResizeRequested),
            _ => Ok(()),
        })
    }

    fn add_navigation_buttons(
        inner: &Rc<Inner>,
        host: &mut dyn ButtonHost,
        index: usize,
        total: usize,
    ) {
        let l10n = &inner.config.l10n;

        if index + 1 == total {
            let bus = inner.bus.clone();
            host.add_button(
                ButtonSpec::new(FINISH_BUTTON, l10n.finish_button_label.clone(), false),
                Rc::new(move || bus.publish(&SetEvent::SolutionScreenRequested)),
            );
        } else {
            host.add_button(
                ButtonSpec::new(NEXT_BUTTON, "", true)
                    .with_attribute("href", "#")
                    .with_attribute("aria-label", l10n.next_question_aria_label.clone()),
                Self::jump_action(Rc::downgrade(inner), index + 1),
            );
        }

        if index > 0 {
            host.add_button(
                ButtonSpec::new(PREVIOUS_BUTTON, "", true)
                    .with_attribute("href", "#")
                    .with_attribute("aria-label", l10n.previous_question_aria_label.clone()),
                Self::jump_action(Rc::downgrade(inner), index - 1),
            );
        }
    }

    fn jump_action(weak: Weak<Inner>, target: usize) -> Rc<dyn Fn() -> Result<()>> {
        Rc::new(move || match weak.upgrade() {
            Some(inner) => inner.navigator.jump_to(target),
            None => Ok(()),
        })
    }

    // ========================================================================
    // Scheduling
    // ========================================================================

    /// Runs every deferred action, including actions deferred while
    /// draining. Returns how many ran.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by an action; remaining actions stay
    /// queued for the next tick.
    pub fn tick(&self) -> Result<usize> {
        let inner = &self.inner;
        let mut ran = 0;
        while let Some(action) = inner.scheduler.pop() {
            ran += 1;
            match action {
                Deferred::FocusCurrentSlide => {
                    let slide = inner.navigator.current();
                    inner.bus.publish(&SetEvent::FocusAnnouncer { slide })?;
                }
                Deferred::ComposeStatement => {
                    let result = inner.composer.build(inner.navigator.slides())?;
                    info!(
                        id = %inner.config.id,
                        score = ?result.statement.raw_score(),
                        success = result.is_success(),
                        children = result.children.len(),
                        "Result statement composed"
                    );
                    inner
                        .bus
                        .publish(&SetEvent::ResultStatement(Box::new(result)))?;
                }
            }
        }
        Ok(ran)
    }

    /// Number of actions waiting for the next tick.
    #[must_use]
    pub fn pending_actions(&self) -> usize {
        self.inner.scheduler.pending()
    }

    // ========================================================================
    // Host contract
    // ========================================================================

    /// Sum of the slides' current scores.
    pub fn get_score(&self) -> Result<u32> {
        ScoreAggregator::new(self.inner.navigator.slides()).total_score()
    }

    /// Sum of the slides' max scores.
    pub fn get_max_score(&self) -> Result<u32> {
        ScoreAggregator::new(self.inner.navigator.slides()).total_max_score()
    }

    /// Returns `true` if any slide has been answered this episode.
    #[must_use]
    pub fn get_answer_given(&self) -> bool {
        self.inner.navigator.answer_given()
    }

    /// Starts a new episode.
    ///
    /// From the solution screen this is the `retry` transition. On the
    /// question slides the set is reset without changing screens.
    ///
    /// # Errors
    ///
    /// Returns `SetError::InvalidStateTransition` on the introduction
    /// screen; nothing is reset.
    pub fn reset_task(&self) -> Result<()> {
        let view = &self.inner.view;
        if view.state() == ViewState::SolutionScreen {
            view.retry().map(|_| ())
        } else {
            view.retry_in_place()
        }
    }

    /// Tells every slide to reveal its solution.
    ///
    /// From the solution screen this is the `show_solutions` transition back
    /// to the slides. The current slide is kept.
    ///
    /// # Errors
    ///
    /// Returns `SetError::InvalidStateTransition` on the introduction
    /// screen; nothing is revealed.
    pub fn show_solutions(&self) -> Result<()> {
        let view = &self.inner.view;
        if view.state() == ViewState::SolutionScreen {
            view.show_solutions().map(|_| ())
        } else {
            view.show_solutions_in_place()
        }
    }

    /// Builds the result statement from the current state.
    pub fn get_result_statement(&self) -> Result<ResultStatement> {
        self.inner.composer.build(self.inner.navigator.slides())
    }

    /// Forwards a host resize of the set's container to every slide.
    pub fn notify_resize(&self) -> Result<()> {
        for slide in self.inner.navigator.slides() {
            with_adapter_mut(&slide.adapter, slide.index, |adapter| adapter.parent_resized())?;
        }
        Ok(())
    }

    // ========================================================================
    // Navigation and view
    // ========================================================================

    /// Leaves the introduction screen.
    pub fn exit_introduction(&self) -> Result<ViewState> {
        self.inner.view.exit_introduction()
    }

    /// Moves to the solution screen, whether or not every slide is answered.
    pub fn request_solution_screen(&self) -> Result<ViewState> {
        self.inner.view.request_solution_screen()
    }

    /// Makes `target` the current slide.
    pub fn jump_to(&self, target: usize) -> Result<()> {
        self.inner.navigator.jump_to(target)
    }

    /// Current screen.
    #[must_use]
    pub fn view_state(&self) -> ViewState {
        self.inner.view.state()
    }

    /// Index of the current slide.
    #[must_use]
    pub fn current_slide(&self) -> usize {
        self.inner.navigator.current()
    }

    /// Number of slides.
    #[must_use]
    pub fn total_slides(&self) -> usize {
        self.inner.navigator.total()
    }

    /// Slides in order.
    #[must_use]
    pub fn slides(&self) -> &[Slide] {
        self.inner.navigator.slides()
    }

    /// Answered slides, in the order they were answered.
    #[must_use]
    pub fn answered_slides(&self) -> Vec<usize> {
        self.inner.navigator.answered_slides()
    }

    /// Returns `true` while slides display their solutions.
    #[must_use]
    pub fn is_showing_solutions(&self) -> bool {
        self.inner.view.is_showing_solutions()
    }

    /// One progress dot per slide.
    #[must_use]
    pub fn progress_dots(&self) -> Vec<ProgressDot> {
        self.inner.navigator.progress_dots(&self.inner.config.l10n)
    }

    /// Content of the solution screen, or `None` on any other screen.
    pub fn solution_summary(&self) -> Result<Option<SolutionSummary>> {
        let inner = &self.inner;
        if inner.view.state() != ViewState::SolutionScreen {
            return Ok(None);
        }
        let snapshot = inner.snapshot()?;
        Ok(Some(SolutionSummary {
            score: snapshot.score,
            max_score: snapshot.max_score,
            percentage: score_percentage(snapshot.score, snapshot.max_score),
            feedback: determine_overall_feedback(
                &inner.config.overall_feedback,
                snapshot.score,
                snapshot.max_score,
            ),
            results_label: inner.config.l10n.solution_screen_results_label.clone(),
        }))
    }

    /// The set's bus.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    /// The set's configuration.
    #[must_use]
    pub fn config(&self) -> &SetConfig {
        &self.inner.config
    }
}
