//! Slide navigation and answer tracking.

use std::cell::{Cell, RefCell};

use indexmap::IndexSet;
use serde::Serialize;
use tracing::{debug, info};

use crate::adapter::{with_adapter_mut, SharedAdapter};
use crate::error::{Result, SetError};
use crate::event_bus::{EventBus, SetEvent};
use crate::l10n::L10n;
use crate::scheduler::{Deferred, Scheduler};
use crate::statement::InteractionKind;

/// One question's position in the sequence.
#[derive(Clone)]
pub struct Slide {
    /// 0-based index, fixed at construction.
    pub index: usize,
    /// Stable per-slide identifier from the configuration.
    pub sub_content_id: String,
    /// The question this slide shows.
    pub adapter: SharedAdapter,
}

impl std::fmt::Debug for Slide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slide")
            .field("index", &self.index)
            .field("sub_content_id", &self.sub_content_id)
            .finish_non_exhaustive()
    }
}

/// Insertion-ordered set of answered slide indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnsweredSet {
    indices: IndexSet<usize>,
}

impl AnsweredSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `index`. Returns `false` if it was already present.
    pub fn insert(&mut self, index: usize) -> bool {
        self.indices.insert(index)
    }

    /// Returns `true` if `index` has been answered.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    /// Number of distinct answered slides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns `true` if nothing has been answered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Removes every index.
    pub fn clear(&mut self) {
        self.indices.clear();
    }

    /// Iterates in the order slides were answered.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    /// Returns the indices in the order slides were answered.
    #[must_use]
    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }
}

/// Progress indicator entry for one slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressDot {
    /// 0-based slide index.
    pub index: usize,
    /// `true` for the current slide.
    pub active: bool,
    /// `true` once the slide has been answered this episode.
    pub answered: bool,
    /// Rendered slide title.
    pub title: String,
    /// Accessible label combining the title and the slide's status.
    pub aria_label: String,
}

/// Tracks the current slide and the answered slides of an episode.
#[derive(Debug)]
pub struct SlideNavigator {
    slides: Vec<Slide>,
    current: Cell<usize>,
    answered: RefCell<AnsweredSet>,
    // One-shot guard for `AllAnswered`, re-armed by `reset`.
    armed: Cell<bool>,
    bus: EventBus,
    scheduler: Scheduler,
}

impl SlideNavigator {
    /// Creates a navigator positioned on slide 0.
    ///
    /// # Errors
    ///
    /// Returns `SetError::NoQuestions` if `slides` is empty.
    pub fn new(slides: Vec<Slide>, bus: EventBus, scheduler: Scheduler) -> Result<Self> {
        if slides.is_empty() {
            return Err(SetError::NoQuestions);
        }
        Ok(Self {
            slides,
            current: Cell::new(0),
            answered: RefCell::new(AnsweredSet::new()),
            armed: Cell::new(true),
            bus,
            scheduler,
        })
    }

    /// Index of the current slide.
    #[must_use]
    pub fn current(&self) -> usize {
        self.current.get()
    }

    /// Number of slides.
    #[must_use]
    pub fn total(&self) -> usize {
        self.slides.len()
    }

    /// Slides in order.
    #[must_use]
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    /// Answered slide indices in the order they were answered.
    #[must_use]
    pub fn answered_slides(&self) -> Vec<usize> {
        self.answered.borrow().to_vec()
    }

    /// Returns `true` if `index` has been answered this episode.
    #[must_use]
    pub fn is_answered(&self, index: usize) -> bool {
        self.answered.borrow().contains(index)
    }

    /// Returns `true` if at least one slide has been answered.
    #[must_use]
    pub fn answer_given(&self) -> bool {
        !self.answered.borrow().is_empty()
    }

    /// Makes `target` the current slide.
    ///
    /// Jumping to the current slide does nothing. Otherwise the slide being
    /// left is stopped (when it supports it), focusing the new slide's
    /// announcer is deferred, and [`SetEvent::ResizeRequested`] then
    /// [`SetEvent::SlideChanged`] are published.
    ///
    /// # Errors
    ///
    /// Returns `SetError::SlideOutOfRange` without side effects if `target`
    /// is not a slide index, `SetError::AdapterBusy` if the slide being left
    /// is borrowed, and any listener error.
    pub fn jump_to(&self, target: usize) -> Result<()> {
        let total = self.slides.len();
        if target >= total {
            return Err(SetError::slide_out_of_range(target, total));
        }

        let from = self.current.get();
        if target == from {
            return Ok(());
        }

        let leaving = &self.slides[from];
        with_adapter_mut(&leaving.adapter, from, |adapter| {
            if let Some(stoppable) = adapter.as_stoppable() {
                stoppable.stop();
            }
        })?;

        self.current.set(target);
        debug!(from, to = target, "Slide changed");

        self.scheduler.defer(Deferred::FocusCurrentSlide);
        self.bus.publish(&SetEvent::ResizeRequested)?;
        self.bus.publish(&SetEvent::SlideChanged { from, to: target })
    }

    /// Records an interaction on `slide`.
    ///
    /// Returns `true` if the slide was newly added to the answered set.
    /// Verbs other than `interacted`, `answered` and `attempted` are ignored.
    /// When the last unanswered slide is added, [`SetEvent::AllAnswered`] is
    /// published, once per episode.
    ///
    /// # Errors
    ///
    /// Returns `SetError::SlideOutOfRange` if `slide` is not a slide index,
    /// and any listener error.
    pub fn mark_answered(&self, slide: usize, verb: &InteractionKind) -> Result<bool> {
        let total = self.slides.len();
        if slide >= total {
            return Err(SetError::slide_out_of_range(slide, total));
        }
        if !verb.counts_as_answer() {
            return Ok(false);
        }

        let (added, answered) = {
            let mut set = self.answered.borrow_mut();
            let added = set.insert(slide);
            (added, set.len())
        };
        if added {
            debug!(slide, %verb, answered, total, "Slide answered");
        }

        if answered == total && self.armed.replace(false) {
            info!(total, "All slides answered");
            if let Err(e) = self.bus.publish(&SetEvent::AllAnswered) {
                self.armed.set(true);
                return Err(e);
            }
        }
        Ok(added)
    }

    /// Starts a new episode.
    ///
    /// Clears the answered set, moves back to slide 0, re-arms the
    /// all-answered signal and resets every question in slide order.
    ///
    /// # Errors
    ///
    /// Returns `SetError::AdapterBusy` if a question is borrowed, and any
    /// listener error.
    pub fn reset(&self) -> Result<()> {
        self.answered.borrow_mut().clear();
        let from = self.current.replace(0);
        self.armed.set(true);

        for slide in &self.slides {
            with_adapter_mut(&slide.adapter, slide.index, |adapter| {
                if let Some(resettable) = adapter.as_resettable() {
                    resettable.reset_task();
                }
            })?;
        }
        debug!(slides = self.slides.len(), "Navigator reset");

        if from != 0 {
            self.bus.publish(&SetEvent::SlideChanged { from, to: 0 })?;
        }
        Ok(())
    }

    /// Returns one progress dot per slide.
    #[must_use]
    pub fn progress_dots(&self, l10n: &L10n) -> Vec<ProgressDot> {
        let current = self.current.get();
        let answered = self.answered.borrow();
        self.slides
            .iter()
            .map(|slide| {
                let title = l10n.slide_title(slide.index);
                let active = slide.index == current;
                let is_answered = answered.contains(slide.index);

                let mut aria_label = title.clone();
                if active {
                    aria_label.push_str(", ");
                    aria_label.push_str(&l10n.active_slide_aria_label);
                }
                if is_answered {
                    aria_label.push_str(", ");
                    aria_label.push_str(&l10n.answered_slide_aria_label);
                }

                ProgressDot {
                    index: slide.index,
                    active,
                    answered: is_answered,
                    title,
                    aria_label,
                }
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::event_bus::EventKind;
    use crate::scripted::{Capabilities, ScriptedQuestion};

    fn navigator(n: usize) -> (SlideNavigator, Vec<Rc<RefCell<ScriptedQuestion>>>, EventBus, Scheduler) {
        let questions: Vec<_> = (0..n).map(|_| ScriptedQuestion::new(1).shared()).collect();
        let slides = questions
            .iter()
            .enumerate()
            .map(|(index, q)| Slide {
                index,
                sub_content_id: format!("q{index}"),
                adapter: q.clone(),
            })
            .collect();
        let bus = EventBus::new();
        let scheduler = Scheduler::new();
        let nav = SlideNavigator::new(slides, bus.clone(), scheduler.clone()).unwrap();
        (nav, questions, bus, scheduler)
    }

    fn count(bus: &EventBus, kind: EventKind) -> Rc<Cell<usize>> {
        let counter = Rc::new(Cell::new(0));
        let c = Rc::clone(&counter);
        bus.subscribe(kind, move |_| {
            c.set(c.get() + 1);
            Ok(())
        });
        counter
    }

    #[test]
    fn test_empty_navigator_is_rejected() {
        let err = SlideNavigator::new(Vec::new(), EventBus::new(), Scheduler::new()).unwrap_err();
        assert!(matches!(err, SetError::NoQuestions));
    }

    #[test]
    fn test_answered_set_is_idempotent_and_ordered() {
        let mut set = AnsweredSet::new();
        assert!(set.insert(2));
        assert!(set.insert(0));
        assert!(!set.insert(2));
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_vec(), vec![2, 0]);
    }

    #[test]
    fn test_jump_to_current_is_noop() {
        let (nav, questions, bus, scheduler) = navigator(3);
        let resizes = count(&bus, EventKind::ResizeRequested);

        nav.jump_to(0).unwrap();

        assert_eq!(resizes.get(), 0);
        assert!(scheduler.is_idle());
        assert_eq!(questions[0].borrow().stop_count(), 0);
    }

    #[test]
    fn test_jump_to_stops_resizes_and_defers_focus() {
        let (nav, questions, bus, scheduler) = navigator(3);
        let resizes = count(&bus, EventKind::ResizeRequested);
        let changes = count(&bus, EventKind::SlideChanged);

        nav.jump_to(2).unwrap();

        assert_eq!(nav.current(), 2);
        assert_eq!(questions[0].borrow().stop_count(), 1);
        assert_eq!(resizes.get(), 1);
        assert_eq!(changes.get(), 1);
        assert_eq!(scheduler.queued(), vec![Deferred::FocusCurrentSlide]);
    }

    #[test]
    fn test_jump_completes_before_failing_slide_listener() {
        let (nav, _questions, bus, scheduler) = navigator(3);
        let resizes = count(&bus, EventKind::ResizeRequested);
        bus.subscribe(EventKind::SlideChanged, |_| {
            Err(SetError::adapter(1, "listener failed"))
        });

        let err = nav.jump_to(1).unwrap_err();
        assert!(matches!(err, SetError::Adapter { slide: 1, .. }));
        assert_eq!(nav.current(), 1);
        assert_eq!(resizes.get(), 1);
        assert_eq!(scheduler.queued(), vec![Deferred::FocusCurrentSlide]);
    }

    #[test]
    fn test_failed_all_answered_listener_keeps_signal_armed() {
        let (nav, _questions, bus, _scheduler) = navigator(1);
        let fail = Rc::new(Cell::new(true));
        let flag = Rc::clone(&fail);
        bus.subscribe(EventKind::AllAnswered, move |_| {
            if flag.get() {
                Err(SetError::adapter(0, "listener failed"))
            } else {
                Ok(())
            }
        });
        let fired = count(&bus, EventKind::AllAnswered);

        assert!(nav.mark_answered(0, &InteractionKind::Answered).is_err());
        assert_eq!(fired.get(), 0);

        fail.set(false);
        assert!(!nav.mark_answered(0, &InteractionKind::Answered).unwrap());
        assert_eq!(fired.get(), 1);

        nav.mark_answered(0, &InteractionKind::Answered).unwrap();
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_jump_without_stop_capability() {
        let question = ScriptedQuestion::new(1)
            .with_capabilities(Capabilities {
                stop: false,
                ..Capabilities::default()
            })
            .shared();
        let other = ScriptedQuestion::new(1).shared();
        let slides = vec![
            Slide {
                index: 0,
                sub_content_id: "a".into(),
                adapter: question.clone(),
            },
            Slide {
                index: 1,
                sub_content_id: "b".into(),
                adapter: other,
            },
        ];
        let nav = SlideNavigator::new(slides, EventBus::new(), Scheduler::new()).unwrap();

        nav.jump_to(1).unwrap();
        assert_eq!(nav.current(), 1);
        assert_eq!(question.borrow().stop_count(), 0);
    }

    #[test]
    fn test_jump_out_of_range_is_rejected() {
        let (nav, _questions, _bus, scheduler) = navigator(2);
        let err = nav.jump_to(2).unwrap_err();
        assert!(matches!(err, SetError::SlideOutOfRange { index: 2, total: 2 }));
        assert_eq!(nav.current(), 0);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_non_answer_verbs_are_ignored() {
        let (nav, _questions, _bus, _scheduler) = navigator(2);
        assert!(!nav.mark_answered(0, &InteractionKind::Completed).unwrap());
        assert!(!nav.mark_answered(0, &InteractionKind::Other("experienced".into())).unwrap());
        assert!(!nav.answer_given());
    }

    #[test]
    fn test_all_answered_fires_once_per_episode() {
        let (nav, _questions, bus, _scheduler) = navigator(2);
        let all = count(&bus, EventKind::AllAnswered);

        nav.mark_answered(0, &InteractionKind::Answered).unwrap();
        assert_eq!(all.get(), 0);
        nav.mark_answered(1, &InteractionKind::Interacted).unwrap();
        assert_eq!(all.get(), 1);
        nav.mark_answered(1, &InteractionKind::Attempted).unwrap();
        nav.mark_answered(0, &InteractionKind::Answered).unwrap();
        assert_eq!(all.get(), 1);

        nav.reset().unwrap();
        nav.mark_answered(1, &InteractionKind::Answered).unwrap();
        nav.mark_answered(0, &InteractionKind::Answered).unwrap();
        assert_eq!(all.get(), 2);
    }

    #[test]
    fn test_single_slide_fires_all_answered() {
        let (nav, _questions, bus, _scheduler) = navigator(1);
        let all = count(&bus, EventKind::AllAnswered);
        nav.mark_answered(0, &InteractionKind::Attempted).unwrap();
        assert_eq!(all.get(), 1);
    }

    #[test]
    fn test_reset_clears_and_resets_adapters() {
        let (nav, questions, _bus, _scheduler) = navigator(3);
        nav.jump_to(2).unwrap();
        nav.mark_answered(1, &InteractionKind::Answered).unwrap();

        nav.reset().unwrap();

        assert_eq!(nav.current(), 0);
        assert!(nav.answered_slides().is_empty());
        for question in &questions {
            assert_eq!(question.borrow().reset_count(), 1);
        }
    }

    #[test]
    fn test_progress_dots() {
        let (nav, _questions, _bus, _scheduler) = navigator(3);
        nav.mark_answered(0, &InteractionKind::Answered).unwrap();
        nav.jump_to(1).unwrap();

        let dots = nav.progress_dots(&L10n::default());
        assert_eq!(dots.len(), 3);
        assert_eq!(dots[0].aria_label, "Slide 1, Answered");
        assert_eq!(dots[1].aria_label, "Slide 2, Currently active");
        assert_eq!(dots[2].aria_label, "Slide 3");
        assert!(dots[1].active);
        assert!(dots[0].answered);
    }
}
