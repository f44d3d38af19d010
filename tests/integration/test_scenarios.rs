//! End-to-end scenarios for a question set.
//!
//! Each test builds a set over scripted questions, records every event on
//! its bus and drives it the way a learner and a host would.

use std::cell::RefCell;
use std::rc::Rc;

use slideset_core::{
    Capabilities, EventBus, EventKind, InteractionKind, IntroductionConfig, QuestionConfig,
    QuestionSet, ScriptedQuestion, SetConfig, SetError, SetEvent, SharedAdapter, ViewState,
    FINISH_BUTTON, NEXT_BUTTON, PREVIOUS_BUTTON,
};

type Question = Rc<RefCell<ScriptedQuestion>>;

struct Harness {
    set: QuestionSet,
    questions: Vec<Question>,
    events: Rc<RefCell<Vec<SetEvent>>>,
}

impl Harness {
    fn new(config: SetConfig) -> Self {
        let questions = (0..config.questions.len())
            .map(|_| ScriptedQuestion::new(1).shared())
            .collect();
        Self::with_questions(config, questions)
    }

    fn with_questions(config: SetConfig, questions: Vec<Question>) -> Self {
        let adapters: Vec<SharedAdapter> = questions
            .iter()
            .map(|q| Rc::clone(q) as SharedAdapter)
            .collect();
        let bus = EventBus::new();
        let events = Rc::new(RefCell::new(Vec::new()));
        for kind in EventKind::ALL {
            let events = Rc::clone(&events);
            bus.subscribe(kind, move |event| {
                events.borrow_mut().push(event.clone());
                Ok(())
            });
        }
        let set = QuestionSet::with_bus(config, adapters, bus).expect("set should start");
        Self {
            set,
            questions,
            events,
        }
    }

    fn answer(&self, slide: usize, score: u32, verb: InteractionKind) {
        ScriptedQuestion::answer(&self.questions[slide], score, verb).expect("answer");
        self.set.tick().expect("tick");
    }

    fn count(&self, kind: EventKind) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|event| event.kind() == kind)
            .count()
    }

    fn clear_events(&self) {
        self.events.borrow_mut().clear();
    }
}

fn config(slides: usize) -> SetConfig {
    SetConfig {
        id: "scenario".to_string(),
        title: "Scenario".to_string(),
        questions: (0..slides)
            .map(|i| QuestionConfig::new(format!("q{i}")))
            .collect(),
        ..SetConfig::default()
    }
}

// ============================================================================
// Scenarios
// ============================================================================

/// Three slides without introduction: answering all three with qualifying
/// verbs fires `all_answered` once and moves to the solution screen.
#[test]
fn scenario_three_slides_without_intro() {
    let h = Harness::new(config(3));
    assert_eq!(h.set.view_state(), ViewState::Questions);
    assert_eq!(h.set.current_slide(), 0);

    h.answer(0, 1, InteractionKind::Answered);
    assert_eq!(h.set.answered_slides(), vec![0]);

    h.answer(1, 1, InteractionKind::Interacted);
    h.answer(2, 1, InteractionKind::Attempted);
    assert_eq!(h.set.answered_slides(), vec![0, 1, 2]);
    assert_eq!(h.count(EventKind::AllAnswered), 1);
    assert_eq!(h.set.view_state(), ViewState::SolutionScreen);
    assert_eq!(h.count(EventKind::ResultStatement), 1);
}

/// One slide with introduction: the single answer completes the set.
#[test]
fn scenario_single_slide_with_intro() {
    let mut config = config(1);
    config.introduction = IntroductionConfig {
        show_intro_page: true,
        ..IntroductionConfig::default()
    };
    let h = Harness::new(config);
    assert_eq!(h.set.view_state(), ViewState::Intro);

    h.set.exit_introduction().expect("exit introduction");
    h.set.tick().expect("tick");
    assert_eq!(h.set.view_state(), ViewState::Questions);
    assert_eq!(h.set.current_slide(), 0);
    assert!(h
        .events
        .borrow()
        .contains(&SetEvent::FocusAnnouncer { slide: 0 }));

    h.answer(0, 1, InteractionKind::Answered);
    assert_eq!(h.count(EventKind::AllAnswered), 1);
}

/// Retry from the solution screen starts a clean episode that can complete
/// again exactly once.
#[test]
fn scenario_retry_then_second_pass() {
    let h = Harness::new(config(3));
    for slide in 0..3 {
        h.answer(slide, 1, InteractionKind::Answered);
    }
    h.set.jump_to(2).expect("jump");
    assert_eq!(h.set.view_state(), ViewState::SolutionScreen);
    assert_eq!(h.set.get_score().expect("score"), 3);

    h.set.reset_task().expect("retry");
    h.set.tick().expect("tick");
    assert_eq!(h.set.view_state(), ViewState::Questions);
    assert!(h.set.answered_slides().is_empty());
    assert!(!h.set.get_answer_given());
    assert_eq!(h.set.current_slide(), 0);
    assert_eq!(h.set.get_score().expect("score"), 0);
    for question in &h.questions {
        assert_eq!(question.borrow().reset_count(), 1);
    }

    h.clear_events();
    for slide in 0..3 {
        h.answer(slide, 1, InteractionKind::Answered);
    }
    h.answer(1, 1, InteractionKind::Answered);
    assert_eq!(h.count(EventKind::AllAnswered), 1);
    assert_eq!(h.count(EventKind::ResultStatement), 1);
}

/// A set without questions cannot start.
#[test]
fn scenario_no_questions_cannot_start() {
    let err = QuestionSet::new(config(0), Vec::new()).expect_err("must not start");
    assert!(matches!(err, SetError::NoQuestions));
    assert!(err.is_fatal());
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn all_answered_fires_once_for_every_slide_count() {
    for n in 1..=5 {
        let h = Harness::new(config(n));
        for slide in 0..n {
            assert_eq!(h.count(EventKind::AllAnswered), 0, "n={n}");
            h.answer(slide, 1, InteractionKind::Answered);
        }
        assert_eq!(h.count(EventKind::AllAnswered), 1, "n={n}");

        h.answer(0, 1, InteractionKind::Answered);
        assert_eq!(h.count(EventKind::AllAnswered), 1, "n={n}");

        h.set.reset_task().expect("reset");
        for slide in (0..n).rev() {
            h.answer(slide, 0, InteractionKind::Attempted);
        }
        assert_eq!(h.count(EventKind::AllAnswered), 2, "n={n}");
    }
}

#[test]
fn repeated_answers_are_idempotent() {
    let h = Harness::new(config(2));
    h.answer(0, 1, InteractionKind::Answered);
    h.answer(0, 1, InteractionKind::Interacted);
    assert_eq!(h.set.answered_slides(), vec![0]);
    assert_eq!(h.count(EventKind::AllAnswered), 0);
}

#[test]
fn non_answer_verbs_do_not_count() {
    let h = Harness::new(config(1));
    h.answer(0, 0, InteractionKind::Completed);
    h.answer(0, 0, InteractionKind::Progressed);
    assert!(!h.set.get_answer_given());
    assert_eq!(h.count(EventKind::AllAnswered), 0);
}

#[test]
fn jump_to_current_slide_has_no_effect() {
    let h = Harness::new(config(3));
    h.set.jump_to(0).expect("jump");
    assert_eq!(h.set.pending_actions(), 0);
    assert!(h.events.borrow().is_empty());
    assert_eq!(h.questions[0].borrow().stop_count(), 0);
}

#[test]
fn jump_out_of_range_is_rejected_without_side_effects() {
    let h = Harness::new(config(2));
    let err = h.set.jump_to(5).expect_err("out of range");
    assert!(err.is_rejection());
    assert_eq!(h.set.current_slide(), 0);
    assert!(h.events.borrow().is_empty());
}

#[test]
fn score_never_exceeds_max_and_starts_at_zero() {
    let h = Harness::new(config(3));
    assert_eq!(h.set.get_score().expect("score"), 0);
    assert_eq!(h.set.get_max_score().expect("max"), 3);

    h.answer(1, 1, InteractionKind::Answered);
    assert_eq!(h.set.get_score().expect("score"), 1);

    h.questions[2].borrow_mut().set_score(10);
    let score = h.set.get_score().expect("score");
    assert!(score <= h.set.get_max_score().expect("max"));
}

#[test]
fn illegal_triggers_are_rejected() {
    let mut config = config(1);
    config.introduction.show_intro_page = true;
    let h = Harness::new(config);

    let err = h.set.request_solution_screen().expect_err("not from intro");
    assert!(matches!(err, SetError::InvalidStateTransition { .. }));
    assert_eq!(h.set.view_state(), ViewState::Intro);

    h.set.exit_introduction().expect("exit");
    let err = h.set.exit_introduction().expect_err("already exited");
    assert!(err.is_rejection());
    assert_eq!(h.set.view_state(), ViewState::Questions);
}

#[test]
fn host_actions_are_rejected_on_the_introduction() {
    let mut config = config(2);
    config.introduction.show_intro_page = true;
    let h = Harness::new(config);

    let err = h.set.show_solutions().expect_err("no solutions from intro");
    assert!(matches!(err, SetError::InvalidStateTransition { .. }));
    let err = h.set.reset_task().expect_err("no reset from intro");
    assert!(matches!(err, SetError::InvalidStateTransition { .. }));

    assert_eq!(h.set.view_state(), ViewState::Intro);
    assert!(!h.set.is_showing_solutions());
    assert_eq!(h.set.pending_actions(), 0);
    assert!(h.events.borrow().is_empty());
    for question in &h.questions {
        assert_eq!(question.borrow().solutions_shown(), 0);
        assert_eq!(question.borrow().reset_count(), 0);
    }

    h.set.exit_introduction().expect("exit");
    h.set.show_solutions().expect("show solutions on the slides");
    assert!(h.set.is_showing_solutions());
}

#[test]
fn unlisted_verb_with_known_name_counts_as_answer() {
    let h = Harness::new(config(1));
    h.answer(0, 1, InteractionKind::Other("answered".to_string()));
    assert!(h.set.get_answer_given());
    assert_eq!(h.count(EventKind::AllAnswered), 1);
}

#[test]
fn show_solutions_from_solution_screen_keeps_current_slide() {
    let h = Harness::new(config(2));
    h.set.jump_to(1).expect("jump");
    h.answer(0, 1, InteractionKind::Answered);
    h.answer(1, 0, InteractionKind::Answered);
    assert_eq!(h.set.view_state(), ViewState::SolutionScreen);

    h.set.show_solutions().expect("show solutions");
    assert_eq!(h.set.view_state(), ViewState::Questions);
    assert_eq!(h.set.current_slide(), 1);
    assert!(h.set.is_showing_solutions());
    assert_eq!(h.set.answered_slides().len(), 2);
    for question in &h.questions {
        assert_eq!(question.borrow().solutions_shown(), 1);
        assert_eq!(question.borrow().reset_count(), 0);
    }
}

#[test]
fn child_statements_precede_composite_statement() {
    let h = Harness::new(config(3));
    for slide in 0..3 {
        h.answer(slide, 1, InteractionKind::Answered);
    }

    let events = h.events.borrow();
    let composite = events
        .iter()
        .position(|e| matches!(e, SetEvent::ResultStatement(_)))
        .expect("composite statement");
    let children_before = events[..composite]
        .iter()
        .filter(|e| matches!(e, SetEvent::SlideStatement { .. }))
        .count();
    assert_eq!(children_before, 3);

    let ending_points: Vec<_> = events[..composite]
        .iter()
        .filter_map(|e| match e {
            SetEvent::SlideStatement { statement, .. } => statement.ending_point(),
            _ => None,
        })
        .collect();
    assert_eq!(ending_points, vec![1, 2, 3]);

    let SetEvent::ResultStatement(result) = &events[composite] else {
        unreachable!("position matched a result statement");
    };
    assert!(result.is_success());
    assert_eq!(result.children.len(), 3);
    let child_ids: Vec<_> = result
        .children
        .iter()
        .map(|child| child.object.id.as_str())
        .collect();
    assert_eq!(child_ids, vec!["q0", "q1", "q2"]);
}

#[test]
fn result_statement_is_repeatable_without_side_effects() {
    let h = Harness::new(config(2));
    h.answer(0, 1, InteractionKind::Answered);

    let first = h.set.get_result_statement().expect("statement");
    let second = h.set.get_result_statement().expect("statement");
    assert_eq!(first.children.len(), 1);
    assert_eq!(second.children.len(), 1);
    assert!(!first.is_success());
    assert_eq!(h.set.answered_slides(), vec![0]);
    assert_eq!(h.set.pending_actions(), 0);
}

#[test]
fn questions_without_optional_capabilities_still_work() {
    let questions = (0..2)
        .map(|_| {
            ScriptedQuestion::new(1)
                .with_capabilities(Capabilities::none())
                .shared()
        })
        .collect();
    let h = Harness::with_questions(config(2), questions);

    h.set.jump_to(1).expect("jump without stop");
    h.answer(0, 1, InteractionKind::Answered);
    h.answer(1, 1, InteractionKind::Answered);
    assert_eq!(h.set.view_state(), ViewState::SolutionScreen);

    let result = h.set.get_result_statement().expect("statement");
    assert!(result.children.is_empty());

    h.set.show_solutions().expect("show solutions without reveal");
    h.set.reset_task().expect("reset without reset capability");
    assert!(h.set.answered_slides().is_empty());
}

// ============================================================================
// Navigation buttons
// ============================================================================

#[test]
fn navigation_buttons_move_between_slides() {
    let h = Harness::new(config(3));

    assert!(ScriptedQuestion::click(&h.questions[0], NEXT_BUTTON).expect("click"));
    assert_eq!(h.set.current_slide(), 1);
    assert_eq!(h.questions[0].borrow().stop_count(), 1);

    assert!(ScriptedQuestion::click(&h.questions[1], PREVIOUS_BUTTON).expect("click"));
    assert_eq!(h.set.current_slide(), 0);

    h.set.tick().expect("tick");
    assert!(h
        .events
        .borrow()
        .contains(&SetEvent::FocusAnnouncer { slide: 0 }));
}

#[test]
fn finish_button_appears_once_all_answered_and_hides_on_retry() {
    let mut config = config(2);
    config.behaviour.auto_show_solution_screen = false;
    let h = Harness::new(config);
    let last = &h.questions[1];

    assert!(!last.borrow().is_button_visible(FINISH_BUTTON));
    h.answer(0, 1, InteractionKind::Answered);
    h.answer(1, 1, InteractionKind::Answered);
    assert!(last.borrow().is_button_visible(FINISH_BUTTON));
    assert_eq!(h.set.view_state(), ViewState::Questions);
    assert_eq!(h.count(EventKind::ResultStatement), 1);

    assert!(ScriptedQuestion::click(last, FINISH_BUTTON).expect("finish"));
    h.set.tick().expect("tick");
    assert_eq!(h.set.view_state(), ViewState::SolutionScreen);
    assert_eq!(h.count(EventKind::ResultStatement), 1);

    h.set.reset_task().expect("retry");
    assert!(!last.borrow().is_button_visible(FINISH_BUTTON));
}

#[test]
fn early_solution_screen_composes_statement_once() {
    let h = Harness::new(config(3));
    h.answer(0, 1, InteractionKind::Answered);

    h.set.request_solution_screen().expect("early exit");
    h.set.tick().expect("tick");
    assert_eq!(h.count(EventKind::ResultStatement), 1);

    let summary = h.set.solution_summary().expect("summary").expect("on solution screen");
    assert_eq!(summary.score, 1);
    assert_eq!(summary.max_score, 3);
}

#[test]
fn adapter_errors_propagate_to_the_caller() {
    let h = Harness::new(config(1));
    h.set.bus().subscribe(EventKind::SlideInteraction, |_| {
        Err(SetError::adapter(0, "widget crashed"))
    });

    let err = ScriptedQuestion::answer(&h.questions[0], 1, InteractionKind::Answered)
        .expect_err("listener error must propagate");
    assert!(matches!(err, SetError::Adapter { slide: 0, .. }));
}
