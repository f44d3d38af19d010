//! Tests against the fixture set shipped in `fixtures/`.
//!
//! The fruit set opens on an introduction, does not move to the solution
//! screen on its own and declares a max score of 4 across three questions.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use slideset_core::{
    InteractionKind, QuestionAdapter, QuestionSet, ScriptedQuestion, SetConfig, SharedAdapter,
    ViewState, FINISH_BUTTON, NEXT_BUTTON,
};
use slideset_report::{
    json::JsonGenerator, MarkdownGenerator, Report, ReportSummary, ReportViewState, SlideRow,
};

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join("fruit-set")
}

fn load_config() -> SetConfig {
    SetConfig::load_from_file(&fixture_dir().join("set.json")).expect("fixture should load")
}

fn params_max_score(_library: &str, params: &serde_json::Value) -> Option<f64> {
    params.get("maxScore").and_then(serde_json::Value::as_f64)
}

fn build_set(config: SetConfig) -> (QuestionSet, Vec<Rc<RefCell<ScriptedQuestion>>>) {
    let questions: Vec<_> = config
        .questions
        .iter()
        .map(|question| {
            let max = question
                .params
                .as_ref()
                .and_then(|params| params.get("maxScore"))
                .and_then(serde_json::Value::as_u64)
                .and_then(|max| u32::try_from(max).ok())
                .unwrap_or(1);
            ScriptedQuestion::new(max).shared()
        })
        .collect();
    let adapters = questions
        .iter()
        .map(|q| Rc::clone(q) as SharedAdapter)
        .collect();
    let set = QuestionSet::new(config, adapters).expect("set should start");
    (set, questions)
}

fn summary_report(set: &QuestionSet) -> Report {
    let rows: Vec<SlideRow> = set
        .slides()
        .iter()
        .map(|slide| {
            let adapter = slide.adapter.borrow();
            SlideRow::new(
                slide.index,
                slide.sub_content_id.clone(),
                adapter.score(),
                adapter.max_score(),
                set.answered_slides().contains(&slide.index),
            )
        })
        .collect();
    let solution = set
        .solution_summary()
        .expect("summary")
        .expect("on solution screen");
    let result = set.get_result_statement().expect("result statement");

    Report::builder()
        .title(set.config().title.clone())
        .summary(ReportSummary {
            view_state: ReportViewState::SolutionScreen,
            score: solution.score,
            max_score: solution.max_score,
            answered: set.answered_slides().len(),
            total_slides: set.total_slides(),
            success: Some(result.is_success()),
            feedback: solution.feedback,
        })
        .slides(rows)
        .build()
        .expect("report should build")
}

#[test]
fn fixture_config_loads() {
    let config = load_config();
    assert_eq!(config.id, "fruit-set");
    assert_eq!(config.questions.len(), 3);
    assert!(config.starts_with_introduction());
    assert_eq!(config.introduction.image_path(), Some("images/basket.png"));
    assert!(!config.behaviour.auto_show_solution_screen);
    assert_eq!(config.l10n.slide_title(1), "Fruit 2");
    assert_eq!(config.declared_max_score(params_max_score).expect("max"), 4);
}

#[test]
fn fixture_script_is_a_list_of_actions() {
    let raw = std::fs::read_to_string(fixture_dir().join("script.json")).expect("script");
    let steps: serde_json::Value = serde_json::from_str(&raw).expect("valid JSON");
    let steps = steps.as_array().expect("array of steps");
    assert_eq!(steps.len(), 7);
    assert!(steps.iter().all(|step| step["action"].is_string()));
    assert_eq!(steps.last().expect("last step")["action"], "finish");
}

#[test]
fn fixture_session_reaches_feedback() {
    let (set, questions) = build_set(load_config());
    assert_eq!(set.get_max_score().expect("max"), 4);
    assert_eq!(set.view_state(), ViewState::Intro);

    set.exit_introduction().expect("exit introduction");
    ScriptedQuestion::answer(&questions[0], 1, InteractionKind::Answered).expect("answer");
    assert!(ScriptedQuestion::click(&questions[0], NEXT_BUTTON).expect("next"));
    ScriptedQuestion::answer(&questions[1], 0, InteractionKind::Attempted).expect("answer");
    assert!(ScriptedQuestion::click(&questions[1], NEXT_BUTTON).expect("next"));
    ScriptedQuestion::answer(&questions[2], 2, InteractionKind::Answered).expect("answer");
    set.tick().expect("tick");

    assert_eq!(set.current_slide(), 2);
    assert_eq!(set.view_state(), ViewState::Questions);
    assert_eq!(
        questions[2].borrow().button(FINISH_BUTTON).expect("finish").label,
        "Done"
    );

    assert!(ScriptedQuestion::click(&questions[2], FINISH_BUTTON).expect("finish"));
    set.tick().expect("tick");
    assert_eq!(set.view_state(), ViewState::SolutionScreen);

    let summary = set
        .solution_summary()
        .expect("summary")
        .expect("on solution screen");
    assert_eq!(summary.score, 3);
    assert_eq!(summary.max_score, 4);
    assert_eq!(summary.percentage, 75);
    assert_eq!(summary.feedback, "Nearly there");

    let dots = set.progress_dots();
    assert_eq!(dots.len(), 3);
    assert_eq!(dots[0].title, "Fruit 1");
    assert!(dots.iter().all(|dot| dot.answered));
    assert!(dots[2].active);
}

#[test]
fn fixture_session_report() {
    let (set, questions) = build_set(load_config());
    set.exit_introduction().expect("exit introduction");
    ScriptedQuestion::answer(&questions[0], 1, InteractionKind::Answered).expect("answer");
    ScriptedQuestion::answer(&questions[1], 1, InteractionKind::Answered).expect("answer");
    ScriptedQuestion::answer(&questions[2], 2, InteractionKind::Answered).expect("answer");
    set.request_solution_screen().expect("solution screen");
    set.tick().expect("tick");

    let report = summary_report(&set);
    assert!(report.is_complete());
    assert_eq!(report.summary.success, Some(true));
    assert_eq!(report.summary.feedback, "Perfect");

    let markdown = MarkdownGenerator::new(&report).generate();
    assert!(markdown.starts_with("# Question Set Report: Fruit vocabulary"));
    assert!(markdown.contains("| Score | 4 / 4 (100%) |"));
    assert!(markdown.contains("| 3 | plum | 2 / 2 | &#10003; |"));

    let json = JsonGenerator::new(&report).generate().expect("json");
    let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
    assert_eq!(value["summary"]["answered"], 3);
    assert_eq!(value["slides"][0]["sub_content_id"], "apple");
}
