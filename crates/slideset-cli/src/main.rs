//! SlideSet CLI
//!
//! Validates question-set definitions and drives them with scripted answers.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use serde_json::Value;
use slideset_core::{
    EventBus, EventKind, InteractionKind, QuestionAdapter, QuestionConfig, QuestionSet,
    ScriptedQuestion, SetConfig, SetEvent, SharedAdapter, ViewState, FINISH_BUTTON, NEXT_BUTTON,
    PREVIOUS_BUTTON,
};
use slideset_report::{
    json::JsonGenerator, MarkdownGenerator, Report, ReportSummary, ReportViewState, SlideRow,
    TimelineEntry,
};
use tracing_subscriber::EnvFilter;

/// Max score of a question whose params do not declare one.
const DEFAULT_MAX_SCORE: u32 = 1;

/// SlideSet - composite question-set runner
///
/// Checks set definitions and simulates learners answering them.
#[derive(Parser, Debug)]
#[command(name = "slideset")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a set definition and print its outline
    Check {
        /// Path to the set definition (JSON)
        #[arg(value_name = "SET")]
        set: PathBuf,
    },
    /// Answer a set with a script of steps and print a session report
    Run {
        /// Path to the set definition (JSON)
        #[arg(value_name = "SET")]
        set: PathBuf,

        /// Path to the script (JSON array of steps)
        #[arg(short, long, value_name = "FILE")]
        script: PathBuf,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,

        /// Write the report to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Markdown,
    Json,
}

/// One scripted learner or host action.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "action", rename_all = "camelCase")]
enum Step {
    /// Answer a slide.
    Answer {
        slide: usize,
        #[serde(default)]
        score: u32,
        #[serde(default = "default_verb")]
        verb: InteractionKind,
    },
    /// Click the current slide's next button.
    Next,
    /// Click the current slide's previous button.
    Previous,
    /// Jump straight to a slide, as the progress dots do.
    Jump { slide: usize },
    /// Leave the introduction screen.
    ExitIntroduction,
    /// Click the finish button on the last slide.
    Finish,
    /// Reset the set, as the host or the retry button does.
    Retry,
    /// Reveal every solution.
    ShowSolutions,
    /// Resize the set's container.
    Resize,
}

fn default_verb() -> InteractionKind {
    InteractionKind::Answered
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match args.command {
        Command::Check { set } => run_check(&set),
        Command::Run {
            set,
            script,
            format,
            output,
        } => run_script(&set, &script, format, output.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

// ============================================================================
// check
// ============================================================================

fn run_check(set_path: &Path) -> anyhow::Result<()> {
    let config = load_set(set_path)?;
    let declared = config.declared_max_score(|_, params| {
        params.get("maxScore").and_then(Value::as_f64)
    })?;

    println!("Set definition is valid:");
    println!("  Id: {}", config.id);
    if !config.title.is_empty() {
        println!("  Title: {}", config.title);
    }
    println!("  Slides: {}", config.questions.len());
    println!(
        "  Introduction: {}",
        if config.starts_with_introduction() {
            "shown"
        } else {
            "skipped"
        }
    );
    println!("  Declared max score: {declared}");
    println!("  Feedback ranges: {}", config.overall_feedback.len());
    for (index, question) in config.questions.iter().enumerate() {
        println!(
            "  {}. {} ({})",
            index + 1,
            question.sub_content_id,
            question.library.as_deref().unwrap_or("no library")
        );
    }
    Ok(())
}

// ============================================================================
// run
// ============================================================================

/// Shared state recorded by the bus listeners during a run.
#[derive(Default)]
struct Recorder {
    step: Cell<u32>,
    timeline: RefCell<Vec<TimelineEntry>>,
    success: Cell<Option<bool>>,
}

fn run_script(
    set_path: &Path,
    script_path: &Path,
    format: OutputFormat,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let config = load_set(set_path)?;
    let steps = load_script(script_path)?;
    tracing::info!(steps = steps.len(), script = %script_path.display(), "Script loaded");

    let questions: Vec<Rc<RefCell<ScriptedQuestion>>> = config
        .questions
        .iter()
        .map(|q| ScriptedQuestion::new(declared_max_score(q)).shared())
        .collect();
    let adapters: Vec<SharedAdapter> = questions
        .iter()
        .map(|q| Rc::clone(q) as SharedAdapter)
        .collect();

    let bus = EventBus::new();
    let recorder = Rc::new(Recorder::default());
    record_events(&bus, &recorder);

    let set = QuestionSet::with_bus(config, adapters, bus)?;
    set.tick()?;

    for (number, step) in (1u32..).zip(&steps) {
        recorder.step.set(number);
        tracing::debug!(step = number, ?step, "Running step");
        match apply_step(&set, &questions, step) {
            Ok(()) => {}
            Err(e) if is_rejection(&e) => {
                tracing::warn!(step = number, error = %e, "Step rejected");
            }
            Err(e) => return Err(e.context(format!("step {number} failed"))),
        }
        set.tick()?;
    }

    let report = build_report(&set, &questions, &recorder)?;
    write_report(&report, format, output)
}

fn is_rejection(err: &anyhow::Error) -> bool {
    err.downcast_ref::<slideset_core::SetError>()
        .is_some_and(slideset_core::SetError::is_rejection)
}

fn apply_step(
    set: &QuestionSet,
    questions: &[Rc<RefCell<ScriptedQuestion>>],
    step: &Step,
) -> anyhow::Result<()> {
    match step {
        Step::Answer { slide, score, verb } => {
            let question = questions.get(*slide).ok_or_else(|| {
                slideset_core::SetError::slide_out_of_range(*slide, questions.len())
            })?;
            ScriptedQuestion::answer(question, *score, verb.clone())?;
        }
        Step::Next => click(questions, set.current_slide(), NEXT_BUTTON)?,
        Step::Previous => click(questions, set.current_slide(), PREVIOUS_BUTTON)?,
        Step::Jump { slide } => set.jump_to(*slide)?,
        Step::ExitIntroduction => {
            set.exit_introduction()?;
        }
        Step::Finish => click(questions, questions.len() - 1, FINISH_BUTTON)?,
        Step::Retry => set.reset_task()?,
        Step::ShowSolutions => set.show_solutions()?,
        Step::Resize => set.notify_resize()?,
    }
    Ok(())
}

fn click(
    questions: &[Rc<RefCell<ScriptedQuestion>>],
    slide: usize,
    button: &str,
) -> anyhow::Result<()> {
    let question = questions
        .get(slide)
        .with_context(|| format!("slide {slide} does not exist"))?;
    if !ScriptedQuestion::click(question, button)? {
        tracing::warn!(slide, button, "Button is not available");
    }
    Ok(())
}

fn record_events(bus: &EventBus, recorder: &Rc<Recorder>) {
    for kind in EventKind::ALL {
        let recorder = Rc::clone(recorder);
        bus.subscribe(kind, move |event| {
            if let SetEvent::ResultStatement(result) = event {
                recorder.success.set(Some(result.is_success()));
            }
            let step = recorder.step.get();
            let entry = match describe(event) {
                Some(details) => TimelineEntry::with_details(step, event.event_name(), details),
                None => TimelineEntry::new(step, event.event_name()),
            };
            recorder.timeline.borrow_mut().push(entry);
            Ok(())
        });
    }
}

fn describe(event: &SetEvent) -> Option<String> {
    match event {
        SetEvent::SlideInteraction { slide, verb } => Some(format!("slide {} {verb}", slide + 1)),
        SetEvent::SlideStatement { slide, statement } => Some(format!(
            "slide {} scored {}",
            slide + 1,
            statement
                .raw_score()
                .map_or_else(|| "nothing".to_string(), |s| s.to_string())
        )),
        SetEvent::SlideChanged { from, to } => Some(format!("{} -> {}", from + 1, to + 1)),
        SetEvent::ViewChanged { from, to } => Some(format!("{from} -> {to}")),
        SetEvent::FocusAnnouncer { slide } => Some(format!("slide {}", slide + 1)),
        SetEvent::ResultStatement(result) => Some(format!(
            "score {}, success {}, {} child statements",
            result
                .statement
                .raw_score()
                .map_or_else(|| "-".to_string(), |s| s.to_string()),
            result.is_success(),
            result.children.len()
        )),
        SetEvent::AllAnswered
        | SetEvent::SolutionScreenRequested
        | SetEvent::Retry
        | SetEvent::ShowSolutions
        | SetEvent::ResizeRequested => None,
    }
}

fn build_report(
    set: &QuestionSet,
    questions: &[Rc<RefCell<ScriptedQuestion>>],
    recorder: &Recorder,
) -> anyhow::Result<Report> {
    let answered = set.answered_slides();
    let slides = set
        .slides()
        .iter()
        .zip(questions)
        .map(|(slide, question)| {
            let question = question.borrow();
            SlideRow::new(
                slide.index,
                slide.sub_content_id.clone(),
                question.score(),
                question.max_score(),
                answered.contains(&slide.index),
            )
        })
        .collect();

    let feedback = set
        .solution_summary()?
        .map(|summary| summary.feedback)
        .unwrap_or_default();

    let summary = ReportSummary {
        view_state: convert_view_state(set.view_state()),
        score: set.get_score()?,
        max_score: set.get_max_score()?,
        answered: answered.len(),
        total_slides: set.total_slides(),
        success: recorder.success.get(),
        feedback,
    };

    let title = if set.config().title.is_empty() {
        set.config().id.clone()
    } else {
        set.config().title.clone()
    };

    Ok(Report::builder()
        .title(title)
        .summary(summary)
        .slides(slides)
        .timeline(recorder.timeline.borrow().clone())
        .build()?)
}

const fn convert_view_state(state: ViewState) -> ReportViewState {
    match state {
        ViewState::Intro => ReportViewState::Intro,
        ViewState::Questions => ReportViewState::Questions,
        ViewState::SolutionScreen => ReportViewState::SolutionScreen,
    }
}

fn write_report(
    report: &Report,
    format: OutputFormat,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    match (format, output) {
        (OutputFormat::Json, Some(path)) => {
            JsonGenerator::new(report).write_to_file(path, true)?;
            println!("JSON report: {}", path.display());
        }
        (OutputFormat::Json, None) => {
            println!("{}", JsonGenerator::new(report).generate_pretty()?);
        }
        (OutputFormat::Markdown, Some(path)) => {
            std::fs::write(path, MarkdownGenerator::new(report).generate())
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Markdown report: {}", path.display());
        }
        (OutputFormat::Markdown, None) => {
            print!("{}", MarkdownGenerator::new(report).generate());
        }
    }
    Ok(())
}

// ============================================================================
// Loading
// ============================================================================

fn load_set(path: &Path) -> anyhow::Result<SetConfig> {
    if !path.exists() {
        anyhow::bail!(
            "Set definition not found: '{}'\n\nSuggestion: Check the path to the set JSON file",
            path.display()
        );
    }
    Ok(SetConfig::load_from_file(path)?)
}

fn load_script(path: &Path) -> anyhow::Result<Vec<Step>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script '{}'", path.display()))?;
    serde_json::from_str(&content).with_context(|| {
        format!(
            "invalid script '{}'\n\nSuggestion: The script is a JSON array of steps such as {{\"action\": \"answer\", \"slide\": 0, \"score\": 1}}",
            path.display()
        )
    })
}

fn declared_max_score(question: &QuestionConfig) -> u32 {
    question
        .params
        .as_ref()
        .and_then(|params| params.get("maxScore"))
        .and_then(Value::as_u64)
        .map_or(DEFAULT_MAX_SCORE, |max| u32::try_from(max).unwrap_or(u32::MAX))
}
