//! SlideSet Core
//!
//! Coordinates a linear set of third-party question widgets as one
//! exercise: view-state machine, slide navigation and answer tracking,
//! score aggregation and result-statement composition over a shared bus.

pub mod adapter;
pub mod composer;
pub mod config;
pub mod error;
pub mod event_bus;
pub mod feedback;
pub mod l10n;
pub mod navigator;
pub mod question_set;
pub mod scheduler;
pub mod score;
pub mod scripted;
pub mod statement;
pub mod view_state;

pub use adapter::{
    AdapterEvent, AdapterEventKind, AdapterHandler, ButtonAction, ButtonHost, ButtonSpec,
    QuestionAdapter, Resettable, SharedAdapter, SlideContainer, SolutionReveal, StatementSource,
    Stoppable, FINISH_BUTTON, NEXT_BUTTON, PREVIOUS_BUTTON,
};
pub use composer::{ResultStatementComposer, COMPOUND_INTERACTION};
pub use config::{Behaviour, ImageRef, IntroductionConfig, QuestionConfig, SetConfig};
pub use error::{Result, SetError};
pub use event_bus::{EventBus, EventKind, Listener, SetEvent, SubscriptionHandle};
pub use feedback::{determine_overall_feedback, score_percentage, FeedbackRange};
pub use l10n::{render_template, L10n};
pub use navigator::{AnsweredSet, ProgressDot, Slide, SlideNavigator};
pub use question_set::{QuestionSet, SolutionSummary};
pub use scheduler::{Deferred, Scheduler};
pub use score::{ScoreAggregator, ScoreSnapshot};
pub use scripted::{Capabilities, ScriptedQuestion};
pub use statement::{
    ActivityDefinition, InteractionKind, ResultStatement, Score, Statement, StatementContext,
    StatementObject, StatementResult, Verb, ENDING_POINT_EXTENSION,
};
pub use view_state::{ViewState, ViewStateMachine, ViewTrigger};
