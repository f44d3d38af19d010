//! Composition of the set's outward result statement.
//!
//! Building is pure: it reads the slides and never touches navigation or
//! answered state, so it may be repeated any number of times. Publishing is
//! limited to once per episode through [`ResultStatementComposer::schedule_once`].

use std::cell::Cell;
use std::collections::BTreeMap;

use tracing::debug;

use crate::adapter::with_adapter;
use crate::error::Result;
use crate::navigator::Slide;
use crate::scheduler::{Deferred, Scheduler};
use crate::score::ScoreAggregator;
use crate::statement::{
    ActivityDefinition, InteractionKind, ResultStatement, Statement, StatementResult,
    INTERACTION_ACTIVITY_TYPE,
};

/// Interaction type of the set's own statement.
pub const COMPOUND_INTERACTION: &str = "compound";

/// Builds the composite result statement of a set.
#[derive(Debug)]
pub struct ResultStatementComposer {
    object_id: String,
    title: String,
    armed: Cell<bool>,
    scheduler: Scheduler,
}

impl ResultStatementComposer {
    /// Creates a composer for the set identified by `object_id`.
    #[must_use]
    pub fn new(
        object_id: impl Into<String>,
        title: impl Into<String>,
        scheduler: Scheduler,
    ) -> Self {
        Self {
            object_id: object_id.into(),
            title: title.into(),
            armed: Cell::new(true),
            scheduler,
        }
    }

    /// Defers composing the statement, unless it was already scheduled
    /// this episode. Returns `true` if it was scheduled.
    ///
    /// Composition runs on the next tick, after every child statement
    /// produced by the triggering interaction has been published.
    pub fn schedule_once(&self) -> bool {
        if !self.armed.replace(false) {
            return false;
        }
        debug!(object = %self.object_id, "Scheduling result statement");
        self.scheduler.defer(Deferred::ComposeStatement);
        true
    }

    /// Allows the next episode to schedule composition again.
    pub fn rearm(&self) {
        self.armed.set(true);
    }

    /// Returns `true` while composition has not been scheduled this episode.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed.get()
    }

    /// Builds the statement from the current state of `slides`.
    ///
    /// The set's own statement is an `answered` statement on a `compound`
    /// interaction, scored with the aggregate score. Children are the
    /// statements of the slides that produce one, in slide order.
    ///
    /// # Errors
    ///
    /// Returns `SetError::AdapterBusy` if a question is mutably borrowed.
    pub fn build(&self, slides: &[Slide]) -> Result<ResultStatement> {
        let snapshot = ScoreAggregator::new(slides).snapshot()?;

        let mut statement = Statement::new(&InteractionKind::Answered, self.object_id.clone());
        statement.object.definition = Some(self.definition());
        statement = statement.with_score(snapshot.score, snapshot.max_score);
        let result = statement.result.get_or_insert_with(StatementResult::default);
        result.success = Some(snapshot.is_full_marks());
        result.completion = Some(true);

        let mut children = Vec::with_capacity(slides.len());
        for slide in slides {
            let child = with_adapter(&slide.adapter, slide.index, |adapter| {
                adapter.as_statement_source().and_then(|source| source.xapi_data())
            })?;
            children.extend(child);
        }

        Ok(ResultStatement {
            statement,
            children,
        })
    }

    fn definition(&self) -> ActivityDefinition {
        let mut name = BTreeMap::new();
        name.insert("en-US".to_string(), self.title.clone());
        ActivityDefinition {
            name,
            activity_type: Some(INTERACTION_ACTIVITY_TYPE.to_string()),
            interaction_type: Some(COMPOUND_INTERACTION.to_string()),
            ..ActivityDefinition::default()
        }
    }
}
