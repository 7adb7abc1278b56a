//! Port for the side-effects that run when a step is completed.
//!
//! Completion work (file validation, moving images between storage areas,
//! requesting finalization) lives outside this crate. The engine only needs
//! to know whether the step may close.

use crate::workflow::domain::{Project, Step};
use async_trait::async_trait;
use std::borrow::Cow;
use std::fmt;

/// Completion work rejected the step.
///
/// The engine records the rejection with `fail_step`, using `problem` as the
/// problem name and [`Self::note_text`] as the note text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRejection {
    problem: String,
    message: String,
}

impl CompletionRejection {
    /// Creates a rejection.
    #[must_use]
    pub fn new(problem: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            problem: problem.into(),
            message: message.into(),
        }
    }

    /// Returns the problem name used to tag the error note.
    #[must_use]
    pub fn problem(&self) -> &str {
        &self.problem
    }

    /// Returns the error note text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the text of the error note, naming the problem when the
    /// message is blank.
    #[must_use]
    pub fn note_text(&self) -> Cow<'_, str> {
        if self.message.trim().is_empty() {
            Cow::Owned(format!("Step completion rejected: {}", self.problem))
        } else {
            Cow::Borrowed(&self.message)
        }
    }
}

impl fmt::Display for CompletionRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.problem, self.message)
    }
}

/// Runs the completion side-effects of a step.
#[async_trait]
pub trait StepCompletion: Send + Sync {
    /// Performs completion work for `project` finishing `step`.
    ///
    /// # Errors
    ///
    /// Returns a [`CompletionRejection`] when the step must not close.
    async fn complete(&self, project: &Project, step: &Step) -> Result<(), CompletionRejection>;
}
