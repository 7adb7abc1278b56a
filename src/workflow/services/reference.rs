//! Loading the immutable reference data shared by every service.

use crate::workflow::{
    domain::{ProblemCatalog, StepGraph, StepGraphError},
    ports::{ReferenceDataError, ReferenceDataSource},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors raised while loading reference data.
#[derive(Debug, Error)]
pub enum ReferenceLoadError {
    /// The source could not be read.
    #[error(transparent)]
    Source(#[from] ReferenceDataError),
    /// The stored steps do not form a valid graph.
    #[error("invalid step graph: {0}")]
    Graph(#[from] StepGraphError),
}

/// Step graph and problem catalog, loaded once and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct WorkflowReference {
    steps: Arc<StepGraph>,
    problems: Arc<ProblemCatalog>,
}

impl WorkflowReference {
    /// Wraps an already-built graph and catalog.
    #[must_use]
    pub fn new(steps: StepGraph, problems: ProblemCatalog) -> Self {
        Self {
            steps: Arc::new(steps),
            problems: Arc::new(problems),
        }
    }

    /// Loads and validates reference data from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceLoadError`] when the source fails or the steps do
    /// not form a valid graph.
    pub async fn load<S>(source: &S) -> Result<Self, ReferenceLoadError>
    where
        S: ReferenceDataSource + ?Sized,
    {
        let steps = StepGraph::new(source.load_steps().await?)?;
        let problems = ProblemCatalog::new(source.load_problems().await?);
        info!(
            steps = steps.len(),
            problems = problems.iter().count(),
            "loaded workflow reference data"
        );
        Ok(Self::new(steps, problems))
    }

    /// Returns the step graph.
    #[must_use]
    pub fn steps(&self) -> &StepGraph {
        &self.steps
    }

    /// Returns the problem catalog.
    #[must_use]
    pub fn problems(&self) -> &ProblemCatalog {
        &self.problems
    }
}
