//! In-memory source of steps and problems.

use async_trait::async_trait;

use crate::workflow::{
    domain::{Problem, Step},
    ports::{ReferenceDataResult, ReferenceDataSource},
};

/// Reference data held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReferenceData {
    steps: Vec<Step>,
    problems: Vec<Problem>,
}

impl InMemoryReferenceData {
    /// Creates a source serving the given steps and problems.
    #[must_use]
    pub fn new(
        steps: impl IntoIterator<Item = Step>,
        problems: impl IntoIterator<Item = Problem>,
    ) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            problems: problems.into_iter().collect(),
        }
    }
}

#[async_trait]
impl ReferenceDataSource for InMemoryReferenceData {
    async fn load_steps(&self) -> ReferenceDataResult<Vec<Step>> {
        Ok(self.steps.clone())
    }

    async fn load_problems(&self) -> ReferenceDataResult<Vec<Problem>> {
        Ok(self.problems.clone())
    }
}
