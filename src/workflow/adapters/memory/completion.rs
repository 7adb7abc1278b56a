//! Step completion adapters that need no external systems.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::workflow::{
    domain::{Project, Step, StepId},
    ports::{CompletionRejection, StepCompletion},
};

/// Completion adapter that accepts every step.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptingStepCompletion;

#[async_trait]
impl StepCompletion for AcceptingStepCompletion {
    async fn complete(&self, _project: &Project, _step: &Step) -> Result<(), CompletionRejection> {
        Ok(())
    }
}

/// Completion adapter that rejects configured steps with a fixed problem.
#[derive(Debug, Clone, Default)]
pub struct RejectingStepCompletion {
    rejections: HashMap<StepId, CompletionRejection>,
}

impl RejectingStepCompletion {
    /// Creates an adapter that accepts every step.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects completion of `step_id` with `rejection`.
    #[must_use]
    pub fn rejecting(mut self, step_id: StepId, rejection: CompletionRejection) -> Self {
        self.rejections.insert(step_id, rejection);
        self
    }
}

#[async_trait]
impl StepCompletion for RejectingStepCompletion {
    async fn complete(&self, _project: &Project, step: &Step) -> Result<(), CompletionRejection> {
        self.rejections
            .get(&step.id())
            .map_or(Ok(()), |rejection| Err(rejection.clone()))
    }
}
