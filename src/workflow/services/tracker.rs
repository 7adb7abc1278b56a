//! Assignment tracker: start times and recorded durations.

use super::transition::{StepFailure, StepResult};
use crate::workflow::{
    domain::{Project, WorkflowDomainError},
    ports::ProjectRepository,
};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info};

/// Persists start and duration changes of a project's active assignment.
#[derive(Clone)]
pub struct AssignmentTracker<P, C>
where
    P: ProjectRepository,
    C: Clock + Send + Sync,
{
    projects: Arc<P>,
    clock: Arc<C>,
}

impl<P, C> AssignmentTracker<P, C>
where
    P: ProjectRepository,
    C: Clock + Send + Sync,
{
    /// Creates a tracker.
    #[must_use]
    pub const fn new(projects: Arc<P>, clock: Arc<C>) -> Self {
        Self { projects, clock }
    }

    /// Starts the active assignment of `project`.
    ///
    /// The project start time is written only the first time; the
    /// assignment's start time and status are written on every call.
    ///
    /// # Errors
    ///
    /// Returns [`StepFailure`] when the assignment cannot be started or
    /// persistence fails.
    pub async fn start_active_assignment(&self, project: &mut Project) -> StepResult<()> {
        let expected_step_id = project.current_step_id();
        let project_started = project.start_active_assignment(&*self.clock)?;
        if project_started {
            self.projects.update_project(project, expected_step_id).await?;
            info!(project_id = %project.id(), "project started");
        }
        self.persist_active(project).await?;
        info!(
            project_id = %project.id(),
            step_id = %project.current_step_id(),
            "active assignment started"
        );
        Ok(())
    }

    /// Records `minutes` of work on the active assignment.
    ///
    /// Zero leaves any stored duration untouched, so a corrective pass does
    /// not erase the time spent on the first attempt.
    ///
    /// # Errors
    ///
    /// Returns [`StepFailure`] when the project has no open assignment
    /// or persistence fails.
    pub async fn record_duration(&self, project: &mut Project, minutes: u32) -> StepResult<()> {
        if !project.record_active_duration(minutes)? {
            debug!(project_id = %project.id(), "zero duration reported; keeping stored value");
            return Ok(());
        }
        self.persist_active(project).await
    }

    /// Writes the active assignment of `project`.
    pub(crate) async fn persist_active(&self, project: &Project) -> StepResult<()> {
        let active = project
            .active_assignment()
            .ok_or(WorkflowDomainError::NoActiveAssignment(project.id()))?;
        self.projects
            .update_assignment(active)
            .await
            .map_err(StepFailure::from)
    }
}
