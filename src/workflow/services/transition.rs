//! Transition engine: finishing, failing, and rejecting project steps.

use super::{
    annotation::{AnnotationError, AnnotationService},
    error::{ErrorKind, domain_kind, graph_kind, project_repository_kind},
    locks::ProjectLocks,
    reference::WorkflowReference,
    tracker::AssignmentTracker,
};
use crate::workflow::{
    domain::{
        AssignmentStatus, Note, NoteDraft, NoteType, ProblemId, Project, ProjectId,
        StaffMemberId, Step, StepGraphError, StepId, WorkflowDomainError,
    },
    ports::{NoteRepository, ProjectRepository, ProjectRepositoryError, StepCompletion},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// What went wrong while acting on a project's current step.
#[derive(Debug, Error)]
pub enum StepFailure {
    /// The project's state does not allow the transition.
    #[error(transparent)]
    Domain(#[from] WorkflowDomainError),
    /// The step graph lacks a required step or edge.
    #[error(transparent)]
    Graph(#[from] StepGraphError),
    /// Project persistence failed or lost a concurrent update.
    #[error(transparent)]
    Repository(#[from] ProjectRepositoryError),
    /// Recording the error note failed.
    #[error(transparent)]
    Annotation(#[from] AnnotationError),
}

impl StepFailure {
    /// Classifies the failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(err) => domain_kind(err),
            Self::Graph(err) => graph_kind(err),
            Self::Repository(err) => project_repository_kind(err),
            Self::Annotation(err) => err.kind(),
        }
    }
}

/// Service-level errors for project transitions.
#[derive(Debug, Error)]
pub enum TransitionError {
    /// The project does not exist.
    #[error("project {0} not found")]
    ProjectNotFound(ProjectId),
    /// Reading the project failed.
    #[error("unable to load project {project_id}: {source}")]
    Load {
        /// Project being loaded.
        project_id: ProjectId,
        /// Storage failure.
        #[source]
        source: ProjectRepositoryError,
    },
    /// The operation on the project's current step failed.
    #[error("project {project_id} step {step_id}: {source}")]
    Step {
        /// Project being transitioned.
        project_id: ProjectId,
        /// Step the project was on when the operation began.
        step_id: StepId,
        /// Underlying failure.
        #[source]
        source: StepFailure,
    },
}

impl TransitionError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ProjectNotFound(_) => ErrorKind::NotFound,
            Self::Load { source, .. } => project_repository_kind(source),
            Self::Step { source, .. } => source.kind(),
        }
    }

    /// Returns the project the operation targeted.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        match self {
            Self::ProjectNotFound(project_id)
            | Self::Load { project_id, .. }
            | Self::Step { project_id, .. } => *project_id,
        }
    }

    /// Returns the step the project was on, when it was loaded.
    #[must_use]
    pub const fn step_id(&self) -> Option<StepId> {
        match self {
            Self::Step { step_id, .. } => Some(*step_id),
            Self::ProjectNotFound(_) | Self::Load { .. } => None,
        }
    }
}

/// Result type for transition operations.
pub type TransitionResult<T> = Result<T, TransitionError>;

/// Result type for work on an already-loaded project.
pub type StepResult<T> = Result<T, StepFailure>;

/// Result of finishing a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishOutcome {
    /// The project moved to the next step with a new assignment.
    Advanced(Project),
    /// The terminal step finished; the workflow is complete.
    Completed(Project),
    /// Completion work rejected the step; the assignment was flagged with an
    /// error and the project stays on its step.
    Parked {
        /// Project after the failure was recorded.
        project: Project,
        /// Error note describing the rejection.
        note: Note,
    },
}

impl FinishOutcome {
    /// Returns the project after the operation.
    #[must_use]
    pub const fn project(&self) -> &Project {
        match self {
            Self::Advanced(project) | Self::Completed(project) | Self::Parked { project, .. } => {
                project
            }
        }
    }
}

/// Result of failing a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedStep {
    /// Project after the failure was recorded.
    pub project: Project,
    /// Error note linked to the resolved problem.
    pub note: Note,
}

/// Drives projects through their workflow.
///
/// Each operation holds the project's lock from load to last write. The
/// sub-step writes are individually durable; a failure part way leaves the
/// state of the last successful write.
#[derive(Clone)]
pub struct TransitionEngine<P, N, S, C>
where
    P: ProjectRepository,
    N: NoteRepository,
    S: StepCompletion,
    C: Clock + Send + Sync,
{
    projects: Arc<P>,
    tracker: AssignmentTracker<P, C>,
    annotations: AnnotationService<P, N, C>,
    completion: Arc<S>,
    reference: WorkflowReference,
    locks: Arc<ProjectLocks>,
    clock: Arc<C>,
}

impl<P, N, S, C> TransitionEngine<P, N, S, C>
where
    P: ProjectRepository,
    N: NoteRepository,
    S: StepCompletion,
    C: Clock + Send + Sync,
{
    /// Creates an engine with its own lock registry.
    #[must_use]
    pub fn new(
        projects: Arc<P>,
        notes: Arc<N>,
        completion: Arc<S>,
        reference: WorkflowReference,
        clock: Arc<C>,
    ) -> Self {
        Self {
            tracker: AssignmentTracker::new(Arc::clone(&projects), Arc::clone(&clock)),
            annotations: AnnotationService::new(
                Arc::clone(&projects),
                notes,
                reference.clone(),
                Arc::clone(&clock),
            ),
            projects,
            completion,
            reference,
            locks: Arc::new(ProjectLocks::new()),
            clock,
        }
    }

    /// Shares `locks` with other services acting on the same projects.
    #[must_use]
    pub fn with_locks(mut self, locks: Arc<ProjectLocks>) -> Self {
        self.locks = locks;
        self
    }

    /// Starts the active assignment of a project.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the project is unknown, finished, its
    /// active assignment is closed, or persistence fails.
    pub async fn start_active_assignment(&self, project_id: ProjectId) -> TransitionResult<Project> {
        let _guard = self.locks.lock(project_id).await;
        let mut project = self.load(project_id).await?;
        let step_id = project.current_step_id();
        self.tracker
            .start_active_assignment(&mut project)
            .await
            .map_err(|source| step_failed(project_id, step_id, source))?;
        Ok(project)
    }

    /// Records working time on the active assignment without finishing it.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the project is unknown or finished,
    /// or persistence fails.
    pub async fn record_duration(
        &self,
        project_id: ProjectId,
        minutes: u32,
    ) -> TransitionResult<Project> {
        let _guard = self.locks.lock(project_id).await;
        let mut project = self.load(project_id).await?;
        let step_id = project.current_step_id();
        self.tracker
            .record_duration(&mut project, minutes)
            .await
            .map_err(|source| step_failed(project_id, step_id, source))?;
        Ok(project)
    }

    /// Finishes the current step and advances the project.
    ///
    /// The duration is recorded first. Completion work then runs unless the
    /// step is terminal and the unit is flagged with an error. A rejected
    /// completion is recorded as a step failure and returned as
    /// [`FinishOutcome::Parked`]. Otherwise the assignment is finished and the
    /// project either completes (terminal step) or moves to the next step,
    /// owned according to that step's owner policy.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the project is unknown or finished,
    /// the active assignment cannot finish, the graph lacks a successor, or
    /// persistence fails.
    pub async fn finish_step(
        &self,
        project_id: ProjectId,
        duration_minutes: u32,
    ) -> TransitionResult<FinishOutcome> {
        let _guard = self.locks.lock(project_id).await;
        let project = self.load(project_id).await?;
        let step_id = project.current_step_id();
        self.finish_loaded(project, duration_minutes)
            .await
            .map_err(|source| step_failed(project_id, step_id, source))
    }

    async fn finish_loaded(
        &self,
        mut project: Project,
        duration_minutes: u32,
    ) -> StepResult<FinishOutcome> {
        let step = self.current_step(&project)?.clone();
        ensure_active_can_become(&project, AssignmentStatus::Finished)?;
        let next_step = if step.is_terminal() {
            None
        } else {
            Some(self.reference.steps().next_step(&step)?.clone())
        };

        self.tracker
            .record_duration(&mut project, duration_minutes)
            .await?;

        if step.is_terminal() && project.unit_has_error() {
            info!(
                project_id = %project.id(),
                step_id = %step.id(),
                "unit flagged with error; skipping completion work"
            );
        } else if let Err(rejection) = self.completion.complete(&project, &step).await {
            warn!(
                project_id = %project.id(),
                step_id = %step.id(),
                problem = rejection.problem(),
                "step completion rejected"
            );
            let note = self
                .fail_loaded(&mut project, rejection.problem(), &rejection.note_text())
                .await?;
            return Ok(FinishOutcome::Parked { project, note });
        }

        project.finish_active_assignment(&*self.clock)?;
        self.tracker.persist_active(&project).await?;
        let expected_step_id = project.current_step_id();

        let Some(next_step) = next_step else {
            project.mark_finished(&*self.clock);
            self.projects
                .update_project(&project, expected_step_id)
                .await?;
            info!(
                project_id = %project.id(),
                step_id = %step.id(),
                "workflow complete"
            );
            return Ok(FinishOutcome::Completed(project));
        };

        let owner = project.next_owner(next_step.owner_policy());
        self.advance(&mut project, &next_step, owner).await?;
        info!(
            project_id = %project.id(),
            from_step = %step.id(),
            step_id = %next_step.id(),
            owner_policy = %next_step.owner_policy(),
            owner = ?owner.map(|id| id.value()),
            "project advanced"
        );
        Ok(FinishOutcome::Advanced(project))
    }

    /// Flags the active assignment with an error and records a problem note.
    ///
    /// The project stays on its current step. An unknown problem name links
    /// the note to the reserved "other" problem instead of failing.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the project is unknown or finished,
    /// the message is blank, the assignment cannot be flagged, or
    /// persistence fails.
    pub async fn fail_step(
        &self,
        project_id: ProjectId,
        problem_name: &str,
        message: &str,
    ) -> TransitionResult<FailedStep> {
        let _guard = self.locks.lock(project_id).await;
        let mut project = self.load(project_id).await?;
        let step_id = project.current_step_id();
        let note = self
            .fail_loaded(&mut project, problem_name, message)
            .await
            .map_err(|source| step_failed(project_id, step_id, source))?;
        Ok(FailedStep { project, note })
    }

    /// Sends the project back to the current step's failure step.
    ///
    /// The active assignment is closed as rejected (the duration policy of
    /// [`Self::record_duration`] applies) and a new assignment is created
    /// at the failure step for the project's original owner.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the project is unknown or finished,
    /// the assignment was not started, the step has no failure step, or
    /// persistence fails.
    pub async fn reject_step(
        &self,
        project_id: ProjectId,
        duration_minutes: u32,
    ) -> TransitionResult<Project> {
        let _guard = self.locks.lock(project_id).await;
        let mut project = self.load(project_id).await?;
        let step_id = project.current_step_id();
        self.reject_loaded(&mut project, duration_minutes)
            .await
            .map_err(|source| step_failed(project_id, step_id, source))?;
        Ok(project)
    }

    async fn reject_loaded(&self, project: &mut Project, duration_minutes: u32) -> StepResult<()> {
        let step = self.current_step(project)?;
        let fail_step = self.reference.steps().failure_step(step)?.clone();
        let from_step = step.id();
        ensure_active_can_become(project, AssignmentStatus::Rejected)?;

        self.tracker
            .record_duration(project, duration_minutes)
            .await?;
        project.reject_active_assignment(&*self.clock)?;
        self.tracker.persist_active(project).await?;

        let owner = project.original_owner();
        self.advance(project, &fail_step, owner).await?;
        info!(
            project_id = %project.id(),
            from_step = %from_step,
            step_id = %fail_step.id(),
            "project sent back to failure step"
        );
        Ok(())
    }

    async fn fail_loaded(
        &self,
        project: &mut Project,
        problem_name: &str,
        message: &str,
    ) -> StepResult<Note> {
        if message.trim().is_empty() {
            return Err(WorkflowDomainError::EmptyNoteText.into());
        }
        project.fail_active_assignment()?;
        self.tracker.persist_active(project).await?;

        let problem = self.reference.problems().resolve_or_other(problem_name);
        if problem.id() == ProblemId::OTHER {
            warn!(
                project_id = %project.id(),
                problem = problem_name,
                "problem resolved to the reserved other problem"
            );
        }
        let draft = NoteDraft::new(
            project.current_step_id(),
            project.owner_id(),
            NoteType::Problem,
            message,
        );
        let note = self
            .annotations
            .append(project, draft, [problem.id()])
            .await?;
        info!(
            project_id = %project.id(),
            step_id = %project.current_step_id(),
            problem_id = %problem.id(),
            "step failed"
        );
        Ok(note)
    }

    async fn advance(
        &self,
        project: &mut Project,
        step: &Step,
        owner: Option<StaffMemberId>,
    ) -> StepResult<()> {
        let expected_step_id = project.current_step_id();
        project.advance_to(step.id(), owner, &*self.clock);
        self.projects
            .update_project(project, expected_step_id)
            .await?;
        let created = project
            .active_assignment()
            .ok_or(WorkflowDomainError::NoActiveAssignment(project.id()))?;
        self.projects.insert_assignment(created).await?;
        Ok(())
    }

    async fn load(&self, project_id: ProjectId) -> TransitionResult<Project> {
        match self.projects.find_by_id(project_id).await {
            Ok(Some(project)) => Ok(project),
            Ok(None) => Err(TransitionError::ProjectNotFound(project_id)),
            Err(source) => {
                error!(project_id = %project_id, error = %source, "unable to load project");
                Err(TransitionError::Load { project_id, source })
            }
        }
    }

    fn current_step(&self, project: &Project) -> StepResult<&Step> {
        Ok(self.reference.steps().step_by_id(project.current_step_id())?)
    }
}

/// Rejects the operation before any write when the active assignment
/// cannot move to `target`.
fn ensure_active_can_become(
    project: &Project,
    target: AssignmentStatus,
) -> Result<(), WorkflowDomainError> {
    if project.is_finished() {
        return Err(WorkflowDomainError::ProjectFinished(project.id()));
    }
    let active = project
        .active_assignment()
        .ok_or(WorkflowDomainError::NoActiveAssignment(project.id()))?;
    if active.status().can_transition_to(target) {
        Ok(())
    } else {
        Err(WorkflowDomainError::InvalidAssignmentTransition {
            assignment_id: active.id(),
            from: active.status(),
            to: target,
        })
    }
}

/// Attaches the project and step to `source` and logs it.
fn step_failed(project_id: ProjectId, step_id: StepId, source: StepFailure) -> TransitionError {
    let kind = source.kind();
    match kind {
        ErrorKind::Validation | ErrorKind::NotFound => warn!(
            project_id = %project_id,
            step_id = %step_id,
            kind = %kind,
            error = %source,
            "transition refused"
        ),
        ErrorKind::Persistence | ErrorKind::GraphMisconfiguration | ErrorKind::Conflict => error!(
            project_id = %project_id,
            step_id = %step_id,
            kind = %kind,
            error = %source,
            "unable to update project"
        ),
    }
    TransitionError::Step {
        project_id,
        step_id,
        source,
    }
}
