//! Claiming and releasing project steps.

use super::{
    annotation::{AnnotationError, AnnotationService},
    error::{ErrorKind, domain_kind, graph_kind, project_repository_kind},
    locks::ProjectLocks,
    reference::WorkflowReference,
};
use crate::workflow::{
    domain::{
        Claimant, ClaimOutcome, Note, NoteDraft, NoteType, Project, ProjectId, StepGraphError,
        WorkflowDomainError,
    },
    ports::{NoteRepository, ProjectRepository, ProjectRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Service-level errors for ownership changes.
#[derive(Debug, Error)]
pub enum OwnershipError {
    /// The project does not exist.
    #[error("project {0} not found")]
    ProjectNotFound(ProjectId),
    /// The claim or release is not allowed.
    #[error(transparent)]
    Domain(#[from] WorkflowDomainError),
    /// The current step is not in the graph.
    #[error(transparent)]
    Graph(#[from] StepGraphError),
    /// Project persistence failed or lost a concurrent update.
    #[error(transparent)]
    Repository(#[from] ProjectRepositoryError),
    /// Recording the release note failed.
    #[error(transparent)]
    Annotation(#[from] AnnotationError),
}

impl OwnershipError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ProjectNotFound(_) => ErrorKind::NotFound,
            Self::Domain(err) => domain_kind(err),
            Self::Graph(err) => graph_kind(err),
            Self::Repository(err) => project_repository_kind(err),
            Self::Annotation(err) => err.kind(),
        }
    }
}

/// Result type for ownership operations.
pub type OwnershipResult<T> = Result<T, OwnershipError>;

/// Result of a claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedStep {
    /// Project after the claim.
    pub project: Project,
    /// What the claim changed.
    pub outcome: ClaimOutcome,
}

/// Result of a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasedStep {
    /// Project after the release.
    pub project: Project,
    /// Comment recording the cancelled assignment.
    pub note: Note,
}

/// Changes who owns a project's current step.
#[derive(Clone)]
pub struct OwnershipService<P, N, C>
where
    P: ProjectRepository,
    N: NoteRepository,
    C: Clock + Send + Sync,
{
    projects: Arc<P>,
    annotations: AnnotationService<P, N, C>,
    reference: WorkflowReference,
    locks: Arc<ProjectLocks>,
    clock: Arc<C>,
}

impl<P, N, C> OwnershipService<P, N, C>
where
    P: ProjectRepository,
    N: NoteRepository,
    C: Clock + Send + Sync,
{
    /// Creates an ownership service with its own lock registry.
    #[must_use]
    pub fn new(
        projects: Arc<P>,
        notes: Arc<N>,
        reference: WorkflowReference,
        clock: Arc<C>,
    ) -> Self {
        Self {
            annotations: AnnotationService::new(
                Arc::clone(&projects),
                notes,
                reference.clone(),
                Arc::clone(&clock),
            ),
            projects,
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

    /// Gives the current step of a project to `claimant`.
    ///
    /// # Errors
    ///
    /// Returns [`OwnershipError`] when the project is unknown or finished,
    /// the owner policy forbids the claim, or persistence fails.
    pub async fn claim_step(
        &self,
        project_id: ProjectId,
        claimant: Claimant,
    ) -> OwnershipResult<ClaimedStep> {
        let _guard = self.locks.lock(project_id).await;
        let mut project = self.load(project_id).await?;
        let step = self
            .reference
            .steps()
            .step_by_id(project.current_step_id())?;
        let expected_step_id = project.current_step_id();
        let previous_owner = project.owner_id();
        let outcome = project.claim(step, claimant, &*self.clock)?;

        match outcome {
            ClaimOutcome::AlreadyOwner => {
                if previous_owner != project.owner_id() {
                    self.projects
                        .update_project(&project, expected_step_id)
                        .await?;
                }
            }
            ClaimOutcome::FilledVacancy(_) => {
                self.persist_active(&project).await?;
                self.projects
                    .update_project(&project, expected_step_id)
                    .await?;
            }
            ClaimOutcome::Reassigned { previous, .. } => {
                if let Some(closed) = project
                    .assignments()
                    .iter()
                    .find(|assignment| assignment.id() == previous)
                {
                    self.projects.update_assignment(closed).await?;
                }
                self.projects
                    .update_project(&project, expected_step_id)
                    .await?;
                let created = project
                    .active_assignment()
                    .ok_or(WorkflowDomainError::NoActiveAssignment(project_id))?;
                self.projects.insert_assignment(created).await?;
            }
        }

        info!(
            project_id = %project_id,
            step_id = %project.current_step_id(),
            staff_member_id = %claimant.staff_member_id,
            role = claimant.role.as_str(),
            outcome = ?outcome,
            "step claimed"
        );
        Ok(ClaimedStep { project, outcome })
    }

    /// Cancels the current owner's assignment, leaving the step unclaimed,
    /// and records a comment about the cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`OwnershipError`] when the project is unknown, finished, or
    /// unowned, or persistence fails.
    pub async fn release_step(&self, project_id: ProjectId) -> OwnershipResult<ReleasedStep> {
        let _guard = self.locks.lock(project_id).await;
        let mut project = self.load(project_id).await?;
        let expected_step_id = project.current_step_id();
        let released = project.release()?;
        self.persist_active(&project).await?;
        self.projects
            .update_project(&project, expected_step_id)
            .await?;

        let draft = NoteDraft::new(
            project.current_step_id(),
            Some(released),
            NoteType::Comment,
            format!("Assignment to staff member {released} was cancelled"),
        );
        let note = self.annotations.append(&project, draft, []).await?;
        info!(
            project_id = %project_id,
            step_id = %project.current_step_id(),
            staff_member_id = %released,
            "step released"
        );
        Ok(ReleasedStep { project, note })
    }

    async fn persist_active(&self, project: &Project) -> OwnershipResult<()> {
        let active = project
            .active_assignment()
            .ok_or(WorkflowDomainError::NoActiveAssignment(project.id()))?;
        self.projects.update_assignment(active).await?;
        Ok(())
    }

    async fn load(&self, project_id: ProjectId) -> OwnershipResult<Project> {
        self.projects
            .find_by_id(project_id)
            .await?
            .ok_or(OwnershipError::ProjectNotFound(project_id))
    }
}
