//! Annotation service: notes attached to project steps.

use super::{
    error::{ErrorKind, domain_kind, graph_kind, note_repository_kind, project_repository_kind},
    reference::WorkflowReference,
};
use crate::workflow::{
    domain::{
        Note, NoteDraft, Problem, ProblemId, Project, ProjectId, Step, StepGraphError,
        WorkflowDomainError,
    },
    ports::{NoteRepository, NoteRepositoryError, ProjectRepository, ProjectRepositoryError},
};
use mockable::Clock;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Service-level errors for note operations.
#[derive(Debug, Error)]
pub enum AnnotationError {
    /// The project does not exist.
    #[error("project {0} not found")]
    ProjectNotFound(ProjectId),
    /// A linked problem is not in the catalog.
    #[error("problem {0} not found")]
    UnknownProblem(ProblemId),
    /// The note's step could not be resolved.
    #[error(transparent)]
    Step(#[from] StepGraphError),
    /// Note validation failed.
    #[error(transparent)]
    Domain(#[from] WorkflowDomainError),
    /// Project lookup failed.
    #[error(transparent)]
    Projects(#[from] ProjectRepositoryError),
    /// Note persistence failed.
    #[error(transparent)]
    Notes(#[from] NoteRepositoryError),
}

impl AnnotationError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ProjectNotFound(_) | Self::UnknownProblem(_) => ErrorKind::NotFound,
            Self::Step(err) => graph_kind(err),
            Self::Domain(err) => domain_kind(err),
            Self::Projects(err) => project_repository_kind(err),
            Self::Notes(err) => note_repository_kind(err),
        }
    }
}

/// Result type for annotation operations.
pub type AnnotationResult<T> = Result<T, AnnotationError>;

/// A note together with the step and problems it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteEntry {
    /// The note.
    pub note: Note,
    /// Step the note was recorded against.
    pub step: Step,
    /// Linked problems, in link order.
    pub problems: Vec<Problem>,
}

/// Records and lists project notes.
#[derive(Clone)]
pub struct AnnotationService<P, N, C>
where
    P: ProjectRepository,
    N: NoteRepository,
    C: Clock + Send + Sync,
{
    projects: Arc<P>,
    notes: Arc<N>,
    reference: WorkflowReference,
    clock: Arc<C>,
}

impl<P, N, C> AnnotationService<P, N, C>
where
    P: ProjectRepository,
    N: NoteRepository,
    C: Clock + Send + Sync,
{
    /// Creates an annotation service.
    #[must_use]
    pub const fn new(
        projects: Arc<P>,
        notes: Arc<N>,
        reference: WorkflowReference,
        clock: Arc<C>,
    ) -> Self {
        Self {
            projects,
            notes,
            reference,
            clock,
        }
    }

    /// Adds a note to a project and returns the project's full note feed,
    /// newest first.
    ///
    /// Every input is validated before anything is written.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotationError`] when the project, the step, or a problem
    /// is unknown, the step belongs to another workflow, the text is blank,
    /// or persistence fails.
    pub async fn add_note(
        &self,
        project_id: ProjectId,
        draft: NoteDraft,
        problem_ids: &[ProblemId],
    ) -> AnnotationResult<Vec<NoteEntry>> {
        let project = self.load_project(project_id).await?;
        self.append(&project, draft, problem_ids.iter().copied())
            .await?;
        self.feed(project_id).await
    }

    /// Returns every note of a project, newest first, with its step and
    /// problems resolved.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotationError`] when the project is unknown, a stored note
    /// references reference data that no longer exists, or persistence
    /// fails.
    pub async fn list_notes(&self, project_id: ProjectId) -> AnnotationResult<Vec<NoteEntry>> {
        if self.projects.find_by_id(project_id).await?.is_none() {
            return Err(AnnotationError::ProjectNotFound(project_id));
        }
        self.feed(project_id).await
    }

    async fn feed(&self, project_id: ProjectId) -> AnnotationResult<Vec<NoteEntry>> {
        let notes = self.notes.list_for_project(project_id).await?;
        notes
            .into_iter()
            .map(|note| self.entry_for(note))
            .collect()
    }

    /// Validates and appends a note to an already-loaded project.
    pub(crate) async fn append(
        &self,
        project: &Project,
        draft: NoteDraft,
        problem_ids: impl IntoIterator<Item = ProblemId>,
    ) -> AnnotationResult<Note> {
        let steps = self.reference.steps();
        let step = steps.step_by_id(draft.step_id)?;
        if !steps.belongs_to_workflow(step.id(), project.workflow_id()) {
            return Err(WorkflowDomainError::ForeignStep {
                project_id: project.id(),
                workflow_id: project.workflow_id(),
                step_id: step.id(),
            }
            .into());
        }
        let linked: Vec<ProblemId> = problem_ids.into_iter().collect();
        if let Some(unknown) = linked
            .iter()
            .copied()
            .find(|id| self.reference.problems().get(*id).is_none())
        {
            return Err(AnnotationError::UnknownProblem(unknown));
        }

        let note = Note::new(project.id(), draft, linked, &*self.clock)?;
        self.notes.append(&note).await?;
        info!(
            project_id = %note.project_id(),
            step_id = %note.step_id(),
            note_type = note.note_type().as_str(),
            problems = note.problem_ids().len(),
            "note recorded"
        );
        Ok(note)
    }

    async fn load_project(&self, project_id: ProjectId) -> AnnotationResult<Project> {
        self.projects
            .find_by_id(project_id)
            .await?
            .ok_or(AnnotationError::ProjectNotFound(project_id))
    }

    fn entry_for(&self, note: Note) -> AnnotationResult<NoteEntry> {
        let step = self.reference.steps().step_by_id(note.step_id())?.clone();
        let problems = note
            .problem_ids()
            .iter()
            .map(|id| {
                self.reference
                    .problems()
                    .get(*id)
                    .cloned()
                    .ok_or(AnnotationError::UnknownProblem(*id))
            })
            .collect::<AnnotationResult<Vec<_>>>()?;
        debug!(note_id = %note.id(), "resolved note entry");
        Ok(NoteEntry {
            note,
            step,
            problems,
        })
    }
}
