//! Repository port for projects and their assignments.
//!
//! Each method is one durable write or read. Services compose them into
//! multi-step transitions without wrapping the sequence in a transaction.

use crate::workflow::domain::{Assignment, AssignmentId, Project, ProjectId, StepId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for project repository operations.
pub type ProjectRepositoryResult<T> = Result<T, ProjectRepositoryError>;

/// Project persistence contract.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Stores a new project together with its assignment history.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectRepositoryError::DuplicateProject`] when the project
    /// already exists.
    async fn store(&self, project: &Project) -> ProjectRepositoryResult<()>;

    /// Finds a project with its assignments ordered newest first.
    ///
    /// Returns `None` when the project does not exist.
    async fn find_by_id(&self, id: ProjectId) -> ProjectRepositoryResult<Option<Project>>;

    /// Persists the project header: current step, owner, and start and
    /// finish times.
    ///
    /// The write only applies while the stored current step still equals
    /// `expected_step_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectRepositoryError::NotFound`] when the project does not
    /// exist and [`ProjectRepositoryError::StaleProject`] when another writer
    /// moved the project first.
    async fn update_project(
        &self,
        project: &Project,
        expected_step_id: StepId,
    ) -> ProjectRepositoryResult<()>;

    /// Appends a new assignment to its project.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectRepositoryError::NotFound`] when the owning project
    /// does not exist or [`ProjectRepositoryError::DuplicateAssignment`] when
    /// the assignment id is taken.
    async fn insert_assignment(&self, assignment: &Assignment) -> ProjectRepositoryResult<()>;

    /// Persists status, owner, timestamps, and duration of an assignment.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectRepositoryError::AssignmentNotFound`] when the
    /// assignment does not exist.
    async fn update_assignment(&self, assignment: &Assignment) -> ProjectRepositoryResult<()>;
}

/// Errors returned by project repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ProjectRepositoryError {
    /// A project with the same identifier already exists.
    #[error("duplicate project identifier: {0}")]
    DuplicateProject(ProjectId),

    /// An assignment with the same identifier already exists.
    #[error("duplicate assignment identifier: {0}")]
    DuplicateAssignment(AssignmentId),

    /// The project was not found.
    #[error("project not found: {0}")]
    NotFound(ProjectId),

    /// The assignment was not found.
    #[error("assignment not found: {0}")]
    AssignmentNotFound(AssignmentId),

    /// The project moved to another step since it was loaded.
    #[error("project {project_id} expected at step {expected} but stored at step {actual}")]
    StaleProject {
        /// Project being written.
        project_id: ProjectId,
        /// Step the writer loaded.
        expected: StepId,
        /// Step currently stored.
        actual: StepId,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ProjectRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
