//! Repository port for project notes and their problem links.

use crate::workflow::domain::{Note, NoteId, ProjectId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for note repository operations.
pub type NoteRepositoryResult<T> = Result<T, NoteRepositoryError>;

/// Note persistence contract.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Stores a note and one note-to-problem link per linked problem.
    ///
    /// # Errors
    ///
    /// Returns [`NoteRepositoryError::DuplicateNote`] when the note id is
    /// taken.
    async fn append(&self, note: &Note) -> NoteRepositoryResult<()>;

    /// Returns every note of the project ordered by creation time, newest
    /// first.
    async fn list_for_project(&self, project_id: ProjectId) -> NoteRepositoryResult<Vec<Note>>;
}

/// Errors returned by note repository implementations.
#[derive(Debug, Clone, Error)]
pub enum NoteRepositoryError {
    /// A note with the same identifier already exists.
    #[error("duplicate note identifier: {0}")]
    DuplicateNote(NoteId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl NoteRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
