//! In-memory repository for project notes.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::workflow::{
    domain::{Note, ProjectId},
    ports::{NoteRepository, NoteRepositoryError, NoteRepositoryResult},
};

/// Thread-safe in-memory note repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNoteRepository {
    notes: Arc<RwLock<Vec<Note>>>,
}

impl InMemoryNoteRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> NoteRepositoryError {
    NoteRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl NoteRepository for InMemoryNoteRepository {
    async fn append(&self, note: &Note) -> NoteRepositoryResult<()> {
        let mut notes = self.notes.write().map_err(lock_error)?;
        if notes.iter().any(|existing| existing.id() == note.id()) {
            return Err(NoteRepositoryError::DuplicateNote(note.id()));
        }
        notes.push(note.clone());
        Ok(())
    }

    async fn list_for_project(&self, project_id: ProjectId) -> NoteRepositoryResult<Vec<Note>> {
        let notes = self.notes.read().map_err(lock_error)?;
        // Reverse insertion order first so equal timestamps list newest first.
        let mut found: Vec<Note> = notes
            .iter()
            .rev()
            .filter(|note| note.project_id() == project_id)
            .cloned()
            .collect();
        found.sort_by(|left, right| right.created_at().cmp(&left.created_at()));
        Ok(found)
    }
}
