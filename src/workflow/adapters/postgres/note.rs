//! `PostgreSQL` repository for notes and their problem links.

use super::{
    blocking::{WorkflowPgPool, run_blocking},
    models::{NewNoteRow, NoteProblemRow, NoteRow, db_id, domain_id},
    schema::{notes, notes_problems},
};
use crate::workflow::{
    domain::{Note, ProblemId, ProjectId},
    ports::{NoteRepository, NoteRepositoryError, NoteRepositoryResult},
};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::collections::HashMap;
use uuid::Uuid;

/// `PostgreSQL`-backed note repository.
#[derive(Debug, Clone)]
pub struct PostgresNoteRepository {
    pool: WorkflowPgPool,
}

impl PostgresNoteRepository {
    /// Creates a repository from a connection pool.
    #[must_use]
    pub const fn new(pool: WorkflowPgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteRepository for PostgresNoteRepository {
    async fn append(&self, note: &Note) -> NoteRepositoryResult<()> {
        let note_id = note.id();
        let row = NewNoteRow::from_note(note).map_err(NoteRepositoryError::persistence)?;
        let links = NoteProblemRow::for_note(note).map_err(NoteRepositoryError::persistence)?;

        run_blocking(&self.pool, NoteRepositoryError::persistence, move |connection| {
            connection
                .transaction::<_, DieselError, _>(|tx| {
                    diesel::insert_into(notes::table).values(&row).execute(tx)?;
                    if !links.is_empty() {
                        diesel::insert_into(notes_problems::table)
                            .values(&links)
                            .execute(tx)?;
                    }
                    Ok(())
                })
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        NoteRepositoryError::DuplicateNote(note_id)
                    }
                    _ => NoteRepositoryError::persistence(err),
                })
        })
        .await
    }

    async fn list_for_project(&self, project_id: ProjectId) -> NoteRepositoryResult<Vec<Note>> {
        let key = db_id(project_id.value()).map_err(NoteRepositoryError::persistence)?;
        run_blocking(&self.pool, NoteRepositoryError::persistence, move |connection| {
            let rows = notes::table
                .filter(notes::project_id.eq(key))
                .order((notes::created_at.desc(), notes::sequence.desc()))
                .select(NoteRow::as_select())
                .load::<NoteRow>(connection)
                .map_err(NoteRepositoryError::persistence)?;
            let note_ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
            let link_rows = notes_problems::table
                .filter(notes_problems::note_id.eq_any(note_ids))
                .order((notes_problems::note_id, notes_problems::position))
                .select(NoteProblemRow::as_select())
                .load::<NoteProblemRow>(connection)
                .map_err(NoteRepositoryError::persistence)?;

            let mut links: HashMap<Uuid, Vec<ProblemId>> = HashMap::new();
            for link in link_rows {
                let problem_id = domain_id(link.problem_id).map_err(NoteRepositoryError::persistence)?;
                links
                    .entry(link.note_id)
                    .or_default()
                    .push(ProblemId::new(problem_id));
            }

            rows.into_iter()
                .map(|row| {
                    let problem_ids = links.remove(&row.id).unwrap_or_default();
                    row.into_note(problem_ids)
                        .map_err(NoteRepositoryError::persistence)
                })
                .collect()
        })
        .await
    }
}
