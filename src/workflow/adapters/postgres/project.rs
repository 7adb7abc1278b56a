//! `PostgreSQL` repository for projects and assignments.

use super::{
    blocking::{WorkflowPgPool, run_blocking},
    models::{
        AssignmentChangeset, AssignmentRow, NewAssignmentRow, ProjectHeaderChangeset, ProjectRow,
        db_id, domain_id,
    },
    schema::{assignments, projects},
};
use crate::workflow::{
    domain::{Assignment, Project, ProjectId, StepId},
    ports::{ProjectRepository, ProjectRepositoryError, ProjectRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed project repository.
#[derive(Debug, Clone)]
pub struct PostgresProjectRepository {
    pool: WorkflowPgPool,
}

impl PostgresProjectRepository {
    /// Creates a repository from a connection pool.
    #[must_use]
    pub const fn new(pool: WorkflowPgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectRepository for PostgresProjectRepository {
    async fn store(&self, project: &Project) -> ProjectRepositoryResult<()> {
        let project_id = project.id();
        let header = ProjectRow::from_project(project).map_err(ProjectRepositoryError::persistence)?;
        // Oldest first so the generated sequence follows history order.
        let history = project
            .assignments()
            .iter()
            .rev()
            .map(NewAssignmentRow::from_assignment)
            .collect::<Result<Vec<_>, _>>()
            .map_err(ProjectRepositoryError::persistence)?;

        run_blocking(&self.pool, ProjectRepositoryError::persistence, move |connection| {
            connection
                .transaction::<_, DieselError, _>(|tx| {
                    diesel::insert_into(projects::table)
                        .values(&header)
                        .execute(tx)?;
                    diesel::insert_into(assignments::table)
                        .values(&history)
                        .execute(tx)?;
                    Ok(())
                })
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        ProjectRepositoryError::DuplicateProject(project_id)
                    }
                    _ => ProjectRepositoryError::persistence(err),
                })
        })
        .await
    }

    async fn find_by_id(&self, id: ProjectId) -> ProjectRepositoryResult<Option<Project>> {
        let key = db_id(id.value()).map_err(ProjectRepositoryError::persistence)?;
        run_blocking(&self.pool, ProjectRepositoryError::persistence, move |connection| {
            let Some(header) = projects::table
                .filter(projects::id.eq(key))
                .select(ProjectRow::as_select())
                .first::<ProjectRow>(connection)
                .optional()
                .map_err(ProjectRepositoryError::persistence)?
            else {
                return Ok(None);
            };
            let rows = assignments::table
                .filter(assignments::project_id.eq(key))
                .order(assignments::sequence.desc())
                .select(AssignmentRow::as_select())
                .load::<AssignmentRow>(connection)
                .map_err(ProjectRepositoryError::persistence)?;
            let history = rows
                .into_iter()
                .map(AssignmentRow::into_assignment)
                .collect::<Result<Vec<_>, _>>()
                .map_err(ProjectRepositoryError::persistence)?;
            header
                .into_project(history)
                .map(Some)
                .map_err(ProjectRepositoryError::persistence)
        })
        .await
    }

    async fn update_project(
        &self,
        project: &Project,
        expected_step_id: StepId,
    ) -> ProjectRepositoryResult<()> {
        let project_id = project.id();
        let key = db_id(project_id.value()).map_err(ProjectRepositoryError::persistence)?;
        let expected = db_id(expected_step_id.value()).map_err(ProjectRepositoryError::persistence)?;
        let changes =
            ProjectHeaderChangeset::from_project(project).map_err(ProjectRepositoryError::persistence)?;

        run_blocking(&self.pool, ProjectRepositoryError::persistence, move |connection| {
            let updated = diesel::update(
                projects::table
                    .filter(projects::id.eq(key))
                    .filter(projects::current_step_id.eq(expected)),
            )
            .set(&changes)
            .execute(connection)
            .map_err(ProjectRepositoryError::persistence)?;
            if updated > 0 {
                return Ok(());
            }
            match stored_step(connection, key)? {
                None => Err(ProjectRepositoryError::NotFound(project_id)),
                Some(actual) => Err(ProjectRepositoryError::StaleProject {
                    project_id,
                    expected: expected_step_id,
                    actual,
                }),
            }
        })
        .await
    }

    async fn insert_assignment(&self, assignment: &Assignment) -> ProjectRepositoryResult<()> {
        let project_id = assignment.project_id();
        let assignment_id = assignment.id();
        let row =
            NewAssignmentRow::from_assignment(assignment).map_err(ProjectRepositoryError::persistence)?;

        run_blocking(&self.pool, ProjectRepositoryError::persistence, move |connection| {
            diesel::insert_into(assignments::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        ProjectRepositoryError::DuplicateAssignment(assignment_id)
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        ProjectRepositoryError::NotFound(project_id)
                    }
                    _ => ProjectRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update_assignment(&self, assignment: &Assignment) -> ProjectRepositoryResult<()> {
        let assignment_id = assignment.id();
        let changes =
            AssignmentChangeset::from_assignment(assignment).map_err(ProjectRepositoryError::persistence)?;

        run_blocking(&self.pool, ProjectRepositoryError::persistence, move |connection| {
            let updated = diesel::update(
                assignments::table.filter(assignments::id.eq(assignment_id.into_inner())),
            )
            .set(&changes)
            .execute(connection)
            .map_err(ProjectRepositoryError::persistence)?;
            if updated == 0 {
                return Err(ProjectRepositoryError::AssignmentNotFound(assignment_id));
            }
            Ok(())
        })
        .await
    }
}

fn stored_step(connection: &mut PgConnection, key: i64) -> ProjectRepositoryResult<Option<StepId>> {
    let stored = projects::table
        .filter(projects::id.eq(key))
        .select(projects::current_step_id)
        .first::<i64>(connection)
        .optional()
        .map_err(ProjectRepositoryError::persistence)?;
    stored
        .map(|value| domain_id(value).map(StepId::new))
        .transpose()
        .map_err(ProjectRepositoryError::persistence)
}
