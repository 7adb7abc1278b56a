//! `PostgreSQL` source of steps and problems.

use super::{
    blocking::{WorkflowPgPool, run_blocking},
    models::{ProblemRow, StepRow},
    schema::{problems, steps},
};
use crate::workflow::{
    domain::{Problem, Step},
    ports::{ReferenceDataError, ReferenceDataResult, ReferenceDataSource},
};
use async_trait::async_trait;
use diesel::prelude::*;

/// Reads reference data from the `steps` and `problems` tables.
#[derive(Debug, Clone)]
pub struct PostgresReferenceData {
    pool: WorkflowPgPool,
}

impl PostgresReferenceData {
    /// Creates a source from a connection pool.
    #[must_use]
    pub const fn new(pool: WorkflowPgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferenceDataSource for PostgresReferenceData {
    async fn load_steps(&self) -> ReferenceDataResult<Vec<Step>> {
        run_blocking(&self.pool, ReferenceDataError::persistence, |connection| {
            steps::table
                .order(steps::id)
                .select(StepRow::as_select())
                .load::<StepRow>(connection)
                .map_err(ReferenceDataError::persistence)?
                .into_iter()
                .map(|row| {
                    row.into_step()
                        .map_err(|err| ReferenceDataError::Invalid(err.to_string()))
                })
                .collect()
        })
        .await
    }

    async fn load_problems(&self) -> ReferenceDataResult<Vec<Problem>> {
        run_blocking(&self.pool, ReferenceDataError::persistence, |connection| {
            problems::table
                .order(problems::id)
                .select(ProblemRow::as_select())
                .load::<ProblemRow>(connection)
                .map_err(ReferenceDataError::persistence)?
                .into_iter()
                .map(|row| {
                    row.into_problem()
                        .map_err(|err| ReferenceDataError::Invalid(err.to_string()))
                })
                .collect()
        })
        .await
    }
}
