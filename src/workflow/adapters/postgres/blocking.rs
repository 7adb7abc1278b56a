//! Helpers for running Diesel calls off the async executor.

use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use thiserror::Error;

/// `PostgreSQL` connection pool type used by the workflow adapters.
pub type WorkflowPgPool = Pool<ConnectionManager<PgConnection>>;

/// Failure outside the query itself.
#[derive(Debug, Error)]
pub(super) enum BlockingError {
    /// No connection could be checked out.
    #[error("connection pool: {0}")]
    Pool(#[from] PoolError),
    /// The blocking task panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Runs `f` with a pooled connection on the blocking thread pool.
///
/// Pool checkout failures and join errors are converted with `map_err`.
pub(super) async fn run_blocking<F, T, E, M>(pool: &WorkflowPgPool, map_err: M, f: F) -> Result<T, E>
where
    F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    M: Fn(BlockingError) -> E + Send + Copy + 'static,
{
    let owned_pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut connection = owned_pool
            .get()
            .map_err(|err| map_err(BlockingError::from(err)))?;
        f(&mut connection)
    })
    .await
    .map_err(|err| map_err(BlockingError::from(err)))?
}
