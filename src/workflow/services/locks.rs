//! Per-project critical sections.
//!
//! Transitions on one project must not interleave: two concurrent finishes
//! could otherwise leave the current step and the active assignment out of
//! step with each other. Services hold the project's lock for the whole
//! read-modify-write sequence. Repositories additionally reject header
//! writes whose expected current step is stale, which covers writers in
//! other processes.

use crate::workflow::domain::ProjectId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of per-project async mutexes.
#[derive(Debug, Default)]
pub struct ProjectLocks {
    locks: Mutex<HashMap<ProjectId, Arc<AsyncMutex<()>>>>,
}

/// Guard held while a project transition runs.
#[derive(Debug)]
pub struct ProjectGuard {
    _guard: OwnedMutexGuard<()>,
}

impl ProjectLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `project_id`.
    pub async fn lock(&self, project_id: ProjectId) -> ProjectGuard {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop entries nobody is holding or waiting on.
            locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
            Arc::clone(locks.entry(project_id).or_default())
        };
        ProjectGuard {
            _guard: mutex.lock_owned().await,
        }
    }
}
