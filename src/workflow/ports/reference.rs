//! Source of the static reference data: steps and problems.
//!
//! Reference data is read once at process start and treated as immutable
//! afterwards.

use crate::workflow::domain::{Problem, Step};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for reference data loading.
pub type ReferenceDataResult<T> = Result<T, ReferenceDataError>;

/// Reference data loading contract.
#[async_trait]
pub trait ReferenceDataSource: Send + Sync {
    /// Loads every configured step of every workflow.
    async fn load_steps(&self) -> ReferenceDataResult<Vec<Step>>;

    /// Loads the problem catalog.
    async fn load_problems(&self) -> ReferenceDataResult<Vec<Problem>>;
}

/// Errors returned while loading reference data.
#[derive(Debug, Clone, Error)]
pub enum ReferenceDataError {
    /// A stored row could not be mapped onto the domain.
    #[error("invalid reference data: {0}")]
    Invalid(String),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ReferenceDataError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
