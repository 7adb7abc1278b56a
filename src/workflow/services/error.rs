//! Classification of service errors for callers.

use crate::workflow::{
    domain::{StepGraphError, WorkflowDomainError},
    ports::{NoteRepositoryError, ProjectRepositoryError},
};
use std::fmt;

/// Coarse error category used by callers to decide how to respond.
///
/// No category is retried by this crate; retry policy belongs to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An unknown project, step, or problem identifier.
    NotFound,
    /// Malformed input or a request the current state does not allow.
    /// Rejected before any write.
    Validation,
    /// Storage read or write failure. Earlier writes of the operation may
    /// have persisted.
    Persistence,
    /// The step graph lacks a required edge.
    GraphMisconfiguration,
    /// Another writer changed the project concurrently.
    Conflict,
}

impl ErrorKind {
    /// Returns a short lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Validation => "validation",
            Self::Persistence => "persistence",
            Self::GraphMisconfiguration => "graph_misconfiguration",
            Self::Conflict => "conflict",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) const fn domain_kind(_err: &WorkflowDomainError) -> ErrorKind {
    ErrorKind::Validation
}

pub(crate) const fn graph_kind(err: &StepGraphError) -> ErrorKind {
    if err.is_not_found() {
        ErrorKind::NotFound
    } else {
        ErrorKind::GraphMisconfiguration
    }
}

pub(crate) const fn project_repository_kind(err: &ProjectRepositoryError) -> ErrorKind {
    match err {
        ProjectRepositoryError::NotFound(_) | ProjectRepositoryError::AssignmentNotFound(_) => {
            ErrorKind::NotFound
        }
        ProjectRepositoryError::StaleProject { .. } => ErrorKind::Conflict,
        ProjectRepositoryError::DuplicateProject(_)
        | ProjectRepositoryError::DuplicateAssignment(_)
        | ProjectRepositoryError::Persistence(_) => ErrorKind::Persistence,
    }
}

pub(crate) const fn note_repository_kind(_err: &NoteRepositoryError) -> ErrorKind {
    ErrorKind::Persistence
}
