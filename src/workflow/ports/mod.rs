//! Port contracts for the workflow engine.
//!
//! Ports define infrastructure-agnostic interfaces used by workflow services.

pub mod completion;
pub mod note;
pub mod project;
pub mod reference;

pub use completion::{CompletionRejection, StepCompletion};
pub use note::{NoteRepository, NoteRepositoryError, NoteRepositoryResult};
pub use project::{ProjectRepository, ProjectRepositoryError, ProjectRepositoryResult};
pub use reference::{ReferenceDataError, ReferenceDataResult, ReferenceDataSource};
