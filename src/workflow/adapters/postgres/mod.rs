//! `PostgreSQL` adapters for workflow persistence.
//!
//! Queries run on the blocking thread pool through an r2d2 pool of Diesel
//! connections. The schema is created by the SQL migrations under
//! `migrations/`.

mod blocking;
mod models;
mod note;
mod project;
mod reference;
mod schema;

pub use blocking::WorkflowPgPool;
pub use note::PostgresNoteRepository;
pub use project::PostgresProjectRepository;
pub use reference::PostgresReferenceData;
