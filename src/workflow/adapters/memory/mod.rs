//! In-memory adapter implementations.
//!
//! These adapters are thread-safe and keep projects, assignments, and notes
//! as separate records so that each port call behaves like an independent
//! durable write.

mod completion;
mod note;
mod project;
mod reference;

pub use completion::{AcceptingStepCompletion, RejectingStepCompletion};
pub use note::InMemoryNoteRepository;
pub use project::InMemoryProjectRepository;
pub use reference::InMemoryReferenceData;
