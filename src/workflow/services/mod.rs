//! Application services orchestrating workflow progression.

mod annotation;
mod error;
mod locks;
mod ownership;
mod reference;
mod tracker;
mod transition;

pub use annotation::{AnnotationError, AnnotationResult, AnnotationService, NoteEntry};
pub use error::ErrorKind;
pub use locks::{ProjectGuard, ProjectLocks};
pub use ownership::{ClaimedStep, OwnershipError, OwnershipResult, OwnershipService, ReleasedStep};
pub use reference::{ReferenceLoadError, WorkflowReference};
pub use tracker::AssignmentTracker;
pub use transition::{
    FailedStep, FinishOutcome, StepFailure, StepResult, TransitionEngine, TransitionError,
    TransitionResult,
};
