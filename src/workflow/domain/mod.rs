//! Domain model for the project workflow progression engine.
//!
//! Entities are owned value records that reference each other by
//! identifier: a [`Project`] holds its assignment history, while steps,
//! notes, and problems are looked up by id.

mod assignment;
mod error;
mod ids;
mod note;
mod project;
mod staff;
mod step;

pub use assignment::{Assignment, AssignmentStatus, PersistedAssignmentData};
pub use error::{ParseWorkflowValueError, StepGraphError, WorkflowDomainError};
pub use ids::{AssignmentId, NoteId, ProblemId, ProjectId, StaffMemberId, StepId, WorkflowId};
pub use note::{Note, NoteDraft, NoteType, PersistedNoteData, Problem, ProblemCatalog};
pub use project::{ClaimOutcome, NewProject, PersistedProjectData, Project};
pub use staff::{Claimant, StaffRole};
pub use step::{OwnerPolicy, Step, StepDefinition, StepGraph, StepType};
