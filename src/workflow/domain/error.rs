//! Error types for workflow domain validation and parsing.

use super::{AssignmentId, AssignmentStatus, ProjectId, StaffMemberId, StepId, WorkflowId};
use thiserror::Error;

/// Errors returned by project and assignment state changes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowDomainError {
    /// The project has no assignment to act on.
    #[error("project {0} has no active assignment")]
    NoActiveAssignment(ProjectId),

    /// The requested assignment status change is not allowed.
    #[error("invalid assignment transition for {assignment_id}: {from} -> {to}")]
    InvalidAssignmentTransition {
        /// Assignment being changed.
        assignment_id: AssignmentId,
        /// Current status.
        from: AssignmentStatus,
        /// Requested status.
        to: AssignmentStatus,
    },

    /// The project has already finished its terminal step.
    #[error("project {0} has already finished its workflow")]
    ProjectFinished(ProjectId),

    /// The staff member may not claim the current step.
    #[error("staff member {staff_member_id} cannot claim project {project_id} step {step_id}: {reason}")]
    ClaimNotPermitted {
        /// Project being claimed.
        project_id: ProjectId,
        /// Current step of the project.
        step_id: StepId,
        /// Staff member attempting the claim.
        staff_member_id: StaffMemberId,
        /// Human-readable reason.
        reason: String,
    },

    /// The project has no owner to release.
    #[error("project {0} has no owner to release")]
    NoOwner(ProjectId),

    /// A note was submitted without text.
    #[error("note text must not be empty")]
    EmptyNoteText,

    /// A note references a step from another workflow.
    #[error("step {step_id} does not belong to workflow {workflow_id} of project {project_id}")]
    ForeignStep {
        /// Project receiving the note.
        project_id: ProjectId,
        /// Workflow of the project.
        workflow_id: WorkflowId,
        /// Offending step.
        step_id: StepId,
    },
}

/// Error returned while parsing a stored enumeration value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseWorkflowValueError {
    /// Name of the enumeration being parsed.
    pub kind: &'static str,
    /// Rejected input.
    pub value: String,
}

impl ParseWorkflowValueError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Errors returned by step graph lookups and construction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StepGraphError {
    /// No step exists with the identifier.
    #[error("step {0} not found")]
    UnknownStep(StepId),

    /// Two steps share an identifier.
    #[error("step {0} is defined more than once")]
    DuplicateStep(StepId),

    /// A non-terminal step has no successor.
    #[error("step {0} is not terminal but has no next step")]
    MissingNextStep(StepId),

    /// A step has no failure-redirect step.
    #[error("step {0} has no failure step")]
    MissingFailStep(StepId),

    /// An edge points at a step that does not exist.
    #[error("step {step_id} references unknown step {target}")]
    DanglingEdge {
        /// Step owning the edge.
        step_id: StepId,
        /// Unresolved target.
        target: StepId,
    },

    /// Following successor edges from the step never reaches a terminal step.
    #[error("no terminal step is reachable from step {0}")]
    NoTerminalReachable(StepId),
}

impl StepGraphError {
    /// Returns whether the error is a plain lookup miss rather than a
    /// misconfigured graph.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::UnknownStep(_))
    }
}
