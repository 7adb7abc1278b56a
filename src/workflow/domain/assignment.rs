//! Assignment records and their status state machine.

use super::{
    AssignmentId, ParseWorkflowValueError, ProjectId, StaffMemberId, StepId, WorkflowDomainError,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Progress of one assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// Waiting for the owner to begin.
    Assigned,
    /// Work is in progress.
    Started,
    /// Work completed and the project moved on.
    Finished,
    /// Work stopped on a recorded problem.
    Error,
    /// Work was sent back to the failure step.
    Rejected,
    /// Ownership passed to somebody else before the work finished.
    Reassigned,
}

impl AssignmentStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::Started => "started",
            Self::Finished => "finished",
            Self::Error => "error",
            Self::Rejected => "rejected",
            Self::Reassigned => "reassigned",
        }
    }

    /// Returns whether transition to `target` is allowed.
    ///
    /// Restarting a started assignment and re-flagging an errored one are
    /// permitted so that both operations stay idempotent.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (
                Self::Assigned,
                Self::Started | Self::Error | Self::Reassigned
            ) | (
                Self::Started,
                Self::Started | Self::Finished | Self::Error | Self::Rejected | Self::Reassigned
            ) | (
                Self::Error,
                Self::Started | Self::Finished | Self::Error | Self::Reassigned
            )
        )
    }

    /// Returns whether no further transitions are possible.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Finished | Self::Rejected | Self::Reassigned)
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for AssignmentStatus {
    type Error = ParseWorkflowValueError;

    fn try_from(value: &str) -> Result<Self, ParseWorkflowValueError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "assigned" => Ok(Self::Assigned),
            "started" => Ok(Self::Started),
            "finished" => Ok(Self::Finished),
            "error" => Ok(Self::Error),
            "rejected" => Ok(Self::Rejected),
            "reassigned" => Ok(Self::Reassigned),
            _ => Err(ParseWorkflowValueError::new("assignment status", value)),
        }
    }
}

/// One staff member performing one step on one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    id: AssignmentId,
    #[serde(rename = "projectID")]
    project_id: ProjectId,
    #[serde(rename = "stepID")]
    step_id: StepId,
    #[serde(rename = "staffMemberID")]
    staff_member_id: Option<StaffMemberId>,
    status: AssignmentStatus,
    assigned_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    duration_minutes: u32,
}

/// Parameter object for reconstructing a persisted assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedAssignmentData {
    /// Assignment identifier.
    pub id: AssignmentId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Step being worked.
    pub step_id: StepId,
    /// Staff member doing the work, if claimed.
    pub staff_member_id: Option<StaffMemberId>,
    /// Current status.
    pub status: AssignmentStatus,
    /// Creation timestamp.
    pub assigned_at: DateTime<Utc>,
    /// Latest start timestamp.
    pub started_at: Option<DateTime<Utc>>,
    /// Finish timestamp.
    pub finished_at: Option<DateTime<Utc>>,
    /// Recorded working time in minutes.
    pub duration_minutes: u32,
}

impl Assignment {
    /// Creates a new `Assigned` record.
    #[must_use]
    pub fn new(
        project_id: ProjectId,
        step_id: StepId,
        staff_member_id: Option<StaffMemberId>,
        assigned_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AssignmentId::new(),
            project_id,
            step_id,
            staff_member_id,
            status: AssignmentStatus::Assigned,
            assigned_at,
            started_at: None,
            finished_at: None,
            duration_minutes: 0,
        }
    }

    /// Reconstructs an assignment from persisted storage.
    #[must_use]
    pub const fn from_persisted(data: PersistedAssignmentData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            step_id: data.step_id,
            staff_member_id: data.staff_member_id,
            status: data.status,
            assigned_at: data.assigned_at,
            started_at: data.started_at,
            finished_at: data.finished_at,
            duration_minutes: data.duration_minutes,
        }
    }

    /// Returns the assignment identifier.
    #[must_use]
    pub const fn id(&self) -> AssignmentId {
        self.id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the step being worked.
    #[must_use]
    pub const fn step_id(&self) -> StepId {
        self.step_id
    }

    /// Returns the assigned staff member, if any.
    #[must_use]
    pub const fn staff_member_id(&self) -> Option<StaffMemberId> {
        self.staff_member_id
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> AssignmentStatus {
        self.status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn assigned_at(&self) -> DateTime<Utc> {
        self.assigned_at
    }

    /// Returns the latest start timestamp.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns the finish timestamp.
    #[must_use]
    pub const fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Returns the recorded duration in minutes.
    #[must_use]
    pub const fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    pub(super) fn transition_to(
        &mut self,
        target: AssignmentStatus,
    ) -> Result<(), WorkflowDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(WorkflowDomainError::InvalidAssignmentTransition {
                assignment_id: self.id,
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        Ok(())
    }

    pub(super) fn start(&mut self, now: DateTime<Utc>) -> Result<(), WorkflowDomainError> {
        self.transition_to(AssignmentStatus::Started)?;
        self.started_at = Some(now);
        Ok(())
    }

    pub(super) fn close(
        &mut self,
        status: AssignmentStatus,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowDomainError> {
        self.transition_to(status)?;
        self.finished_at = Some(now);
        Ok(())
    }

    /// Stores a non-zero duration; zero leaves the previous value in place.
    pub(super) const fn record_duration(&mut self, minutes: u32) -> bool {
        if minutes == 0 {
            return false;
        }
        self.duration_minutes = minutes;
        true
    }

    pub(super) const fn set_staff_member(&mut self, staff_member_id: StaffMemberId) {
        self.staff_member_id = Some(staff_member_id);
    }
}
