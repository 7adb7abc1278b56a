//! Project aggregate root and its assignment history.

use super::{
    Assignment, AssignmentId, AssignmentStatus, Claimant, OwnerPolicy, ProjectId, StaffMemberId,
    Step, StepId, WorkflowDomainError, WorkflowId,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Unit status value flagged by the tracking system when upstream content
/// has a defect.
const UNIT_ERROR_STATUS: &str = "error";

/// Digitization project moving through a workflow.
///
/// Assignments are ordered newest first; index 0 is the active assignment.
/// Assignments are only ever appended, never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    id: ProjectId,
    #[serde(rename = "workflowID")]
    workflow_id: WorkflowId,
    #[serde(rename = "currentStepID")]
    current_step_id: StepId,
    #[serde(rename = "ownerID")]
    owner_id: Option<StaffMemberId>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    unit_status: String,
    assignments: Vec<Assignment>,
}

/// Parameter object for creating a project at the first step of a workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    /// Project identifier issued by the tracking system.
    pub id: ProjectId,
    /// Workflow the project follows.
    pub workflow_id: WorkflowId,
    /// Step the project begins at.
    pub first_step_id: StepId,
    /// Initial owner, if already claimed.
    pub owner_id: Option<StaffMemberId>,
    /// Status of the physical unit being digitized.
    pub unit_status: String,
}

/// Parameter object for reconstructing a persisted project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedProjectData {
    /// Project identifier.
    pub id: ProjectId,
    /// Workflow the project follows.
    pub workflow_id: WorkflowId,
    /// Current step.
    pub current_step_id: StepId,
    /// Current owner.
    pub owner_id: Option<StaffMemberId>,
    /// Time work first started.
    pub started_at: Option<DateTime<Utc>>,
    /// Time the terminal step finished.
    pub finished_at: Option<DateTime<Utc>>,
    /// Status of the physical unit.
    pub unit_status: String,
    /// Assignment history, newest first.
    pub assignments: Vec<Assignment>,
}

/// Result of a successful claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The claimant already owned the active assignment.
    AlreadyOwner,
    /// The ownerless active assignment now belongs to the claimant.
    FilledVacancy(AssignmentId),
    /// The previous assignment was closed and a new one created.
    Reassigned {
        /// Assignment marked as reassigned.
        previous: AssignmentId,
        /// Newly created active assignment.
        current: AssignmentId,
    },
}

impl Project {
    /// Creates a project with a single `Assigned` assignment at its first
    /// step.
    #[must_use]
    pub fn new(data: NewProject, clock: &impl Clock) -> Self {
        let assignment = Assignment::new(data.id, data.first_step_id, data.owner_id, clock.utc());
        Self {
            id: data.id,
            workflow_id: data.workflow_id,
            current_step_id: data.first_step_id,
            owner_id: data.owner_id,
            started_at: None,
            finished_at: None,
            unit_status: data.unit_status,
            assignments: vec![assignment],
        }
    }

    /// Reconstructs a project from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedProjectData) -> Self {
        Self {
            id: data.id,
            workflow_id: data.workflow_id,
            current_step_id: data.current_step_id,
            owner_id: data.owner_id,
            started_at: data.started_at,
            finished_at: data.finished_at,
            unit_status: data.unit_status,
            assignments: data.assignments,
        }
    }

    /// Returns the project identifier.
    #[must_use]
    pub const fn id(&self) -> ProjectId {
        self.id
    }

    /// Returns the workflow identifier.
    #[must_use]
    pub const fn workflow_id(&self) -> WorkflowId {
        self.workflow_id
    }

    /// Returns the current step.
    #[must_use]
    pub const fn current_step_id(&self) -> StepId {
        self.current_step_id
    }

    /// Returns the current owner, if any.
    #[must_use]
    pub const fn owner_id(&self) -> Option<StaffMemberId> {
        self.owner_id
    }

    /// Returns the time work first started.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns the time the terminal step finished.
    #[must_use]
    pub const fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Returns the unit status reported by the tracking system.
    #[must_use]
    pub fn unit_status(&self) -> &str {
        &self.unit_status
    }

    /// Returns whether the unit is flagged with an error.
    #[must_use]
    pub fn unit_has_error(&self) -> bool {
        self.unit_status.eq_ignore_ascii_case(UNIT_ERROR_STATUS)
    }

    /// Returns whether the terminal step has finished.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Returns the assignment history, newest first.
    #[must_use]
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Returns the active (newest) assignment.
    #[must_use]
    pub fn active_assignment(&self) -> Option<&Assignment> {
        self.assignments.first()
    }

    /// Returns the staff member of the oldest assignment that had one.
    #[must_use]
    pub fn original_owner(&self) -> Option<StaffMemberId> {
        self.assignments
            .iter()
            .rev()
            .find_map(Assignment::staff_member_id)
    }

    /// Returns the staff member of the newest assignment that had one.
    #[must_use]
    pub fn prior_owner(&self) -> Option<StaffMemberId> {
        self.assignments
            .iter()
            .find_map(Assignment::staff_member_id)
    }

    /// Resolves who receives the next step under `policy`.
    #[must_use]
    pub fn next_owner(&self, policy: OwnerPolicy) -> Option<StaffMemberId> {
        match policy {
            OwnerPolicy::PriorOwner => self.owner_id,
            OwnerPolicy::OriginalOwner => self.original_owner(),
            OwnerPolicy::Unclaimed => None,
        }
    }

    fn active_mut(&mut self) -> Result<&mut Assignment, WorkflowDomainError> {
        if self.finished_at.is_some() {
            return Err(WorkflowDomainError::ProjectFinished(self.id));
        }
        let id = self.id;
        self.assignments
            .first_mut()
            .ok_or(WorkflowDomainError::NoActiveAssignment(id))
    }

    /// Starts the active assignment.
    ///
    /// The project start time is set only on the first call. The assignment
    /// start time and status are set on every call. Returns whether the
    /// project start time changed.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError`] when there is no active assignment,
    /// the project has finished, or the assignment cannot be started.
    pub fn start_active_assignment(
        &mut self,
        clock: &impl Clock,
    ) -> Result<bool, WorkflowDomainError> {
        let now = clock.utc();
        self.active_mut()?.start(now)?;
        if self.started_at.is_some() {
            return Ok(false);
        }
        self.started_at = Some(now);
        Ok(true)
    }

    /// Records working time on the active assignment.
    ///
    /// Zero minutes preserves any previously recorded duration. Returns
    /// whether the stored duration changed.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError`] when there is no active assignment or
    /// the project has finished.
    pub fn record_active_duration(&mut self, minutes: u32) -> Result<bool, WorkflowDomainError> {
        Ok(self.active_mut()?.record_duration(minutes))
    }

    /// Marks the active assignment finished.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError`] when the assignment cannot finish.
    pub fn finish_active_assignment(&mut self, clock: &impl Clock) -> Result<(), WorkflowDomainError> {
        let now = clock.utc();
        self.active_mut()?.close(AssignmentStatus::Finished, now)
    }

    /// Flags the active assignment with an error; the project stays on its
    /// current step.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError`] when the assignment cannot be flagged.
    pub fn fail_active_assignment(&mut self) -> Result<(), WorkflowDomainError> {
        self.active_mut()?.transition_to(AssignmentStatus::Error)
    }

    /// Marks the active assignment rejected.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError`] when the assignment cannot be rejected.
    pub fn reject_active_assignment(&mut self, clock: &impl Clock) -> Result<(), WorkflowDomainError> {
        let now = clock.utc();
        self.active_mut()?.close(AssignmentStatus::Rejected, now)
    }

    /// Moves the project to `step_id` owned by `owner_id` and appends a new
    /// `Assigned` assignment for the pair. Returns the new assignment's id.
    pub fn advance_to(
        &mut self,
        step_id: StepId,
        owner_id: Option<StaffMemberId>,
        clock: &impl Clock,
    ) -> AssignmentId {
        let assignment = Assignment::new(self.id, step_id, owner_id, clock.utc());
        let assignment_id = assignment.id();
        self.current_step_id = step_id;
        self.owner_id = owner_id;
        self.assignments.insert(0, assignment);
        assignment_id
    }

    /// Records that the terminal step finished.
    pub fn mark_finished(&mut self, clock: &impl Clock) {
        self.finished_at = Some(clock.utc());
    }

    /// Checks whether `claimant` may take the current step.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::ClaimNotPermitted`] when the step's
    /// owner policy names somebody else.
    pub fn check_claim(&self, step: &Step, claimant: Claimant) -> Result<(), WorkflowDomainError> {
        if claimant.role.overrides_owner_policy() {
            return Ok(());
        }
        let (required, label) = match step.owner_policy() {
            OwnerPolicy::Unclaimed => return Ok(()),
            OwnerPolicy::PriorOwner => (self.prior_owner(), "prior owner"),
            OwnerPolicy::OriginalOwner => (self.original_owner(), "original owner"),
        };
        match required {
            Some(owner) if owner != claimant.staff_member_id => {
                Err(WorkflowDomainError::ClaimNotPermitted {
                    project_id: self.id,
                    step_id: self.current_step_id,
                    staff_member_id: claimant.staff_member_id,
                    reason: format!("step requires {label} {owner}"),
                })
            }
            _ => Ok(()),
        }
    }

    /// Gives the current step to `claimant`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError`] when the claim is not permitted, the
    /// project has finished, or the active assignment cannot be reassigned.
    pub fn claim(
        &mut self,
        step: &Step,
        claimant: Claimant,
        clock: &impl Clock,
    ) -> Result<ClaimOutcome, WorkflowDomainError> {
        self.check_claim(step, claimant)?;
        let claimant_id = claimant.staff_member_id;
        let active = self.active_mut()?;

        if active.status() == AssignmentStatus::Assigned && active.staff_member_id().is_none() {
            active.set_staff_member(claimant_id);
            let filled = active.id();
            self.owner_id = Some(claimant_id);
            return Ok(ClaimOutcome::FilledVacancy(filled));
        }

        let already_owner = active.staff_member_id() == Some(claimant_id)
            && active.status() != AssignmentStatus::Reassigned;
        if already_owner {
            self.owner_id = Some(claimant_id);
            return Ok(ClaimOutcome::AlreadyOwner);
        }

        if active.status() != AssignmentStatus::Reassigned {
            active.transition_to(AssignmentStatus::Reassigned)?;
        }
        let previous = active.id();
        let current_step = self.current_step_id;
        let current = self.advance_to(current_step, Some(claimant_id), clock);
        Ok(ClaimOutcome::Reassigned { previous, current })
    }

    /// Cancels the current owner's assignment and leaves the step ownerless.
    ///
    /// Returns the released owner.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::NoOwner`] when nobody owns the project
    /// or a transition error when the active assignment is already closed.
    pub fn release(&mut self) -> Result<StaffMemberId, WorkflowDomainError> {
        let owner = self.owner_id.ok_or(WorkflowDomainError::NoOwner(self.id))?;
        self.active_mut()?
            .transition_to(AssignmentStatus::Reassigned)?;
        self.owner_id = None;
        Ok(owner)
    }
}
