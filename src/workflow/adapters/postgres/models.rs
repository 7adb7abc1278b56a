//! Diesel row models and their mapping onto domain records.

use super::schema::{assignments, notes, notes_problems, problems, projects, steps};
use crate::workflow::domain::{
    Assignment, AssignmentId, AssignmentStatus, Note, NoteId, NoteType, OwnerPolicy,
    ParseWorkflowValueError, PersistedAssignmentData, PersistedNoteData, PersistedProjectData,
    Problem, ProblemId, Project, ProjectId, StaffMemberId, Step, StepDefinition, StepId, StepType,
    WorkflowId,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::num::TryFromIntError;
use thiserror::Error;
use uuid::Uuid;

/// A stored value could not be mapped onto the domain or back.
#[derive(Debug, Error)]
pub(super) enum RowConversionError {
    /// A numeric column is outside the domain range.
    #[error("value out of range: {0}")]
    Range(#[from] TryFromIntError),
    /// An enumeration column holds an unknown value.
    #[error(transparent)]
    Value(#[from] ParseWorkflowValueError),
}

type ConversionResult<T> = Result<T, RowConversionError>;

pub(super) fn db_id(value: u64) -> ConversionResult<i64> {
    Ok(i64::try_from(value)?)
}

fn optional_db_id(value: Option<u64>) -> ConversionResult<Option<i64>> {
    value.map(db_id).transpose()
}

pub(super) fn domain_id(value: i64) -> ConversionResult<u64> {
    Ok(u64::try_from(value)?)
}

fn optional_domain_id(value: Option<i64>) -> ConversionResult<Option<u64>> {
    value.map(domain_id).transpose()
}

/// Query result row for steps.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = steps)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(super) struct StepRow {
    pub id: i64,
    pub workflow_id: i64,
    pub name: String,
    pub step_type: String,
    pub next_step_id: Option<i64>,
    pub fail_step_id: Option<i64>,
    pub owner_type: String,
}

impl StepRow {
    pub(super) fn into_step(self) -> ConversionResult<Step> {
        Ok(Step::new(StepDefinition {
            id: StepId::new(domain_id(self.id)?),
            workflow_id: WorkflowId::new(domain_id(self.workflow_id)?),
            name: self.name,
            step_type: StepType::try_from(self.step_type.as_str())?,
            next_step_id: optional_domain_id(self.next_step_id)?.map(StepId::new),
            fail_step_id: optional_domain_id(self.fail_step_id)?.map(StepId::new),
            owner_policy: OwnerPolicy::try_from(self.owner_type.as_str())?,
        }))
    }
}

/// Query result row for problems.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = problems)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(super) struct ProblemRow {
    pub id: i64,
    pub name: String,
    pub label: String,
}

impl ProblemRow {
    pub(super) fn into_problem(self) -> ConversionResult<Problem> {
        Ok(Problem::new(
            ProblemId::new(domain_id(self.id)?),
            self.name,
            self.label,
        ))
    }
}

/// Project header row, used for reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(super) struct ProjectRow {
    pub id: i64,
    pub workflow_id: i64,
    pub current_step_id: i64,
    pub owner_id: Option<i64>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub unit_status: String,
}

impl ProjectRow {
    pub(super) fn from_project(project: &Project) -> ConversionResult<Self> {
        Ok(Self {
            id: db_id(project.id().value())?,
            workflow_id: db_id(project.workflow_id().value())?,
            current_step_id: db_id(project.current_step_id().value())?,
            owner_id: optional_db_id(project.owner_id().map(StaffMemberId::value))?,
            started_at: project.started_at(),
            finished_at: project.finished_at(),
            unit_status: project.unit_status().to_owned(),
        })
    }

    pub(super) fn into_project(self, assignments: Vec<Assignment>) -> ConversionResult<Project> {
        Ok(Project::from_persisted(PersistedProjectData {
            id: ProjectId::new(domain_id(self.id)?),
            workflow_id: WorkflowId::new(domain_id(self.workflow_id)?),
            current_step_id: StepId::new(domain_id(self.current_step_id)?),
            owner_id: optional_domain_id(self.owner_id)?.map(StaffMemberId::new),
            started_at: self.started_at,
            finished_at: self.finished_at,
            unit_status: self.unit_status,
            assignments,
        }))
    }
}

/// Mutable project header columns.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = projects)]
#[diesel(treat_none_as_null = true)]
pub(super) struct ProjectHeaderChangeset {
    pub current_step_id: i64,
    pub owner_id: Option<i64>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ProjectHeaderChangeset {
    pub(super) fn from_project(project: &Project) -> ConversionResult<Self> {
        Ok(Self {
            current_step_id: db_id(project.current_step_id().value())?,
            owner_id: optional_db_id(project.owner_id().map(StaffMemberId::value))?,
            started_at: project.started_at(),
            finished_at: project.finished_at(),
        })
    }
}

/// Query result row for assignments.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = assignments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(super) struct AssignmentRow {
    pub id: Uuid,
    pub project_id: i64,
    pub step_id: i64,
    pub staff_member_id: Option<i64>,
    pub status: String,
    pub assigned_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_minutes: i32,
}

impl AssignmentRow {
    pub(super) fn into_assignment(self) -> ConversionResult<Assignment> {
        Ok(Assignment::from_persisted(PersistedAssignmentData {
            id: AssignmentId::from_uuid(self.id),
            project_id: ProjectId::new(domain_id(self.project_id)?),
            step_id: StepId::new(domain_id(self.step_id)?),
            staff_member_id: optional_domain_id(self.staff_member_id)?.map(StaffMemberId::new),
            status: AssignmentStatus::try_from(self.status.as_str())?,
            assigned_at: self.assigned_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
            duration_minutes: u32::try_from(self.duration_minutes)?,
        }))
    }
}

/// Insert model for assignments; the sequence is generated.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = assignments)]
pub(super) struct NewAssignmentRow {
    pub id: Uuid,
    pub project_id: i64,
    pub step_id: i64,
    pub staff_member_id: Option<i64>,
    pub status: String,
    pub assigned_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_minutes: i32,
}

impl NewAssignmentRow {
    pub(super) fn from_assignment(assignment: &Assignment) -> ConversionResult<Self> {
        Ok(Self {
            id: assignment.id().into_inner(),
            project_id: db_id(assignment.project_id().value())?,
            step_id: db_id(assignment.step_id().value())?,
            staff_member_id: optional_db_id(
                assignment.staff_member_id().map(StaffMemberId::value),
            )?,
            status: assignment.status().as_str().to_owned(),
            assigned_at: assignment.assigned_at(),
            started_at: assignment.started_at(),
            finished_at: assignment.finished_at(),
            duration_minutes: i32::try_from(assignment.duration_minutes())?,
        })
    }
}

/// Mutable assignment columns.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = assignments)]
#[diesel(treat_none_as_null = true)]
pub(super) struct AssignmentChangeset {
    pub staff_member_id: Option<i64>,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_minutes: i32,
}

impl AssignmentChangeset {
    pub(super) fn from_assignment(assignment: &Assignment) -> ConversionResult<Self> {
        Ok(Self {
            staff_member_id: optional_db_id(
                assignment.staff_member_id().map(StaffMemberId::value),
            )?,
            status: assignment.status().as_str().to_owned(),
            started_at: assignment.started_at(),
            finished_at: assignment.finished_at(),
            duration_minutes: i32::try_from(assignment.duration_minutes())?,
        })
    }
}

/// Query result row for notes.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = notes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(super) struct NoteRow {
    pub id: Uuid,
    pub project_id: i64,
    pub step_id: i64,
    pub staff_member_id: Option<i64>,
    pub note_type: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl NoteRow {
    pub(super) fn into_note(self, problem_ids: Vec<ProblemId>) -> ConversionResult<Note> {
        Ok(Note::from_persisted(PersistedNoteData {
            id: NoteId::from_uuid(self.id),
            project_id: ProjectId::new(domain_id(self.project_id)?),
            step_id: StepId::new(domain_id(self.step_id)?),
            staff_member_id: optional_domain_id(self.staff_member_id)?.map(StaffMemberId::new),
            note_type: NoteType::try_from(self.note_type.as_str())?,
            text: self.text,
            created_at: self.created_at,
            problem_ids,
        }))
    }
}

/// Insert model for notes; the sequence is generated.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notes)]
pub(super) struct NewNoteRow {
    pub id: Uuid,
    pub project_id: i64,
    pub step_id: i64,
    pub staff_member_id: Option<i64>,
    pub note_type: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl NewNoteRow {
    pub(super) fn from_note(note: &Note) -> ConversionResult<Self> {
        Ok(Self {
            id: note.id().into_inner(),
            project_id: db_id(note.project_id().value())?,
            step_id: db_id(note.step_id().value())?,
            staff_member_id: optional_db_id(note.staff_member_id().map(StaffMemberId::value))?,
            note_type: note.note_type().as_str().to_owned(),
            text: note.text().to_owned(),
            created_at: note.created_at(),
        })
    }
}

/// Note-to-problem link row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = notes_problems)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(super) struct NoteProblemRow {
    pub note_id: Uuid,
    pub problem_id: i64,
    pub position: i32,
}

impl NoteProblemRow {
    pub(super) fn for_note(note: &Note) -> ConversionResult<Vec<Self>> {
        note.problem_ids()
            .iter()
            .enumerate()
            .map(|(position, problem_id)| {
                Ok(Self {
                    note_id: note.id().into_inner(),
                    problem_id: db_id(problem_id.value())?,
                    position: i32::try_from(position)?,
                })
            })
            .collect()
    }
}
