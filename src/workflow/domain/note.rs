//! Project notes and the problem catalog.

use super::{
    NoteId, ParseWorkflowValueError, ProblemId, ProjectId, StaffMemberId, StepId,
    WorkflowDomainError,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of a project note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteType {
    /// General commentary.
    Comment,
    /// Suggested improvement.
    Suggestion,
    /// Defect report; written automatically when a step fails.
    Problem,
    /// Remark about the physical item's condition.
    ItemCondition,
}

impl NoteType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::Suggestion => "suggestion",
            Self::Problem => "problem",
            Self::ItemCondition => "item_condition",
        }
    }
}

impl TryFrom<&str> for NoteType {
    type Error = ParseWorkflowValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "comment" => Ok(Self::Comment),
            "suggestion" => Ok(Self::Suggestion),
            "problem" => Ok(Self::Problem),
            "item_condition" => Ok(Self::ItemCondition),
            _ => Err(ParseWorkflowValueError::new("note type", value)),
        }
    }
}

/// Catalogued defect tag attachable to notes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Problem {
    id: ProblemId,
    name: String,
    label: String,
}

impl Problem {
    /// Creates a catalog entry.
    #[must_use]
    pub fn new(id: ProblemId, name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            label: label.into(),
        }
    }

    /// Returns the reserved "other" entry.
    #[must_use]
    pub fn other() -> Self {
        Self::new(ProblemId::OTHER, "other", "Other")
    }

    /// Returns the problem identifier.
    #[must_use]
    pub const fn id(&self) -> ProblemId {
        self.id
    }

    /// Returns the machine name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    fn matches(&self, query: &str) -> bool {
        self.name.eq_ignore_ascii_case(query) || self.label.eq_ignore_ascii_case(query)
    }
}

/// Static catalog of problems.
///
/// Always contains the reserved [`ProblemId::OTHER`] entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemCatalog {
    problems: BTreeMap<ProblemId, Problem>,
    other: Problem,
}

impl ProblemCatalog {
    /// Builds a catalog, adding the reserved "other" entry when missing.
    #[must_use]
    pub fn new(problems: impl IntoIterator<Item = Problem>) -> Self {
        let mut by_id: BTreeMap<ProblemId, Problem> = problems
            .into_iter()
            .map(|problem| (problem.id, problem))
            .collect();
        let other = by_id
            .entry(ProblemId::OTHER)
            .or_insert_with(Problem::other)
            .clone();
        Self {
            problems: by_id,
            other,
        }
    }

    /// Looks up a problem by identifier.
    #[must_use]
    pub fn get(&self, id: ProblemId) -> Option<&Problem> {
        self.problems.get(&id)
    }

    /// Finds a problem by name or label, ignoring ASCII case.
    #[must_use]
    pub fn find_by_name(&self, query: &str) -> Option<&Problem> {
        let trimmed = query.trim();
        self.problems.values().find(|problem| problem.matches(trimmed))
    }

    /// Finds a problem by name, falling back to the reserved "other" entry.
    #[must_use]
    pub fn resolve_or_other(&self, query: &str) -> &Problem {
        self.find_by_name(query).unwrap_or_else(|| self.other())
    }

    /// Returns the reserved "other" entry.
    #[must_use]
    pub const fn other(&self) -> &Problem {
        &self.other
    }

    /// Returns every problem ordered by identifier.
    pub fn iter(&self) -> impl Iterator<Item = &Problem> {
        self.problems.values()
    }
}

impl Default for ProblemCatalog {
    fn default() -> Self {
        Self::new([])
    }
}

/// Human commentary recorded against a project step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    id: NoteId,
    #[serde(rename = "projectID")]
    project_id: ProjectId,
    #[serde(rename = "stepID")]
    step_id: StepId,
    #[serde(rename = "staffMemberID")]
    staff_member_id: Option<StaffMemberId>,
    note_type: NoteType,
    text: String,
    created_at: DateTime<Utc>,
    #[serde(rename = "problemIDs")]
    problem_ids: Vec<ProblemId>,
}

/// Caller-supplied content of a new note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    /// Step the note is recorded against.
    pub step_id: StepId,
    /// Author; `None` for notes written by the system.
    pub staff_member_id: Option<StaffMemberId>,
    /// Kind of note.
    pub note_type: NoteType,
    /// Free text.
    pub text: String,
}

impl NoteDraft {
    /// Creates a draft.
    #[must_use]
    pub fn new(
        step_id: StepId,
        staff_member_id: Option<StaffMemberId>,
        note_type: NoteType,
        text: impl Into<String>,
    ) -> Self {
        Self {
            step_id,
            staff_member_id,
            note_type,
            text: text.into(),
        }
    }
}

/// Parameter object for reconstructing a persisted note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedNoteData {
    /// Note identifier.
    pub id: NoteId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Step the note refers to.
    pub step_id: StepId,
    /// Author, if any.
    pub staff_member_id: Option<StaffMemberId>,
    /// Kind of note.
    pub note_type: NoteType,
    /// Free text.
    pub text: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Linked problems.
    pub problem_ids: Vec<ProblemId>,
}

impl Note {
    /// Creates a note for `project_id` from a draft.
    ///
    /// Duplicate problem ids are collapsed.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::EmptyNoteText`] when the text is blank.
    pub fn new(
        project_id: ProjectId,
        draft: NoteDraft,
        problem_ids: impl IntoIterator<Item = ProblemId>,
        clock: &impl Clock,
    ) -> Result<Self, WorkflowDomainError> {
        if draft.text.trim().is_empty() {
            return Err(WorkflowDomainError::EmptyNoteText);
        }
        let mut linked: Vec<ProblemId> = Vec::new();
        for problem_id in problem_ids {
            if !linked.contains(&problem_id) {
                linked.push(problem_id);
            }
        }
        Ok(Self {
            id: NoteId::new(),
            project_id,
            step_id: draft.step_id,
            staff_member_id: draft.staff_member_id,
            note_type: draft.note_type,
            text: draft.text,
            created_at: clock.utc(),
            problem_ids: linked,
        })
    }

    /// Reconstructs a note from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedNoteData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            step_id: data.step_id,
            staff_member_id: data.staff_member_id,
            note_type: data.note_type,
            text: data.text,
            created_at: data.created_at,
            problem_ids: data.problem_ids,
        }
    }

    /// Returns the note identifier.
    #[must_use]
    pub const fn id(&self) -> NoteId {
        self.id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the step the note refers to.
    #[must_use]
    pub const fn step_id(&self) -> StepId {
        self.step_id
    }

    /// Returns the author, if any.
    #[must_use]
    pub const fn staff_member_id(&self) -> Option<StaffMemberId> {
        self.staff_member_id
    }

    /// Returns the note type.
    #[must_use]
    pub const fn note_type(&self) -> NoteType {
        self.note_type
    }

    /// Returns the free text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the linked problems.
    #[must_use]
    pub fn problem_ids(&self) -> &[ProblemId] {
        &self.problem_ids
    }
}
