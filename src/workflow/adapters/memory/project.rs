//! In-memory repository for projects and assignments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::workflow::{
    domain::{
        Assignment, PersistedProjectData, Project, ProjectId, StaffMemberId, StepId, WorkflowId,
    },
    ports::{ProjectRepository, ProjectRepositoryError, ProjectRepositoryResult},
};

/// Thread-safe in-memory project repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProjectRepository {
    state: Arc<RwLock<HashMap<ProjectId, StoredProject>>>,
}

/// Header columns and assignment rows of one project, stored separately.
#[derive(Debug, Clone)]
struct StoredProject {
    workflow_id: WorkflowId,
    current_step_id: StepId,
    owner_id: Option<StaffMemberId>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    unit_status: String,
    assignments: Vec<Assignment>,
}

impl StoredProject {
    fn from_project(project: &Project) -> Self {
        Self {
            workflow_id: project.workflow_id(),
            current_step_id: project.current_step_id(),
            owner_id: project.owner_id(),
            started_at: project.started_at(),
            finished_at: project.finished_at(),
            unit_status: project.unit_status().to_owned(),
            assignments: project.assignments().to_vec(),
        }
    }

    fn to_project(&self, id: ProjectId) -> Project {
        Project::from_persisted(PersistedProjectData {
            id,
            workflow_id: self.workflow_id,
            current_step_id: self.current_step_id,
            owner_id: self.owner_id,
            started_at: self.started_at,
            finished_at: self.finished_at,
            unit_status: self.unit_status.clone(),
            assignments: self.assignments.clone(),
        })
    }
}

impl InMemoryProjectRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> ProjectRepositoryError {
    ProjectRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn store(&self, project: &Project) -> ProjectRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.contains_key(&project.id()) {
            return Err(ProjectRepositoryError::DuplicateProject(project.id()));
        }
        state.insert(project.id(), StoredProject::from_project(project));
        Ok(())
    }

    async fn find_by_id(&self, id: ProjectId) -> ProjectRepositoryResult<Option<Project>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.get(&id).map(|stored| stored.to_project(id)))
    }

    async fn update_project(
        &self,
        project: &Project,
        expected_step_id: StepId,
    ) -> ProjectRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let stored = state
            .get_mut(&project.id())
            .ok_or(ProjectRepositoryError::NotFound(project.id()))?;
        if stored.current_step_id != expected_step_id {
            return Err(ProjectRepositoryError::StaleProject {
                project_id: project.id(),
                expected: expected_step_id,
                actual: stored.current_step_id,
            });
        }

        stored.current_step_id = project.current_step_id();
        stored.owner_id = project.owner_id();
        stored.started_at = project.started_at();
        stored.finished_at = project.finished_at();
        Ok(())
    }

    async fn insert_assignment(&self, assignment: &Assignment) -> ProjectRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let duplicate = state.values().any(|stored| {
            stored
                .assignments
                .iter()
                .any(|existing| existing.id() == assignment.id())
        });
        if duplicate {
            return Err(ProjectRepositoryError::DuplicateAssignment(assignment.id()));
        }

        let stored = state
            .get_mut(&assignment.project_id())
            .ok_or(ProjectRepositoryError::NotFound(assignment.project_id()))?;
        stored.assignments.insert(0, assignment.clone());
        Ok(())
    }

    async fn update_assignment(&self, assignment: &Assignment) -> ProjectRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let existing = state
            .get_mut(&assignment.project_id())
            .and_then(|stored| {
                stored
                    .assignments
                    .iter_mut()
                    .find(|existing| existing.id() == assignment.id())
            })
            .ok_or(ProjectRepositoryError::AssignmentNotFound(assignment.id()))?;
        *existing = assignment.clone();
        Ok(())
    }
}
