//! Shared reference data and service wiring for lifecycle tests.

use std::sync::Arc;

use dpg_workflow::workflow::{
    adapters::memory::{
        AcceptingStepCompletion, InMemoryNoteRepository, InMemoryProjectRepository,
        InMemoryReferenceData,
    },
    domain::{
        NewProject, OwnerPolicy, Problem, ProblemId, Project, ProjectId, StaffMemberId, Step,
        StepDefinition, StepId, StepType, WorkflowId,
    },
    ports::ProjectRepository,
    services::{
        AnnotationService, OwnershipService, ProjectLocks, TransitionEngine, WorkflowReference,
    },
};
use mockable::DefaultClock;

pub const WORKFLOW: WorkflowId = WorkflowId::new(3);
pub const CAPTURE: StepId = StepId::new(31);
pub const QUALITY_CHECK: StepId = StepId::new(32);
pub const METADATA: StepId = StepId::new(33);
pub const DELIVER: StepId = StepId::new(34);

pub const DANA: StaffMemberId = StaffMemberId::new(7001);
pub const EVAN: StaffMemberId = StaffMemberId::new(7002);
pub const SUPERVISOR: StaffMemberId = StaffMemberId::new(7100);

pub const FOCUS: ProblemId = ProblemId::new(41);

/// Builds one step of the capture workflow.
#[must_use]
pub fn step(
    id: StepId,
    name: &str,
    step_type: StepType,
    next_step_id: Option<StepId>,
    fail_step_id: Option<StepId>,
    owner_policy: OwnerPolicy,
) -> Step {
    Step::new(StepDefinition {
        id,
        workflow_id: WORKFLOW,
        name: name.to_owned(),
        step_type,
        next_step_id,
        fail_step_id,
        owner_policy,
    })
}

/// Capture -> Quality check -> Metadata -> Deliver.
#[must_use]
pub fn capture_workflow() -> Vec<Step> {
    vec![
        step(
            CAPTURE,
            "Capture",
            StepType::Normal,
            Some(QUALITY_CHECK),
            None,
            OwnerPolicy::Unclaimed,
        ),
        step(
            QUALITY_CHECK,
            "Quality check",
            StepType::Normal,
            Some(METADATA),
            Some(CAPTURE),
            OwnerPolicy::Unclaimed,
        ),
        step(
            METADATA,
            "Metadata",
            StepType::Normal,
            Some(DELIVER),
            Some(QUALITY_CHECK),
            OwnerPolicy::OriginalOwner,
        ),
        step(
            DELIVER,
            "Deliver",
            StepType::Terminal,
            None,
            Some(METADATA),
            OwnerPolicy::PriorOwner,
        ),
    ]
}

/// Problems known to the capture workflow; "other" is left for the catalog
/// to add.
#[must_use]
pub fn capture_problems() -> Vec<Problem> {
    vec![Problem::new(FOCUS, "focus", "Out of focus")]
}

/// Services wired to shared in-memory repositories.
pub struct Services {
    pub projects: Arc<InMemoryProjectRepository>,
    pub engine: TransitionEngine<
        InMemoryProjectRepository,
        InMemoryNoteRepository,
        AcceptingStepCompletion,
        DefaultClock,
    >,
    pub ownership: OwnershipService<InMemoryProjectRepository, InMemoryNoteRepository, DefaultClock>,
    pub annotations:
        AnnotationService<InMemoryProjectRepository, InMemoryNoteRepository, DefaultClock>,
}

impl Services {
    /// Loads reference data and wires every service.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference data does not form a valid graph.
    pub async fn load() -> Result<Self, eyre::Report> {
        let source = InMemoryReferenceData::new(capture_workflow(), capture_problems());
        let reference = WorkflowReference::load(&source).await?;
        let projects = Arc::new(InMemoryProjectRepository::new());
        let notes = Arc::new(InMemoryNoteRepository::new());
        let clock = Arc::new(DefaultClock);
        let locks = Arc::new(ProjectLocks::new());

        Ok(Self {
            engine: TransitionEngine::new(
                Arc::clone(&projects),
                Arc::clone(&notes),
                Arc::new(AcceptingStepCompletion),
                reference.clone(),
                Arc::clone(&clock),
            )
            .with_locks(Arc::clone(&locks)),
            ownership: OwnershipService::new(
                Arc::clone(&projects),
                Arc::clone(&notes),
                reference.clone(),
                Arc::clone(&clock),
            )
            .with_locks(locks),
            annotations: AnnotationService::new(Arc::clone(&projects), notes, reference, clock),
            projects,
        })
    }

    /// Stores a fresh project at the capture step.
    ///
    /// # Errors
    ///
    /// Returns an error if the project already exists.
    pub async fn create_project(
        &self,
        id: u64,
        owner_id: Option<StaffMemberId>,
    ) -> Result<ProjectId, eyre::Report> {
        let project = Project::new(
            NewProject {
                id: ProjectId::new(id),
                workflow_id: WORKFLOW,
                first_step_id: CAPTURE,
                owner_id,
                unit_status: "in_progress".to_owned(),
            },
            &DefaultClock,
        );
        self.projects.store(&project).await?;
        Ok(project.id())
    }

    /// Reads a project back from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the project is missing.
    pub async fn stored(&self, id: ProjectId) -> Result<Project, eyre::Report> {
        self.projects
            .find_by_id(id)
            .await?
            .ok_or_else(|| eyre::eyre!("project {id} should exist"))
    }
}
