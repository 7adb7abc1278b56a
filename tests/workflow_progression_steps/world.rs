//! Shared world state for workflow progression BDD scenarios.

use std::sync::Arc;

use dpg_workflow::workflow::{
    adapters::memory::{AcceptingStepCompletion, InMemoryNoteRepository, InMemoryProjectRepository},
    domain::{
        OwnerPolicy, Problem, ProblemCatalog, ProblemId, Project, ProjectId, Step, StepDefinition,
        StepGraph, StepGraphError, StepId, StepType, WorkflowId,
    },
    ports::ProjectRepository,
    services::{TransitionEngine, TransitionError, WorkflowReference},
};
use mockable::DefaultClock;
use rstest::fixture;

/// Engine type used by the BDD world.
pub type TestEngine = TransitionEngine<
    InMemoryProjectRepository,
    InMemoryNoteRepository,
    AcceptingStepCompletion,
    DefaultClock,
>;

/// Workflow the scenarios run against.
pub const WORKFLOW: WorkflowId = WorkflowId::new(1);

/// Scenario world for workflow progression behaviour tests.
pub struct ProgressionWorld {
    pub engine: TestEngine,
    pub projects: Arc<InMemoryProjectRepository>,
    pub notes: Arc<InMemoryNoteRepository>,
    pub project_id: Option<ProjectId>,
    pub last_result: Option<Result<(), TransitionError>>,
}

fn step(
    id: u64,
    name: &str,
    step_type: StepType,
    next_step_id: Option<u64>,
    fail_step_id: Option<u64>,
    owner_policy: OwnerPolicy,
) -> Step {
    Step::new(StepDefinition {
        id: StepId::new(id),
        workflow_id: WORKFLOW,
        name: name.to_owned(),
        step_type,
        next_step_id: next_step_id.map(StepId::new),
        fail_step_id: fail_step_id.map(StepId::new),
        owner_policy,
    })
}

/// Scan -> Process -> Review -> Finalize.
fn reference() -> Result<WorkflowReference, StepGraphError> {
    let graph = StepGraph::new([
        step(1, "Scan", StepType::Normal, Some(2), None, OwnerPolicy::Unclaimed),
        step(2, "Process", StepType::Normal, Some(3), Some(1), OwnerPolicy::PriorOwner),
        step(3, "Review", StepType::Normal, Some(4), Some(2), OwnerPolicy::Unclaimed),
        step(4, "Finalize", StepType::Terminal, None, Some(3), OwnerPolicy::PriorOwner),
    ])?;
    let problems = ProblemCatalog::new([Problem::new(ProblemId::new(1), "bad_scan", "Bad scan")]);
    Ok(WorkflowReference::new(graph, problems))
}

impl ProgressionWorld {
    /// Creates a world with empty repositories.
    ///
    /// # Errors
    ///
    /// Returns an error if the scenario step graph is invalid.
    pub fn new() -> Result<Self, StepGraphError> {
        let projects = Arc::new(InMemoryProjectRepository::new());
        let notes = Arc::new(InMemoryNoteRepository::new());
        let engine = TransitionEngine::new(
            Arc::clone(&projects),
            Arc::clone(&notes),
            Arc::new(AcceptingStepCompletion),
            reference()?,
            Arc::new(DefaultClock),
        );
        Ok(Self {
            engine,
            projects,
            notes,
            project_id: None,
            last_result: None,
        })
    }

    /// Returns the scenario's project identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if no project has been created yet.
    pub fn project_id(&self) -> Result<ProjectId, eyre::Report> {
        self.project_id
            .ok_or_else(|| eyre::eyre!("missing project in scenario world"))
    }

    /// Reads the scenario's project from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if no project exists.
    pub fn stored_project(&self) -> Result<Project, eyre::Report> {
        let id = self.project_id()?;
        run_async(self.projects.find_by_id(id))?
            .ok_or_else(|| eyre::eyre!("project {id} missing from repository"))
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
#[expect(
    clippy::expect_used,
    reason = "Fixture setup fails loudly on an invalid scenario graph"
)]
pub fn world() -> ProgressionWorld {
    ProgressionWorld::new().expect("scenario step graph is valid")
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
