//! Workflow steps and the immutable step graph.

use super::{ParseWorkflowValueError, StepGraphError, StepId, WorkflowId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Kind of a workflow step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepType {
    /// An intermediate production step with a successor.
    Normal,
    /// The final step of a workflow.
    Terminal,
}

impl StepType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Terminal => "terminal",
        }
    }
}

impl TryFrom<&str> for StepType {
    type Error = ParseWorkflowValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "terminal" => Ok(Self::Terminal),
            _ => Err(ParseWorkflowValueError::new("step type", value)),
        }
    }
}

/// Rule deciding who receives a step when the project advances into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OwnerPolicy {
    /// The project's current owner keeps the work.
    PriorOwner,
    /// Whoever first worked the project receives the work.
    OriginalOwner,
    /// Nobody is assigned; a staff member must claim the step.
    Unclaimed,
}

impl OwnerPolicy {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PriorOwner => "prior_owner",
            Self::OriginalOwner => "original_owner",
            Self::Unclaimed => "unclaimed",
        }
    }
}

impl fmt::Display for OwnerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for OwnerPolicy {
    type Error = ParseWorkflowValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "prior_owner" | "priorowner" => Ok(Self::PriorOwner),
            "original_owner" | "originalowner" => Ok(Self::OriginalOwner),
            "unclaimed" => Ok(Self::Unclaimed),
            _ => Err(ParseWorkflowValueError::new("owner policy", value)),
        }
    }
}

/// One stage of a workflow's production sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    id: StepId,
    #[serde(rename = "workflowID")]
    workflow_id: WorkflowId,
    name: String,
    #[serde(rename = "stepType")]
    step_type: StepType,
    #[serde(rename = "nextStepID")]
    next_step_id: Option<StepId>,
    #[serde(rename = "failStepID")]
    fail_step_id: Option<StepId>,
    #[serde(rename = "ownerType")]
    owner_policy: OwnerPolicy,
}

/// Parameter object describing a step as stored by configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDefinition {
    /// Step identifier.
    pub id: StepId,
    /// Workflow the step belongs to.
    pub workflow_id: WorkflowId,
    /// Display name.
    pub name: String,
    /// Step kind.
    pub step_type: StepType,
    /// Successor step.
    pub next_step_id: Option<StepId>,
    /// Step receiving the project when this step is rejected.
    pub fail_step_id: Option<StepId>,
    /// Owner policy applied when a project advances into this step.
    pub owner_policy: OwnerPolicy,
}

impl Step {
    /// Builds a step from its stored definition.
    #[must_use]
    pub fn new(definition: StepDefinition) -> Self {
        Self {
            id: definition.id,
            workflow_id: definition.workflow_id,
            name: definition.name,
            step_type: definition.step_type,
            next_step_id: definition.next_step_id,
            fail_step_id: definition.fail_step_id,
            owner_policy: definition.owner_policy,
        }
    }

    /// Returns the step identifier.
    #[must_use]
    pub const fn id(&self) -> StepId {
        self.id
    }

    /// Returns the owning workflow.
    #[must_use]
    pub const fn workflow_id(&self) -> WorkflowId {
        self.workflow_id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the step kind.
    #[must_use]
    pub const fn step_type(&self) -> StepType {
        self.step_type
    }

    /// Returns whether this is the final step of its workflow.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self.step_type, StepType::Terminal)
    }

    /// Returns the successor step, if any.
    #[must_use]
    pub const fn next_step_id(&self) -> Option<StepId> {
        self.next_step_id
    }

    /// Returns the failure-redirect step, if any.
    #[must_use]
    pub const fn fail_step_id(&self) -> Option<StepId> {
        self.fail_step_id
    }

    /// Returns the owner policy for projects entering this step.
    #[must_use]
    pub const fn owner_policy(&self) -> OwnerPolicy {
        self.owner_policy
    }
}

/// Read-only lookup over every configured step.
///
/// The graph is validated on construction: edges resolve, non-terminal
/// steps have successors, and every step reaches a terminal step by
/// following successor edges.
///
/// ```
/// use dpg_workflow::workflow::domain::{
///     OwnerPolicy, Step, StepDefinition, StepGraph, StepId, StepType, WorkflowId,
/// };
///
/// let scan = Step::new(StepDefinition {
///     id: StepId::new(1),
///     workflow_id: WorkflowId::new(1),
///     name: "Scan".to_owned(),
///     step_type: StepType::Normal,
///     next_step_id: Some(StepId::new(2)),
///     fail_step_id: None,
///     owner_policy: OwnerPolicy::Unclaimed,
/// });
/// let finalize = Step::new(StepDefinition {
///     id: StepId::new(2),
///     workflow_id: WorkflowId::new(1),
///     name: "Finalize".to_owned(),
///     step_type: StepType::Terminal,
///     next_step_id: None,
///     fail_step_id: Some(StepId::new(1)),
///     owner_policy: OwnerPolicy::PriorOwner,
/// });
///
/// let graph = StepGraph::new([scan, finalize]).expect("valid graph");
/// let first = graph.step_by_id(StepId::new(1)).expect("known step");
/// assert_eq!(graph.next_step(first).expect("successor").name(), "Finalize");
/// ```
#[derive(Debug, Clone, Default)]
pub struct StepGraph {
    steps: HashMap<StepId, Step>,
}

impl StepGraph {
    /// Builds and validates a step graph.
    ///
    /// # Errors
    ///
    /// Returns [`StepGraphError`] when a step id is duplicated, an edge is
    /// dangling, a non-terminal step lacks a successor, or a terminal step is
    /// unreachable.
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Result<Self, StepGraphError> {
        let mut by_id = HashMap::new();
        for step in steps {
            let id = step.id();
            if by_id.insert(id, step).is_some() {
                return Err(StepGraphError::DuplicateStep(id));
            }
        }

        let graph = Self { steps: by_id };
        graph.validate_edges()?;
        graph.validate_termination()?;
        Ok(graph)
    }

    fn validate_edges(&self) -> Result<(), StepGraphError> {
        for step in self.steps.values() {
            for target in [step.next_step_id, step.fail_step_id].into_iter().flatten() {
                if !self.steps.contains_key(&target) {
                    return Err(StepGraphError::DanglingEdge {
                        step_id: step.id,
                        target,
                    });
                }
            }
            if !step.is_terminal() && step.next_step_id.is_none() {
                return Err(StepGraphError::MissingNextStep(step.id));
            }
        }
        Ok(())
    }

    fn validate_termination(&self) -> Result<(), StepGraphError> {
        for start in self.steps.values() {
            let mut visited = HashSet::new();
            let mut current = start;
            while !current.is_terminal() {
                if !visited.insert(current.id) {
                    return Err(StepGraphError::NoTerminalReachable(start.id));
                }
                current = self.next_step(current)?;
            }
        }
        Ok(())
    }

    /// Looks up a step by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StepGraphError::UnknownStep`] when the id does not resolve.
    pub fn step_by_id(&self, id: StepId) -> Result<&Step, StepGraphError> {
        self.steps.get(&id).ok_or(StepGraphError::UnknownStep(id))
    }

    /// Returns the successor of `step`.
    ///
    /// # Errors
    ///
    /// Returns [`StepGraphError::MissingNextStep`] for a step without a
    /// successor (including terminal steps) and
    /// [`StepGraphError::UnknownStep`] when the edge does not resolve.
    pub fn next_step(&self, step: &Step) -> Result<&Step, StepGraphError> {
        let next_id = step
            .next_step_id
            .ok_or(StepGraphError::MissingNextStep(step.id))?;
        self.step_by_id(next_id)
    }

    /// Returns the failure-redirect step of `step`.
    ///
    /// # Errors
    ///
    /// Returns [`StepGraphError::MissingFailStep`] when the step has no
    /// failure edge and [`StepGraphError::UnknownStep`] when the edge does
    /// not resolve.
    pub fn failure_step(&self, step: &Step) -> Result<&Step, StepGraphError> {
        let fail_id = step
            .fail_step_id
            .ok_or(StepGraphError::MissingFailStep(step.id))?;
        self.step_by_id(fail_id)
    }

    /// Returns whether `step_id` is a step of `workflow_id`.
    #[must_use]
    pub fn belongs_to_workflow(&self, step_id: StepId, workflow_id: WorkflowId) -> bool {
        self.steps
            .get(&step_id)
            .is_some_and(|step| step.workflow_id == workflow_id)
    }

    /// Returns the number of steps in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns whether the graph has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
