//! Loading reference data into the shared workflow reference.

use super::helpers::{CAPTURE, DELIVER, capture_problems, capture_workflow, step};
use dpg_workflow::workflow::{
    adapters::memory::InMemoryReferenceData,
    domain::{OwnerPolicy, ProblemId, StepGraphError, StepId, StepType},
    services::{ReferenceLoadError, WorkflowReference},
};
use eyre::ensure;

#[tokio::test(flavor = "multi_thread")]
async fn loads_graph_and_catalog() -> Result<(), eyre::Report> {
    let source = InMemoryReferenceData::new(capture_workflow(), capture_problems());

    let reference = WorkflowReference::load(&source).await?;

    ensure!(reference.steps().len() == 4, "four steps");
    let capture = reference.steps().step_by_id(CAPTURE)?;
    ensure!(!capture.is_terminal(), "capture is normal");
    ensure!(reference.steps().step_by_id(DELIVER)?.is_terminal(), "deliver ends");
    ensure!(
        reference.problems().get(ProblemId::OTHER).is_some(),
        "reserved problem present"
    );
    ensure!(reference.problems().iter().count() == 2, "focus and other");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn dangling_edges_fail_to_load() -> Result<(), eyre::Report> {
    let mut steps = capture_workflow();
    steps.push(step(
        StepId::new(39),
        "Orphan",
        StepType::Normal,
        Some(StepId::new(404)),
        None,
        OwnerPolicy::Unclaimed,
    ));
    let source = InMemoryReferenceData::new(steps, capture_problems());

    let result = WorkflowReference::load(&source).await;

    ensure!(
        matches!(
            result,
            Err(ReferenceLoadError::Graph(StepGraphError::DanglingEdge { .. }))
        ),
        "got {:?}",
        result.err()
    );
    Ok(())
}
