//! Then steps for workflow progression BDD scenarios.

use super::world::{ProgressionWorld, run_async};
use dpg_workflow::workflow::{
    domain::{AssignmentStatus, NoteType, ProblemId, StaffMemberId, StepId},
    ports::NoteRepository,
};
use rstest_bdd_macros::then;

fn expect_success(world: &ProgressionWorld) -> Result<(), eyre::Report> {
    match world.last_result.as_ref() {
        Some(Err(err)) => Err(eyre::eyre!("operation failed unexpectedly: {err}")),
        Some(Ok(())) | None => Ok(()),
    }
}

fn parse_status(status: &str) -> Result<AssignmentStatus, eyre::Report> {
    AssignmentStatus::try_from(status)
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))
}

#[then("the project is at step {step:u64}")]
fn project_at_step(world: &ProgressionWorld, step: u64) -> Result<(), eyre::Report> {
    let project = world.stored_project()?;
    eyre::ensure!(
        project.current_step_id() == StepId::new(step),
        "expected step {step}, found {}",
        project.current_step_id()
    );
    Ok(())
}

#[then("the project is owned by staff member {owner:u64}")]
fn project_owned_by(world: &ProgressionWorld, owner: u64) -> Result<(), eyre::Report> {
    expect_success(world)?;
    let project = world.stored_project()?;
    eyre::ensure!(
        project.owner_id() == Some(StaffMemberId::new(owner)),
        "expected owner {owner}, found {:?}",
        project.owner_id()
    );
    Ok(())
}

#[then("the project has no owner")]
fn project_has_no_owner(world: &ProgressionWorld) -> Result<(), eyre::Report> {
    expect_success(world)?;
    let project = world.stored_project()?;
    eyre::ensure!(project.owner_id().is_none(), "project still has an owner");
    Ok(())
}

#[then(r#"the active assignment is "{status}""#)]
fn active_assignment_is(world: &ProgressionWorld, status: String) -> Result<(), eyre::Report> {
    let expected = parse_status(&status)?;
    let project = world.stored_project()?;
    let active = project
        .active_assignment()
        .ok_or_else(|| eyre::eyre!("project has no active assignment"))?;
    eyre::ensure!(
        active.status() == expected,
        "expected {expected}, found {}",
        active.status()
    );
    Ok(())
}

#[then(r#"the previous assignment is "{status}""#)]
fn previous_assignment_is(world: &ProgressionWorld, status: String) -> Result<(), eyre::Report> {
    let expected = parse_status(&status)?;
    let project = world.stored_project()?;
    let previous = project
        .assignments()
        .get(1)
        .ok_or_else(|| eyre::eyre!("project has no previous assignment"))?;
    eyre::ensure!(
        previous.status() == expected,
        "expected {expected}, found {}",
        previous.status()
    );
    Ok(())
}

#[then("the previous assignment recorded {minutes:u32} minutes")]
fn previous_assignment_recorded(
    world: &ProgressionWorld,
    minutes: u32,
) -> Result<(), eyre::Report> {
    expect_success(world)?;
    let project = world.stored_project()?;
    let previous = project
        .assignments()
        .get(1)
        .ok_or_else(|| eyre::eyre!("project has no previous assignment"))?;
    eyre::ensure!(
        previous.duration_minutes() == minutes,
        "expected {minutes} minutes, found {}",
        previous.duration_minutes()
    );
    Ok(())
}

#[then(r#"the latest note is a "{note_type}" note linked to problem {problem:u64}"#)]
fn latest_note(
    world: &ProgressionWorld,
    note_type: String,
    problem: u64,
) -> Result<(), eyre::Report> {
    expect_success(world)?;
    let expected_type = NoteType::try_from(note_type.as_str())
        .map_err(|err| eyre::eyre!("invalid expected note type in scenario: {err}"))?;
    let notes = run_async(world.notes.list_for_project(world.project_id()?))?;
    let latest = notes
        .first()
        .ok_or_else(|| eyre::eyre!("project has no notes"))?;
    eyre::ensure!(latest.note_type() == expected_type, "unexpected note type");
    eyre::ensure!(
        latest.problem_ids() == [ProblemId::new(problem)],
        "expected problem {problem}, found {:?}",
        latest.problem_ids()
    );
    Ok(())
}

#[then("the workflow is complete")]
fn workflow_complete(world: &ProgressionWorld) -> Result<(), eyre::Report> {
    expect_success(world)?;
    let project = world.stored_project()?;
    eyre::ensure!(project.is_finished(), "project has not finished");
    Ok(())
}

#[then(r#"finishing again is refused with a "{kind}" error"#)]
fn finishing_again_refused(world: &ProgressionWorld, kind: String) -> Result<(), eyre::Report> {
    let id = world.project_id()?;
    let Err(err) = run_async(world.engine.finish_step(id, 1)) else {
        return Err(eyre::eyre!("finishing a complete project succeeded"));
    };
    eyre::ensure!(
        err.kind().as_str() == kind,
        "expected {kind} error, found {}",
        err.kind()
    );
    Ok(())
}

#[then(r#"the operation fails with a "{kind}" error"#)]
fn operation_fails(world: &ProgressionWorld, kind: String) -> Result<(), eyre::Report> {
    let result = world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing operation result"))?;
    let Err(err) = result else {
        return Err(eyre::eyre!("expected a {kind} error, operation succeeded"));
    };
    eyre::ensure!(
        err.kind().as_str() == kind,
        "expected {kind} error, found {}",
        err.kind()
    );
    Ok(())
}
