//! When steps for workflow progression BDD scenarios.

use super::world::{ProgressionWorld, run_async};
use rstest_bdd_macros::when;

#[when("the step is finished after {minutes:u32} minutes")]
fn finish_step(world: &mut ProgressionWorld, minutes: u32) -> Result<(), eyre::Report> {
    let id = world.project_id()?;
    let result = run_async(world.engine.finish_step(id, minutes));
    world.last_result = Some(result.map(|_| ()));
    Ok(())
}

#[when(r#"the step fails with problem "{problem}" and message "{message}""#)]
fn fail_step(
    world: &mut ProgressionWorld,
    problem: String,
    message: String,
) -> Result<(), eyre::Report> {
    let id = world.project_id()?;
    let result = run_async(world.engine.fail_step(id, &problem, &message));
    world.last_result = Some(result.map(|_| ()));
    Ok(())
}

#[when("the step is rejected after {minutes:u32} minutes")]
fn reject_step(world: &mut ProgressionWorld, minutes: u32) -> Result<(), eyre::Report> {
    let id = world.project_id()?;
    let result = run_async(world.engine.reject_step(id, minutes));
    world.last_result = Some(result.map(|_| ()));
    Ok(())
}
