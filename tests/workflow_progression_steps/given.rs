//! Given steps for workflow progression BDD scenarios.

use super::world::{ProgressionWorld, WORKFLOW, run_async};
use dpg_workflow::workflow::{
    domain::{NewProject, Project, ProjectId, StaffMemberId, StepId},
    ports::ProjectRepository,
};
use eyre::WrapErr;
use mockable::DefaultClock;
use rstest_bdd_macros::given;

#[given("a project {id:u64} owned by staff member {owner:u64} at step {step:u64}")]
fn project_at_step(
    world: &mut ProgressionWorld,
    id: u64,
    owner: u64,
    step: u64,
) -> Result<(), eyre::Report> {
    let project = Project::new(
        NewProject {
            id: ProjectId::new(id),
            workflow_id: WORKFLOW,
            first_step_id: StepId::new(step),
            owner_id: Some(StaffMemberId::new(owner)),
            unit_status: "in_progress".to_owned(),
        },
        &DefaultClock,
    );
    run_async(world.projects.store(&project)).wrap_err("store scenario project")?;
    world.project_id = Some(project.id());
    Ok(())
}

#[given("the active assignment has been started")]
fn assignment_started(world: &mut ProgressionWorld) -> Result<(), eyre::Report> {
    let id = world.project_id()?;
    run_async(world.engine.start_active_assignment(id)).wrap_err("start active assignment")?;
    Ok(())
}

#[given("{minutes:u32} minutes have been recorded")]
fn minutes_recorded(world: &mut ProgressionWorld, minutes: u32) -> Result<(), eyre::Report> {
    let id = world.project_id()?;
    run_async(world.engine.record_duration(id, minutes)).wrap_err("record duration")?;
    Ok(())
}

#[given(r#"the step has failed with problem "{problem}""#)]
fn step_has_failed(world: &mut ProgressionWorld, problem: String) -> Result<(), eyre::Report> {
    let id = world.project_id()?;
    run_async(world.engine.fail_step(id, &problem, "Needs another pass"))
        .wrap_err("fail step in scenario setup")?;
    Ok(())
}
