//! Projects walked through the capture workflow end to end.

use super::helpers::{
    CAPTURE, DANA, DELIVER, EVAN, FOCUS, METADATA, QUALITY_CHECK, SUPERVISOR, Services,
};
use dpg_workflow::workflow::{
    domain::{AssignmentStatus, Claimant, NoteDraft, NoteType, ProblemId, StaffRole},
    services::{ErrorKind, FinishOutcome},
};
use eyre::{bail, ensure};

#[tokio::test(flavor = "multi_thread")]
async fn project_travels_from_capture_to_delivery() -> Result<(), eyre::Report> {
    let services = Services::load().await?;
    let id = services.create_project(1, None).await?;
    let engine = &services.engine;

    services
        .ownership
        .claim_step(id, Claimant::new(DANA, StaffRole::Staff))
        .await?;
    engine.start_active_assignment(id).await?;
    let captured = engine.finish_step(id, 40).await?;
    ensure!(captured.project().current_step_id() == QUALITY_CHECK, "at quality check");
    ensure!(captured.project().owner_id().is_none(), "quality check is unclaimed");

    services
        .ownership
        .claim_step(id, Claimant::new(EVAN, StaffRole::Student))
        .await?;
    engine.start_active_assignment(id).await?;
    let failed = engine
        .fail_step(id, "out of focus", "Frames 10-14 are soft")
        .await?;
    ensure!(failed.note.problem_ids() == [FOCUS], "linked by label");
    engine.start_active_assignment(id).await?;
    let rejected = engine.reject_step(id, 20).await?;
    ensure!(rejected.current_step_id() == CAPTURE, "sent back to capture");
    ensure!(rejected.owner_id() == Some(DANA), "original owner recaptures");

    engine.start_active_assignment(id).await?;
    engine.finish_step(id, 15).await?;
    services
        .ownership
        .claim_step(id, Claimant::new(EVAN, StaffRole::Student))
        .await?;
    engine.start_active_assignment(id).await?;
    let checked = engine.finish_step(id, 10).await?;
    ensure!(checked.project().current_step_id() == METADATA, "at metadata");
    ensure!(checked.project().owner_id() == Some(DANA), "metadata goes to original owner");

    engine.start_active_assignment(id).await?;
    let described = engine.finish_step(id, 30).await?;
    ensure!(described.project().current_step_id() == DELIVER, "at delivery");
    ensure!(described.project().owner_id() == Some(DANA), "delivery keeps prior owner");

    engine.start_active_assignment(id).await?;
    let delivered = engine.finish_step(id, 5).await?;
    let FinishOutcome::Completed(project) = delivered else {
        bail!("expected completion, got {delivered:?}");
    };
    ensure!(project.is_finished(), "workflow complete");
    ensure!(project.current_step_id() == DELIVER, "stays on the terminal step");

    let stored = services.stored(id).await?;
    let history: Vec<_> = stored
        .assignments()
        .iter()
        .map(|assignment| (assignment.step_id(), assignment.status()))
        .collect();
    ensure!(
        history
            == [
                (DELIVER, AssignmentStatus::Finished),
                (METADATA, AssignmentStatus::Finished),
                (QUALITY_CHECK, AssignmentStatus::Finished),
                (CAPTURE, AssignmentStatus::Finished),
                (QUALITY_CHECK, AssignmentStatus::Rejected),
                (CAPTURE, AssignmentStatus::Finished),
            ],
        "history {history:?}"
    );
    let minutes: Vec<u32> = stored
        .assignments()
        .iter()
        .map(|assignment| assignment.duration_minutes())
        .collect();
    ensure!(minutes == [5, 30, 10, 15, 20, 40], "durations {minutes:?}");

    let feed = services.annotations.list_notes(id).await?;
    ensure!(feed.len() == 1, "only the failure note");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn finished_project_refuses_further_work() -> Result<(), eyre::Report> {
    let services = Services::load().await?;
    let id = services.create_project(2, Some(DANA)).await?;
    let engine = &services.engine;
    for _ in 0..4 {
        engine.start_active_assignment(id).await?;
        engine.finish_step(id, 1).await?;
        if services.stored(id).await?.owner_id().is_none() {
            services
                .ownership
                .claim_step(id, Claimant::new(DANA, StaffRole::Staff))
                .await?;
        }
    }
    ensure!(services.stored(id).await?.is_finished(), "workflow complete");

    let finish = engine.finish_step(id, 1).await;
    let claim = services
        .ownership
        .claim_step(id, Claimant::new(SUPERVISOR, StaffRole::Admin))
        .await;

    ensure!(
        finish.is_err_and(|err| err.kind() == ErrorKind::Validation),
        "finish refused"
    );
    ensure!(
        claim.is_err_and(|err| err.kind() == ErrorKind::Validation),
        "claim refused"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn supervisor_takes_over_and_releases_a_step() -> Result<(), eyre::Report> {
    let services = Services::load().await?;
    let id = services.create_project(3, Some(DANA)).await?;
    services.engine.start_active_assignment(id).await?;
    services.engine.finish_step(id, 25).await?;
    services
        .ownership
        .claim_step(id, Claimant::new(EVAN, StaffRole::Staff))
        .await?;
    services.engine.start_active_assignment(id).await?;
    services.engine.finish_step(id, 25).await?;

    let refused = services
        .ownership
        .claim_step(id, Claimant::new(EVAN, StaffRole::Staff))
        .await;
    ensure!(refused.is_err(), "metadata belongs to the original owner");

    let claimed = services
        .ownership
        .claim_step(id, Claimant::new(SUPERVISOR, StaffRole::Supervisor))
        .await?;
    ensure!(claimed.project.owner_id() == Some(SUPERVISOR), "supervisor owns metadata");

    let released = services.ownership.release_step(id).await?;
    ensure!(released.project.owner_id().is_none(), "step left unclaimed");

    let feed = services
        .annotations
        .add_note(
            id,
            NoteDraft::new(METADATA, Some(DANA), NoteType::Suggestion, "Add the donor name"),
            &[ProblemId::OTHER],
        )
        .await?;
    let kinds: Vec<NoteType> = feed.iter().map(|entry| entry.note.note_type()).collect();
    ensure!(kinds == [NoteType::Suggestion, NoteType::Comment], "feed {kinds:?}");
    let Some(latest) = feed.first() else {
        bail!("feed is empty");
    };
    let labels: Vec<&str> = latest.problems.iter().map(|problem| problem.label()).collect();
    ensure!(labels == ["Other"], "catalog supplies the reserved problem");
    Ok(())
}
