//! Storage failures surfacing through the services.

use super::fixtures::{
    ALICE, Harness, PROCESS, REVIEW, SCAN, new_project, project_with_history, reference,
};
use crate::workflow::{
    adapters::memory::{AcceptingStepCompletion, InMemoryNoteRepository},
    domain::{Assignment, AssignmentStatus, Note, NoteDraft, NoteType, Project, ProjectId, StepId},
    ports::{
        NoteRepository, NoteRepositoryError, NoteRepositoryResult, ProjectRepository,
        ProjectRepositoryError, ProjectRepositoryResult,
    },
    services::{AnnotationService, ErrorKind, StepFailure, TransitionEngine, TransitionError},
};
use async_trait::async_trait;
use eyre::{Result, bail, ensure};
use mockable::DefaultClock;
use mockall::mock;
use rstest::rstest;
use std::sync::Arc;

mock! {
    Projects {}

    #[async_trait]
    impl ProjectRepository for Projects {
        async fn store(&self, project: &Project) -> ProjectRepositoryResult<()>;
        async fn find_by_id(&self, id: ProjectId) -> ProjectRepositoryResult<Option<Project>>;
        async fn update_project(
            &self,
            project: &Project,
            expected_step_id: StepId,
        ) -> ProjectRepositoryResult<()>;
        async fn insert_assignment(&self, assignment: &Assignment) -> ProjectRepositoryResult<()>;
        async fn update_assignment(&self, assignment: &Assignment) -> ProjectRepositoryResult<()>;
    }
}

mock! {
    Notes {}

    #[async_trait]
    impl NoteRepository for Notes {
        async fn append(&self, note: &Note) -> NoteRepositoryResult<()>;
        async fn list_for_project(&self, project_id: ProjectId) -> NoteRepositoryResult<Vec<Note>>;
    }
}

fn started_at_process() -> Result<Project> {
    project_with_history(
        1,
        Some(ALICE),
        "",
        &[(PROCESS, Some(ALICE), AssignmentStatus::Started)],
    )
}

type MockedEngine =
    TransitionEngine<MockProjects, InMemoryNoteRepository, AcceptingStepCompletion, DefaultClock>;

fn engine(projects: MockProjects) -> Result<MockedEngine> {
    Ok(TransitionEngine::new(
        Arc::new(projects),
        Arc::new(InMemoryNoteRepository::new()),
        Arc::new(AcceptingStepCompletion),
        reference()?,
        Arc::new(DefaultClock),
    ))
}

fn connection_lost() -> ProjectRepositoryError {
    ProjectRepositoryError::persistence(std::io::Error::other("connection reset"))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_assignment_write_stops_the_transition() -> Result<()> {
    let project = started_at_process()?;
    let mut projects = MockProjects::new();
    projects
        .expect_find_by_id()
        .returning(move |_| Ok(Some(project.clone())));
    projects
        .expect_update_assignment()
        .times(1)
        .returning(|_| Err(connection_lost()));
    projects.expect_update_project().never();
    projects.expect_insert_assignment().never();

    let result = engine(projects)?.finish_step(ProjectId::new(1), 30).await;

    let Err(err) = result else {
        bail!("finish succeeded despite storage failure");
    };
    ensure!(err.kind() == ErrorKind::Persistence, "kind {:?}", err.kind());
    ensure!(
        matches!(
            &err,
            TransitionError::Step {
                project_id,
                step_id: PROCESS,
                source: StepFailure::Repository(ProjectRepositoryError::Persistence(_)),
            } if *project_id == ProjectId::new(1)
        ),
        "context {err:?}"
    );
    ensure!(
        err.to_string() == "project 1 step 2: persistence error: connection reset",
        "message {err}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_project_read_names_the_project() -> Result<()> {
    let mut projects = MockProjects::new();
    projects
        .expect_find_by_id()
        .times(1)
        .returning(|_| Err(connection_lost()));
    projects.expect_update_assignment().never();

    let result = engine(projects)?
        .fail_step(ProjectId::new(4242), "bad_scan", "Blurred")
        .await;

    let Err(err) = result else {
        bail!("failure recorded without a readable project");
    };
    ensure!(err.kind() == ErrorKind::Persistence, "kind {:?}", err.kind());
    ensure!(
        (err.project_id(), err.step_id()) == (ProjectId::new(4242), None),
        "context {err:?}"
    );
    ensure!(err.to_string().contains("project 4242"), "message {err}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lost_step_race_is_a_conflict() -> Result<()> {
    let project = started_at_process()?;
    let mut projects = MockProjects::new();
    projects
        .expect_find_by_id()
        .returning(move |_| Ok(Some(project.clone())));
    projects.expect_update_assignment().returning(|_| Ok(()));
    projects
        .expect_update_project()
        .withf(|_, expected| *expected == PROCESS)
        .times(1)
        .returning(|project, expected| {
            Err(ProjectRepositoryError::StaleProject {
                project_id: project.id(),
                expected,
                actual: REVIEW,
            })
        });
    projects.expect_insert_assignment().never();

    let result = engine(projects)?.finish_step(ProjectId::new(1), 30).await;

    let Err(err) = result else {
        bail!("finish succeeded after losing the race");
    };
    ensure!(err.kind() == ErrorKind::Conflict, "kind {:?}", err.kind());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_assignment_row_is_not_found() -> Result<()> {
    let project = started_at_process()?;
    let mut projects = MockProjects::new();
    projects
        .expect_find_by_id()
        .returning(move |_| Ok(Some(project.clone())));
    projects
        .expect_update_assignment()
        .returning(|assignment| Err(ProjectRepositoryError::AssignmentNotFound(assignment.id())));

    let result = engine(projects)?.record_duration(ProjectId::new(1), 15).await;

    let Err(err) = result else {
        bail!("duration recorded without an assignment row");
    };
    ensure!(err.kind() == ErrorKind::NotFound, "kind {:?}", err.kind());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_note_write_is_a_persistence_error() -> Result<()> {
    let harness = Harness::new()?;
    let id = harness.seed(new_project(2, SCAN, Some(ALICE))).await?;
    let mut notes = MockNotes::new();
    notes
        .expect_append()
        .times(1)
        .returning(|_| Err(NoteRepositoryError::persistence(std::io::Error::other("disk full"))));
    notes.expect_list_for_project().never();
    let annotations = AnnotationService::new(
        Arc::clone(&harness.projects),
        Arc::new(notes),
        reference()?,
        Arc::new(DefaultClock),
    );

    let result = annotations
        .add_note(
            id,
            NoteDraft::new(SCAN, Some(ALICE), NoteType::Comment, "Binding is loose"),
            &[],
        )
        .await;

    let Err(err) = result else {
        bail!("note accepted despite storage failure");
    };
    ensure!(err.kind() == ErrorKind::Persistence, "kind {:?}", err.kind());
    Ok(())
}
