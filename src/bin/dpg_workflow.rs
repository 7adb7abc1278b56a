//! Command-line front end for the workflow progression engine.
//!
//! Usage:
//!
//! ```text
//! dpg-workflow [--config <path>] <command> [options]
//! ```
//!
//! Each invocation loads settings, connects to `PostgreSQL`, reads the step
//! graph and problem catalog once, runs a single operation, and prints the
//! resulting records as JSON on stdout. Logs go to stderr.

use clap::{Parser, Subcommand};
use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use dpg_workflow::{
    config::{Settings, SettingsError},
    logging::init_tracing,
    workflow::{
        adapters::{
            memory::AcceptingStepCompletion,
            postgres::{
                PostgresNoteRepository, PostgresProjectRepository, PostgresReferenceData,
                WorkflowPgPool,
            },
        },
        domain::{
            Claimant, NoteDraft, NoteType, ProblemId, ProjectId, StaffMemberId, StaffRole, StepId,
        },
        services::{
            AnnotationError, AnnotationService, FinishOutcome, OwnershipError, OwnershipService,
            ProjectLocks, ReferenceLoadError, TransitionEngine, TransitionError, WorkflowReference,
        },
    },
};
use mockable::DefaultClock;
use serde_json::{Value, json};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Builder;
use tracing::error;

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("failed to initialise logging: {0}")]
    Logging(#[source] BoxError),
    #[error("runtime init failed: {0}")]
    Runtime(#[source] io::Error),
    #[error("failed to connect to the database: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error(transparent)]
    Reference(#[from] ReferenceLoadError),
    #[error("{kind}: {0}", kind = .0.kind())]
    Transition(#[from] TransitionError),
    #[error("{kind}: {0}", kind = .0.kind())]
    Annotation(#[from] AnnotationError),
    #[error("{kind}: {0}", kind = .0.kind())]
    Ownership(#[from] OwnershipError),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Drives digitization projects through their workflow.
#[derive(Debug, Parser)]
#[command(name = "dpg-workflow", version, about)]
struct Cli {
    /// TOML settings file layered over the defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the active assignment of a project.
    Start {
        #[arg(long)]
        project: u64,
    },
    /// Finish the current step and advance the project.
    Finish {
        #[arg(long)]
        project: u64,
        /// Minutes spent; 0 keeps any previously recorded duration.
        #[arg(long, default_value_t = 0)]
        minutes: u32,
    },
    /// Flag the current step with a problem.
    Fail {
        #[arg(long)]
        project: u64,
        /// Problem name or label; unknown names map to "other".
        #[arg(long)]
        problem: String,
        #[arg(long)]
        message: String,
    },
    /// Send the project back to the current step's failure step.
    Reject {
        #[arg(long)]
        project: u64,
        #[arg(long, default_value_t = 0)]
        minutes: u32,
    },
    /// Claim the current step for a staff member.
    Claim {
        #[arg(long)]
        project: u64,
        #[arg(long)]
        staff: u64,
        #[arg(long, default_value = "staff", value_parser = parse_role)]
        role: StaffRole,
    },
    /// Release the current owner's assignment.
    Release {
        #[arg(long)]
        project: u64,
    },
    /// Add a note and print the project's note feed.
    Note {
        #[arg(long)]
        project: u64,
        #[arg(long)]
        step: u64,
        #[arg(long)]
        staff: Option<u64>,
        #[arg(long = "type", default_value = "comment", value_parser = parse_note_type)]
        note_type: NoteType,
        #[arg(long)]
        text: String,
        /// Problem identifier to link; repeat for several.
        #[arg(long = "problem")]
        problems: Vec<u64>,
    },
    /// Print the project's note feed.
    Notes {
        #[arg(long)]
        project: u64,
    },
}

fn parse_role(value: &str) -> Result<StaffRole, String> {
    StaffRole::try_from(value).map_err(|err| err.to_string())
}

fn parse_note_type(value: &str) -> Result<NoteType, String> {
    NoteType::try_from(value).map_err(|err| err.to_string())
}

struct Services {
    engine: TransitionEngine<
        PostgresProjectRepository,
        PostgresNoteRepository,
        AcceptingStepCompletion,
        DefaultClock,
    >,
    ownership: OwnershipService<PostgresProjectRepository, PostgresNoteRepository, DefaultClock>,
    annotations: AnnotationService<PostgresProjectRepository, PostgresNoteRepository, DefaultClock>,
}

impl Services {
    async fn connect(pool: WorkflowPgPool) -> Result<Self, CliError> {
        let reference = WorkflowReference::load(&PostgresReferenceData::new(pool.clone())).await?;
        let projects = Arc::new(PostgresProjectRepository::new(pool.clone()));
        let notes = Arc::new(PostgresNoteRepository::new(pool));
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
            annotations: AnnotationService::new(projects, notes, reference, clock),
        })
    }

    async fn run(&self, command: Command) -> Result<Value, CliError> {
        let output = match command {
            Command::Start { project } => {
                let started = self
                    .engine
                    .start_active_assignment(ProjectId::new(project))
                    .await?;
                json!({ "project": started })
            }
            Command::Finish { project, minutes } => {
                let outcome = self.engine.finish_step(ProjectId::new(project), minutes).await?;
                finish_output(&outcome)
            }
            Command::Fail {
                project,
                problem,
                message,
            } => {
                let failed = self
                    .engine
                    .fail_step(ProjectId::new(project), &problem, &message)
                    .await?;
                json!({ "project": failed.project, "note": failed.note })
            }
            Command::Reject { project, minutes } => {
                let rejected = self.engine.reject_step(ProjectId::new(project), minutes).await?;
                json!({ "project": rejected })
            }
            Command::Claim {
                project,
                staff,
                role,
            } => {
                let claimant = Claimant::new(StaffMemberId::new(staff), role);
                let claimed = self
                    .ownership
                    .claim_step(ProjectId::new(project), claimant)
                    .await?;
                json!({ "project": claimed.project, "outcome": format!("{:?}", claimed.outcome) })
            }
            Command::Release { project } => {
                let released = self.ownership.release_step(ProjectId::new(project)).await?;
                json!({ "project": released.project, "note": released.note })
            }
            Command::Note {
                project,
                step,
                staff,
                note_type,
                text,
                problems,
            } => {
                let draft = NoteDraft::new(
                    StepId::new(step),
                    staff.map(StaffMemberId::new),
                    note_type,
                    text,
                );
                let problem_ids: Vec<ProblemId> = problems.into_iter().map(ProblemId::new).collect();
                let feed = self
                    .annotations
                    .add_note(ProjectId::new(project), draft, &problem_ids)
                    .await?;
                json!({ "notes": feed })
            }
            Command::Notes { project } => {
                let feed = self.annotations.list_notes(ProjectId::new(project)).await?;
                json!({ "notes": feed })
            }
        };
        Ok(output)
    }
}

fn finish_output(outcome: &FinishOutcome) -> Value {
    match outcome {
        FinishOutcome::Advanced(project) => json!({ "outcome": "advanced", "project": project }),
        FinishOutcome::Completed(project) => json!({ "outcome": "completed", "project": project }),
        FinishOutcome::Parked { project, note } => {
            json!({ "outcome": "parked", "project": project, "note": note })
        }
    }
}

/// Builds the pool outside the runtime; r2d2 blocks until its initial
/// connections are open.
fn connect_pool(settings: &Settings) -> Result<WorkflowPgPool, CliError> {
    let pool = Pool::builder()
        .max_size(settings.database.max_connections)
        .connection_timeout(Duration::from_secs(settings.database.connect_timeout_secs))
        .build(ConnectionManager::<PgConnection>::new(&settings.database.url))?;
    Ok(pool)
}

fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    run(cli).map_err(|err| {
        error!(error = %err, "command failed");
        err.into()
    })
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = Settings::load(cli.config.as_deref())?;
    init_tracing(&settings.logging).map_err(CliError::Logging)?;
    let pool = connect_pool(&settings)?;
    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let output = runtime.block_on(async {
        let services = Services::connect(pool).await?;
        services.run(cli.command).await
    })?;

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &output)?;
    writeln!(stdout)?;
    Ok(())
}
