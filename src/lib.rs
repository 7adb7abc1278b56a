//! Project workflow progression engine for a digitization production line.
//!
//! Projects move through a fixed graph of steps. Each step is worked by a
//! staff member under an assignment; finishing a step advances the project
//! and hands the next step to an owner chosen by that step's policy.
//! Failures park the project on its step with a problem note.
//!
//! # Architecture
//!
//! The [`workflow`] bounded context follows hexagonal architecture:
//!
//! - **Domain**: projects, assignments, steps, notes, and problems
//! - **Ports**: repository and completion traits
//! - **Adapters**: in-memory and `PostgreSQL` implementations
//! - **Services**: the transition engine and its collaborators
//!
//! [`config`] and [`logging`] provide the runtime settings and tracing setup
//! used by the `dpg-workflow` binary.

pub mod config;
pub mod logging;
pub mod workflow;
