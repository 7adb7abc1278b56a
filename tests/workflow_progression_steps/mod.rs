//! Step definitions for workflow progression BDD scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
