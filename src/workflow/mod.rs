//! Workflow progression bounded context.
//!
//! The step graph and problem catalog are loaded once and shared read-only.
//! Projects and notes are read and written through ports on every call; no
//! project state is cached between operations.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
