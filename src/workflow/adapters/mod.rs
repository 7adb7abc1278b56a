//! Adapter implementations of the workflow ports.

pub mod memory;
pub mod postgres;
