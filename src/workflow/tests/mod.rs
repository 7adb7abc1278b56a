//! Unit tests for the workflow bounded context.

mod persistence_failure_tests;
