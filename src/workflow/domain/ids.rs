//! Identifier types for the workflow domain.
//!
//! Reference data and projects are keyed by the numeric identifiers issued
//! by the surrounding tracking system. Assignments and notes are created by
//! this crate and receive random UUIDs.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wraps a raw identifier value.
            #[must_use]
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the raw identifier value.
            #[must_use]
            pub const fn value(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the wrapped UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a digitization project.
    ProjectId
);
numeric_id!(
    /// Identifier of a workflow (a fixed sequence of steps).
    WorkflowId
);
numeric_id!(
    /// Identifier of a workflow step.
    StepId
);
numeric_id!(
    /// Identifier of a staff member.
    StaffMemberId
);
numeric_id!(
    /// Identifier of a catalogued problem.
    ProblemId
);

impl ProblemId {
    /// Reserved identifier of the "other" problem used when a requested
    /// problem cannot be resolved.
    pub const OTHER: Self = Self(7);
}

uuid_id!(
    /// Identifier of one staff member's assignment to one project step.
    AssignmentId
);
uuid_id!(
    /// Identifier of a project note.
    NoteId
);
