//! Staff members acting on projects.

use super::{ParseWorkflowValueError, StaffMemberId};
use serde::{Deserialize, Serialize};

/// Role of a staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    /// Student worker.
    Student,
    /// Regular staff.
    Staff,
    /// Supervisor; may claim any step.
    Supervisor,
    /// Administrator; may claim any step.
    Admin,
}

impl StaffRole {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Staff => "staff",
            Self::Supervisor => "supervisor",
            Self::Admin => "admin",
        }
    }

    /// Returns whether the role bypasses owner-policy claim checks.
    #[must_use]
    pub const fn overrides_owner_policy(self) -> bool {
        matches!(self, Self::Supervisor | Self::Admin)
    }
}

impl TryFrom<&str> for StaffRole {
    type Error = ParseWorkflowValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "staff" => Ok(Self::Staff),
            "supervisor" => Ok(Self::Supervisor),
            "admin" => Ok(Self::Admin),
            _ => Err(ParseWorkflowValueError::new("staff role", value)),
        }
    }
}

/// Staff member asking to take ownership of a project step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claimant {
    /// Staff member identifier.
    pub staff_member_id: StaffMemberId,
    /// Role of the staff member.
    pub role: StaffRole,
}

impl Claimant {
    /// Creates a claimant.
    #[must_use]
    pub const fn new(staff_member_id: StaffMemberId, role: StaffRole) -> Self {
        Self {
            staff_member_id,
            role,
        }
    }
}
