use serde::{Deserialize, Serialize};

/// Principal classification used by every authorization check.
///
/// Levels are stable wire values: -1 admin, 0 leadership, 1 command center,
/// 2 department head, 3 security officer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Leadership,
    CommandCenter,
    DepartmentHead,
    Officer,
}

impl Role {
    #[must_use]
    pub const fn level(self) -> i32 {
        match self {
            Self::Admin => -1,
            Self::Leadership => 0,
            Self::CommandCenter => 1,
            Self::DepartmentHead => 2,
            Self::Officer => 3,
        }
    }

    #[must_use]
    pub const fn from_level(level: i32) -> Option<Self> {
        match level {
            -1 => Some(Self::Admin),
            0 => Some(Self::Leadership),
            1 => Some(Self::CommandCenter),
            2 => Some(Self::DepartmentHead),
            3 => Some(Self::Officer),
            _ => None,
        }
    }

    /// Admin passes every role check unconditionally. This must be applied
    /// identically at every call site that takes an allowed-roles set.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Admin and leadership are granted every workflow transition.
    #[must_use]
    pub const fn overrides_workflow(self) -> bool {
        matches!(self, Self::Admin | Self::Leadership)
    }
}
