//! Authenticated principals and the role hierarchy.
//!
//! A [`Principal`] is resolved once per request by the API layer and passed explicitly into
//! every service call. Roles are totally ordered; a check for "at least X" admits X and every
//! role above it.

use crate::error::{IntakeError, IntakeResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Authorisation level of a user, lowest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(rename = "pesquisador")]
    Researcher,
    Supervisor,
    #[serde(rename = "administrador")]
    Administrator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Researcher => "pesquisador",
            Role::Supervisor => "supervisor",
            Role::Administrator => "administrador",
        }
    }

    /// Whether this role meets a minimum required role.
    pub fn satisfies(&self, required: Role) -> bool {
        *self >= required
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pesquisador" | "researcher" => Ok(Role::Researcher),
            "supervisor" => Ok(Role::Supervisor),
            "administrador" | "administrator" | "admin" => Ok(Role::Administrator),
            other => Err(IntakeError::InvalidInput(format!("unknown role: {other}"))),
        }
    }
}

/// The authenticated caller of an operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

impl Principal {
    /// Fails with [`IntakeError::Forbidden`] unless the principal holds at least `required`.
    pub fn require(&self, required: Role) -> IntakeResult<()> {
        if self.role.satisfies(required) {
            Ok(())
        } else {
            Err(IntakeError::Forbidden {
                required,
                actual: self.role,
            })
        }
    }
}
