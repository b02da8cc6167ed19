//! Roles and the role assignment policy

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role attribute carried by every principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Provider,
    Client,
}

impl Role {
    /// Get the role name as stored in the identity boundary
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Provider => "provider",
            Role::Client => "client",
        }
    }

    /// Dashboard a user lands on after signing in with this role
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Admin => "/admin/dashboard",
            Role::Provider => "/provider/dashboard",
            Role::Client => "/client/dashboard",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "provider" => Ok(Role::Provider),
            "client" => Ok(Role::Client),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// What sign-in does when the portal role differs from the stored role.
///
/// `SelfAssign` rewrites the stored role to the portal role, which lets any
/// account acquire any role. It is kept as the default for compatibility
/// and every rewrite is logged at warn level. `Enforce` refuses the sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RolePolicy {
    #[default]
    SelfAssign,
    Enforce,
}
