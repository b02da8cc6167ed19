//! User accounts as stored by the identity service

use chrono::{DateTime, Utc};
use marketplace::models::{Principal, Role};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::warn;
use uuid::Uuid;

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Role attribute; older accounts may have none
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Parsed role. Unknown stored values are treated as no role.
    pub fn role(&self) -> Option<Role> {
        let raw = self.role.as_deref()?;
        match raw.parse() {
            Ok(role) => Some(role),
            Err(e) => {
                warn!("User {} has unreadable role: {}", self.id, e);
                None
            }
        }
    }

    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.id,
            email: self.email.clone(),
            role: self.role(),
        }
    }
}

/// New user creation payload. The password is still in clear text here.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub role: Role,
}
