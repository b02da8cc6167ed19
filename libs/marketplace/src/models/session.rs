//! Sessions, principals and session-change events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;

/// Email/password pair submitted to a sign-in or sign-up form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Authenticated account as known to the identity boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    /// Absent for accounts created before roles were recorded
    pub role: Option<Role>,
}

/// Bearer tokens handed to the client after sign-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Result of a successful sign-in or sign-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub principal: Principal,
    pub tokens: TokenPair,
}

/// Request-scoped session context passed to every workflow call
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl Session {
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}

/// Kind of session change published by the identity boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEventKind {
    SignedUp,
    SignedIn,
    SignedOut,
    RoleUpdated,
}

/// Session change notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    pub kind: SessionEventKind,
    pub user_id: Uuid,
    pub role: Option<Role>,
    pub at: DateTime<Utc>,
}

impl SessionEvent {
    pub fn new(kind: SessionEventKind, user_id: Uuid, role: Option<Role>) -> Self {
        Self {
            kind,
            user_id,
            role,
            at: Utc::now(),
        }
    }
}
