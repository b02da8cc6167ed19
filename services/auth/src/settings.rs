//! Identity service settings

use common::settings;
use config::ConfigError;
use marketplace::models::RolePolicy;
use serde::Deserialize;

use crate::rate_limiter::RateLimiterConfig;

const DEFAULTS: &[(&str, &str)] = &[
    ("bind_address", "0.0.0.0:3000"),
    ("role_policy", "self_assign"),
    ("event_buffer", "64"),
    ("rate_limit.max_attempts", "5"),
    ("rate_limit.window_seconds", "300"),
    ("rate_limit.ban_duration_seconds", "3600"),
];

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub bind_address: String,
    /// What sign-in does when the stored role differs from the portal
    pub role_policy: RolePolicy,
    /// Capacity of the session event channel
    pub event_buffer: usize,
    pub rate_limit: RateLimiterConfig,
}

impl AuthSettings {
    /// Load from defaults and `SHEBA_*` environment variables
    pub fn load() -> Result<Self, ConfigError> {
        settings::load(DEFAULTS)
    }
}
