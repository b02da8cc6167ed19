//! API service settings

use common::settings;
use config::ConfigError;
use serde::Deserialize;

const DEFAULTS: &[(&str, &str)] = &[("bind_address", "0.0.0.0:3001")];

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    pub bind_address: String,
}

impl ApiSettings {
    /// Load from defaults and `SHEBA_*` environment variables
    pub fn load() -> Result<Self, ConfigError> {
        settings::load(DEFAULTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_bind_address_override() {
        unsafe {
            std::env::set_var("SHEBA_BIND_ADDRESS", "127.0.0.1:8081");
        }

        assert_eq!(ApiSettings::load().unwrap().bind_address, "127.0.0.1:8081");

        unsafe {
            std::env::remove_var("SHEBA_BIND_ADDRESS");
        }
        assert_eq!(ApiSettings::load().unwrap().bind_address, "0.0.0.0:3001");
    }
}
