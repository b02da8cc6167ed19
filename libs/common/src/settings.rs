//! Layered settings loader
//!
//! Services describe their settings as a `serde` struct. Values come from
//! code defaults overlaid with `SHEBA_*` environment variables; nested keys
//! use a double underscore (`SHEBA_RATE_LIMIT__MAX_ATTEMPTS`).

use config::{Config, ConfigError, Environment};
use serde::de::DeserializeOwned;

/// Environment variable prefix for service settings
pub const ENV_PREFIX: &str = "SHEBA";

/// Load settings of type `T` from defaults and the environment
pub fn load<T: DeserializeOwned>(defaults: &[(&str, &str)]) -> Result<T, ConfigError> {
    let mut builder = Config::builder();
    for (key, value) in defaults {
        builder = builder.set_default(*key, *value)?;
    }

    builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serial_test::serial;

    #[derive(Debug, Deserialize)]
    struct Sample {
        bind_address: String,
        rate_limit: Limits,
    }

    #[derive(Debug, Deserialize)]
    struct Limits {
        max_attempts: u32,
    }

    const DEFAULTS: &[(&str, &str)] = &[
        ("bind_address", "0.0.0.0:3000"),
        ("rate_limit.max_attempts", "5"),
    ];

    #[test]
    #[serial]
    fn test_defaults_are_used() {
        unsafe {
            std::env::remove_var("SHEBA_BIND_ADDRESS");
            std::env::remove_var("SHEBA_RATE_LIMIT__MAX_ATTEMPTS");
        }

        let sample: Sample = load(DEFAULTS).unwrap();
        assert_eq!(sample.bind_address, "0.0.0.0:3000");
        assert_eq!(sample.rate_limit.max_attempts, 5);
    }

    #[test]
    #[serial]
    fn test_environment_overrides_defaults() {
        unsafe {
            std::env::set_var("SHEBA_BIND_ADDRESS", "127.0.0.1:9000");
            std::env::set_var("SHEBA_RATE_LIMIT__MAX_ATTEMPTS", "12");
        }

        let sample: Sample = load(DEFAULTS).unwrap();
        assert_eq!(sample.bind_address, "127.0.0.1:9000");
        assert_eq!(sample.rate_limit.max_attempts, 12);

        unsafe {
            std::env::remove_var("SHEBA_BIND_ADDRESS");
            std::env::remove_var("SHEBA_RATE_LIMIT__MAX_ATTEMPTS");
        }
    }
}
