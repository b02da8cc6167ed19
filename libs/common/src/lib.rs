//! Common library for the Sheba marketplace services
//!
//! This crate provides shared functionality used by the identity and
//! marketplace services: database connectivity and migrations, the Redis
//! session cache, settings loading, tracing setup and bearer-token
//! verification.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, init_pool, health_check};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let pool = init_pool(&config).await?;
//!     let is_healthy = health_check(&pool).await?;
//!     println!("Database health check: {}", is_healthy);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod database;
pub mod error;
pub mod settings;
pub mod telemetry;
pub mod token;
