//! Home-service marketplace core
//!
//! Domain models, the identity and data boundary traits, and the workflows
//! the HTTP services drive: role-specific sign-in, booking creation, admin
//! approval, provider catalogue management and booking status changes.
//!
//! # Example
//!
//! ```rust,ignore
//! use marketplace::models::{Role, RolePolicy};
//! use marketplace::workflows::sign_in;
//!
//! let outcome = sign_in(&identity, Role::Client, &credentials, RolePolicy::SelfAssign).await?;
//! println!("go to {}", outcome.redirect_to);
//! ```

pub mod error;
pub mod models;
pub mod ports;
pub mod workflows;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{MarketplaceError, MarketplaceResult};
