//! Error type shared by the marketplace workflows

use thiserror::Error;
use uuid::Uuid;

use crate::models::{BookingStatus, Role};

/// Errors raised by the marketplace workflows and boundaries
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketplaceError {
    /// No authenticated session accompanies the request
    #[error("Please sign in to continue")]
    Unauthenticated,

    /// A required form field is missing or malformed
    #[error("{0}")]
    Validation(String),

    /// The provider query returned no rows
    #[error("No providers available at the moment")]
    NoProvidersAvailable,

    /// The service does not exist or is not visible to clients
    #[error("Service {0} not found")]
    ServiceNotFound(Uuid),

    /// The booking does not exist
    #[error("Booking {0} not found")]
    BookingNotFound(Uuid),

    /// The booking state machine refuses the transition
    #[error("Cannot move booking from {from} to {to}")]
    InvalidTransition { from: BookingStatus, to: BookingStatus },

    /// The caller does not own the resource or lacks the role
    #[error("Not allowed")]
    Forbidden,

    /// Sign-in through a portal that does not match the stored role
    #[error("This account is registered as {actual}, not {portal}")]
    RoleMismatch { portal: Role, actual: Role },

    /// Error reported by the identity boundary, surfaced verbatim
    #[error("{0}")]
    Identity(String),

    /// Error reported by the data boundary, surfaced verbatim
    #[error("{0}")]
    Store(String),
}

/// Type alias for Result with MarketplaceError
pub type MarketplaceResult<T> = Result<T, MarketplaceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_messages_are_surfaced_verbatim() {
        let err = MarketplaceError::Store("duplicate key value violates unique constraint".into());
        assert_eq!(
            err.to_string(),
            "duplicate key value violates unique constraint"
        );

        let err = MarketplaceError::Identity("Invalid login credentials".into());
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[test]
    fn no_providers_message() {
        assert_eq!(
            MarketplaceError::NoProvidersAvailable.to_string(),
            "No providers available at the moment"
        );
    }
}
