//! Custom error types for the common library
//!
//! This module defines infrastructure error types shared by both services.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Errors raised while verifying bearer tokens
#[derive(Error, Debug)]
pub enum TokenError {
    /// Key material could not be loaded
    #[error("Token key error: {0}")]
    Key(String),

    /// Token failed signature, expiry or shape validation
    #[error("Invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    /// Token was valid but of the wrong kind (e.g. refresh used as access)
    #[error("Unexpected token type")]
    WrongType,
}
