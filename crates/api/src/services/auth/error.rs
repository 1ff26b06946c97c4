//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] patient_dashboard_core::EmailError),

    /// Display name missing or blank.
    #[error("Please add a name")]
    MissingName,

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Bearer token missing, unknown, revoked or expired.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Token expiry falls outside the representable date range.
    #[error("token lifetime out of range")]
    TokenLifetime,

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
