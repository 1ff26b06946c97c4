//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! pd-cli user create -e robin@example.com -n "Robin" -p 'a long password'
//! ```
//!
//! Goes through the same validation and hashing as `POST /api/auth/register`,
//! but issues no token.

use chrono::Duration;
use patient_dashboard_api::db::{Store, create_pool};
use patient_dashboard_api::services::{AuthError, AuthService, SessionCache};
use thiserror::Error;

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Validation or storage failure.
    #[error("{0}")]
    Auth(#[from] AuthError),
}

/// Create a new user.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns `UserError::Auth` for invalid input or a duplicate email.
pub async fn create(email: &str, name: &str, password: &str) -> Result<i32, UserError> {
    let database_url = super::database_url().ok_or(UserError::MissingEnvVar("PD_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let store = Store::Postgres(create_pool(&database_url).await?);

    // No token is issued, so the lifetime is never used
    let cache = SessionCache::default();
    let user = AuthService::new(&store, &cache, Duration::zero())
        .create_user(name, email, password)
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );

    Ok(user.id.into())
}
