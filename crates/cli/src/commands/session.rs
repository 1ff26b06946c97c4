//! Session token maintenance.
//!
//! # Usage
//!
//! ```bash
//! pd-cli session purge
//! ```
//!
//! Expired tokens are already rejected at lookup; this only reclaims rows.

use chrono::Utc;
use patient_dashboard_api::db::{RepositoryError, SessionRepository, Store, create_pool};
use thiserror::Error;

/// Errors that can occur during session maintenance.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Delete failed.
    #[error("{0}")]
    Repository(#[from] RepositoryError),
}

/// Delete every expired bearer token.
///
/// # Returns
///
/// The number of tokens removed.
///
/// # Errors
///
/// Returns `SessionError::Repository` if the delete fails.
pub async fn purge() -> Result<u64, SessionError> {
    let database_url =
        super::database_url().ok_or(SessionError::MissingEnvVar("PD_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let store = Store::Postgres(create_pool(&database_url).await?);

    let removed = SessionRepository::new(&store)
        .purge_expired(Utc::now())
        .await?;

    tracing::info!(removed, "Expired sessions purged");
    Ok(removed)
}
