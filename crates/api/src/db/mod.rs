//! Persistence for the patient dashboard.
//!
//! # Schema: `dashboard`
//!
//! ## Tables
//!
//! - `user` - Accounts and profile attributes
//! - `user_password` - Argon2id password hashes
//! - `session_token` - SHA-256 digests of issued bearer tokens
//! - `medication` - Medications owned by a user
//! - `shipment` - Refill deliveries; `medication_id` is deliberately not a foreign key
//! - `weight_record` - Weight measurements and goal fields
//!
//! # Backends
//!
//! [`Store`] is either a `PostgreSQL` pool or a process-local [`MemoryStore`].
//! Every repository implements both with the same ordering and filtering rules.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p patient-dashboard-cli -- migrate
//! ```

pub mod medications;
pub mod memory;
pub mod sessions;
pub mod shipments;
pub mod users;
pub mod weight;

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use medications::MedicationRepository;
pub use memory::MemoryStore;
pub use sessions::SessionRepository;
pub use shipments::ShipmentRepository;
pub use users::UserRepository;
pub use weight::WeightRepository;

use crate::config::StoreConfig;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
fn conflict_on_unique(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

/// Handle to the configured persistence backend.
///
/// Cheap to clone; both variants share their underlying storage.
#[derive(Clone)]
pub enum Store {
    Postgres(PgPool),
    Memory(Arc<MemoryStore>),
}

impl Store {
    /// Open the backend described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the `PostgreSQL` pool cannot be created.
    pub async fn connect(config: &StoreConfig) -> Result<Self, sqlx::Error> {
        match config {
            StoreConfig::Postgres { database_url } => {
                Ok(Self::Postgres(create_pool(database_url).await?))
            }
            StoreConfig::Memory => Ok(Self::memory()),
        }
    }

    /// A fresh, empty in-memory store.
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(Arc::new(MemoryStore::default()))
    }

    /// Short backend name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }

    /// Check that the backend can serve queries.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if `PostgreSQL` is unreachable.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        match self {
            Self::Postgres(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
                Ok(())
            }
            Self::Memory(_) => Ok(()),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
