//! Bearer token storage.
//!
//! Only the SHA-256 digest of a token is stored; the plaintext never
//! reaches the database.

use chrono::{DateTime, Utc};

use patient_dashboard_core::{Email, UserId};

use super::memory::StoredSession;
use super::{RepositoryError, Store};
use crate::models::CurrentUser;

/// Session joined with its user.
#[derive(Debug, sqlx::FromRow)]
struct SessionUserRow {
    id: i32,
    name: String,
    email: String,
    expires_at: DateTime<Utc>,
}

impl SessionUserRow {
    fn into_session(self) -> Result<(CurrentUser, DateTime<Utc>), RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let user = CurrentUser {
            id: UserId::new(self.id),
            name: self.name,
            email,
        };
        Ok((user, self.expires_at))
    }
}

/// Repository for session token operations.
pub struct SessionRepository<'a> {
    store: &'a Store,
}

impl<'a> SessionRepository<'a> {
    /// Create a new session repository.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Store a token digest for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        token_hash: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        match self.store {
            Store::Postgres(pool) => {
                sqlx::query(
                    "INSERT INTO dashboard.session_token (token_hash, user_id, expires_at) \
                     VALUES ($1, $2, $3)",
                )
                .bind(token_hash)
                .bind(user_id)
                .bind(expires_at)
                .execute(pool)
                .await?;
                Ok(())
            }
            Store::Memory(mem) => {
                mem.sessions.lock().await.insert(
                    token_hash.to_owned(),
                    StoredSession {
                        user_id,
                        expires_at,
                    },
                );
                Ok(())
            }
        }
    }

    /// Resolve an unexpired token digest to its user.
    ///
    /// Returns `None` for unknown or expired tokens and for tokens whose user
    /// has been removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<(CurrentUser, DateTime<Utc>)>, RepositoryError> {
        match self.store {
            Store::Postgres(pool) => {
                let row = sqlx::query_as::<_, SessionUserRow>(
                    "SELECT u.id, u.name, u.email, s.expires_at \
                     FROM dashboard.session_token s \
                     JOIN dashboard.user u ON u.id = s.user_id \
                     WHERE s.token_hash = $1 AND s.expires_at > $2",
                )
                .bind(token_hash)
                .bind(now)
                .fetch_optional(pool)
                .await?;

                row.map(SessionUserRow::into_session).transpose()
            }
            Store::Memory(mem) => {
                let users = mem.users.lock().await;
                let sessions = mem.sessions.lock().await;
                let Some(session) = sessions.get(token_hash).filter(|s| s.expires_at > now)
                else {
                    return Ok(None);
                };
                Ok(users.get(&session.user_id).map(|stored| {
                    (
                        CurrentUser {
                            id: stored.user.id,
                            name: stored.user.name.clone(),
                            email: stored.user.email.clone(),
                        },
                        session.expires_at,
                    )
                }))
            }
        }
    }

    /// Remove a token digest. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, token_hash: &str) -> Result<bool, RepositoryError> {
        match self.store {
            Store::Postgres(pool) => {
                let result = sqlx::query("DELETE FROM dashboard.session_token WHERE token_hash = $1")
                    .bind(token_hash)
                    .execute(pool)
                    .await?;
                Ok(result.rows_affected() > 0)
            }
            Store::Memory(mem) => Ok(mem.sessions.lock().await.remove(token_hash).is_some()),
        }
    }

    /// Drop every expired token. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        match self.store {
            Store::Postgres(pool) => {
                let result = sqlx::query("DELETE FROM dashboard.session_token WHERE expires_at <= $1")
                    .bind(now)
                    .execute(pool)
                    .await?;
                Ok(result.rows_affected())
            }
            Store::Memory(mem) => {
                let mut sessions = mem.sessions.lock().await;
                let before = sessions.len();
                sessions.retain(|_, s| s.expires_at > now);
                Ok((before - sessions.len()) as u64)
            }
        }
    }
}
