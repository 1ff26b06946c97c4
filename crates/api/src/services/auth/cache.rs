//! Short-lived cache of resolved bearer tokens.
//!
//! Keyed by token digest. Entries expire after a fixed TTL or when the
//! session itself expires, whichever comes first, and are dropped on logout.

use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;

use crate::models::CurrentUser;

/// How long a resolved token is trusted without a store lookup.
const CACHE_TTL: Duration = Duration::from_secs(60);

const CACHE_CAPACITY: u64 = 10_000;

/// A resolved bearer token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: CurrentUser,
    pub expires_at: DateTime<Utc>,
}

/// In-process token cache shared through `AppState`.
#[derive(Clone)]
pub struct SessionCache {
    sessions: Cache<String, Session>,
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new(CACHE_TTL)
    }
}

impl SessionCache {
    /// Create a cache whose entries live at most `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let sessions = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(ttl)
            .build();
        Self { sessions }
    }

    /// A cached session that has not expired at `now`.
    pub async fn get(&self, token_hash: &str, now: DateTime<Utc>) -> Option<Session> {
        let session = self.sessions.get(token_hash).await?;
        if session.expires_at <= now {
            self.sessions.invalidate(token_hash).await;
            return None;
        }
        Some(session)
    }

    pub async fn insert(&self, token_hash: String, session: Session) {
        self.sessions.insert(token_hash, session).await;
    }

    pub async fn invalidate(&self, token_hash: &str) {
        self.sessions.invalidate(token_hash).await;
    }
}
