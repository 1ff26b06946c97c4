//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::db::Store;
use crate::services::{AuthService, SessionCache};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    store: Store,
    sessions: SessionCache,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: ApiConfig, store: Store) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                sessions: SessionCache::default(),
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the persistence backend.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    /// Get a reference to the token lookup cache.
    #[must_use]
    pub fn sessions(&self) -> &SessionCache {
        &self.inner.sessions
    }

    /// An authentication service over this state.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.store(), self.sessions(), self.config().token_ttl())
    }
}
