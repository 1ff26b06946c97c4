//! Authentication service.
//!
//! Password accounts with opaque bearer tokens. A token is 32 random bytes,
//! URL-safe base64 encoded; only its SHA-256 digest is persisted.

mod cache;
mod error;

pub use cache::{Session, SessionCache};
pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{info, instrument};

use patient_dashboard_core::Email;

use crate::db::{RepositoryError, SessionRepository, Store, UserRepository};
use crate::models::{CurrentUser, IssuedToken, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Random bytes per bearer token.
const TOKEN_BYTES: usize = 32;

/// Authentication service.
///
/// Handles registration, login and bearer-token resolution.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    sessions: SessionRepository<'a>,
    cache: &'a SessionCache,
    token_ttl: Duration,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a Store, cache: &'a SessionCache, token_ttl: Duration) -> Self {
        Self {
            users: UserRepository::new(store),
            sessions: SessionRepository::new(store),
            cache,
            token_ttl,
        }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Create an account without signing it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingName` if the name is blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }

        // Validate email
        let email = Email::parse(email)?;

        // Validate password
        validate_password(password)?;

        // Hash password
        let password_hash = hash_password(password)?;

        // Create user
        let user = self
            .users
            .create_with_password(name, &email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Register a new user and issue their first token.
    ///
    /// # Errors
    ///
    /// See [`AuthService::create_user`].
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, IssuedToken), AuthError> {
        let user = self.create_user(name, email, password).await?;
        let token = self.issue_token(&user).await?;
        Ok((user, token))
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, IssuedToken), AuthError> {
        // Validate email format
        let email = Email::parse(email)?;

        // Get user with password hash
        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        // Verify password
        verify_password(password, &password_hash)?;

        let token = self.issue_token(&user).await?;
        info!(user_id = %user.id, "User logged in");
        Ok((user, token))
    }

    // =========================================================================
    // Bearer Tokens
    // =========================================================================

    /// Resolve a presented bearer token to its user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is unknown or expired.
    pub async fn authenticate(&self, token: &str) -> Result<CurrentUser, AuthError> {
        let now = Utc::now();
        let digest = token_digest(token);

        if let Some(session) = self.cache.get(&digest, now).await {
            return Ok(session.user);
        }

        let (user, expires_at) = self
            .sessions
            .find(&digest, now)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        self.cache
            .insert(
                digest,
                Session {
                    user: user.clone(),
                    expires_at,
                },
            )
            .await;

        Ok(user)
    }

    /// Revoke a bearer token. Unknown tokens are ignored.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the store fails.
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        let digest = token_digest(token);
        self.cache.invalidate(&digest).await;
        if self.sessions.delete(&digest).await? {
            info!("Session revoked");
        }
        Ok(())
    }

    async fn issue_token(&self, user: &User) -> Result<IssuedToken, AuthError> {
        let expires_at = Utc::now()
            .checked_add_signed(self.token_ttl)
            .ok_or(AuthError::TokenLifetime)?;
        let token = generate_token();

        self.sessions
            .create(&token_digest(&token), user.id, expires_at)
            .await?;

        Ok(IssuedToken { token, expires_at })
    }
}

/// Generate a fresh opaque token.
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex SHA-256 of a token, as stored.
fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::PasswordHash)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
