//! Session-related types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use patient_dashboard_core::{Email, UserId};

/// The user a bearer token resolved to.
///
/// Minimal identity handed to handlers by the `RequireAuth` extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's display name.
    pub name: String,
    /// User's email address.
    pub email: Email,
}

/// A freshly issued bearer token.
///
/// The plaintext exists only in this value; storage keeps its digest.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
