//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration, login and bearer-token sessions
//! - `medications` - Ownership-checked medication CRUD
//! - `shipments` - Ownership-checked shipment CRUD with medication re-checks
//! - `weight` - Weight records, goal snapshot and progress statistics
//! - `profile` - Reading and updating the caller's profile
//!
//! Record services share one contract: a lookup by id is not scoped to the
//! caller, then [`ensure_owner`] turns a missing record into `NotFound` and a
//! foreign one into `Forbidden`. There is no transaction around the lookup and
//! the write, so a concurrent delete surfaces as a second `NotFound`.

pub mod auth;
pub mod medications;
pub mod profile;
pub mod shipments;
pub mod weight;

use std::fmt;

use thiserror::Error;

use patient_dashboard_core::UserId;

pub use auth::{AuthError, AuthService, Session, SessionCache};
pub use medications::MedicationService;
pub use profile::ProfileService;
pub use shipments::ShipmentService;
pub use weight::WeightService;

use crate::db::RepositoryError;
use crate::models::{Entity, Owned};

/// What the caller attempted on a record they do not own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Access,
    Update,
    Delete,
    /// Referencing a medication from a new shipment.
    CreateShipmentFor,
    /// Re-pointing an existing shipment at a medication.
    UpdateShipmentWith,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::CreateShipmentFor => write!(f, "create shipment for"),
            Self::UpdateShipmentWith => write!(f, "update shipment with"),
        }
    }
}

/// Errors from the record services.
///
/// Display strings are client-safe and used verbatim as response messages,
/// except for `Repository`.
#[derive(Debug, Error)]
pub enum RecordError {
    /// No record with that id.
    #[error("{0} not found")]
    NotFound(Entity),

    /// The record exists but belongs to someone else.
    #[error("Not authorized to {action} this {}", .entity.noun())]
    Forbidden { entity: Entity, action: Action },

    /// The payload is missing or has an invalid field.
    #[error("{0}")]
    Validation(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Resolve a by-id lookup into a record the caller owns.
///
/// # Errors
///
/// Returns `RecordError::NotFound` if `record` is `None`.
/// Returns `RecordError::Forbidden` if it belongs to another user.
pub fn ensure_owner<T: Owned>(
    record: Option<T>,
    caller: UserId,
    action: Action,
) -> Result<T, RecordError> {
    let record = record.ok_or(RecordError::NotFound(T::ENTITY))?;
    if record.owner() != caller {
        return Err(RecordError::Forbidden {
            entity: T::ENTITY,
            action,
        });
    }
    Ok(record)
}

/// A required field, or a validation error carrying `message`.
fn required<T>(value: Option<T>, message: &str) -> Result<T, RecordError> {
    value.ok_or_else(|| RecordError::Validation(message.to_owned()))
}

/// A required text field; blank counts as missing.
fn required_text(value: Option<String>, message: &str) -> Result<String, RecordError> {
    let value = value.filter(|v| !v.trim().is_empty());
    required(value, message)
}

/// Reject a present-but-blank text field on update.
fn not_blank(value: Option<&str>, message: &str) -> Result<(), RecordError> {
    if value.is_some_and(|v| v.trim().is_empty()) {
        return Err(RecordError::Validation(message.to_owned()));
    }
    Ok(())
}
