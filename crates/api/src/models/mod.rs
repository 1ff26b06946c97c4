//! Domain models for the API.
//!
//! Output types serialize with camelCase keys. Input types are all-optional
//! so the same shape serves create (presence checked in the service layer)
//! and partial update (absent fields keep their value).

pub mod dates;
pub mod medication;
pub mod session;
pub mod shipment;
pub mod user;
pub mod weight;

use std::fmt;

use patient_dashboard_core::UserId;

pub use medication::{Medication, MedicationFilter, MedicationInput, NewMedication};
pub use session::{CurrentUser, IssuedToken};
pub use shipment::{
    MedicationSummary, NewShipment, Shipment, ShipmentFilter, ShipmentInput, ShipmentView,
};
pub use user::{Address, Profile, ProfileUpdate, User};
pub use weight::{GoalsInput, NewWeightRecord, WeightInput, WeightRecord};

/// Kinds of records, for error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Medication,
    Shipment,
    WeightRecord,
}

impl Entity {
    /// Lowercase noun used inside sentences.
    #[must_use]
    pub const fn noun(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Medication => "medication",
            Self::Shipment => "shipment",
            Self::WeightRecord => "weight record",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "User"),
            Self::Medication => write!(f, "Medication"),
            Self::Shipment => write!(f, "Shipment"),
            Self::WeightRecord => write!(f, "Weight record"),
        }
    }
}

/// A record with exactly one owning user.
pub trait Owned {
    /// Which kind of record this is, for error messages.
    const ENTITY: Entity;

    /// The user allowed to read and write this record.
    fn owner(&self) -> UserId;
}
