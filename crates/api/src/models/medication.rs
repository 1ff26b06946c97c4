//! Medication domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use patient_dashboard_core::{MedicationId, UserId};

use super::{Entity, Owned, dates};

/// A medication the user takes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: MedicationId,
    #[serde(rename = "user")]
    pub user_id: UserId,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for Medication {
    const ENTITY: Entity = Entity::Medication;

    fn owner(&self) -> UserId {
        self.user_id
    }
}

impl Medication {
    /// Merge a partial update; absent fields keep their value.
    pub fn apply(&mut self, input: MedicationInput) {
        if let Some(name) = input.name {
            self.name = name.trim().to_string();
        }
        if let Some(dosage) = input.dosage {
            self.dosage = dosage;
        }
        if let Some(frequency) = input.frequency {
            self.frequency = frequency;
        }
        if let Some(start_date) = input.start_date {
            self.start_date = start_date;
        }
        if input.end_date.is_some() {
            self.end_date = input.end_date;
        }
        if let Some(active) = input.active {
            self.active = active;
        }
        if input.notes.is_some() {
            self.notes = input.notes;
        }
    }
}

/// A validated medication ready to insert.
#[derive(Debug, Clone)]
pub struct NewMedication {
    pub user_id: UserId,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub active: bool,
    pub notes: Option<String>,
}

/// Request body for creating or updating a medication.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationInput {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    #[serde(default, deserialize_with = "dates::optional_datetime")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "dates::optional_datetime")]
    pub end_date: Option<DateTime<Utc>>,
    pub active: Option<bool>,
    pub notes: Option<String>,
}

/// Query parameters for `GET /api/medications`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MedicationFilter {
    /// Only active (or only inactive) medications.
    pub active: Option<bool>,
    /// Case-insensitive substring of the name.
    pub q: Option<String>,
}

impl MedicationFilter {
    /// The search term, lowercased, if it is non-blank.
    #[must_use]
    pub fn needle(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    /// Whether `medication` passes the filter.
    #[must_use]
    pub fn matches(&self, medication: &Medication) -> bool {
        if self.active.is_some_and(|active| active != medication.active) {
            return false;
        }
        self.needle()
            .is_none_or(|needle| medication.name.to_lowercase().contains(&needle))
    }
}
