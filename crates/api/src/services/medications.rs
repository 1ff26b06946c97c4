//! Medication service.

use chrono::Utc;
use tracing::{debug, instrument};

use patient_dashboard_core::{MedicationId, UserId};

use super::{Action, RecordError, ensure_owner, not_blank, required_text};
use crate::db::{MedicationRepository, Store};
use crate::models::{Entity, Medication, MedicationFilter, MedicationInput, NewMedication};

const NAME_REQUIRED: &str = "Please add a medication name";
const DOSAGE_REQUIRED: &str = "Please add a dosage";
const FREQUENCY_REQUIRED: &str = "Please add a frequency";

/// Ownership-checked medication operations.
pub struct MedicationService<'a> {
    medications: MedicationRepository<'a>,
}

impl<'a> MedicationService<'a> {
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self {
            medications: MedicationRepository::new(store),
        }
    }

    /// The caller's medications, newest start date first.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        owner: UserId,
        filter: &MedicationFilter,
    ) -> Result<Vec<Medication>, RecordError> {
        Ok(self.medications.list(owner, filter).await?)
    }

    /// One of the caller's medications.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::NotFound` or `RecordError::Forbidden`.
    #[instrument(skip(self))]
    pub async fn get(&self, id: MedicationId, owner: UserId) -> Result<Medication, RecordError> {
        ensure_owner(self.medications.get(id).await?, owner, Action::Access)
    }

    /// Create a medication owned by the caller.
    ///
    /// `startDate` defaults to now and `active` to true.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Validation` if name, dosage or frequency is missing.
    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        owner: UserId,
        input: MedicationInput,
    ) -> Result<Medication, RecordError> {
        let name = required_text(input.name, NAME_REQUIRED)?;
        let dosage = required_text(input.dosage, DOSAGE_REQUIRED)?;
        let frequency = required_text(input.frequency, FREQUENCY_REQUIRED)?;

        let medication = self
            .medications
            .create(NewMedication {
                user_id: owner,
                name: name.trim().to_owned(),
                dosage,
                frequency,
                start_date: input.start_date.unwrap_or_else(Utc::now),
                end_date: input.end_date,
                active: input.active.unwrap_or(true),
                notes: input.notes,
            })
            .await?;

        debug!(medication_id = %medication.id, "Medication created");
        Ok(medication)
    }

    /// Merge a partial update into one of the caller's medications.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::NotFound`, `RecordError::Forbidden`, or
    /// `RecordError::Validation` if a required field is blanked.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: MedicationId,
        owner: UserId,
        input: MedicationInput,
    ) -> Result<Medication, RecordError> {
        let mut medication = ensure_owner(self.medications.get(id).await?, owner, Action::Update)?;

        not_blank(input.name.as_deref(), NAME_REQUIRED)?;
        not_blank(input.dosage.as_deref(), DOSAGE_REQUIRED)?;
        not_blank(input.frequency.as_deref(), FREQUENCY_REQUIRED)?;
        medication.apply(input);

        self.medications
            .update(&medication)
            .await?
            .ok_or(RecordError::NotFound(Entity::Medication))
    }

    /// Delete one of the caller's medications.
    ///
    /// Shipments that reference it are kept.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::NotFound` or `RecordError::Forbidden`.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: MedicationId, owner: UserId) -> Result<(), RecordError> {
        ensure_owner(self.medications.get(id).await?, owner, Action::Delete)?;
        if !self.medications.delete(id).await? {
            return Err(RecordError::NotFound(Entity::Medication));
        }
        debug!(medication_id = %id, "Medication deleted");
        Ok(())
    }
}
