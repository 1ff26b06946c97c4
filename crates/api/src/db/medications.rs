//! Medication repository.

use chrono::{DateTime, Utc};

use patient_dashboard_core::{MedicationId, UserId};

use super::{RepositoryError, Store};
use crate::models::{Medication, MedicationFilter, NewMedication};

macro_rules! medication_columns {
    () => {
        "id, user_id, name, dosage, frequency, start_date, end_date, active, notes, \
         created_at, updated_at"
    };
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct MedicationRow {
    id: i32,
    user_id: i32,
    name: String,
    dosage: String,
    frequency: String,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    active: bool,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MedicationRow> for Medication {
    fn from(row: MedicationRow) -> Self {
        Self {
            id: MedicationId::new(row.id),
            user_id: UserId::new(row.user_id),
            name: row.name,
            dosage: row.dosage,
            frequency: row.frequency,
            start_date: row.start_date,
            end_date: row.end_date,
            active: row.active,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for medication operations.
///
/// Lookups by id are not scoped to an owner; callers check ownership so that
/// "not found" and "not yours" stay distinguishable.
pub struct MedicationRepository<'a> {
    store: &'a Store,
}

impl<'a> MedicationRepository<'a> {
    /// Create a new medication repository.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// List a user's medications, newest start date first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        owner: UserId,
        filter: &MedicationFilter,
    ) -> Result<Vec<Medication>, RepositoryError> {
        match self.store {
            Store::Postgres(pool) => {
                let rows = sqlx::query_as::<_, MedicationRow>(concat!(
                    "SELECT ",
                    medication_columns!(),
                    " FROM dashboard.medication \
                      WHERE user_id = $1 \
                        AND ($2::bool IS NULL OR active = $2) \
                        AND ($3::text IS NULL OR strpos(lower(name), $3) > 0) \
                      ORDER BY start_date DESC, id DESC"
                ))
                .bind(owner)
                .bind(filter.active)
                .bind(filter.needle())
                .fetch_all(pool)
                .await?;

                Ok(rows.into_iter().map(Medication::from).collect())
            }
            Store::Memory(mem) => {
                let mut medications: Vec<Medication> = mem
                    .medications
                    .lock()
                    .await
                    .values()
                    .filter(|m| m.user_id == owner && filter.matches(m))
                    .cloned()
                    .collect();
                medications.sort_by(|a, b| {
                    b.start_date
                        .cmp(&a.start_date)
                        .then_with(|| b.id.cmp(&a.id))
                });
                Ok(medications)
            }
        }
    }

    /// Get a medication by id, regardless of owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: MedicationId) -> Result<Option<Medication>, RepositoryError> {
        match self.store {
            Store::Postgres(pool) => {
                let row = sqlx::query_as::<_, MedicationRow>(concat!(
                    "SELECT ",
                    medication_columns!(),
                    " FROM dashboard.medication WHERE id = $1"
                ))
                .bind(id)
                .fetch_optional(pool)
                .await?;

                Ok(row.map(Medication::from))
            }
            Store::Memory(mem) => Ok(mem.medications.lock().await.get(&id).cloned()),
        }
    }

    /// Insert a medication.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: NewMedication) -> Result<Medication, RepositoryError> {
        match self.store {
            Store::Postgres(pool) => {
                let row = sqlx::query_as::<_, MedicationRow>(concat!(
                    "INSERT INTO dashboard.medication \
                       (user_id, name, dosage, frequency, start_date, end_date, active, notes) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
                     RETURNING ",
                    medication_columns!()
                ))
                .bind(new.user_id)
                .bind(&new.name)
                .bind(&new.dosage)
                .bind(&new.frequency)
                .bind(new.start_date)
                .bind(new.end_date)
                .bind(new.active)
                .bind(new.notes.as_deref())
                .fetch_one(pool)
                .await?;

                Ok(row.into())
            }
            Store::Memory(mem) => {
                let now = Utc::now();
                let medication = Medication {
                    id: MedicationId::new(mem.next_id()),
                    user_id: new.user_id,
                    name: new.name,
                    dosage: new.dosage,
                    frequency: new.frequency,
                    start_date: new.start_date,
                    end_date: new.end_date,
                    active: new.active,
                    notes: new.notes,
                    created_at: now,
                    updated_at: now,
                };
                mem.medications
                    .lock()
                    .await
                    .insert(medication.id, medication.clone());
                Ok(medication)
            }
        }
    }

    /// Persist every mutable field of `medication`.
    ///
    /// Returns `None` if the row has been deleted in the meantime.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(&self, medication: &Medication) -> Result<Option<Medication>, RepositoryError> {
        match self.store {
            Store::Postgres(pool) => {
                let row = sqlx::query_as::<_, MedicationRow>(concat!(
                    "UPDATE dashboard.medication SET \
                       name = $2, dosage = $3, frequency = $4, start_date = $5, \
                       end_date = $6, active = $7, notes = $8, updated_at = now() \
                     WHERE id = $1 \
                     RETURNING ",
                    medication_columns!()
                ))
                .bind(medication.id)
                .bind(&medication.name)
                .bind(&medication.dosage)
                .bind(&medication.frequency)
                .bind(medication.start_date)
                .bind(medication.end_date)
                .bind(medication.active)
                .bind(medication.notes.as_deref())
                .fetch_optional(pool)
                .await?;

                Ok(row.map(Medication::from))
            }
            Store::Memory(mem) => {
                let mut medications = mem.medications.lock().await;
                let Some(stored) = medications.get_mut(&medication.id) else {
                    return Ok(None);
                };
                *stored = Medication {
                    updated_at: Utc::now(),
                    ..medication.clone()
                };
                Ok(Some(stored.clone()))
            }
        }
    }

    /// Delete a medication. Returns whether a row was removed.
    ///
    /// Shipments referencing it are left in place.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: MedicationId) -> Result<bool, RepositoryError> {
        match self.store {
            Store::Postgres(pool) => {
                let result = sqlx::query("DELETE FROM dashboard.medication WHERE id = $1")
                    .bind(id)
                    .execute(pool)
                    .await?;
                Ok(result.rows_affected() > 0)
            }
            Store::Memory(mem) => Ok(mem.medications.lock().await.remove(&id).is_some()),
        }
    }
}
