//! Shipment repository.
//!
//! Reads always come back as [`ShipmentView`]s with the referenced medication
//! populated through a left join, so a dangling `medication_id` yields a
//! `null` medication instead of dropping the shipment.

use chrono::{DateTime, Utc};

use patient_dashboard_core::{MedicationId, ShipmentId, ShipmentStatus, UserId};

use super::{RepositoryError, Store};
use crate::models::{
    Medication, MedicationSummary, NewShipment, Shipment, ShipmentFilter, ShipmentView,
};

macro_rules! view_columns {
    () => {
        "s.id, s.user_id, s.medication_id, s.shipment_date, s.expected_delivery_date, \
         s.actual_delivery_date, s.tracking_number, s.status, s.quantity, s.notes, \
         s.created_at, s.updated_at, \
         m.id AS med_id, m.name AS med_name, m.dosage AS med_dosage, \
         m.frequency AS med_frequency"
    };
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ShipmentViewRow {
    id: i32,
    user_id: i32,
    medication_id: i32,
    shipment_date: DateTime<Utc>,
    expected_delivery_date: DateTime<Utc>,
    actual_delivery_date: Option<DateTime<Utc>>,
    tracking_number: Option<String>,
    status: String,
    quantity: i32,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    med_id: Option<i32>,
    med_name: Option<String>,
    med_dosage: Option<String>,
    med_frequency: Option<String>,
}

impl TryFrom<ShipmentViewRow> for ShipmentView {
    type Error = RepositoryError;

    fn try_from(row: ShipmentViewRow) -> Result<Self, Self::Error> {
        let status: ShipmentStatus = row.status.parse().map_err(RepositoryError::DataCorruption)?;

        let medication = match (row.med_id, row.med_name, row.med_dosage, row.med_frequency) {
            (Some(id), Some(name), Some(dosage), Some(frequency)) => Some(MedicationSummary {
                id: MedicationId::new(id),
                name,
                dosage,
                frequency,
            }),
            _ => None,
        };

        let shipment = Shipment {
            id: ShipmentId::new(row.id),
            user_id: UserId::new(row.user_id),
            medication_id: MedicationId::new(row.medication_id),
            shipment_date: row.shipment_date,
            expected_delivery_date: row.expected_delivery_date,
            actual_delivery_date: row.actual_delivery_date,
            tracking_number: row.tracking_number,
            status,
            quantity: row.quantity,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };

        Ok(Self::new(shipment, medication))
    }
}

impl From<&Medication> for MedicationSummary {
    fn from(medication: &Medication) -> Self {
        Self {
            id: medication.id,
            name: medication.name.clone(),
            dosage: medication.dosage.clone(),
            frequency: medication.frequency.clone(),
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for shipment operations.
pub struct ShipmentRepository<'a> {
    store: &'a Store,
}

impl<'a> ShipmentRepository<'a> {
    /// Create a new shipment repository.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// List a user's shipments, newest shipment date first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored status is unknown.
    pub async fn list(
        &self,
        owner: UserId,
        filter: &ShipmentFilter,
    ) -> Result<Vec<ShipmentView>, RepositoryError> {
        match self.store {
            Store::Postgres(pool) => {
                let rows = sqlx::query_as::<_, ShipmentViewRow>(concat!(
                    "SELECT ",
                    view_columns!(),
                    " FROM dashboard.shipment s \
                      LEFT JOIN dashboard.medication m ON m.id = s.medication_id \
                      WHERE s.user_id = $1 \
                        AND ($2::text IS NULL OR s.status = $2) \
                        AND ($3::text IS NULL \
                             OR strpos(lower(coalesce(s.tracking_number, '')), $3) > 0 \
                             OR strpos(lower(coalesce(m.name, '')), $3) > 0) \
                      ORDER BY s.shipment_date DESC, s.id DESC"
                ))
                .bind(owner)
                .bind(filter.status.map(ShipmentStatus::as_str))
                .bind(filter.needle())
                .fetch_all(pool)
                .await?;

                rows.into_iter().map(TryInto::try_into).collect()
            }
            Store::Memory(mem) => {
                let shipments = mem.shipments.lock().await;
                let medications = mem.medications.lock().await;
                let mut views: Vec<ShipmentView> = shipments
                    .values()
                    .filter(|s| s.user_id == owner)
                    .map(|s| {
                        let summary = medications.get(&s.medication_id).map(Into::into);
                        ShipmentView::new(s.clone(), summary)
                    })
                    .filter(|view| filter.matches(view))
                    .collect();
                views.sort_by(|a, b| {
                    b.shipment
                        .shipment_date
                        .cmp(&a.shipment.shipment_date)
                        .then_with(|| b.shipment.id.cmp(&a.shipment.id))
                });
                Ok(views)
            }
        }
    }

    /// Get a shipment by id, regardless of owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored status is unknown.
    pub async fn get(&self, id: ShipmentId) -> Result<Option<ShipmentView>, RepositoryError> {
        match self.store {
            Store::Postgres(pool) => {
                let row = sqlx::query_as::<_, ShipmentViewRow>(concat!(
                    "SELECT ",
                    view_columns!(),
                    " FROM dashboard.shipment s \
                      LEFT JOIN dashboard.medication m ON m.id = s.medication_id \
                      WHERE s.id = $1"
                ))
                .bind(id)
                .fetch_optional(pool)
                .await?;

                row.map(TryInto::try_into).transpose()
            }
            Store::Memory(mem) => {
                let shipments = mem.shipments.lock().await;
                let medications = mem.medications.lock().await;
                Ok(shipments.get(&id).map(|s| {
                    let summary = medications.get(&s.medication_id).map(Into::into);
                    ShipmentView::new(s.clone(), summary)
                }))
            }
        }
    }

    /// Insert a shipment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: NewShipment) -> Result<ShipmentView, RepositoryError> {
        match self.store {
            Store::Postgres(pool) => {
                let row = sqlx::query_as::<_, ShipmentViewRow>(concat!(
                    "WITH s AS ( \
                       INSERT INTO dashboard.shipment \
                         (user_id, medication_id, shipment_date, expected_delivery_date, \
                          actual_delivery_date, tracking_number, status, quantity, notes) \
                       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
                       RETURNING * \
                     ) SELECT ",
                    view_columns!(),
                    " FROM s LEFT JOIN dashboard.medication m ON m.id = s.medication_id"
                ))
                .bind(new.user_id)
                .bind(new.medication_id)
                .bind(new.shipment_date)
                .bind(new.expected_delivery_date)
                .bind(new.actual_delivery_date)
                .bind(new.tracking_number.as_deref())
                .bind(new.status.as_str())
                .bind(new.quantity)
                .bind(new.notes.as_deref())
                .fetch_one(pool)
                .await?;

                row.try_into()
            }
            Store::Memory(mem) => {
                let mut shipments = mem.shipments.lock().await;
                let medications = mem.medications.lock().await;

                let now = Utc::now();
                let shipment = Shipment {
                    id: ShipmentId::new(mem.next_id()),
                    user_id: new.user_id,
                    medication_id: new.medication_id,
                    shipment_date: new.shipment_date,
                    expected_delivery_date: new.expected_delivery_date,
                    actual_delivery_date: new.actual_delivery_date,
                    tracking_number: new.tracking_number,
                    status: new.status,
                    quantity: new.quantity,
                    notes: new.notes,
                    created_at: now,
                    updated_at: now,
                };
                shipments.insert(shipment.id, shipment.clone());

                let summary = medications.get(&shipment.medication_id).map(Into::into);
                Ok(ShipmentView::new(shipment, summary))
            }
        }
    }

    /// Persist every mutable field of `shipment`.
    ///
    /// Returns `None` if the row has been deleted in the meantime.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(&self, shipment: &Shipment) -> Result<Option<ShipmentView>, RepositoryError> {
        match self.store {
            Store::Postgres(pool) => {
                let row = sqlx::query_as::<_, ShipmentViewRow>(concat!(
                    "WITH s AS ( \
                       UPDATE dashboard.shipment SET \
                         medication_id = $2, shipment_date = $3, expected_delivery_date = $4, \
                         actual_delivery_date = $5, tracking_number = $6, status = $7, \
                         quantity = $8, notes = $9, updated_at = now() \
                       WHERE id = $1 \
                       RETURNING * \
                     ) SELECT ",
                    view_columns!(),
                    " FROM s LEFT JOIN dashboard.medication m ON m.id = s.medication_id"
                ))
                .bind(shipment.id)
                .bind(shipment.medication_id)
                .bind(shipment.shipment_date)
                .bind(shipment.expected_delivery_date)
                .bind(shipment.actual_delivery_date)
                .bind(shipment.tracking_number.as_deref())
                .bind(shipment.status.as_str())
                .bind(shipment.quantity)
                .bind(shipment.notes.as_deref())
                .fetch_optional(pool)
                .await?;

                row.map(TryInto::try_into).transpose()
            }
            Store::Memory(mem) => {
                let mut shipments = mem.shipments.lock().await;
                let medications = mem.medications.lock().await;

                let Some(stored) = shipments.get_mut(&shipment.id) else {
                    return Ok(None);
                };
                *stored = Shipment {
                    updated_at: Utc::now(),
                    ..shipment.clone()
                };

                let summary = medications.get(&stored.medication_id).map(Into::into);
                Ok(Some(ShipmentView::new(stored.clone(), summary)))
            }
        }
    }

    /// Delete a shipment. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: ShipmentId) -> Result<bool, RepositoryError> {
        match self.store {
            Store::Postgres(pool) => {
                let result = sqlx::query("DELETE FROM dashboard.shipment WHERE id = $1")
                    .bind(id)
                    .execute(pool)
                    .await?;
                Ok(result.rows_affected() > 0)
            }
            Store::Memory(mem) => Ok(mem.shipments.lock().await.remove(&id).is_some()),
        }
    }
}
