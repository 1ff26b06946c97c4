//! Weight record repository.

use chrono::{DateTime, Utc};

use patient_dashboard_core::{UserId, WeightField, WeightRecordId, latest_with};

use super::{RepositoryError, Store};
use crate::models::{NewWeightRecord, WeightRecord};

macro_rules! weight_columns {
    () => {
        "id, user_id, weight, recorded_at, notes, starting_weight, current_weight, \
         weight_goal, weight_change, created_at, updated_at"
    };
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct WeightRecordRow {
    id: i32,
    user_id: i32,
    weight: f64,
    recorded_at: DateTime<Utc>,
    notes: Option<String>,
    starting_weight: Option<f64>,
    current_weight: Option<f64>,
    weight_goal: Option<f64>,
    weight_change: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<WeightRecordRow> for WeightRecord {
    fn from(row: WeightRecordRow) -> Self {
        Self {
            id: WeightRecordId::new(row.id),
            user_id: UserId::new(row.user_id),
            weight: row.weight,
            date: row.recorded_at,
            notes: row.notes,
            starting_weight: row.starting_weight,
            current_weight: row.current_weight,
            weight_goal: row.weight_goal,
            weight_change: row.weight_change,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for weight record operations.
pub struct WeightRepository<'a> {
    store: &'a Store,
}

impl<'a> WeightRepository<'a> {
    /// Create a new weight repository.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// List a user's records, most recent date first (ties: highest id first).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, owner: UserId) -> Result<Vec<WeightRecord>, RepositoryError> {
        match self.store {
            Store::Postgres(pool) => {
                let rows = sqlx::query_as::<_, WeightRecordRow>(concat!(
                    "SELECT ",
                    weight_columns!(),
                    " FROM dashboard.weight_record \
                      WHERE user_id = $1 \
                      ORDER BY recorded_at DESC, id DESC"
                ))
                .bind(owner)
                .fetch_all(pool)
                .await?;

                Ok(rows.into_iter().map(WeightRecord::from).collect())
            }
            Store::Memory(mem) => {
                let mut records: Vec<WeightRecord> = mem
                    .weight_records
                    .lock()
                    .await
                    .values()
                    .filter(|r| r.user_id == owner)
                    .cloned()
                    .collect();
                records.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
                Ok(records)
            }
        }
    }

    /// The user's most recent record that carries `field`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest_with(
        &self,
        owner: UserId,
        field: WeightField,
    ) -> Result<Option<WeightRecord>, RepositoryError> {
        match self.store {
            Store::Postgres(pool) => {
                let sql = format!(
                    concat!(
                        "SELECT ",
                        weight_columns!(),
                        " FROM dashboard.weight_record \
                          WHERE user_id = $1 AND {column} IS NOT NULL \
                          ORDER BY recorded_at DESC, id DESC \
                          LIMIT 1"
                    ),
                    column = field.column()
                );
                let row = sqlx::query_as::<_, WeightRecordRow>(&sql)
                    .bind(owner)
                    .fetch_optional(pool)
                    .await?;

                Ok(row.map(WeightRecord::from))
            }
            Store::Memory(mem) => {
                let records = mem.weight_records.lock().await;
                let owned = records.values().filter(|r| r.user_id == owner);
                Ok(latest_with(owned, field).cloned())
            }
        }
    }

    /// Get a record by id, regardless of owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: WeightRecordId) -> Result<Option<WeightRecord>, RepositoryError> {
        match self.store {
            Store::Postgres(pool) => {
                let row = sqlx::query_as::<_, WeightRecordRow>(concat!(
                    "SELECT ",
                    weight_columns!(),
                    " FROM dashboard.weight_record WHERE id = $1"
                ))
                .bind(id)
                .fetch_optional(pool)
                .await?;

                Ok(row.map(WeightRecord::from))
            }
            Store::Memory(mem) => Ok(mem.weight_records.lock().await.get(&id).cloned()),
        }
    }

    /// Insert a record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: NewWeightRecord) -> Result<WeightRecord, RepositoryError> {
        match self.store {
            Store::Postgres(pool) => {
                let row = sqlx::query_as::<_, WeightRecordRow>(concat!(
                    "INSERT INTO dashboard.weight_record \
                       (user_id, weight, recorded_at, notes, starting_weight, current_weight, \
                        weight_goal, weight_change) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
                     RETURNING ",
                    weight_columns!()
                ))
                .bind(new.user_id)
                .bind(new.weight)
                .bind(new.date)
                .bind(new.notes.as_deref())
                .bind(new.starting_weight)
                .bind(new.current_weight)
                .bind(new.weight_goal)
                .bind(new.weight_change)
                .fetch_one(pool)
                .await?;

                Ok(row.into())
            }
            Store::Memory(mem) => {
                let now = Utc::now();
                let record = WeightRecord {
                    id: WeightRecordId::new(mem.next_id()),
                    user_id: new.user_id,
                    weight: new.weight,
                    date: new.date,
                    notes: new.notes,
                    starting_weight: new.starting_weight,
                    current_weight: new.current_weight,
                    weight_goal: new.weight_goal,
                    weight_change: new.weight_change,
                    created_at: now,
                    updated_at: now,
                };
                mem.weight_records
                    .lock()
                    .await
                    .insert(record.id, record.clone());
                Ok(record)
            }
        }
    }

    /// Persist every mutable field of `record`.
    ///
    /// Returns `None` if the row has been deleted in the meantime.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(&self, record: &WeightRecord) -> Result<Option<WeightRecord>, RepositoryError> {
        match self.store {
            Store::Postgres(pool) => {
                let row = sqlx::query_as::<_, WeightRecordRow>(concat!(
                    "UPDATE dashboard.weight_record SET \
                       weight = $2, recorded_at = $3, notes = $4, starting_weight = $5, \
                       current_weight = $6, weight_goal = $7, weight_change = $8, \
                       updated_at = now() \
                     WHERE id = $1 \
                     RETURNING ",
                    weight_columns!()
                ))
                .bind(record.id)
                .bind(record.weight)
                .bind(record.date)
                .bind(record.notes.as_deref())
                .bind(record.starting_weight)
                .bind(record.current_weight)
                .bind(record.weight_goal)
                .bind(record.weight_change)
                .fetch_optional(pool)
                .await?;

                Ok(row.map(WeightRecord::from))
            }
            Store::Memory(mem) => {
                let mut records = mem.weight_records.lock().await;
                let Some(stored) = records.get_mut(&record.id) else {
                    return Ok(None);
                };
                *stored = WeightRecord {
                    updated_at: Utc::now(),
                    ..record.clone()
                };
                Ok(Some(stored.clone()))
            }
        }
    }

    /// Delete a record. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: WeightRecordId) -> Result<bool, RepositoryError> {
        match self.store {
            Store::Postgres(pool) => {
                let result = sqlx::query("DELETE FROM dashboard.weight_record WHERE id = $1")
                    .bind(id)
                    .execute(pool)
                    .await?;
                Ok(result.rows_affected() > 0)
            }
            Store::Memory(mem) => Ok(mem.weight_records.lock().await.remove(&id).is_some()),
        }
    }
}
