//! Weight service.
//!
//! Goals are never stored on their own. Every write carries the starting and
//! goal weight forward on the new record, and reads resolve them field by
//! field from the latest record that has each one.

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use patient_dashboard_core::{
    GoalSnapshot, ProgressInput, UserId, WeightEntry, WeightField, WeightProgress, WeightRecordId,
};

use super::{Action, RecordError, ensure_owner, required};
use crate::db::{Store, UserRepository, WeightRepository};
use crate::models::{Entity, GoalsInput, NewWeightRecord, WeightInput, WeightRecord};

const WEIGHT_REQUIRED: &str = "Please add a weight value";
const GOALS_REQUIRED: &str = "Please provide at least one of startingWeight or weightGoal";
const CURRENT_WEIGHT_REQUIRED: &str =
    "No weight recorded yet; please provide startingWeight to set goals";

/// Weight records, goal snapshot and progress statistics.
pub struct WeightService<'a> {
    records: WeightRepository<'a>,
    users: UserRepository<'a>,
}

impl<'a> WeightService<'a> {
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self {
            records: WeightRepository::new(store),
            users: UserRepository::new(store),
        }
    }

    /// The caller's records, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn list(&self, owner: UserId) -> Result<Vec<WeightRecord>, RecordError> {
        Ok(self.records.list(owner).await?)
    }

    /// One of the caller's records.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::NotFound` or `RecordError::Forbidden`.
    #[instrument(skip(self))]
    pub async fn get(&self, id: WeightRecordId, owner: UserId) -> Result<WeightRecord, RecordError> {
        ensure_owner(self.records.get(id).await?, owner, Action::Access)
    }

    /// Record a measurement.
    ///
    /// Missing starting and goal weights are carried forward from the latest
    /// record that has them.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Validation` if `weight` is missing.
    #[instrument(skip(self, input))]
    pub async fn create(&self, owner: UserId, input: WeightInput) -> Result<WeightRecord, RecordError> {
        let weight = required(input.weight, WEIGHT_REQUIRED)?;

        let starting_weight = match input.starting_weight {
            Some(value) => Some(value),
            None => self.latest_value(owner, WeightField::StartingWeight).await?,
        };
        let weight_goal = match input.weight_goal {
            Some(value) => Some(value),
            None => self.latest_value(owner, WeightField::WeightGoal).await?,
        };

        let record = self
            .records
            .create(NewWeightRecord {
                notes: input.notes,
                ..NewWeightRecord::measured(
                    owner,
                    weight,
                    input.date.unwrap_or_else(Utc::now),
                    starting_weight,
                    weight_goal,
                )
            })
            .await?;

        debug!(weight_record_id = %record.id, "Weight recorded");
        Ok(record)
    }

    /// Merge a partial update and recompute the weight change.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::NotFound` or `RecordError::Forbidden`.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: WeightRecordId,
        owner: UserId,
        input: WeightInput,
    ) -> Result<WeightRecord, RecordError> {
        let mut record = ensure_owner(self.records.get(id).await?, owner, Action::Update)?;
        record.apply(input);

        self.records
            .update(&record)
            .await?
            .ok_or(RecordError::NotFound(Entity::WeightRecord))
    }

    /// Delete one of the caller's records.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::NotFound` or `RecordError::Forbidden`.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: WeightRecordId, owner: UserId) -> Result<(), RecordError> {
        ensure_owner(self.records.get(id).await?, owner, Action::Delete)?;
        if !self.records.delete(id).await? {
            return Err(RecordError::NotFound(Entity::WeightRecord));
        }
        debug!(weight_record_id = %id, "Weight record deleted");
        Ok(())
    }

    /// Resolve the caller's goal snapshot.
    ///
    /// The three fields are looked up independently.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn goals(&self, owner: UserId) -> Result<GoalSnapshot, RecordError> {
        let starting_weight = self.latest_value(owner, WeightField::StartingWeight).await?;
        let current_weight = self.latest_value(owner, WeightField::Weight).await?;
        let weight_goal = self.latest_value(owner, WeightField::WeightGoal).await?;

        Ok(GoalSnapshot::new(starting_weight, current_weight, weight_goal))
    }

    /// Append a record carrying new goal values.
    ///
    /// The record's weight is the latest measured weight, or the supplied
    /// starting weight when nothing has been measured yet. Unsupplied goal
    /// fields are carried forward.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Validation` if neither field is supplied, or if
    /// there is no weight to record; nothing is written in either case.
    #[instrument(skip(self))]
    pub async fn set_goals(&self, owner: UserId, input: GoalsInput) -> Result<WeightRecord, RecordError> {
        if input.starting_weight.is_none() && input.weight_goal.is_none() {
            return Err(RecordError::Validation(GOALS_REQUIRED.to_owned()));
        }

        let snapshot = self.goals(owner).await?;
        let current_weight = required(
            snapshot.current_weight.or(input.starting_weight),
            CURRENT_WEIGHT_REQUIRED,
        )?;

        let record = self
            .records
            .create(NewWeightRecord::measured(
                owner,
                current_weight,
                Utc::now(),
                input.starting_weight.or(snapshot.starting_weight),
                input.weight_goal.or(snapshot.weight_goal),
            ))
            .await?;

        debug!(weight_record_id = %record.id, "Weight goals updated");
        Ok(record)
    }

    /// Progress statistics over the caller's history and profile.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn progress(
        &self,
        owner: UserId,
        now: DateTime<Utc>,
    ) -> Result<WeightProgress, RecordError> {
        let history = self.records.list(owner).await?;
        let profile = self.users.get_by_id(owner).await?.map(|user| user.profile);

        let input = ProgressInput {
            snapshot: GoalSnapshot::resolve(&history),
            height_cm: profile.as_ref().and_then(|p| p.height),
            target_weight: profile.as_ref().and_then(|p| p.target_weight),
            now,
        };

        Ok(WeightProgress::compute(&input, &history))
    }

    async fn latest_value(
        &self,
        owner: UserId,
        field: WeightField,
    ) -> Result<Option<f64>, RecordError> {
        let record = self.records.latest_with(owner, field).await?;
        Ok(record.and_then(|r| r.field(field)))
    }
}
