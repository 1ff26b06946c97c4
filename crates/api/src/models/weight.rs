//! Weight record domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use patient_dashboard_core::{UserId, WeightEntry, WeightField, WeightRecordId, weight_change};

use super::{Entity, Owned, dates};

/// One weight measurement, optionally carrying goal fields.
///
/// `current_weight` mirrors `weight`, and `weight_change` is always
/// `current_weight - starting_weight` (or `0`), recomputed on every write.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightRecord {
    pub id: WeightRecordId,
    #[serde(rename = "user")]
    pub user_id: UserId,
    pub weight: f64,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
    pub starting_weight: Option<f64>,
    pub current_weight: Option<f64>,
    pub weight_goal: Option<f64>,
    pub weight_change: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WeightRecord {
    /// Merge a partial update and recompute the derived fields.
    pub fn apply(&mut self, input: WeightInput) {
        if let Some(weight) = input.weight {
            self.weight = weight;
            self.current_weight = Some(weight);
        }
        if let Some(date) = input.date {
            self.date = date;
        }
        if input.notes.is_some() {
            self.notes = input.notes;
        }
        if input.starting_weight.is_some() {
            self.starting_weight = input.starting_weight;
        }
        if input.weight_goal.is_some() {
            self.weight_goal = input.weight_goal;
        }
        self.weight_change = weight_change(self.starting_weight, self.current_weight);
    }
}

impl Owned for WeightRecord {
    const ENTITY: Entity = Entity::WeightRecord;

    fn owner(&self) -> UserId {
        self.user_id
    }
}

impl WeightEntry for WeightRecord {
    fn record_id(&self) -> WeightRecordId {
        self.id
    }

    fn recorded_at(&self) -> DateTime<Utc> {
        self.date
    }

    fn field(&self, field: WeightField) -> Option<f64> {
        match field {
            WeightField::StartingWeight => self.starting_weight,
            WeightField::Weight => Some(self.weight),
            WeightField::WeightGoal => self.weight_goal,
        }
    }
}

/// A weight record ready to insert.
#[derive(Debug, Clone)]
pub struct NewWeightRecord {
    pub user_id: UserId,
    pub weight: f64,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
    pub starting_weight: Option<f64>,
    pub current_weight: Option<f64>,
    pub weight_goal: Option<f64>,
    pub weight_change: f64,
}

impl NewWeightRecord {
    /// Build a record, deriving `current_weight` and `weight_change`.
    #[must_use]
    pub fn measured(
        user_id: UserId,
        weight: f64,
        date: DateTime<Utc>,
        starting_weight: Option<f64>,
        weight_goal: Option<f64>,
    ) -> Self {
        Self {
            user_id,
            weight,
            date,
            notes: None,
            starting_weight,
            current_weight: Some(weight),
            weight_goal,
            weight_change: weight_change(starting_weight, Some(weight)),
        }
    }
}

/// Request body for creating or updating a weight record.
///
/// `currentWeight` and `weightChange` are derived and ignored if sent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightInput {
    pub weight: Option<f64>,
    #[serde(default, deserialize_with = "dates::optional_datetime")]
    pub date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub starting_weight: Option<f64>,
    pub weight_goal: Option<f64>,
}

/// Request body for `POST /api/weight/goals`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalsInput {
    pub starting_weight: Option<f64>,
    pub weight_goal: Option<f64>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record() -> WeightRecord {
        let now = Utc::now();
        WeightRecord {
            id: WeightRecordId::new(1),
            user_id: UserId::new(1),
            weight: 190.0,
            date: now,
            notes: None,
            starting_weight: Some(200.0),
            current_weight: Some(190.0),
            weight_goal: Some(170.0),
            weight_change: -10.0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_apply_weight_moves_current_and_change() {
        let mut existing = record();
        existing.apply(WeightInput {
            weight: Some(185.5),
            ..WeightInput::default()
        });

        assert_eq!(existing.current_weight, Some(185.5));
        assert!((existing.weight_change - -14.5).abs() < f64::EPSILON);
        assert_eq!(existing.weight_goal, Some(170.0));
    }

    #[test]
    fn test_apply_starting_weight_recomputes_change() {
        let mut existing = record();
        existing.apply(WeightInput {
            starting_weight: Some(195.0),
            ..WeightInput::default()
        });

        assert!((existing.weight_change - -5.0).abs() < f64::EPSILON);
        assert!((existing.weight - 190.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_measured_without_starting_weight_has_zero_change() {
        let new = NewWeightRecord::measured(UserId::new(1), 180.0, Utc::now(), None, Some(160.0));
        assert_eq!(new.current_weight, Some(180.0));
        assert!(new.weight_change.abs() < f64::EPSILON);
    }

    #[test]
    fn test_input_ignores_derived_fields() {
        let input: WeightInput =
            serde_json::from_str(r#"{"weight":180,"currentWeight":1,"weightChange":99}"#).unwrap();
        assert_eq!(input.weight, Some(180.0));
    }
}
