//! Weight-goal resolution.
//!
//! A user's goal is never stored in one place. Each weight record may carry a
//! starting weight, a goal weight, or neither, and the effective values are
//! synthesized from the history: for every field, the most recently dated
//! record that has it wins. The three lookups are independent and need not
//! land on the same record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::WeightRecordId;

/// A per-record weight field that the resolver can look up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeightField {
    /// The baseline the user started from.
    StartingWeight,
    /// The measured weight of the record.
    Weight,
    /// The target the user is aiming for.
    WeightGoal,
}

impl WeightField {
    /// Column holding this field in the `weight_record` table.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::StartingWeight => "starting_weight",
            Self::Weight => "weight",
            Self::WeightGoal => "weight_goal",
        }
    }
}

/// Read access to a weight record for resolution.
pub trait WeightEntry {
    /// Tie-breaker when two records share a date.
    fn record_id(&self) -> WeightRecordId;

    /// When the measurement was taken.
    fn recorded_at(&self) -> DateTime<Utc>;

    /// Value of `field` on this record, if present.
    fn field(&self, field: WeightField) -> Option<f64>;
}

/// Most recent record carrying `field`.
///
/// "Most recent" is the greatest date; ties break on the greatest id.
pub fn latest_with<'a, E, I>(records: I, field: WeightField) -> Option<&'a E>
where
    E: WeightEntry + 'a,
    I: IntoIterator<Item = &'a E>,
{
    records
        .into_iter()
        .filter(|record| record.field(field).is_some())
        .max_by_key(|record| (record.recorded_at(), record.record_id()))
}

/// `current - starting` when both are known, otherwise `0`.
#[must_use]
pub fn weight_change(starting: Option<f64>, current: Option<f64>) -> f64 {
    match (starting, current) {
        (Some(starting), Some(current)) => current - starting,
        _ => 0.0,
    }
}

/// Effective goal values synthesized from a weight history.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSnapshot {
    pub starting_weight: Option<f64>,
    pub current_weight: Option<f64>,
    pub weight_goal: Option<f64>,
    pub weight_change: f64,
}

impl GoalSnapshot {
    /// Build a snapshot from already-resolved values, deriving the change.
    #[must_use]
    pub fn new(
        starting_weight: Option<f64>,
        current_weight: Option<f64>,
        weight_goal: Option<f64>,
    ) -> Self {
        Self {
            starting_weight,
            current_weight,
            weight_goal,
            weight_change: weight_change(starting_weight, current_weight),
        }
    }

    /// Resolve the snapshot over a full weight history.
    ///
    /// An empty history resolves to all `None` with a change of `0`.
    #[must_use]
    pub fn resolve<E: WeightEntry>(records: &[E]) -> Self {
        let value = |field| latest_with(records, field).and_then(|record| record.field(field));

        Self::new(
            value(WeightField::StartingWeight),
            value(WeightField::Weight),
            value(WeightField::WeightGoal),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    struct Entry {
        id: i32,
        day: u32,
        weight: Option<f64>,
        starting_weight: Option<f64>,
        weight_goal: Option<f64>,
    }

    impl Entry {
        fn on(id: i32, day: u32) -> Self {
            Self {
                id,
                day,
                weight: None,
                starting_weight: None,
                weight_goal: None,
            }
        }
    }

    impl WeightEntry for Entry {
        fn record_id(&self) -> WeightRecordId {
            WeightRecordId::new(self.id)
        }

        fn recorded_at(&self) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2024, 1, self.day, 0, 0, 0).unwrap()
        }

        fn field(&self, field: WeightField) -> Option<f64> {
            match field {
                WeightField::StartingWeight => self.starting_weight,
                WeightField::Weight => self.weight,
                WeightField::WeightGoal => self.weight_goal,
            }
        }
    }

    #[test]
    fn test_resolve_combines_fields_from_different_records() {
        let records = vec![
            Entry {
                starting_weight: Some(200.0),
                ..Entry::on(1, 1)
            },
            Entry {
                weight: Some(190.0),
                ..Entry::on(2, 2)
            },
            Entry {
                weight_goal: Some(170.0),
                ..Entry::on(3, 3)
            },
        ];

        let snapshot = GoalSnapshot::resolve(&records);

        assert_eq!(snapshot.starting_weight, Some(200.0));
        assert_eq!(snapshot.current_weight, Some(190.0));
        assert_eq!(snapshot.weight_goal, Some(170.0));
        assert!((snapshot.weight_change - -10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resolve_empty_history() {
        let snapshot = GoalSnapshot::resolve::<Entry>(&[]);
        assert_eq!(snapshot, GoalSnapshot::default());
        assert!(snapshot.weight_change.abs() < f64::EPSILON);
    }

    #[test]
    fn test_latest_with_prefers_date_over_insertion_order() {
        let records = vec![
            Entry {
                weight_goal: Some(150.0),
                ..Entry::on(9, 5)
            },
            Entry {
                weight_goal: Some(160.0),
                ..Entry::on(2, 1)
            },
        ];

        let latest = latest_with(&records, WeightField::WeightGoal).unwrap();
        assert_eq!(latest.id, 9);
    }

    #[test]
    fn test_latest_with_breaks_date_ties_on_id() {
        let records = vec![
            Entry {
                weight: Some(181.0),
                ..Entry::on(4, 2)
            },
            Entry {
                weight: Some(180.0),
                ..Entry::on(7, 2)
            },
        ];

        let snapshot = GoalSnapshot::resolve(&records);
        assert_eq!(snapshot.current_weight, Some(180.0));
    }

    #[test]
    fn test_latest_with_skips_records_missing_the_field() {
        let records = vec![
            Entry {
                weight: Some(190.0),
                starting_weight: Some(210.0),
                ..Entry::on(1, 1)
            },
            Entry {
                weight: Some(185.0),
                ..Entry::on(2, 2)
            },
        ];

        let snapshot = GoalSnapshot::resolve(&records);
        assert_eq!(snapshot.starting_weight, Some(210.0));
        assert_eq!(snapshot.current_weight, Some(185.0));
        assert_eq!(snapshot.weight_goal, None);
        assert!((snapshot.weight_change - -25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_weight_change_needs_both_sides() {
        assert!(weight_change(Some(200.0), None).abs() < f64::EPSILON);
        assert!(weight_change(None, Some(180.0)).abs() < f64::EPSILON);
        assert!((weight_change(Some(150.0), Some(155.5)) - 5.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let json = serde_json::to_value(GoalSnapshot::new(Some(200.0), None, None)).unwrap();
        assert_eq!(json["startingWeight"], 200.0);
        assert!(json["currentWeight"].is_null());
        assert_eq!(json["weightChange"], 0.0);
    }
}
