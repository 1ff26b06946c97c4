//! Derived progress statistics for the weight dashboard.
//!
//! Everything here is best-effort: a missing input yields a `None` field,
//! never an error.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;

use crate::goals::{GoalSnapshot, WeightEntry, WeightField};

/// Pounds to kilograms.
const LB_TO_KG: f64 = 0.453_592_37;

/// BMI at the top of the "normal" band.
pub const TARGET_BMI: f64 = 25.0;

/// Projections further out than this are dropped.
const MAX_PROJECTION_DAYS: f64 = 36_500.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Inputs to [`WeightProgress::compute`] that do not come from the history.
#[derive(Debug, Clone, Copy)]
pub struct ProgressInput {
    /// Resolved goal snapshot for the same history.
    pub snapshot: GoalSnapshot,
    /// Profile height in centimetres.
    pub height_cm: Option<f64>,
    /// Profile target weight, used when no record carries a goal.
    pub target_weight: Option<f64>,
    /// Reference point for the completion estimate.
    pub now: DateTime<Utc>,
}

/// Progress statistics served by `GET /api/weight/progress`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightProgress {
    pub starting_weight: Option<f64>,
    pub current_weight: Option<f64>,
    pub goal_weight: Option<f64>,
    pub total_lost: Option<f64>,
    pub weight_to_lose: Option<f64>,
    pub progress_percentage: Option<f64>,
    pub bmi: Option<f64>,
    pub target_bmi: f64,
    pub estimated_completion: Option<NaiveDate>,
    /// Difference between the two most recent measurements.
    pub weekly_change: Option<f64>,
    /// `weekly_change` as a percentage of the earlier measurement.
    pub change_rate: Option<f64>,
}

impl WeightProgress {
    /// Compute progress over `history`, which may be in any order.
    #[must_use]
    pub fn compute<E: WeightEntry>(input: &ProgressInput, history: &[E]) -> Self {
        let mut measured: Vec<(&E, f64)> = history
            .iter()
            .filter_map(|record| record.field(WeightField::Weight).map(|w| (record, w)))
            .collect();
        measured.sort_by_key(|(record, _)| (record.recorded_at(), record.record_id()));

        let oldest = measured.first().copied();
        let newest = measured.last().copied();

        let starting_weight = input
            .snapshot
            .starting_weight
            .or_else(|| oldest.map(|(_, weight)| weight));
        let current_weight = input
            .snapshot
            .current_weight
            .or_else(|| newest.map(|(_, weight)| weight));
        let goal_weight = input.snapshot.weight_goal.or(input.target_weight);

        let total_lost = starting_weight
            .zip(current_weight)
            .map(|(start, current)| start - current);
        let weight_to_lose = current_weight
            .zip(goal_weight)
            .map(|(current, goal)| current - goal);

        let progress_percentage = match (starting_weight, goal_weight, total_lost) {
            (Some(start), Some(goal), Some(lost)) => Some(percentage(lost, start - goal)),
            _ => None,
        };

        let bmi = current_weight
            .zip(input.height_cm)
            .and_then(|(weight, height)| bmi(weight, height));

        let estimated_completion = match (oldest, newest, weight_to_lose) {
            (Some(first), Some(last), Some(remaining)) => {
                estimate_completion(first, last, remaining, input.now)
            }
            _ => None,
        };

        let (weekly_change, change_rate) = match measured.as_slice() {
            [.., (_, previous), (_, latest)] => {
                let change = latest - previous;
                let rate = (*previous > 0.0).then(|| change / previous * 100.0);
                (Some(change), rate)
            }
            _ => (None, None),
        };

        Self {
            starting_weight,
            current_weight,
            goal_weight,
            total_lost,
            weight_to_lose,
            progress_percentage,
            bmi,
            target_bmi: TARGET_BMI,
            estimated_completion,
            weekly_change,
            change_rate,
        }
    }
}

/// Share of `span` covered by `lost`, clamped to `[0, 100]`.
fn percentage(lost: f64, span: f64) -> f64 {
    if span.abs() < f64::EPSILON {
        return 0.0;
    }
    (lost / span * 100.0).clamp(0.0, 100.0)
}

/// BMI from a weight in pounds and a height in centimetres, one decimal.
fn bmi(weight_lb: f64, height_cm: f64) -> Option<f64> {
    if height_cm <= 0.0 {
        return None;
    }
    let meters = height_cm / 100.0;
    let value = weight_lb * LB_TO_KG / (meters * meters);
    Some((value * 10.0).round() / 10.0)
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn estimate_completion<E: WeightEntry>(
    (first, first_weight): (&E, f64),
    (last, last_weight): (&E, f64),
    remaining: f64,
    now: DateTime<Utc>,
) -> Option<NaiveDate> {
    let elapsed_days =
        (last.recorded_at() - first.recorded_at()).num_seconds() as f64 / SECONDS_PER_DAY;
    if elapsed_days <= 0.0 || remaining <= 0.0 {
        return None;
    }

    let daily_loss = (first_weight - last_weight) / elapsed_days;
    if daily_loss <= 0.0 {
        return None;
    }

    let days = (remaining / daily_loss).ceil();
    if !days.is_finite() || days > MAX_PROJECTION_DAYS {
        return None;
    }

    now.date_naive().checked_add_days(Days::new(days as u64))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::WeightRecordId;

    struct Point {
        id: i32,
        at: DateTime<Utc>,
        weight: f64,
    }

    impl WeightEntry for Point {
        fn record_id(&self) -> WeightRecordId {
            WeightRecordId::new(self.id)
        }

        fn recorded_at(&self) -> DateTime<Utc> {
            self.at
        }

        fn field(&self, field: WeightField) -> Option<f64> {
            (field == WeightField::Weight).then_some(self.weight)
        }
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 8, 0, 0).unwrap()
    }

    fn input(snapshot: GoalSnapshot) -> ProgressInput {
        ProgressInput {
            snapshot,
            height_cm: None,
            target_weight: None,
            now: day(11),
        }
    }

    #[test]
    fn test_progress_with_full_inputs() {
        let history = vec![
            Point { id: 2, at: day(11), weight: 190.0 },
            Point { id: 1, at: day(1), weight: 200.0 },
        ];
        let snapshot = GoalSnapshot::new(Some(200.0), Some(190.0), Some(180.0));
        let progress = WeightProgress::compute(
            &ProgressInput {
                height_cm: Some(180.0),
                ..input(snapshot)
            },
            &history,
        );

        assert_eq!(progress.total_lost, Some(10.0));
        assert_eq!(progress.weight_to_lose, Some(10.0));
        assert_eq!(progress.progress_percentage, Some(50.0));
        // 190 lb = 86.18 kg over 3.24 m^2
        assert_eq!(progress.bmi, Some(26.6));
        assert!((progress.target_bmi - 25.0).abs() < f64::EPSILON);
        // 10 lb over 10 days, 10 lb remaining
        assert_eq!(
            progress.estimated_completion,
            NaiveDate::from_ymd_opt(2024, 3, 21)
        );
        assert_eq!(progress.weekly_change, Some(-10.0));
        assert_eq!(progress.change_rate, Some(-5.0));
    }

    #[test]
    fn test_progress_falls_back_to_history_and_profile() {
        let history = vec![
            Point { id: 1, at: day(1), weight: 210.0 },
            Point { id: 2, at: day(3), weight: 205.0 },
        ];
        let snapshot = GoalSnapshot::new(None, Some(205.0), None);
        let progress = WeightProgress::compute(
            &ProgressInput {
                target_weight: Some(160.0),
                ..input(snapshot)
            },
            &history,
        );

        assert_eq!(progress.starting_weight, Some(210.0));
        assert_eq!(progress.goal_weight, Some(160.0));
        assert_eq!(progress.total_lost, Some(5.0));
        assert_eq!(progress.bmi, None);
    }

    #[test]
    fn test_progress_percentage_is_clamped() {
        assert!((percentage(30.0, 20.0) - 100.0).abs() < f64::EPSILON);
        assert!(percentage(-5.0, 20.0).abs() < f64::EPSILON);
        assert!(percentage(5.0, 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_completion_estimate_when_gaining() {
        let history = vec![
            Point { id: 1, at: day(1), weight: 180.0 },
            Point { id: 2, at: day(5), weight: 185.0 },
        ];
        let snapshot = GoalSnapshot::new(Some(180.0), Some(185.0), Some(170.0));
        let progress = WeightProgress::compute(&input(snapshot), &history);

        assert_eq!(progress.estimated_completion, None);
        assert_eq!(progress.progress_percentage, Some(0.0));
    }

    #[test]
    fn test_empty_history_yields_nulls() {
        let progress = WeightProgress::compute::<Point>(&input(GoalSnapshot::default()), &[]);

        assert_eq!(progress.starting_weight, None);
        assert_eq!(progress.current_weight, None);
        assert_eq!(progress.total_lost, None);
        assert_eq!(progress.progress_percentage, None);
        assert_eq!(progress.estimated_completion, None);
        assert_eq!(progress.weekly_change, None);
    }

    #[test]
    fn test_serializes_camel_case() {
        let progress = WeightProgress::compute::<Point>(&input(GoalSnapshot::default()), &[]);
        let json = serde_json::to_value(progress).unwrap();
        assert_eq!(json["targetBmi"], 25.0);
        assert!(json["estimatedCompletion"].is_null());
    }
}
