//! Pure aggregation over already-fetched rows.

use std::collections::BTreeMap;

use time::Date;

use super::dto::{DailySummary, MacroTotals};
use crate::store::{DailyTargets, FoodLog, WaterLog, WeightLog};

/// How many recent weight entries feed the trend.
pub const WEIGHT_TREND_SAMPLE: i64 = 10;
/// How far before the range start weight entries are considered.
pub const WEIGHT_LOOKBACK_DAYS: i64 = 30;

/// Sums every given entry into one day's summary.
pub fn daily_summary(
    date: Date,
    food: &[FoodLog],
    water: &[WaterLog],
    targets: DailyTargets,
) -> DailySummary {
    let mut day = DailySummary::zeroed(date, targets);
    food.iter().for_each(|log| day.summary.add_food(log));
    water.iter().for_each(|log| day.summary.add_water(log));
    day
}

/// One zero-filled bucket per day of `[start, start + days)`, then every entry
/// dated inside the range is accumulated into its bucket. Entries outside the
/// range are ignored. Output is ascending by date.
pub fn fill_range(
    start: Date,
    days: u32,
    food: &[FoodLog],
    water: &[WaterLog],
    targets: DailyTargets,
) -> Vec<DailySummary> {
    let mut buckets = BTreeMap::new();
    let mut day = Some(start);
    for _ in 0..days {
        let Some(d) = day else { break };
        buckets.insert(d, DailySummary::zeroed(d, targets));
        day = d.next_day();
    }

    for log in food {
        if let Some(bucket) = buckets.get_mut(&log.date) {
            bucket.summary.add_food(log);
        }
    }
    for log in water {
        if let Some(bucket) = buckets.get_mut(&log.date) {
            bucket.summary.add_water(log);
        }
    }

    buckets.into_values().collect()
}

/// Newest minus oldest of the sample, to one decimal. Not a fitted slope:
/// only the two end points of whatever was fetched matter.
pub fn weight_trend(newest_first: &[WeightLog]) -> f64 {
    match newest_first {
        [newest, .., oldest] => round1(newest.weight_kg - oldest.weight_kg),
        _ => 0.0,
    }
}

pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FoodSource, MealType};
    use time::{macros::date, OffsetDateTime};
    use uuid::Uuid;

    fn food(date: Date, calories: f64, protein: f64, carbs: f64, fats: f64) -> FoodLog {
        FoodLog {
            id: Uuid::new_v4(),
            date,
            meal_type: MealType::Lunch,
            food_source: FoodSource::Manual,
            food_master_id: None,
            food_custom_id: None,
            food_name: "x".into(),
            qty: 1.0,
            calories,
            protein_g: protein,
            carbs_g: carbs,
            fats_g: fats,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn water(date: Date, ml: i32) -> WaterLog {
        WaterLog {
            id: Uuid::new_v4(),
            date,
            amount_ml: ml,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn weight(date: Date, kg: f64) -> WeightLog {
        WeightLog {
            id: Uuid::new_v4(),
            date,
            weight_kg: kg,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn empty_day_is_all_zero_with_given_targets() {
        let d = date!(2024 - 06 - 01);
        let day = daily_summary(d, &[], &[], DailyTargets::default());
        assert_eq!(day.summary, MacroTotals::default());
        assert_eq!(day.targets, DailyTargets::default());
        assert_eq!(day.date, d);
    }

    #[test]
    fn daily_sums_are_unrounded() {
        let d = date!(2024 - 06 - 01);
        let day = daily_summary(
            d,
            &[food(d, 100.5, 10.25, 20.0, 3.0), food(d, 50.25, 0.5, 1.0, 0.125)],
            &[water(d, 500), water(d, 300)],
            DailyTargets::default(),
        );
        assert_eq!(day.summary.calories, 150.75);
        assert_eq!(day.summary.protein, 10.75);
        assert_eq!(day.summary.carbs, 21.0);
        assert_eq!(day.summary.fats, 3.125);
        assert_eq!(day.summary.water, 800);
    }

    #[test]
    fn range_has_one_bucket_per_day_in_ascending_order() {
        let start = date!(2024 - 02 - 26);
        let days = fill_range(start, 7, &[], &[], DailyTargets::default());
        let dates: Vec<Date> = days.iter().map(|d| d.date).collect();
        assert_eq!(
            dates,
            vec![
                date!(2024 - 02 - 26),
                date!(2024 - 02 - 27),
                date!(2024 - 02 - 28),
                date!(2024 - 02 - 29),
                date!(2024 - 03 - 01),
                date!(2024 - 03 - 02),
                date!(2024 - 03 - 03),
            ]
        );
        assert!(days.iter().all(|d| d.summary == MacroTotals::default()));
    }

    #[test]
    fn range_buckets_add_up_per_date_and_drop_strays() {
        let start = date!(2024 - 06 - 01);
        let food_logs = vec![
            food(date!(2024 - 06 - 01), 200.0, 1.0, 1.0, 1.0),
            food(date!(2024 - 06 - 03), 300.0, 2.0, 2.0, 2.0),
            food(date!(2024 - 06 - 03), 150.0, 1.0, 1.0, 1.0),
            food(date!(2024 - 05 - 31), 999.0, 9.0, 9.0, 9.0),
            food(date!(2024 - 06 - 04), 999.0, 9.0, 9.0, 9.0),
        ];
        let water_logs = vec![water(date!(2024 - 06 - 02), 250), water(date!(2024 - 07 - 01), 9000)];
        let days = fill_range(start, 3, &food_logs, &water_logs, DailyTargets::default());

        assert_eq!(days.len(), 3);
        assert_eq!(days[0].summary.calories, 200.0);
        assert_eq!(days[1].summary.calories, 0.0);
        assert_eq!(days[1].summary.water, 250);
        assert_eq!(days[2].summary.calories, 450.0);
        assert_eq!(days[2].summary.protein, 3.0);

        let in_range: f64 = food_logs
            .iter()
            .filter(|f| f.date == date!(2024 - 06 - 03))
            .map(|f| f.calories)
            .sum();
        assert_eq!(days[2].summary.calories, in_range);
    }

    #[test]
    fn range_shares_one_targets_snapshot() {
        let targets = DailyTargets { calories_target: 1800, ..DailyTargets::default() };
        let days = fill_range(date!(2024 - 01 - 01), 2, &[], &[], targets);
        assert!(days.iter().all(|d| d.targets == targets));
    }

    #[test]
    fn trend_needs_two_points() {
        assert_eq!(weight_trend(&[]), 0.0);
        assert_eq!(weight_trend(&[weight(date!(2024 - 06 - 01), 80.0)]), 0.0);
    }

    #[test]
    fn trend_is_newest_minus_oldest_rounded() {
        let sample = vec![
            weight(date!(2024 - 06 - 10), 78.46),
            weight(date!(2024 - 06 - 05), 90.0),
            weight(date!(2024 - 06 - 01), 80.0),
        ];
        // the middle point is ignored
        assert_eq!(weight_trend(&sample), -1.5);

        let gain = vec![weight(date!(2024 - 06 - 10), 70.26), weight(date!(2024 - 06 - 01), 70.0)];
        assert_eq!(weight_trend(&gain), 0.3);
    }
}
