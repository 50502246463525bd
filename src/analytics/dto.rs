use serde::{Deserialize, Serialize};
use time::Date;

use crate::store::{DailyTargets, FoodLog, Streak, WaterLog, WeightLog};

/// Per-day totals of the macros and water.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MacroTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub water: i64,
}

impl MacroTotals {
    pub fn add_food(&mut self, log: &FoodLog) {
        self.calories += log.calories;
        self.protein += log.protein_g;
        self.carbs += log.carbs_g;
        self.fats += log.fats_g;
    }

    pub fn add_water(&mut self, log: &WaterLog) {
        self.water += i64::from(log.amount_ml);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: Date,
    pub summary: MacroTotals,
    pub targets: DailyTargets,
}

impl DailySummary {
    pub fn zeroed(date: Date, targets: DailyTargets) -> Self {
        Self {
            date,
            summary: MacroTotals::default(),
            targets,
        }
    }
}

/// Body of `GET /analytics/daily`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyResponse {
    pub summary: MacroTotals,
    pub targets: DailyTargets,
}

impl DailyResponse {
    pub fn zeroed() -> Self {
        Self {
            summary: MacroTotals::default(),
            targets: DailyTargets::default(),
        }
    }
}

impl From<DailySummary> for DailyResponse {
    fn from(d: DailySummary) -> Self {
        Self {
            summary: d.summary,
            targets: d.targets,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklySummary {
    pub data: Vec<DailySummary>,
    pub targets: DailyTargets,
    pub streak: Streak,
    pub weight_trend: f64,
    pub weight_logs: Vec<WeightLog>,
}

impl WeeklySummary {
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            targets: DailyTargets::default(),
            streak: Streak::default(),
            weight_trend: 0.0,
            weight_logs: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WeeklyQuery {
    #[serde(default = "default_days")]
    pub days: i64,
    /// Last day of the range; today when absent.
    pub end: Option<String>,
}

fn default_days() -> i64 {
    7
}
