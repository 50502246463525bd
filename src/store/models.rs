use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Snacks,
    Dinner,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FoodSource {
    #[default]
    Master,
    Custom,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum UnitType {
    #[serde(rename = "g")]
    #[sqlx(rename = "g")]
    Grams,
    #[serde(rename = "ml")]
    #[sqlx(rename = "ml")]
    Millilitres,
    #[serde(rename = "serving")]
    #[sqlx(rename = "serving")]
    Serving,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    #[default]
    Maintain,
    FatLoss,
    MuscleGain,
}

/// Which catalog a food id points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoodKind {
    Master,
    Custom,
}

// ---- rows ----

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub age: Option<i32>,
    pub height_cm: Option<i32>,
    pub weight_kg: Option<f64>,
    pub activity_level: ActivityLevel,
    pub goal_type: GoalType,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Per-user daily goals. Absent rows read as [`DailyTargets::default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DailyTargets {
    pub calories_target: i32,
    pub protein_target_g: i32,
    pub carbs_target_g: i32,
    pub fats_target_g: i32,
    pub water_target_ml: i32,
}

impl Default for DailyTargets {
    fn default() -> Self {
        Self {
            calories_target: 2000,
            protein_target_g: 120,
            carbs_target_g: 250,
            fats_target_g: 60,
            water_target_ml: 2500,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Streak {
    pub current_streak: i32,
    pub best_streak: i32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_log_date: Option<Date>,
}

/// A catalog entry, either from the shared master list or a user's custom foods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Food {
    pub id: Uuid,
    pub name: String,
    pub unit_type: UnitType,
    pub base_qty: f64,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fats_g: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FoodLog {
    pub id: Uuid,
    pub date: Date,
    pub meal_type: MealType,
    pub food_source: FoodSource,
    pub food_master_id: Option<Uuid>,
    pub food_custom_id: Option<Uuid>,
    pub food_name: String,
    pub qty: f64,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fats_g: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The slice of a food log needed to rebuild the recently used list.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RecentLogRow {
    pub food_name: String,
    pub food_master_id: Option<Uuid>,
    pub food_custom_id: Option<Uuid>,
    pub food_source: FoodSource,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WaterLog {
    pub id: Uuid,
    pub date: Date,
    pub amount_ml: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WeightLog {
    pub id: Uuid,
    pub date: Date,
    pub weight_kg: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Favorite {
    pub id: Uuid,
    pub food_master_id: Option<Uuid>,
    pub food_custom_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A favorite joined with the food it points at.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FavoriteFood {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub food: Food,
    pub favorite_id: Uuid,
    pub is_custom: bool,
}

/// A food tagged with the catalog it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaggedFood {
    #[serde(flatten)]
    pub food: Food,
    pub is_custom: bool,
}

// ---- inputs ----

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub height_cm: Option<i32>,
    pub weight_kg: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub goal_type: Option<GoalType>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.age.is_none()
            && self.height_cm.is_none()
            && self.weight_kg.is_none()
            && self.activity_level.is_none()
            && self.goal_type.is_none()
    }
}

/// A profile as first written, before the store assigns `created_at`.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub name: String,
    pub age: Option<i32>,
    pub height_cm: Option<i32>,
    pub weight_kg: Option<f64>,
    pub activity_level: ActivityLevel,
    pub goal_type: GoalType,
}

impl From<&ProfileUpdate> for NewProfile {
    fn from(u: &ProfileUpdate) -> Self {
        Self {
            name: u.name.clone().unwrap_or_else(|| "User".into()),
            age: u.age,
            height_cm: u.height_cm,
            weight_kg: u.weight_kg,
            activity_level: u.activity_level.unwrap_or_default(),
            goal_type: u.goal_type.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TargetUpdate {
    pub calories_target: Option<i32>,
    pub protein_target_g: Option<i32>,
    pub carbs_target_g: Option<i32>,
    pub fats_target_g: Option<i32>,
    pub water_target_ml: Option<i32>,
}

impl TargetUpdate {
    pub fn is_empty(&self) -> bool {
        self.calories_target.is_none()
            && self.protein_target_g.is_none()
            && self.carbs_target_g.is_none()
            && self.fats_target_g.is_none()
            && self.water_target_ml.is_none()
    }

    /// Overlays the fields that are set onto `base`.
    pub fn apply(&self, base: DailyTargets) -> DailyTargets {
        DailyTargets {
            calories_target: self.calories_target.unwrap_or(base.calories_target),
            protein_target_g: self.protein_target_g.unwrap_or(base.protein_target_g),
            carbs_target_g: self.carbs_target_g.unwrap_or(base.carbs_target_g),
            fats_target_g: self.fats_target_g.unwrap_or(base.fats_target_g),
            water_target_ml: self.water_target_ml.unwrap_or(base.water_target_ml),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCustomFood {
    pub name: String,
    pub unit_type: UnitType,
    pub base_qty: f64,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fats_g: f64,
}

impl NewCustomFood {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty");
        }
        if self.base_qty <= 0.0 {
            return Err("base_qty must be positive");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFoodLog {
    pub date: Date,
    pub meal_type: MealType,
    #[serde(default)]
    pub food_source: Option<FoodSource>,
    #[serde(default)]
    pub food_master_id: Option<Uuid>,
    #[serde(default)]
    pub food_custom_id: Option<Uuid>,
    pub food_name: String,
    pub qty: f64,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fats_g: f64,
}

impl NewFoodLog {
    pub fn source(&self) -> FoodSource {
        self.food_source.unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.food_master_id.is_some() && self.food_custom_id.is_some() {
            return Err("food_master_id and food_custom_id are mutually exclusive");
        }
        if self.food_name.trim().is_empty() {
            return Err("food_name must not be empty");
        }
        if self.qty < 0.0 {
            return Err("qty must not be negative");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NewWaterLog {
    pub date: Date,
    pub amount_ml: i32,
}

impl NewWaterLog {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.amount_ml <= 0 {
            return Err("amount_ml must be positive");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NewWeightLog {
    pub date: Date,
    pub weight_kg: f64,
}

impl NewWeightLog {
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(self.weight_kg.is_finite() && self.weight_kg > 0.0) {
            return Err("weight_kg must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_targets_match_the_documented_set() {
        let t = DailyTargets::default();
        assert_eq!(
            (t.calories_target, t.protein_target_g, t.carbs_target_g, t.fats_target_g, t.water_target_ml),
            (2000, 120, 250, 60, 2500)
        );
    }

    #[test]
    fn food_log_input_defaults_source_to_master() {
        let log: NewFoodLog = serde_json::from_value(json!({
            "date": "2024-05-01",
            "meal_type": "snacks",
            "food_name": "Apple",
            "qty": 1.0,
            "calories": 95.0,
            "protein_g": 0.5,
            "carbs_g": 25.0,
            "fats_g": 0.3
        }))
        .unwrap();
        assert_eq!(log.source(), FoodSource::Master);
        assert!(log.food_master_id.is_none() && log.food_custom_id.is_none());
        assert_eq!(log.date, time::macros::date!(2024 - 05 - 01));
    }

    #[test]
    fn food_log_rejects_both_catalog_ids() {
        let log: NewFoodLog = serde_json::from_value(json!({
            "date": "2024-05-01",
            "meal_type": "lunch",
            "food_master_id": Uuid::new_v4(),
            "food_custom_id": Uuid::new_v4(),
            "food_name": "Rice",
            "qty": 1.0,
            "calories": 130.0,
            "protein_g": 2.7,
            "carbs_g": 28.0,
            "fats_g": 0.3
        }))
        .unwrap();
        assert!(log.validate().is_err());
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        let d = time::macros::date!(2024 - 05 - 01);
        assert!(NewWaterLog { date: d, amount_ml: 0 }.validate().is_err());
        assert!(NewWaterLog { date: d, amount_ml: 250 }.validate().is_ok());
        assert!(NewWeightLog { date: d, weight_kg: f64::NAN }.validate().is_err());
        assert!(NewWeightLog { date: d, weight_kg: 72.5 }.validate().is_ok());
    }

    #[test]
    fn target_update_overlays_only_set_fields() {
        let update = TargetUpdate { water_target_ml: Some(3000), ..Default::default() };
        let merged = update.apply(DailyTargets::default());
        assert_eq!(merged.water_target_ml, 3000);
        assert_eq!(merged.calories_target, 2000);
        assert!(!update.is_empty());
        assert!(TargetUpdate::default().is_empty());
    }

    #[test]
    fn new_profile_fills_defaults() {
        let p = NewProfile::from(&ProfileUpdate { age: Some(30), ..Default::default() });
        assert_eq!(p.name, "User");
        assert_eq!(p.activity_level, ActivityLevel::Medium);
        assert_eq!(p.goal_type, GoalType::Maintain);
        assert_eq!(p.age, Some(30));
    }

    #[test]
    fn enums_use_wire_names() {
        assert_eq!(serde_json::to_value(UnitType::Grams).unwrap(), json!("g"));
        assert_eq!(serde_json::to_value(GoalType::FatLoss).unwrap(), json!("fat_loss"));
        let tagged = TaggedFood {
            food: Food {
                id: Uuid::nil(),
                name: "Rice".into(),
                unit_type: UnitType::Grams,
                base_qty: 100.0,
                calories: 130.0,
                protein_g: 2.7,
                carbs_g: 28.0,
                fats_g: 0.3,
            },
            is_custom: true,
        };
        let v = serde_json::to_value(&tagged).unwrap();
        assert_eq!(v["name"], "Rice");
        assert_eq!(v["is_custom"], true);
    }
}
