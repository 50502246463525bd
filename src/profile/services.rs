use tracing::{info, warn};

use crate::store::{
    ActivityLevel, DailyTargets, GoalType, Profile, ProfileUpdate, ScopedStore, TargetUpdate,
};

const DEFAULT_HEIGHT_CM: f64 = 170.0;
const DEFAULT_WEIGHT_KG: f64 = 70.0;
const DEFAULT_AGE: f64 = 25.0;

/// Updates the caller's profile, creating it (with default targets) on first write.
pub async fn upsert_profile(store: &ScopedStore, update: &ProfileUpdate) -> anyhow::Result<Profile> {
    if let Some(profile) = store.update_profile(update).await? {
        return Ok(profile);
    }

    let created = store.insert_profile(&update.into()).await?;
    info!("profile created");
    match store.targets().await {
        Ok(Some(_)) => {}
        Ok(None) => {
            if let Err(e) = store.insert_targets(&DailyTargets::default()).await {
                warn!(error = %format!("{e:#}"), "could not create default targets");
            }
        }
        Err(e) => warn!(error = %format!("{e:#}"), "could not check targets"),
    }
    Ok(created)
}

pub async fn upsert_targets(store: &ScopedStore, update: &TargetUpdate) -> anyhow::Result<DailyTargets> {
    if let Some(targets) = store.update_targets(update).await? {
        return Ok(targets);
    }
    store.insert_targets(&update.apply(DailyTargets::default())).await
}

fn activity_multiplier(level: ActivityLevel) -> f64 {
    match level {
        ActivityLevel::Low => 1.2,
        ActivityLevel::Medium => 1.55,
        ActivityLevel::High => 1.9,
    }
}

fn goal_adjustment(goal: GoalType) -> f64 {
    match goal {
        GoalType::FatLoss => -500.0,
        GoalType::Maintain => 0.0,
        GoalType::MuscleGain => 300.0,
    }
}

/// Targets derived from body stats: Mifflin-St Jeor BMR times activity,
/// shifted by goal, then split into macros. Missing stats use 170 cm, 70 kg, 25 years.
pub fn suggest_targets(profile: Option<&Profile>) -> DailyTargets {
    let weight = profile
        .and_then(|p| p.weight_kg)
        .filter(|w| *w > 0.0)
        .unwrap_or(DEFAULT_WEIGHT_KG);
    let height = profile
        .and_then(|p| p.height_cm)
        .filter(|h| *h > 0)
        .map_or(DEFAULT_HEIGHT_CM, f64::from);
    let age = profile
        .and_then(|p| p.age)
        .filter(|a| *a > 0)
        .map_or(DEFAULT_AGE, f64::from);
    let activity = profile.map(|p| p.activity_level).unwrap_or_default();
    let goal = profile.map(|p| p.goal_type).unwrap_or_default();

    let bmr = 10.0 * weight + 6.25 * height - 5.0 * age + 5.0;
    let tdee = bmr * activity_multiplier(activity) + goal_adjustment(goal);

    let protein = (weight * 2.2).round();
    let fats = (tdee * 0.25 / 9.0).round();
    let carbs = ((tdee - protein * 4.0 - fats * 9.0) / 4.0).round().max(0.0);

    DailyTargets {
        calories_target: tdee.round() as i32,
        protein_target_g: protein as i32,
        carbs_target_g: carbs as i32,
        fats_target_g: fats as i32,
        water_target_ml: (weight * 35.0).round() as i32,
    }
}
