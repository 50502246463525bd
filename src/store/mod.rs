//! Data store gateway.
//!
//! Every method takes the caller's user id and only ever touches that user's
//! rows (the master food catalog is the one shared table). Handlers never see
//! the raw [`Store`]; they get a [`ScopedStore`] already bound to the verified
//! caller through [`crate::auth::RequestContext`].

use std::sync::Arc;

use async_trait::async_trait;
use time::Date;
use uuid::Uuid;

pub mod memory;
pub mod models;
pub mod postgres;

pub use memory::{MemoryStore, Table};
pub use models::*;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    async fn profile(&self, user_id: Uuid) -> anyhow::Result<Option<Profile>>;
    async fn insert_profile(&self, user_id: Uuid, profile: &NewProfile) -> anyhow::Result<Profile>;
    async fn update_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> anyhow::Result<Option<Profile>>;

    async fn targets(&self, user_id: Uuid) -> anyhow::Result<Option<DailyTargets>>;
    async fn insert_targets(
        &self,
        user_id: Uuid,
        targets: &DailyTargets,
    ) -> anyhow::Result<DailyTargets>;
    async fn update_targets(
        &self,
        user_id: Uuid,
        update: &TargetUpdate,
    ) -> anyhow::Result<Option<DailyTargets>>;

    async fn streak(&self, user_id: Uuid) -> anyhow::Result<Option<Streak>>;
    async fn save_streak(&self, user_id: Uuid, streak: &Streak) -> anyhow::Result<()>;

    /// Case-insensitive substring search on food names.
    async fn search_foods(
        &self,
        user_id: Uuid,
        kind: FoodKind,
        query: &str,
        limit: i64,
    ) -> anyhow::Result<Vec<Food>>;
    async fn insert_custom_food(&self, user_id: Uuid, food: &NewCustomFood) -> anyhow::Result<Food>;
    /// Batch lookup; result order is unspecified.
    async fn foods_by_ids(
        &self,
        user_id: Uuid,
        kind: FoodKind,
        ids: &[Uuid],
    ) -> anyhow::Result<Vec<Food>>;

    async fn insert_food_log(&self, user_id: Uuid, log: &NewFoodLog) -> anyhow::Result<FoodLog>;
    /// Logs with `start <= date <= end`.
    async fn food_logs_between(
        &self,
        user_id: Uuid,
        start: Date,
        end: Date,
    ) -> anyhow::Result<Vec<FoodLog>>;
    async fn update_food_log(
        &self,
        user_id: Uuid,
        id: Uuid,
        log: &NewFoodLog,
    ) -> anyhow::Result<Option<FoodLog>>;
    async fn delete_food_log(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool>;
    /// Newest first by creation time.
    async fn recent_food_logs(&self, user_id: Uuid, limit: i64) -> anyhow::Result<Vec<RecentLogRow>>;

    async fn insert_favorite(
        &self,
        user_id: Uuid,
        food_id: Uuid,
        kind: FoodKind,
    ) -> anyhow::Result<Favorite>;
    /// Removes favorites whose master or custom id equals `food_id`.
    async fn delete_favorite(&self, user_id: Uuid, food_id: Uuid) -> anyhow::Result<u64>;
    async fn favorites(&self, user_id: Uuid) -> anyhow::Result<Vec<FavoriteFood>>;

    async fn insert_water_log(&self, user_id: Uuid, log: &NewWaterLog) -> anyhow::Result<WaterLog>;
    async fn water_logs_between(
        &self,
        user_id: Uuid,
        start: Date,
        end: Date,
    ) -> anyhow::Result<Vec<WaterLog>>;

    /// Insert or replace the entry for `(user, date)`.
    async fn upsert_weight_log(&self, user_id: Uuid, log: &NewWeightLog) -> anyhow::Result<WeightLog>;
    /// Newest first, optionally only entries dated on or after `since`.
    async fn weight_logs(
        &self,
        user_id: Uuid,
        since: Option<Date>,
        limit: i64,
    ) -> anyhow::Result<Vec<WeightLog>>;
}

/// A [`Store`] bound to one authenticated user.
#[derive(Clone)]
pub struct ScopedStore {
    user_id: Uuid,
    inner: Arc<dyn Store>,
}

impl ScopedStore {
    pub fn new(inner: Arc<dyn Store>, user_id: Uuid) -> Self {
        Self { user_id, inner }
    }

    pub async fn profile(&self) -> anyhow::Result<Option<Profile>> {
        self.inner.profile(self.user_id).await
    }

    pub async fn insert_profile(&self, profile: &NewProfile) -> anyhow::Result<Profile> {
        self.inner.insert_profile(self.user_id, profile).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> anyhow::Result<Option<Profile>> {
        self.inner.update_profile(self.user_id, update).await
    }

    pub async fn targets(&self) -> anyhow::Result<Option<DailyTargets>> {
        self.inner.targets(self.user_id).await
    }

    pub async fn insert_targets(&self, targets: &DailyTargets) -> anyhow::Result<DailyTargets> {
        self.inner.insert_targets(self.user_id, targets).await
    }

    pub async fn update_targets(&self, update: &TargetUpdate) -> anyhow::Result<Option<DailyTargets>> {
        self.inner.update_targets(self.user_id, update).await
    }

    pub async fn streak(&self) -> anyhow::Result<Option<Streak>> {
        self.inner.streak(self.user_id).await
    }

    pub async fn save_streak(&self, streak: &Streak) -> anyhow::Result<()> {
        self.inner.save_streak(self.user_id, streak).await
    }

    pub async fn search_foods(
        &self,
        kind: FoodKind,
        query: &str,
        limit: i64,
    ) -> anyhow::Result<Vec<Food>> {
        self.inner.search_foods(self.user_id, kind, query, limit).await
    }

    pub async fn insert_custom_food(&self, food: &NewCustomFood) -> anyhow::Result<Food> {
        self.inner.insert_custom_food(self.user_id, food).await
    }

    pub async fn foods_by_ids(&self, kind: FoodKind, ids: &[Uuid]) -> anyhow::Result<Vec<Food>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.inner.foods_by_ids(self.user_id, kind, ids).await
    }

    pub async fn insert_food_log(&self, log: &NewFoodLog) -> anyhow::Result<FoodLog> {
        self.inner.insert_food_log(self.user_id, log).await
    }

    pub async fn food_logs_on(&self, date: Date) -> anyhow::Result<Vec<FoodLog>> {
        self.inner.food_logs_between(self.user_id, date, date).await
    }

    pub async fn food_logs_between(&self, start: Date, end: Date) -> anyhow::Result<Vec<FoodLog>> {
        self.inner.food_logs_between(self.user_id, start, end).await
    }

    pub async fn update_food_log(&self, id: Uuid, log: &NewFoodLog) -> anyhow::Result<Option<FoodLog>> {
        self.inner.update_food_log(self.user_id, id, log).await
    }

    pub async fn delete_food_log(&self, id: Uuid) -> anyhow::Result<bool> {
        self.inner.delete_food_log(self.user_id, id).await
    }

    pub async fn recent_food_logs(&self, limit: i64) -> anyhow::Result<Vec<RecentLogRow>> {
        self.inner.recent_food_logs(self.user_id, limit).await
    }

    pub async fn insert_favorite(&self, food_id: Uuid, kind: FoodKind) -> anyhow::Result<Favorite> {
        self.inner.insert_favorite(self.user_id, food_id, kind).await
    }

    pub async fn delete_favorite(&self, food_id: Uuid) -> anyhow::Result<u64> {
        self.inner.delete_favorite(self.user_id, food_id).await
    }

    pub async fn favorites(&self) -> anyhow::Result<Vec<FavoriteFood>> {
        self.inner.favorites(self.user_id).await
    }

    pub async fn insert_water_log(&self, log: &NewWaterLog) -> anyhow::Result<WaterLog> {
        self.inner.insert_water_log(self.user_id, log).await
    }

    pub async fn water_logs_on(&self, date: Date) -> anyhow::Result<Vec<WaterLog>> {
        self.inner.water_logs_between(self.user_id, date, date).await
    }

    pub async fn water_logs_between(&self, start: Date, end: Date) -> anyhow::Result<Vec<WaterLog>> {
        self.inner.water_logs_between(self.user_id, start, end).await
    }

    pub async fn upsert_weight_log(&self, log: &NewWeightLog) -> anyhow::Result<WeightLog> {
        self.inner.upsert_weight_log(self.user_id, log).await
    }

    pub async fn weight_logs(&self, since: Option<Date>, limit: i64) -> anyhow::Result<Vec<WeightLog>> {
        self.inner.weight_logs(self.user_id, since, limit).await
    }
}
