use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::{models::*, Store};

/// Tables of the in-memory store; used to inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Profiles,
    DailyTargets,
    Streaks,
    FoodsMaster,
    FoodsCustom,
    FoodLogs,
    Favorites,
    WaterLogs,
    WeightLogs,
}

struct Owned<T> {
    user_id: Uuid,
    row: T,
}

#[derive(Default)]
struct Tables {
    profiles: HashMap<Uuid, Profile>,
    targets: HashMap<Uuid, DailyTargets>,
    streaks: HashMap<Uuid, Streak>,
    foods_master: Vec<Food>,
    foods_custom: Vec<Owned<Food>>,
    // insertion order doubles as creation order
    food_logs: Vec<Owned<FoodLog>>,
    favorites: Vec<Owned<Favorite>>,
    water_logs: Vec<Owned<WaterLog>>,
    weight_logs: Vec<Owned<WeightLog>>,
}

/// Process-local [`Store`] for tests and `DATA_STORE=memory` runs.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    broken: Mutex<HashSet<Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_master_food(&self, food: Food) -> Food {
        self.tables().foods_master.push(food.clone());
        food
    }

    /// Makes every later operation on `table` fail until [`MemoryStore::heal`].
    pub fn fail(&self, table: Table) {
        self.broken.lock().unwrap_or_else(|e| e.into_inner()).insert(table);
    }

    pub fn heal(&self, table: Table) {
        self.broken.lock().unwrap_or_else(|e| e.into_inner()).remove(&table);
    }

    fn check(&self, table: Table) -> anyhow::Result<()> {
        if self.broken.lock().unwrap_or_else(|e| e.into_inner()).contains(&table) {
            anyhow::bail!("table {table:?} unavailable");
        }
        Ok(())
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn matches_name(name: &str, query: &str) -> bool {
    name.to_lowercase().contains(&query.to_lowercase())
}

fn take(limit: i64) -> usize {
    usize::try_from(limit).unwrap_or(0)
}

fn food_log_row(id: Uuid, log: &NewFoodLog, created_at: OffsetDateTime) -> FoodLog {
    FoodLog {
        id,
        date: log.date,
        meal_type: log.meal_type,
        food_source: log.source(),
        food_master_id: log.food_master_id,
        food_custom_id: log.food_custom_id,
        food_name: log.food_name.clone(),
        qty: log.qty,
        calories: log.calories,
        protein_g: log.protein_g,
        carbs_g: log.carbs_g,
        fats_g: log.fats_g,
        created_at,
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn profile(&self, user_id: Uuid) -> anyhow::Result<Option<Profile>> {
        self.check(Table::Profiles)?;
        Ok(self.tables().profiles.get(&user_id).cloned())
    }

    async fn insert_profile(&self, user_id: Uuid, profile: &NewProfile) -> anyhow::Result<Profile> {
        self.check(Table::Profiles)?;
        let mut t = self.tables();
        if t.profiles.contains_key(&user_id) {
            anyhow::bail!("duplicate key value violates unique constraint \"profiles_pkey\"");
        }
        let row = Profile {
            id: user_id,
            name: profile.name.clone(),
            age: profile.age,
            height_cm: profile.height_cm,
            weight_kg: profile.weight_kg,
            activity_level: profile.activity_level,
            goal_type: profile.goal_type,
            created_at: OffsetDateTime::now_utc(),
        };
        t.profiles.insert(user_id, row.clone());
        Ok(row)
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> anyhow::Result<Option<Profile>> {
        self.check(Table::Profiles)?;
        let mut t = self.tables();
        let Some(p) = t.profiles.get_mut(&user_id) else {
            return Ok(None);
        };
        if let Some(name) = &update.name {
            p.name = name.clone();
        }
        p.age = update.age.or(p.age);
        p.height_cm = update.height_cm.or(p.height_cm);
        p.weight_kg = update.weight_kg.or(p.weight_kg);
        p.activity_level = update.activity_level.unwrap_or(p.activity_level);
        p.goal_type = update.goal_type.unwrap_or(p.goal_type);
        Ok(Some(p.clone()))
    }

    async fn targets(&self, user_id: Uuid) -> anyhow::Result<Option<DailyTargets>> {
        self.check(Table::DailyTargets)?;
        Ok(self.tables().targets.get(&user_id).copied())
    }

    async fn insert_targets(
        &self,
        user_id: Uuid,
        targets: &DailyTargets,
    ) -> anyhow::Result<DailyTargets> {
        self.check(Table::DailyTargets)?;
        let mut t = self.tables();
        if t.targets.contains_key(&user_id) {
            anyhow::bail!("duplicate key value violates unique constraint \"daily_targets_pkey\"");
        }
        t.targets.insert(user_id, *targets);
        Ok(*targets)
    }

    async fn update_targets(
        &self,
        user_id: Uuid,
        update: &TargetUpdate,
    ) -> anyhow::Result<Option<DailyTargets>> {
        self.check(Table::DailyTargets)?;
        let mut t = self.tables();
        Ok(t.targets.get_mut(&user_id).map(|current| {
            *current = update.apply(*current);
            *current
        }))
    }

    async fn streak(&self, user_id: Uuid) -> anyhow::Result<Option<Streak>> {
        self.check(Table::Streaks)?;
        Ok(self.tables().streaks.get(&user_id).copied())
    }

    async fn save_streak(&self, user_id: Uuid, streak: &Streak) -> anyhow::Result<()> {
        self.check(Table::Streaks)?;
        self.tables().streaks.insert(user_id, *streak);
        Ok(())
    }

    async fn search_foods(
        &self,
        user_id: Uuid,
        kind: FoodKind,
        query: &str,
        limit: i64,
    ) -> anyhow::Result<Vec<Food>> {
        let t = self.tables();
        let found = match kind {
            FoodKind::Master => {
                self.check(Table::FoodsMaster)?;
                t.foods_master
                    .iter()
                    .filter(|f| matches_name(&f.name, query))
                    .take(take(limit))
                    .cloned()
                    .collect()
            }
            FoodKind::Custom => {
                self.check(Table::FoodsCustom)?;
                t.foods_custom
                    .iter()
                    .filter(|o| o.user_id == user_id && matches_name(&o.row.name, query))
                    .take(take(limit))
                    .map(|o| o.row.clone())
                    .collect()
            }
        };
        Ok(found)
    }

    async fn insert_custom_food(&self, user_id: Uuid, food: &NewCustomFood) -> anyhow::Result<Food> {
        self.check(Table::FoodsCustom)?;
        let row = Food {
            id: Uuid::new_v4(),
            name: food.name.clone(),
            unit_type: food.unit_type,
            base_qty: food.base_qty,
            calories: food.calories,
            protein_g: food.protein_g,
            carbs_g: food.carbs_g,
            fats_g: food.fats_g,
        };
        self.tables().foods_custom.push(Owned { user_id, row: row.clone() });
        Ok(row)
    }

    async fn foods_by_ids(
        &self,
        user_id: Uuid,
        kind: FoodKind,
        ids: &[Uuid],
    ) -> anyhow::Result<Vec<Food>> {
        let t = self.tables();
        let found = match kind {
            FoodKind::Master => {
                self.check(Table::FoodsMaster)?;
                t.foods_master
                    .iter()
                    .filter(|f| ids.contains(&f.id))
                    .cloned()
                    .collect()
            }
            FoodKind::Custom => {
                self.check(Table::FoodsCustom)?;
                t.foods_custom
                    .iter()
                    .filter(|o| o.user_id == user_id && ids.contains(&o.row.id))
                    .map(|o| o.row.clone())
                    .collect()
            }
        };
        Ok(found)
    }

    async fn insert_food_log(&self, user_id: Uuid, log: &NewFoodLog) -> anyhow::Result<FoodLog> {
        self.check(Table::FoodLogs)?;
        let row = food_log_row(Uuid::new_v4(), log, OffsetDateTime::now_utc());
        self.tables().food_logs.push(Owned { user_id, row: row.clone() });
        Ok(row)
    }

    async fn food_logs_between(
        &self,
        user_id: Uuid,
        start: Date,
        end: Date,
    ) -> anyhow::Result<Vec<FoodLog>> {
        self.check(Table::FoodLogs)?;
        Ok(self
            .tables()
            .food_logs
            .iter()
            .filter(|o| o.user_id == user_id && o.row.date >= start && o.row.date <= end)
            .map(|o| o.row.clone())
            .collect())
    }

    async fn update_food_log(
        &self,
        user_id: Uuid,
        id: Uuid,
        log: &NewFoodLog,
    ) -> anyhow::Result<Option<FoodLog>> {
        self.check(Table::FoodLogs)?;
        let mut t = self.tables();
        Ok(t.food_logs
            .iter_mut()
            .find(|o| o.user_id == user_id && o.row.id == id)
            .map(|o| {
                o.row = food_log_row(id, log, o.row.created_at);
                o.row.clone()
            }))
    }

    async fn delete_food_log(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        self.check(Table::FoodLogs)?;
        let mut t = self.tables();
        let before = t.food_logs.len();
        t.food_logs.retain(|o| !(o.user_id == user_id && o.row.id == id));
        Ok(t.food_logs.len() != before)
    }

    async fn recent_food_logs(&self, user_id: Uuid, limit: i64) -> anyhow::Result<Vec<RecentLogRow>> {
        self.check(Table::FoodLogs)?;
        Ok(self
            .tables()
            .food_logs
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .take(take(limit))
            .map(|o| RecentLogRow {
                food_name: o.row.food_name.clone(),
                food_master_id: o.row.food_master_id,
                food_custom_id: o.row.food_custom_id,
                food_source: o.row.food_source,
            })
            .collect())
    }

    async fn insert_favorite(
        &self,
        user_id: Uuid,
        food_id: Uuid,
        kind: FoodKind,
    ) -> anyhow::Result<Favorite> {
        self.check(Table::Favorites)?;
        let row = Favorite {
            id: Uuid::new_v4(),
            food_master_id: (kind == FoodKind::Master).then_some(food_id),
            food_custom_id: (kind == FoodKind::Custom).then_some(food_id),
            created_at: OffsetDateTime::now_utc(),
        };
        self.tables().favorites.push(Owned { user_id, row: row.clone() });
        Ok(row)
    }

    async fn delete_favorite(&self, user_id: Uuid, food_id: Uuid) -> anyhow::Result<u64> {
        self.check(Table::Favorites)?;
        let mut t = self.tables();
        let before = t.favorites.len();
        t.favorites.retain(|o| {
            !(o.user_id == user_id
                && (o.row.food_master_id == Some(food_id) || o.row.food_custom_id == Some(food_id)))
        });
        Ok((before - t.favorites.len()) as u64)
    }

    async fn favorites(&self, user_id: Uuid) -> anyhow::Result<Vec<FavoriteFood>> {
        self.check(Table::Favorites)?;
        let t = self.tables();
        let joined = t
            .favorites
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .filter_map(|o| {
                let master = o
                    .row
                    .food_master_id
                    .and_then(|id| t.foods_master.iter().find(|f| f.id == id));
                let custom = o.row.food_custom_id.and_then(|id| {
                    t.foods_custom
                        .iter()
                        .find(|c| c.user_id == user_id && c.row.id == id)
                        .map(|c| &c.row)
                });
                master.or(custom).map(|food| FavoriteFood {
                    food: food.clone(),
                    favorite_id: o.row.id,
                    is_custom: o.row.food_custom_id.is_some(),
                })
            })
            .collect();
        Ok(joined)
    }

    async fn insert_water_log(&self, user_id: Uuid, log: &NewWaterLog) -> anyhow::Result<WaterLog> {
        self.check(Table::WaterLogs)?;
        let row = WaterLog {
            id: Uuid::new_v4(),
            date: log.date,
            amount_ml: log.amount_ml,
            created_at: OffsetDateTime::now_utc(),
        };
        self.tables().water_logs.push(Owned { user_id, row: row.clone() });
        Ok(row)
    }

    async fn water_logs_between(
        &self,
        user_id: Uuid,
        start: Date,
        end: Date,
    ) -> anyhow::Result<Vec<WaterLog>> {
        self.check(Table::WaterLogs)?;
        Ok(self
            .tables()
            .water_logs
            .iter()
            .filter(|o| o.user_id == user_id && o.row.date >= start && o.row.date <= end)
            .map(|o| o.row.clone())
            .collect())
    }

    async fn upsert_weight_log(&self, user_id: Uuid, log: &NewWeightLog) -> anyhow::Result<WeightLog> {
        self.check(Table::WeightLogs)?;
        let mut t = self.tables();
        if let Some(existing) = t
            .weight_logs
            .iter_mut()
            .find(|o| o.user_id == user_id && o.row.date == log.date)
        {
            existing.row.weight_kg = log.weight_kg;
            return Ok(existing.row.clone());
        }
        let row = WeightLog {
            id: Uuid::new_v4(),
            date: log.date,
            weight_kg: log.weight_kg,
            created_at: OffsetDateTime::now_utc(),
        };
        t.weight_logs.push(Owned { user_id, row: row.clone() });
        Ok(row)
    }

    async fn weight_logs(
        &self,
        user_id: Uuid,
        since: Option<Date>,
        limit: i64,
    ) -> anyhow::Result<Vec<WeightLog>> {
        self.check(Table::WeightLogs)?;
        let mut rows: Vec<WeightLog> = self
            .tables()
            .weight_logs
            .iter()
            .filter(|o| o.user_id == user_id && since.map_or(true, |s| o.row.date >= s))
            .map(|o| o.row.clone())
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        rows.truncate(take(limit));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn weight(date: Date, kg: f64) -> NewWeightLog {
        NewWeightLog { date, weight_kg: kg }
    }

    #[tokio::test]
    async fn rows_are_scoped_to_their_owner() {
        let store = MemoryStore::new();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let d = date!(2024 - 03 - 01);
        store
            .insert_water_log(alice, &NewWaterLog { date: d, amount_ml: 250 })
            .await
            .unwrap();

        assert_eq!(store.water_logs_between(alice, d, d).await.unwrap().len(), 1);
        assert!(store.water_logs_between(bob, d, d).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn weight_upsert_replaces_same_day_and_lists_newest_first() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store.upsert_weight_log(user, &weight(date!(2024 - 03 - 01), 80.0)).await.unwrap();
        store.upsert_weight_log(user, &weight(date!(2024 - 03 - 03), 79.0)).await.unwrap();
        store.upsert_weight_log(user, &weight(date!(2024 - 03 - 01), 81.0)).await.unwrap();

        let rows = store.weight_logs(user, None, 30).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, date!(2024 - 03 - 03));
        assert_eq!(rows[1].weight_kg, 81.0);

        let since = store.weight_logs(user, Some(date!(2024 - 03 - 02)), 30).await.unwrap();
        assert_eq!(since.len(), 1);
    }

    #[tokio::test]
    async fn broken_tables_fail_until_healed() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store.fail(Table::DailyTargets);
        assert!(store.targets(user).await.is_err());
        store.heal(Table::DailyTargets);
        assert_eq!(store.targets(user).await.unwrap(), None);
    }
}
