use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use time::Date;
use uuid::Uuid;

use super::{models::*, Store};

/// [`Store`] over a Postgres pool. Each query filters on the caller's id.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;

        // The schema may be managed outside this service.
        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }

        Ok(Self::new(db))
    }
}

/// ILIKE pattern matching `query` literally anywhere in the name.
fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl Store for PgStore {
    async fn profile(&self, user_id: Uuid) -> anyhow::Result<Option<Profile>> {
        let row = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, name, age, height_cm, weight_kg, activity_level, goal_type, created_at
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("select profile")?;
        Ok(row)
    }

    async fn insert_profile(&self, user_id: Uuid, profile: &NewProfile) -> anyhow::Result<Profile> {
        let row = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, name, age, height_cm, weight_kg, activity_level, goal_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, age, height_cm, weight_kg, activity_level, goal_type, created_at
            "#,
        )
        .bind(user_id)
        .bind(&profile.name)
        .bind(profile.age)
        .bind(profile.height_cm)
        .bind(profile.weight_kg)
        .bind(profile.activity_level)
        .bind(profile.goal_type)
        .fetch_one(&self.db)
        .await
        .context("insert profile")?;
        Ok(row)
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> anyhow::Result<Option<Profile>> {
        let row = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles
               SET name = COALESCE($2, name),
                   age = COALESCE($3, age),
                   height_cm = COALESCE($4, height_cm),
                   weight_kg = COALESCE($5, weight_kg),
                   activity_level = COALESCE($6, activity_level),
                   goal_type = COALESCE($7, goal_type)
             WHERE id = $1
            RETURNING id, name, age, height_cm, weight_kg, activity_level, goal_type, created_at
            "#,
        )
        .bind(user_id)
        .bind(update.name.as_deref())
        .bind(update.age)
        .bind(update.height_cm)
        .bind(update.weight_kg)
        .bind(update.activity_level)
        .bind(update.goal_type)
        .fetch_optional(&self.db)
        .await
        .context("update profile")?;
        Ok(row)
    }

    async fn targets(&self, user_id: Uuid) -> anyhow::Result<Option<DailyTargets>> {
        let row = sqlx::query_as::<_, DailyTargets>(
            r#"
            SELECT calories_target, protein_target_g, carbs_target_g, fats_target_g, water_target_ml
            FROM daily_targets
            WHERE user_id = $1
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("select daily targets")?;
        Ok(row)
    }

    async fn insert_targets(
        &self,
        user_id: Uuid,
        targets: &DailyTargets,
    ) -> anyhow::Result<DailyTargets> {
        let row = sqlx::query_as::<_, DailyTargets>(
            r#"
            INSERT INTO daily_targets
                (user_id, calories_target, protein_target_g, carbs_target_g, fats_target_g, water_target_ml)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING calories_target, protein_target_g, carbs_target_g, fats_target_g, water_target_ml
            "#,
        )
        .bind(user_id)
        .bind(targets.calories_target)
        .bind(targets.protein_target_g)
        .bind(targets.carbs_target_g)
        .bind(targets.fats_target_g)
        .bind(targets.water_target_ml)
        .fetch_one(&self.db)
        .await
        .context("insert daily targets")?;
        Ok(row)
    }

    async fn update_targets(
        &self,
        user_id: Uuid,
        update: &TargetUpdate,
    ) -> anyhow::Result<Option<DailyTargets>> {
        let row = sqlx::query_as::<_, DailyTargets>(
            r#"
            UPDATE daily_targets
               SET calories_target = COALESCE($2, calories_target),
                   protein_target_g = COALESCE($3, protein_target_g),
                   carbs_target_g = COALESCE($4, carbs_target_g),
                   fats_target_g = COALESCE($5, fats_target_g),
                   water_target_ml = COALESCE($6, water_target_ml)
             WHERE user_id = $1
            RETURNING calories_target, protein_target_g, carbs_target_g, fats_target_g, water_target_ml
            "#,
        )
        .bind(user_id)
        .bind(update.calories_target)
        .bind(update.protein_target_g)
        .bind(update.carbs_target_g)
        .bind(update.fats_target_g)
        .bind(update.water_target_ml)
        .fetch_optional(&self.db)
        .await
        .context("update daily targets")?;
        Ok(row)
    }

    async fn streak(&self, user_id: Uuid) -> anyhow::Result<Option<Streak>> {
        let row = sqlx::query_as::<_, Streak>(
            r#"
            SELECT current_streak, best_streak, last_log_date
            FROM streaks
            WHERE user_id = $1
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("select streak")?;
        Ok(row)
    }

    async fn save_streak(&self, user_id: Uuid, streak: &Streak) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO streaks (user_id, current_streak, best_streak, last_log_date)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
               SET current_streak = EXCLUDED.current_streak,
                   best_streak = EXCLUDED.best_streak,
                   last_log_date = EXCLUDED.last_log_date
            "#,
        )
        .bind(user_id)
        .bind(streak.current_streak)
        .bind(streak.best_streak)
        .bind(streak.last_log_date)
        .execute(&self.db)
        .await
        .context("upsert streak")?;
        Ok(())
    }

    async fn search_foods(
        &self,
        user_id: Uuid,
        kind: FoodKind,
        query: &str,
        limit: i64,
    ) -> anyhow::Result<Vec<Food>> {
        let pattern = contains_pattern(query);
        let rows = match kind {
            FoodKind::Master => sqlx::query_as::<_, Food>(
                r#"
                SELECT id, name, unit_type, base_qty, calories, protein_g, carbs_g, fats_g
                FROM foods_master
                WHERE name ILIKE $1
                ORDER BY name
                LIMIT $2
                "#,
            )
            .bind(&pattern)
            .bind(limit)
            .fetch_all(&self.db)
            .await
            .context("search master foods")?,
            FoodKind::Custom => sqlx::query_as::<_, Food>(
                r#"
                SELECT id, name, unit_type, base_qty, calories, protein_g, carbs_g, fats_g
                FROM foods_custom
                WHERE user_id = $1 AND name ILIKE $2
                ORDER BY name
                LIMIT $3
                "#,
            )
            .bind(user_id)
            .bind(&pattern)
            .bind(limit)
            .fetch_all(&self.db)
            .await
            .context("search custom foods")?,
        };
        Ok(rows)
    }

    async fn insert_custom_food(&self, user_id: Uuid, food: &NewCustomFood) -> anyhow::Result<Food> {
        let row = sqlx::query_as::<_, Food>(
            r#"
            INSERT INTO foods_custom
                (id, user_id, name, unit_type, base_qty, calories, protein_g, carbs_g, fats_g)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, name, unit_type, base_qty, calories, protein_g, carbs_g, fats_g
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&food.name)
        .bind(food.unit_type)
        .bind(food.base_qty)
        .bind(food.calories)
        .bind(food.protein_g)
        .bind(food.carbs_g)
        .bind(food.fats_g)
        .fetch_one(&self.db)
        .await
        .context("insert custom food")?;
        Ok(row)
    }

    async fn foods_by_ids(
        &self,
        user_id: Uuid,
        kind: FoodKind,
        ids: &[Uuid],
    ) -> anyhow::Result<Vec<Food>> {
        let rows = match kind {
            FoodKind::Master => sqlx::query_as::<_, Food>(
                r#"
                SELECT id, name, unit_type, base_qty, calories, protein_g, carbs_g, fats_g
                FROM foods_master
                WHERE id = ANY($1)
                "#,
            )
            .bind(ids)
            .fetch_all(&self.db)
            .await
            .context("select master foods by id")?,
            FoodKind::Custom => sqlx::query_as::<_, Food>(
                r#"
                SELECT id, name, unit_type, base_qty, calories, protein_g, carbs_g, fats_g
                FROM foods_custom
                WHERE user_id = $1 AND id = ANY($2)
                "#,
            )
            .bind(user_id)
            .bind(ids)
            .fetch_all(&self.db)
            .await
            .context("select custom foods by id")?,
        };
        Ok(rows)
    }

    async fn insert_food_log(&self, user_id: Uuid, log: &NewFoodLog) -> anyhow::Result<FoodLog> {
        let row = sqlx::query_as::<_, FoodLog>(
            r#"
            INSERT INTO food_logs
                (id, user_id, date, meal_type, food_source, food_master_id, food_custom_id,
                 food_name, qty, calories, protein_g, carbs_g, fats_g)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id, date, meal_type, food_source, food_master_id, food_custom_id,
                      food_name, qty, calories, protein_g, carbs_g, fats_g, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(log.date)
        .bind(log.meal_type)
        .bind(log.source())
        .bind(log.food_master_id)
        .bind(log.food_custom_id)
        .bind(&log.food_name)
        .bind(log.qty)
        .bind(log.calories)
        .bind(log.protein_g)
        .bind(log.carbs_g)
        .bind(log.fats_g)
        .fetch_one(&self.db)
        .await
        .context("insert food log")?;
        Ok(row)
    }

    async fn food_logs_between(
        &self,
        user_id: Uuid,
        start: Date,
        end: Date,
    ) -> anyhow::Result<Vec<FoodLog>> {
        let rows = sqlx::query_as::<_, FoodLog>(
            r#"
            SELECT id, date, meal_type, food_source, food_master_id, food_custom_id,
                   food_name, qty, calories, protein_g, carbs_g, fats_g, created_at
            FROM food_logs
            WHERE user_id = $1 AND date >= $2 AND date <= $3
            ORDER BY date, created_at
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await
        .context("select food logs")?;
        Ok(rows)
    }

    async fn update_food_log(
        &self,
        user_id: Uuid,
        id: Uuid,
        log: &NewFoodLog,
    ) -> anyhow::Result<Option<FoodLog>> {
        let row = sqlx::query_as::<_, FoodLog>(
            r#"
            UPDATE food_logs
               SET date = $3, meal_type = $4, food_source = $5, food_master_id = $6,
                   food_custom_id = $7, food_name = $8, qty = $9, calories = $10,
                   protein_g = $11, carbs_g = $12, fats_g = $13
             WHERE id = $1 AND user_id = $2
            RETURNING id, date, meal_type, food_source, food_master_id, food_custom_id,
                      food_name, qty, calories, protein_g, carbs_g, fats_g, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(log.date)
        .bind(log.meal_type)
        .bind(log.source())
        .bind(log.food_master_id)
        .bind(log.food_custom_id)
        .bind(&log.food_name)
        .bind(log.qty)
        .bind(log.calories)
        .bind(log.protein_g)
        .bind(log.carbs_g)
        .bind(log.fats_g)
        .fetch_optional(&self.db)
        .await
        .context("update food log")?;
        Ok(row)
    }

    async fn delete_food_log(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM food_logs WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("delete food log")?;
        Ok(res.rows_affected() > 0)
    }

    async fn recent_food_logs(&self, user_id: Uuid, limit: i64) -> anyhow::Result<Vec<RecentLogRow>> {
        let rows = sqlx::query_as::<_, RecentLogRow>(
            r#"
            SELECT food_name, food_master_id, food_custom_id, food_source
            FROM food_logs
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await
        .context("select recent food logs")?;
        Ok(rows)
    }

    async fn insert_favorite(
        &self,
        user_id: Uuid,
        food_id: Uuid,
        kind: FoodKind,
    ) -> anyhow::Result<Favorite> {
        let (master, custom) = match kind {
            FoodKind::Master => (Some(food_id), None),
            FoodKind::Custom => (None, Some(food_id)),
        };
        let row = sqlx::query_as::<_, Favorite>(
            r#"
            INSERT INTO favorites (id, user_id, food_master_id, food_custom_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, food_master_id, food_custom_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(master)
        .bind(custom)
        .fetch_one(&self.db)
        .await
        .context("insert favorite")?;
        Ok(row)
    }

    async fn delete_favorite(&self, user_id: Uuid, food_id: Uuid) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            DELETE FROM favorites
            WHERE user_id = $1 AND (food_master_id = $2 OR food_custom_id = $2)
            "#,
        )
        .bind(user_id)
        .bind(food_id)
        .execute(&self.db)
        .await
        .context("delete favorite")?;
        Ok(res.rows_affected())
    }

    async fn favorites(&self, user_id: Uuid) -> anyhow::Result<Vec<FavoriteFood>> {
        let rows = sqlx::query_as::<_, FavoriteFood>(
            r#"
            SELECT f.id AS favorite_id,
                   f.food_custom_id IS NOT NULL AS is_custom,
                   COALESCE(m.id, c.id) AS id,
                   COALESCE(m.name, c.name) AS name,
                   COALESCE(m.unit_type, c.unit_type) AS unit_type,
                   COALESCE(m.base_qty, c.base_qty) AS base_qty,
                   COALESCE(m.calories, c.calories) AS calories,
                   COALESCE(m.protein_g, c.protein_g) AS protein_g,
                   COALESCE(m.carbs_g, c.carbs_g) AS carbs_g,
                   COALESCE(m.fats_g, c.fats_g) AS fats_g
            FROM favorites f
            LEFT JOIN foods_master m ON m.id = f.food_master_id
            LEFT JOIN foods_custom c ON c.id = f.food_custom_id AND c.user_id = f.user_id
            WHERE f.user_id = $1 AND (m.id IS NOT NULL OR c.id IS NOT NULL)
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("select favorites")?;
        Ok(rows)
    }

    async fn insert_water_log(&self, user_id: Uuid, log: &NewWaterLog) -> anyhow::Result<WaterLog> {
        let row = sqlx::query_as::<_, WaterLog>(
            r#"
            INSERT INTO water_logs (id, user_id, date, amount_ml)
            VALUES ($1, $2, $3, $4)
            RETURNING id, date, amount_ml, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(log.date)
        .bind(log.amount_ml)
        .fetch_one(&self.db)
        .await
        .context("insert water log")?;
        Ok(row)
    }

    async fn water_logs_between(
        &self,
        user_id: Uuid,
        start: Date,
        end: Date,
    ) -> anyhow::Result<Vec<WaterLog>> {
        let rows = sqlx::query_as::<_, WaterLog>(
            r#"
            SELECT id, date, amount_ml, created_at
            FROM water_logs
            WHERE user_id = $1 AND date >= $2 AND date <= $3
            ORDER BY date, created_at
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await
        .context("select water logs")?;
        Ok(rows)
    }

    async fn upsert_weight_log(&self, user_id: Uuid, log: &NewWeightLog) -> anyhow::Result<WeightLog> {
        let row = sqlx::query_as::<_, WeightLog>(
            r#"
            INSERT INTO weight_logs (id, user_id, date, weight_kg)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, date) DO UPDATE SET weight_kg = EXCLUDED.weight_kg
            RETURNING id, date, weight_kg, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(log.date)
        .bind(log.weight_kg)
        .fetch_one(&self.db)
        .await
        .context("upsert weight log")?;
        Ok(row)
    }

    async fn weight_logs(
        &self,
        user_id: Uuid,
        since: Option<Date>,
        limit: i64,
    ) -> anyhow::Result<Vec<WeightLog>> {
        let rows = sqlx::query_as::<_, WeightLog>(
            r#"
            SELECT id, date, weight_kg, created_at
            FROM weight_logs
            WHERE user_id = $1 AND ($2::date IS NULL OR date >= $2)
            ORDER BY date DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(since)
        .bind(limit)
        .fetch_all(&self.db)
        .await
        .context("select weight logs")?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("oats"), "%oats%");
        assert_eq!(contains_pattern("100%_juice"), r"%100\%\_juice%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
    }
}
