use std::collections::HashSet;

use time::Date;
use tracing::{debug, warn};
use uuid::Uuid;

use super::dto::{FoodSearchResponse, SEARCH_LIMIT};
use crate::{
    fetched::Fetched,
    store::{Food, FoodKind, FoodLog, NewFoodLog, RecentLogRow, ScopedStore, TaggedFood},
    streaks,
};

/// Distinct catalog ids from recent logs, most recent first.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RecentIds {
    pub master: Vec<Uuid>,
    pub custom: Vec<Uuid>,
}

impl RecentIds {
    /// Master foods go first, up to `limit`.
    pub fn master_batch(&self, limit: usize) -> &[Uuid] {
        &self.master[..self.master.len().min(limit)]
    }

    /// Custom foods fill whatever `collected` master foods left of `limit`.
    pub fn custom_batch(&self, limit: usize, collected: usize) -> &[Uuid] {
        let budget = limit.saturating_sub(collected);
        &self.custom[..self.custom.len().min(budget)]
    }
}

/// Rows are expected newest first. Manual entries have no catalog id and are skipped.
pub fn recent_food_ids(rows: &[RecentLogRow]) -> RecentIds {
    let mut seen = HashSet::new();
    let mut ids = RecentIds::default();
    for row in rows {
        match (row.food_master_id, row.food_custom_id) {
            (Some(id), _) if seen.insert(id) => ids.master.push(id),
            (None, Some(id)) if seen.insert(id) => ids.custom.push(id),
            _ => {}
        }
    }
    ids
}

/// Puts `foods` in the order of `ids`, dropping ids that did not resolve.
pub fn order_by_ids(foods: Vec<Food>, ids: &[Uuid]) -> Vec<Food> {
    let mut foods: Vec<Option<Food>> = foods.into_iter().map(Some).collect();
    ids.iter()
        .filter_map(|id| {
            foods
                .iter_mut()
                .find(|f| f.as_ref().is_some_and(|f| f.id == *id))
                .and_then(Option::take)
        })
        .collect()
}

pub async fn search(store: &ScopedStore, query: &str) -> Fetched<FoodSearchResponse> {
    let master = Fetched::recover(
        store.search_foods(FoodKind::Master, query, SEARCH_LIMIT).await,
        "foods_master",
        Vec::new,
    );
    let custom = Fetched::recover(
        store.search_foods(FoodKind::Custom, query, SEARCH_LIMIT).await,
        "foods_custom",
        Vec::new,
    );
    let degraded = master.is_degraded() || custom.is_degraded();
    Fetched::new(
        FoodSearchResponse {
            master: master.into_inner(),
            custom: custom.into_inner(),
        },
        degraded,
    )
}

/// Up to `limit` distinct foods the caller logged recently, master foods first.
pub async fn recent_foods(store: &ScopedStore, limit: usize) -> anyhow::Result<Vec<TaggedFood>> {
    let rows = store.recent_food_logs((limit * 2) as i64).await?;
    let ids = recent_food_ids(&rows);

    let mut out = Vec::with_capacity(limit);
    let master_ids = ids.master_batch(limit);
    let master = store.foods_by_ids(FoodKind::Master, master_ids).await?;
    out.extend(
        order_by_ids(master, master_ids)
            .into_iter()
            .map(|food| TaggedFood { food, is_custom: false }),
    );

    let custom_ids = ids.custom_batch(limit, out.len());
    let custom = store.foods_by_ids(FoodKind::Custom, custom_ids).await?;
    out.extend(
        order_by_ids(custom, custom_ids)
            .into_iter()
            .map(|food| TaggedFood { food, is_custom: true }),
    );
    Ok(out)
}

/// Stores the log, then moves the streak along. A streak failure never
/// fails the log itself.
pub async fn log_food(store: &ScopedStore, log: &NewFoodLog) -> anyhow::Result<FoodLog> {
    let created = store.insert_food_log(log).await?;
    bump_streak(store, created.date).await;
    Ok(created)
}

async fn bump_streak(store: &ScopedStore, logged_on: Date) {
    let current = match store.streak().await {
        Ok(s) => s.unwrap_or_default(),
        Err(e) => {
            warn!(error = %format!("{e:#}"), "could not read streak");
            return;
        }
    };
    let next = streaks::advance(current, logged_on);
    if next == current {
        return;
    }
    match store.save_streak(&next).await {
        Ok(()) => debug!(current = next.current_streak, best = next.best_streak, "streak updated"),
        Err(e) => warn!(error = %format!("{e:#}"), "could not save streak"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FoodSource, MealType, MemoryStore, Streak, Table, UnitType};
    use std::sync::Arc;
    use time::macros::date;

    fn row(master: Option<Uuid>, custom: Option<Uuid>) -> RecentLogRow {
        RecentLogRow {
            food_name: "x".into(),
            food_master_id: master,
            food_custom_id: custom,
            food_source: FoodSource::Master,
        }
    }

    fn food(id: Uuid, name: &str) -> Food {
        Food {
            id,
            name: name.into(),
            unit_type: UnitType::Grams,
            base_qty: 100.0,
            calories: 100.0,
            protein_g: 1.0,
            carbs_g: 1.0,
            fats_g: 1.0,
        }
    }

    fn new_log(date: Date, master: Option<Uuid>) -> NewFoodLog {
        NewFoodLog {
            date,
            meal_type: MealType::Breakfast,
            food_source: None,
            food_master_id: master,
            food_custom_id: None,
            food_name: "Oats".into(),
            qty: 40.0,
            calories: 150.0,
            protein_g: 5.0,
            carbs_g: 27.0,
            fats_g: 3.0,
        }
    }

    #[test]
    fn recent_ids_are_distinct_and_keep_recency() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let rows = vec![
            row(Some(a), None),
            row(None, Some(c)),
            row(Some(a), None),
            row(None, None),
            row(Some(b), None),
            row(None, Some(c)),
        ];
        let ids = recent_food_ids(&rows);
        assert_eq!(ids.master, vec![a, b]);
        assert_eq!(ids.custom, vec![c]);
    }

    #[test]
    fn custom_batch_gets_what_master_left() {
        let ids = RecentIds {
            master: vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()],
            custom: vec![Uuid::new_v4(), Uuid::new_v4()],
        };
        assert_eq!(ids.master_batch(2).len(), 2);
        assert!(ids.custom_batch(2, 2).is_empty());
        assert_eq!(ids.custom_batch(4, 3).len(), 1);
        assert_eq!(ids.custom_batch(10, 3).len(), 2);
    }

    #[test]
    fn order_follows_ids_and_drops_missing() {
        let (a, b, gone) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let ordered = order_by_ids(vec![food(b, "b"), food(a, "a")], &[a, gone, b]);
        let names: Vec<_> = ordered.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[tokio::test]
    async fn recent_foods_collapses_repeats() {
        let mem = Arc::new(MemoryStore::new());
        let oats = mem.add_master_food(food(Uuid::new_v4(), "Oats"));
        let store = ScopedStore::new(mem.clone(), Uuid::new_v4());
        for _ in 0..3 {
            log_food(&store, &new_log(date!(2024 - 06 - 01), Some(oats.id))).await.unwrap();
        }

        let recent = recent_foods(&store, 20).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].food.id, oats.id);
        assert!(!recent[0].is_custom);
    }

    #[tokio::test]
    async fn logging_advances_streak() {
        let mem = Arc::new(MemoryStore::new());
        let store = ScopedStore::new(mem.clone(), Uuid::new_v4());
        for d in [date!(2024 - 06 - 01), date!(2024 - 06 - 02), date!(2024 - 06 - 02)] {
            log_food(&store, &new_log(d, None)).await.unwrap();
        }
        let streak = store.streak().await.unwrap().unwrap();
        assert_eq!(
            streak,
            Streak {
                current_streak: 2,
                best_streak: 2,
                last_log_date: Some(date!(2024 - 06 - 02)),
            }
        );
    }

    #[tokio::test]
    async fn streak_failure_does_not_fail_the_log() {
        let mem = Arc::new(MemoryStore::new());
        mem.fail(Table::Streaks);
        let store = ScopedStore::new(mem.clone(), Uuid::new_v4());

        let created = log_food(&store, &new_log(date!(2024 - 06 - 01), None)).await.unwrap();
        assert_eq!(created.food_source, FoodSource::Master);
        assert_eq!(store.food_logs_on(date!(2024 - 06 - 01)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn search_degrades_per_catalog() {
        let mem = Arc::new(MemoryStore::new());
        mem.add_master_food(food(Uuid::new_v4(), "Greek yogurt"));
        mem.fail(Table::FoodsCustom);
        let store = ScopedStore::new(mem.clone(), Uuid::new_v4());

        let found = search(&store, "yog").await;
        assert!(found.is_degraded());
        let found = found.into_inner();
        assert_eq!(found.master.len(), 1);
        assert!(found.custom.is_empty());
    }
}
