use anyhow::Context;
use time::{Date, Duration};
use tracing::warn;

use super::{
    aggregate::{self, WEIGHT_LOOKBACK_DAYS, WEIGHT_TREND_SAMPLE},
    dto::{DailySummary, WeeklySummary},
};
use crate::{
    fetched::Fetched,
    store::{DailyTargets, ScopedStore, Streak},
    streaks,
};

pub const MAX_RANGE_DAYS: i64 = 366;

pub async fn load_targets(store: &ScopedStore) -> Fetched<DailyTargets> {
    Fetched::recover(
        store.targets().await.map(Option::unwrap_or_default),
        "daily_targets",
        DailyTargets::default,
    )
}

pub async fn load_streak(store: &ScopedStore) -> Fetched<Streak> {
    Fetched::recover(
        store.streak().await.map(Option::unwrap_or_default),
        "streaks",
        Streak::default,
    )
}

/// Totals for one date. Each of the three reads falls back on its own.
pub async fn daily(store: &ScopedStore, date: Date) -> Fetched<DailySummary> {
    let food = Fetched::recover(store.food_logs_on(date).await, "food_logs", Vec::new);
    let water = Fetched::recover(store.water_logs_on(date).await, "water_logs", Vec::new);
    let targets = load_targets(store).await;

    let degraded = food.is_degraded() || water.is_degraded() || targets.is_degraded();
    let summary = aggregate::daily_summary(date, food.value(), water.value(), *targets.value());
    Fetched::new(summary, degraded)
}

/// `days` summaries ending at `end`, plus targets, streak and weight trend.
/// A failed log read empties the whole result; the other reads fall back
/// individually.
pub async fn weekly(store: &ScopedStore, end: Date, days: i64) -> Fetched<WeeklySummary> {
    match try_weekly(store, end, days).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!(error = %format!("{e:#}"), %end, days, "weekly summary failed");
            Fetched::Degraded(WeeklySummary::empty())
        }
    }
}

async fn try_weekly(
    store: &ScopedStore,
    end: Date,
    days: i64,
) -> anyhow::Result<Fetched<WeeklySummary>> {
    anyhow::ensure!(
        (1..=MAX_RANGE_DAYS).contains(&days),
        "days must be between 1 and {MAX_RANGE_DAYS}, got {days}"
    );
    let start = end
        .checked_sub(Duration::days(days - 1))
        .context("range start out of bounds")?;

    let food = store.food_logs_between(start, end).await?;
    let water = store.water_logs_between(start, end).await?;

    let targets = load_targets(store).await;
    let streak = load_streak(store).await.map(|s| streaks::as_of(s, end));

    let since = start
        .checked_sub(Duration::days(WEIGHT_LOOKBACK_DAYS))
        .context("weight window out of bounds")?;
    let weights = Fetched::recover(
        store.weight_logs(Some(since), WEIGHT_TREND_SAMPLE).await,
        "weight_logs",
        Vec::new,
    );

    let degraded = targets.is_degraded() || streak.is_degraded() || weights.is_degraded();
    let targets = targets.into_inner();
    let weight_logs = weights.into_inner();

    let summary = WeeklySummary {
        data: aggregate::fill_range(start, days as u32, &food, &water, targets),
        targets,
        streak: streak.into_inner(),
        weight_trend: aggregate::weight_trend(&weight_logs),
        weight_logs,
    };
    Ok(Fetched::new(summary, degraded))
}
