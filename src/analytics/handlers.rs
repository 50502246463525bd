use axum::{extract::Query, routing::get, Json, Router};
use tracing::{instrument, warn};

use super::{
    dto::{DailyQuery, DailyResponse, WeeklyQuery, WeeklySummary},
    services,
};
use crate::{
    auth::RequestContext,
    dates::{parse_iso_date, today},
    state::AppState,
};

pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/analytics/daily", get(daily_summary))
        .route("/analytics/weekly", get(weekly_summary))
}

#[instrument(skip(ctx), fields(user_id = %ctx.user_id))]
pub async fn daily_summary(ctx: RequestContext, Query(q): Query<DailyQuery>) -> Json<DailyResponse> {
    let date = match q.date.as_deref() {
        None => Some(today()),
        Some(raw) => parse_iso_date(raw),
    };
    let Some(date) = date else {
        warn!(date = ?q.date, "unparseable date; returning zero summary");
        return Json(DailyResponse::zeroed());
    };

    let day = services::daily(&ctx.store, date).await;
    if day.is_degraded() {
        warn!(%date, "daily summary degraded");
    }
    Json(day.into_inner().into())
}

#[instrument(skip(ctx), fields(user_id = %ctx.user_id))]
pub async fn weekly_summary(
    ctx: RequestContext,
    Query(q): Query<WeeklyQuery>,
) -> Json<WeeklySummary> {
    let end = match q.end.as_deref() {
        None => Some(today()),
        Some(raw) => parse_iso_date(raw),
    };
    let Some(end) = end else {
        warn!(end = ?q.end, "unparseable end date; returning empty summary");
        return Json(WeeklySummary::empty());
    };

    let week = services::weekly(&ctx.store, end, q.days).await;
    if week.is_degraded() {
        warn!(%end, days = q.days, "weekly summary degraded");
    }
    Json(week.into_inner())
}
