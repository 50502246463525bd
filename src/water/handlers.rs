use axum::{extract::Query, http::StatusCode, routing::post, Json, Router};
use tracing::{info, instrument, warn};

use crate::{
    auth::RequestContext,
    dates::{parse_iso_date, DateQuery},
    error::AppError,
    fetched::Fetched,
    state::AppState,
    store::{NewWaterLog, WaterLog},
};

pub fn water_routes() -> Router<AppState> {
    Router::new()
        .route("/water", post(log_water).get(list_water))
        .route("/water/", post(log_water).get(list_water))
}

#[instrument(skip(ctx), fields(user_id = %ctx.user_id))]
pub async fn log_water(
    ctx: RequestContext,
    Json(body): Json<NewWaterLog>,
) -> Result<(StatusCode, Json<WaterLog>), AppError> {
    body.validate().map_err(|m| AppError::BadRequest(m.into()))?;
    let log = ctx.store.insert_water_log(&body).await?;
    info!(date = %log.date, amount_ml = log.amount_ml, "water logged");
    Ok((StatusCode::CREATED, Json(log)))
}

#[instrument(skip(ctx), fields(user_id = %ctx.user_id))]
pub async fn list_water(ctx: RequestContext, Query(q): Query<DateQuery>) -> Json<Vec<WaterLog>> {
    let Some(date) = parse_iso_date(&q.date) else {
        warn!(date = %q.date, "unparseable date; returning no logs");
        return Json(Vec::new());
    };
    let logs = Fetched::recover(ctx.store.water_logs_on(date).await, "water_logs", Vec::new);
    Json(logs.into_inner())
}
