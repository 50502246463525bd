use axum::{routing::post, Json, Router};
use tracing::{info, instrument};

use crate::{
    auth::RequestContext,
    error::AppError,
    fetched::Fetched,
    state::AppState,
    store::{NewWeightLog, WeightLog},
};

/// Entries returned by `GET /weight`.
pub const HISTORY_LIMIT: i64 = 30;

pub fn weight_routes() -> Router<AppState> {
    Router::new()
        .route("/weight", post(log_weight).get(weight_history))
        .route("/weight/", post(log_weight).get(weight_history))
}

/// One entry per date: logging the same date again replaces the weight.
#[instrument(skip(ctx), fields(user_id = %ctx.user_id))]
pub async fn log_weight(
    ctx: RequestContext,
    Json(body): Json<NewWeightLog>,
) -> Result<Json<WeightLog>, AppError> {
    body.validate().map_err(|m| AppError::BadRequest(m.into()))?;
    let log = ctx.store.upsert_weight_log(&body).await?;
    info!(date = %log.date, weight_kg = log.weight_kg, "weight logged");
    Ok(Json(log))
}

#[instrument(skip(ctx), fields(user_id = %ctx.user_id))]
pub async fn weight_history(ctx: RequestContext) -> Json<Vec<WeightLog>> {
    let logs = Fetched::recover(
        ctx.store.weight_logs(None, HISTORY_LIMIT).await,
        "weight_logs",
        Vec::new,
    );
    Json(logs.into_inner())
}
