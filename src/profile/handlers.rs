use axum::{
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument, warn};

use super::{dto::Message, services};
use crate::{
    auth::RequestContext,
    error::AppError,
    fetched::Fetched,
    state::AppState,
    store::{DailyTargets, ProfileUpdate, TargetUpdate},
};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/profile/", get(get_profile).put(update_profile))
        .route("/profile/targets", get(get_targets).put(update_targets))
        .route("/profile/targets/suggested", get(suggested_targets))
}

/// The caller's profile, or `{}` before one exists or when it cannot be read.
#[instrument(skip(ctx), fields(user_id = %ctx.user_id))]
pub async fn get_profile(ctx: RequestContext) -> Response {
    let profile = Fetched::recover(ctx.store.profile().await, "profiles", || None);
    match profile.into_inner() {
        Some(profile) => Json(profile).into_response(),
        None => Json(json!({})).into_response(),
    }
}

#[instrument(skip(ctx, body), fields(user_id = %ctx.user_id))]
pub async fn update_profile(
    ctx: RequestContext,
    Json(body): Json<ProfileUpdate>,
) -> Result<Response, AppError> {
    if body.is_empty() {
        return Ok(Json(Message { message: "No data to update" }).into_response());
    }
    let profile = services::upsert_profile(&ctx.store, &body).await?;
    Ok(Json(profile).into_response())
}

#[instrument(skip(ctx), fields(user_id = %ctx.user_id))]
pub async fn get_targets(ctx: RequestContext) -> Json<DailyTargets> {
    let targets = Fetched::recover(
        ctx.store.targets().await.map(Option::unwrap_or_default),
        "daily_targets",
        DailyTargets::default,
    );
    Json(targets.into_inner())
}

#[instrument(skip(ctx, body), fields(user_id = %ctx.user_id))]
pub async fn update_targets(
    ctx: RequestContext,
    Json(body): Json<TargetUpdate>,
) -> Result<Response, AppError> {
    if body.is_empty() {
        return Ok(Json(Message { message: "No data" }).into_response());
    }
    let targets = services::upsert_targets(&ctx.store, &body).await?;
    info!(calories = targets.calories_target, "targets updated");
    Ok(Json(targets).into_response())
}

#[instrument(skip(ctx), fields(user_id = %ctx.user_id))]
pub async fn suggested_targets(ctx: RequestContext) -> Json<DailyTargets> {
    let profile = match ctx.store.profile().await {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %format!("{e:#}"), "could not read profile; suggesting from defaults");
            None
        }
    };
    Json(services::suggest_targets(profile.as_ref()))
}
