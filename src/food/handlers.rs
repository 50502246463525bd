use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{Deleted, FavoriteRequest, FoodSearchResponse, RecentQuery, SearchQuery},
    services,
};
use crate::{
    auth::RequestContext,
    dates::{parse_iso_date, DateQuery},
    error::AppError,
    fetched::Fetched,
    state::AppState,
    store::{
        Favorite, FavoriteFood, Food, FoodKind, FoodLog, NewCustomFood, NewFoodLog, TaggedFood,
    },
};

pub fn food_routes() -> Router<AppState> {
    Router::new()
        .route("/food/search", get(search_foods))
        .route("/food/custom", post(create_custom_food))
        .route("/food/log", post(log_food).get(list_food_logs))
        .route("/food/log/:id", put(update_food_log).delete(delete_food_log))
        .route("/food/favorites", get(list_favorites))
        .route("/food/favorites/:food_id", post(add_favorite).delete(remove_favorite))
        .route("/food/recent", get(recent_foods))
}

fn bad_request(msg: &str) -> AppError {
    AppError::BadRequest(msg.to_owned())
}

#[instrument(skip(ctx), fields(user_id = %ctx.user_id))]
pub async fn search_foods(
    ctx: RequestContext,
    Query(q): Query<SearchQuery>,
) -> Json<FoodSearchResponse> {
    let found = services::search(&ctx.store, q.q.trim()).await;
    if found.is_degraded() {
        warn!(query = %q.q, "food search degraded");
    }
    Json(found.into_inner())
}

#[instrument(skip(ctx, body), fields(user_id = %ctx.user_id))]
pub async fn create_custom_food(
    ctx: RequestContext,
    Json(body): Json<NewCustomFood>,
) -> Result<(StatusCode, Json<Food>), AppError> {
    body.validate().map_err(bad_request)?;
    let food = ctx.store.insert_custom_food(&body).await?;
    info!(food_id = %food.id, "custom food created");
    Ok((StatusCode::CREATED, Json(food)))
}

#[instrument(skip(ctx, body), fields(user_id = %ctx.user_id))]
pub async fn log_food(
    ctx: RequestContext,
    Json(body): Json<NewFoodLog>,
) -> Result<(StatusCode, Json<FoodLog>), AppError> {
    body.validate().map_err(bad_request)?;
    let log = services::log_food(&ctx.store, &body).await?;
    info!(log_id = %log.id, date = %log.date, "food logged");
    Ok((StatusCode::CREATED, Json(log)))
}

#[instrument(skip(ctx), fields(user_id = %ctx.user_id))]
pub async fn list_food_logs(ctx: RequestContext, Query(q): Query<DateQuery>) -> Json<Vec<FoodLog>> {
    let Some(date) = parse_iso_date(&q.date) else {
        warn!(date = %q.date, "unparseable date; returning no logs");
        return Json(Vec::new());
    };
    let logs = Fetched::recover(ctx.store.food_logs_on(date).await, "food_logs", Vec::new);
    Json(logs.into_inner())
}

#[instrument(skip(ctx, body), fields(user_id = %ctx.user_id))]
pub async fn update_food_log(
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    Json(body): Json<NewFoodLog>,
) -> Result<Json<FoodLog>, AppError> {
    body.validate().map_err(bad_request)?;
    ctx.store
        .update_food_log(id, &body)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Food log not found".into()))
}

#[instrument(skip(ctx), fields(user_id = %ctx.user_id))]
pub async fn delete_food_log(
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Deleted>, AppError> {
    let deleted = ctx.store.delete_food_log(id).await?;
    Ok(Json(Deleted { deleted }))
}

#[instrument(skip(ctx, body), fields(user_id = %ctx.user_id))]
pub async fn add_favorite(
    ctx: RequestContext,
    Path(food_id): Path<Uuid>,
    body: Option<Json<FavoriteRequest>>,
) -> Result<(StatusCode, Json<Favorite>), AppError> {
    // a missing body means a master food
    let is_custom = body.is_some_and(|Json(b)| b.is_custom);
    let kind = if is_custom { FoodKind::Custom } else { FoodKind::Master };
    let favorite = ctx.store.insert_favorite(food_id, kind).await?;
    Ok((StatusCode::CREATED, Json(favorite)))
}

#[instrument(skip(ctx), fields(user_id = %ctx.user_id))]
pub async fn remove_favorite(
    ctx: RequestContext,
    Path(food_id): Path<Uuid>,
) -> Result<Json<Deleted>, AppError> {
    let removed = ctx.store.delete_favorite(food_id).await?;
    Ok(Json(Deleted { deleted: removed > 0 }))
}

#[instrument(skip(ctx), fields(user_id = %ctx.user_id))]
pub async fn list_favorites(ctx: RequestContext) -> Json<Vec<FavoriteFood>> {
    let favorites = Fetched::recover(ctx.store.favorites().await, "favorites", Vec::new);
    Json(favorites.into_inner())
}

#[instrument(skip(ctx), fields(user_id = %ctx.user_id))]
pub async fn recent_foods(ctx: RequestContext, Query(q): Query<RecentQuery>) -> Json<Vec<TaggedFood>> {
    let recent = Fetched::recover(
        services::recent_foods(&ctx.store, q.clamped()).await,
        "recent_foods",
        Vec::new,
    );
    Json(recent.into_inner())
}
