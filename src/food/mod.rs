//! Food catalog search, custom foods, the food log, favorites and recents.

pub mod dto;
mod handlers;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::food_routes()
}
