//! Daily and weekly nutrition summaries.

pub mod aggregate;
pub mod dto;
mod handlers;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::analytics_routes()
}
