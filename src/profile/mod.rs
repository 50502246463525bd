//! Profile and daily targets.

pub mod dto;
mod handlers;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::profile_routes()
}
