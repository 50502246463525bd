use serde::{Deserialize, Serialize};

use crate::store::Food;

pub const SEARCH_LIMIT: i64 = 20;
pub const RECENT_LIMIT_MAX: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Default, Serialize)]
pub struct FoodSearchResponse {
    pub master: Vec<Food>,
    pub custom: Vec<Food>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FavoriteRequest {
    #[serde(default)]
    pub is_custom: bool,
}

fn default_recent_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default = "default_recent_limit")]
    pub limit: i64,
}

impl RecentQuery {
    pub fn clamped(&self) -> usize {
        self.limit.clamp(1, RECENT_LIMIT_MAX) as usize
    }
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub deleted: bool,
}
