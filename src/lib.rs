pub mod analytics;
pub mod app;
pub mod auth;
pub mod config;
pub mod dates;
pub mod error;
pub mod fetched;
pub mod food;
pub mod profile;
pub mod state;
pub mod store;
pub mod streaks;
pub mod water;
pub mod weight;
