use serde::Deserialize;
use time::{macros::format_description, Date, OffsetDateTime};

/// `?date=YYYY-MM-DD`, kept raw so a bad value can degrade instead of rejecting.
#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: String,
}

/// Parses a calendar date in `YYYY-MM-DD` form.
pub fn parse_iso_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}

pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}
