//! Query time window resolution.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use thiserror::Error;

use crate::config::schema::WindowConfig;

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Errors produced while resolving the window.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("unrecognised timestamp '{0}'")]
    Unparseable(String),

    #[error("window start {start} is not before end {end}")]
    Inverted { start: String, end: String },

    #[error("trailing window of {0} hours reaches outside the supported date range")]
    OutOfRange(u64),
}

/// Closed time range `[from, to]` queried for every descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeWindow {
    /// Resolve the configured bounds relative to `now`.
    pub fn resolve(config: &WindowConfig, now: DateTime<Utc>) -> Result<Self, WindowError> {
        let to = match &config.end {
            Some(end) => parse_timestamp(end)?,
            None => now,
        };
        let from = match &config.start {
            Some(start) => parse_timestamp(start)?,
            None => trailing_start(to, config.trailing_hours)?,
        };

        if from >= to {
            return Err(WindowError::Inverted {
                start: from.to_rfc3339(),
                end: to.to_rfc3339(),
            });
        }
        Ok(Self { from, to })
    }
}

fn trailing_start(to: DateTime<Utc>, hours: u64) -> Result<DateTime<Utc>, WindowError> {
    i64::try_from(hours)
        .ok()
        .and_then(TimeDelta::try_hours)
        .and_then(|span| to.checked_sub_signed(span))
        .ok_or(WindowError::OutOfRange(hours))
}

/// Parse a human-readable timestamp.
///
/// Accepts local `YYYY-MM-DD HH:MM:SS`, local `YYYY-MM-DD`, RFC 3339 and
/// unix seconds.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, WindowError> {
    let input = input.trim();
    let unparseable = || WindowError::Unparseable(input.to_string());

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
        let secs: i64 = input.parse().map_err(|_| unparseable())?;
        return DateTime::from_timestamp(secs, 0).ok_or_else(unparseable);
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(unparseable)?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(unparseable)
}
