//! Time specification parser for user-friendly time expressions
//!
//! Supported formats:
//! - "now" - current time
//! - "today" - start of today
//! - "yesterday" - start of yesterday
//! - "-30m", "-1h", "-2hours" - relative time
//! - "-1d", "-2days", "-1w" - relative time (days, weeks)
//! - "2025-01-12" - specific date
//! - "2025-01-12 14:30:00" - specific datetime

use anyhow::{anyhow, Result};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime};

/// Parse a time specification string and return a unix timestamp (seconds
/// since epoch).
pub fn parse_time_spec(spec: &str) -> Result<i64> {
    let spec = spec.trim().to_lowercase();

    let dt = match spec.as_str() {
        "now" => Local::now(),
        "today" => Local::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| anyhow!("Failed to create datetime for today"))?
            .and_local_timezone(Local)
            .single()
            .ok_or_else(|| anyhow!("Ambiguous timezone for today"))?,
        "yesterday" => {
            let yesterday = Local::now().date_naive() - Duration::days(1);
            yesterday
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| anyhow!("Failed to create datetime for yesterday"))?
                .and_local_timezone(Local)
                .single()
                .ok_or_else(|| anyhow!("Ambiguous timezone for yesterday"))?
        }
        _ => {
            if let Some(relative) = parse_relative_time(&spec)? {
                return Ok(relative);
            }

            parse_absolute_time(&spec)?
        }
    };

    let timestamp = dt.timestamp();
    if timestamp < 0 {
        return Err(anyhow!("Time is before unix epoch"));
    }

    Ok(timestamp)
}

/// Parse relative time expressions like "-30m", "-1h", "-2days", "-3weeks"
fn parse_relative_time(spec: &str) -> Result<Option<i64>> {
    if !spec.starts_with('-') {
        return Ok(None);
    }

    let spec = &spec[1..];

    let Some(unit_at) = spec.find(|c: char| !c.is_ascii_digit()) else {
        return Err(anyhow!("No time unit specified in relative time"));
    };

    let (number, unit) = spec.split_at(unit_at);
    let value: i64 = number
        .parse()
        .map_err(|_| anyhow!("Invalid number in relative time: {}", number))?;

    let duration = match unit {
        "m" | "min" | "mins" | "minute" | "minutes" => Duration::minutes(value),
        "h" | "hour" | "hours" => Duration::hours(value),
        "d" | "day" | "days" => Duration::days(value),
        "w" | "week" | "weeks" => Duration::weeks(value),
        _ => return Err(anyhow!("Unknown time unit: {}", unit)),
    };

    Ok(Some((Local::now() - duration).timestamp()))
}

/// Parse absolute date/datetime expressions
fn parse_absolute_time(spec: &str) -> Result<chrono::DateTime<Local>> {
    if let Ok(datetime) = NaiveDateTime::parse_from_str(spec, "%Y-%m-%d %H:%M:%S") {
        return datetime
            .and_local_timezone(Local)
            .single()
            .ok_or_else(|| anyhow!("Ambiguous timezone for {}", spec));
    }

    if let Ok(date) = NaiveDate::parse_from_str(spec, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| anyhow!("Failed to create datetime for {}", spec))?
            .and_local_timezone(Local)
            .single()
            .ok_or_else(|| anyhow!("Ambiguous timezone for {}", spec));
    }

    Err(anyhow!("Unrecognized time specification: {}", spec))
}
