// File: ./src/model/parser.rs
// Handles timestamp and date-filter text
use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use std::env;
use std::fmt::Display;

/// Named zone of the host: `$TZ` when it names one, else the system setting.
/// Rendering through a named zone makes `%Z` an abbreviation (`EST`) rather than an offset.
pub fn local_zone() -> Option<chrono_tz::Tz> {
    if let Ok(name) = env::var("TZ")
        && let Ok(tz) = name.trim_start_matches(':').parse()
    {
        return Some(tz);
    }
    iana_time_zone::get_timezone().ok()?.parse().ok()
}

/// `MM/DD/YY hh:mm:ss AM/PM TZ` in the given zone.
pub fn format_timestamp<Tz>(ts: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    ts.with_timezone(tz)
        .format("%m/%d/%y %I:%M:%S %p %Z")
        .to_string()
}

/// Same as [`format_timestamp`], empty when there is nothing to show.
pub fn format_optional<Tz>(ts: Option<&DateTime<Utc>>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    ts.map(|t| format_timestamp(t, tz)).unwrap_or_default()
}

/// The form Asana itself uses, e.g. `2023-01-03T09:30:00.000Z`.
pub fn format_iso(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Validates a `YYYY-MM-DD` filter value and hands it back untouched.
pub fn parse_date_filter(value: &str) -> Result<String, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| value.to_string())
        .map_err(|e| format!("expected YYYY-MM-DD, got '{}': {}", value, e))
}
