//! Common validation utilities.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use validator::ValidationError;

/// Maximum length of a tracked entity identifier.
pub const MAX_ENTITY_ID_LENGTH: usize = 64;

/// Validates that a latitude value is finite and within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        let mut err = ValidationError::new("latitude_range");
        err.message = Some("Latitude must be between -90 and 90".into());
        Err(err)
    }
}

/// Validates that a longitude value is finite and within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        let mut err = ValidationError::new("longitude_range");
        err.message = Some("Longitude must be between -180 and 180".into());
        Err(err)
    }
}

/// Validates a tracked entity identifier.
///
/// Identifiers are 1-64 characters of ASCII letters, digits, `-` or `_`.
pub fn validate_entity_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > MAX_ENTITY_ID_LENGTH {
        let mut err = ValidationError::new("entity_id_length");
        err.message = Some("Entity ID must be 1-64 characters".into());
        return Err(err);
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        let mut err = ValidationError::new("entity_id_charset");
        err.message =
            Some("Entity ID may only contain letters, digits, '-' and '_'".into());
        return Err(err);
    }

    Ok(())
}

/// Parses a sample timestamp given as epoch milliseconds or ISO 8601.
///
/// Accepted forms:
/// - `"1701878400000"` (milliseconds since epoch, must be positive)
/// - `"2024-01-01T12:00:00+02:00"` (RFC 3339)
/// - `"2024-01-01T12:00:00.000Z"` (ISO 8601, UTC)
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    let raw = raw.trim();

    if let Ok(millis) = raw.parse::<i64>() {
        if millis <= 0 {
            let mut err = ValidationError::new("timestamp_invalid");
            err.message = Some("Timestamp must be positive".into());
            return Err(err);
        }
        return millis_to_datetime(millis);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.fZ") {
        return Ok(dt.and_utc());
    }

    let mut err = ValidationError::new("timestamp_invalid");
    err.message = Some("Invalid timestamp format. Use milliseconds or ISO 8601".into());
    Err(err)
}

/// Converts epoch milliseconds to a UTC timestamp.
pub fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>, ValidationError> {
    Utc.timestamp_millis_opt(millis).single().ok_or_else(|| {
        let mut err = ValidationError::new("timestamp_invalid");
        err.message = Some("Invalid timestamp".into());
        err
    })
}
