//! Location sample domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::coordinate::Coordinate;
use super::entity::EntityId;

/// A validated location observation for a tracked entity.
///
/// Immutable once persisted. History is displayed by `observed_at`, but
/// geofence evaluation follows arrival order (`received_at`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    pub entity_id: EntityId,
    pub coordinate: Coordinate,
    pub observed_at: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
}

/// A persisted location sample with its storage identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    pub id: i64,
    pub entity_id: EntityId,
    pub latitude: f64,
    pub longitude: f64,
    pub observed_at: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
}

impl LocationRecord {
    pub fn from_sample(id: i64, sample: &LocationSample) -> Self {
        Self {
            id,
            entity_id: sample.entity_id.clone(),
            latitude: sample.coordinate.latitude,
            longitude: sample.coordinate.longitude,
            observed_at: sample.observed_at,
            received_at: sample.received_at,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Timestamp as sent by collars: epoch milliseconds or an ISO 8601 string.
///
/// Millisecond values written in float notation (`1.7e12`, `1701878400000.5`)
/// land in `FractionalMillis`; the fraction is truncated during validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimestampInput {
    Millis(i64),
    FractionalMillis(f64),
    Text(String),
}

/// Unvalidated location upload, as received by the ingestion transport.
///
/// Every field is optional so that missing fields surface as a structured
/// `missing_field` error instead of a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLocationSample {
    #[serde(default, alias = "entity_id", alias = "dog_id")]
    pub entity_id: Option<String>,

    #[serde(default, alias = "lat")]
    pub latitude: Option<f64>,

    #[serde(default, alias = "lng")]
    pub longitude: Option<f64>,

    #[serde(default)]
    pub timestamp: Option<TimestampInput>,
}

/// Request payload for batch location upload.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BatchUploadRequest {
    #[serde(default, alias = "entity_id", alias = "dog_id")]
    pub entity_id: Option<String>,

    #[validate(length(min = 1, message = "Batch must contain at least one location"))]
    pub locations: Vec<RawLocationSample>,
}

/// Query parameters for location history.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationHistoryQuery {
    pub limit: Option<i64>,
}

impl LocationHistoryQuery {
    /// Default number of samples returned, newest first.
    pub const DEFAULT_LIMIT: i64 = 100;
    /// Maximum number of samples returned.
    pub const MAX_LIMIT: i64 = 1000;

    /// Returns the effective limit, clamped to valid range.
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}

/// Response payload for location history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationHistoryResponse {
    pub locations: Vec<LocationRecord>,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_sample_accepts_short_names() {
        let json = r#"{"dog_id": "d1", "lat": 40.0, "lng": -74.0}"#;
        let raw: RawLocationSample = serde_json::from_str(json).unwrap();
        assert_eq!(raw.entity_id.as_deref(), Some("d1"));
        assert_eq!(raw.latitude, Some(40.0));
        assert_eq!(raw.longitude, Some(-74.0));
        assert!(raw.timestamp.is_none());
    }

    #[test]
    fn test_raw_sample_accepts_camel_case() {
        let json = r#"{"entityId": "d1", "latitude": 40.0, "longitude": -74.0, "timestamp": 1701878400000}"#;
        let raw: RawLocationSample = serde_json::from_str(json).unwrap();
        assert_eq!(raw.timestamp, Some(TimestampInput::Millis(1701878400000)));
    }

    #[test]
    fn test_raw_sample_missing_fields_deserialize_as_none() {
        let raw: RawLocationSample = serde_json::from_str("{}").unwrap();
        assert!(raw.entity_id.is_none());
        assert!(raw.latitude.is_none());
        assert!(raw.longitude.is_none());
    }

    #[test]
    fn test_timestamp_float_notation() {
        let raw: RawLocationSample = serde_json::from_str(r#"{"timestamp": 1.7e12}"#).unwrap();
        assert_eq!(raw.timestamp, Some(TimestampInput::FractionalMillis(1.7e12)));
    }

    #[test]
    fn test_timestamp_text_variant() {
        let raw: RawLocationSample =
            serde_json::from_str(r#"{"timestamp": "2024-01-01T00:00:00Z"}"#).unwrap();
        assert_eq!(
            raw.timestamp,
            Some(TimestampInput::Text("2024-01-01T00:00:00Z".to_string()))
        );
    }

    #[test]
    fn test_history_query_limit_clamped() {
        assert_eq!(LocationHistoryQuery::default().effective_limit(), 100);
        assert_eq!(LocationHistoryQuery { limit: Some(0) }.effective_limit(), 1);
        assert_eq!(
            LocationHistoryQuery { limit: Some(5000) }.effective_limit(),
            1000
        );
    }

    #[test]
    fn test_record_from_sample() {
        let now = Utc::now();
        let sample = LocationSample {
            entity_id: EntityId::new("d1"),
            coordinate: Coordinate::new(40.0, -74.0),
            observed_at: now,
            received_at: now,
        };
        let record = LocationRecord::from_sample(7, &sample);
        assert_eq!(record.id, 7);
        assert_eq!(record.coordinate(), sample.coordinate);
    }
}
