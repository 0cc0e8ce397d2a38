//! Boundary (geofence polygon) domain models.
//!
//! Boundaries are stored as GeoJSON `Polygon` objects. They are converted into
//! the strict [`BoundaryPolygon`] value type when loaded, so the geometry
//! kernel never sees loosely-typed JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use super::coordinate::Coordinate;
use super::entity::EntityId;

/// Reasons a stored GeoJSON document cannot become a [`BoundaryPolygon`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoundaryError {
    #[error("invalid GeoJSON: {0}")]
    InvalidGeoJson(String),

    #[error("unsupported geometry type '{0}', expected 'Polygon'")]
    UnsupportedType(String),

    #[error("polygon has no outer ring")]
    MissingOuterRing,

    #[error("ring {ring} position {index} must have at least two numbers")]
    InvalidPosition { ring: usize, index: usize },
}

/// Strictly-typed GeoJSON polygon geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoJsonPolygon {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<Vec<Vec<f64>>>,
}

/// A named boundary polygon owned by one tracked entity.
///
/// `rings[0]` is the outer ring; `rings[1..]` are holes. Rings are implicitly
/// closed: a duplicated closing vertex may or may not be present.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryPolygon {
    pub boundary_id: Uuid,
    pub owner_entity_id: EntityId,
    pub name: String,
    pub rings: Vec<Vec<Coordinate>>,
}

impl BoundaryPolygon {
    /// Parses a GeoJSON `Polygon` document into a boundary polygon.
    ///
    /// Only the document shape is checked here. Geometric validity (vertex
    /// counts, finiteness, self-intersection) is judged by the geometry kernel.
    pub fn from_geojson(
        boundary_id: Uuid,
        owner_entity_id: EntityId,
        name: impl Into<String>,
        geojson: &serde_json::Value,
    ) -> Result<Self, BoundaryError> {
        let polygon: GeoJsonPolygon = serde_json::from_value(geojson.clone())
            .map_err(|e| BoundaryError::InvalidGeoJson(e.to_string()))?;

        if polygon.kind != "Polygon" {
            return Err(BoundaryError::UnsupportedType(polygon.kind));
        }
        if polygon.coordinates.is_empty() {
            return Err(BoundaryError::MissingOuterRing);
        }

        let mut rings = Vec::with_capacity(polygon.coordinates.len());
        for (ring_idx, ring) in polygon.coordinates.iter().enumerate() {
            let mut coords = Vec::with_capacity(ring.len());
            for (index, position) in ring.iter().enumerate() {
                if position.len() < 2 {
                    return Err(BoundaryError::InvalidPosition {
                        ring: ring_idx,
                        index,
                    });
                }
                // Altitude, if present, is ignored.
                coords.push(Coordinate::from_position([position[0], position[1]]));
            }
            rings.push(coords);
        }

        Ok(Self {
            boundary_id,
            owner_entity_id,
            name: name.into(),
            rings,
        })
    }

    /// Renders the polygon back to a GeoJSON `Polygon` document.
    pub fn to_geojson(&self) -> serde_json::Value {
        let coordinates: Vec<Vec<[f64; 2]>> = self
            .rings
            .iter()
            .map(|ring| ring.iter().map(|c| c.to_position()).collect())
            .collect();
        serde_json::json!({
            "type": "Polygon",
            "coordinates": coordinates,
        })
    }

    pub fn outer_ring(&self) -> Option<&[Coordinate]> {
        self.rings.first().map(Vec::as_slice)
    }

    pub fn holes(&self) -> &[Vec<Coordinate>] {
        self.rings.get(1..).unwrap_or(&[])
    }
}

/// A stored boundary as managed by the boundary registration surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Boundary {
    pub boundary_id: Uuid,
    pub entity_id: EntityId,
    pub name: String,
    pub boundary_geojson: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Boundary {
    /// Validates the stored GeoJSON into a [`BoundaryPolygon`].
    pub fn to_polygon(&self) -> Result<BoundaryPolygon, BoundaryError> {
        BoundaryPolygon::from_geojson(
            self.boundary_id,
            self.entity_id.clone(),
            self.name.clone(),
            &self.boundary_geojson,
        )
    }
}

/// Request payload for registering a boundary.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBoundaryRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[serde(alias = "boundary_geojson", alias = "geojson")]
    pub boundary_geojson: serde_json::Value,
}

impl CreateBoundaryRequest {
    /// Trims the name so length rules apply to what gets stored.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self
    }
}

/// Response for listing boundaries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBoundariesResponse {
    pub boundaries: Vec<Boundary>,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square() -> serde_json::Value {
        json!({
            "type": "Polygon",
            "coordinates": [[
                [-74.1, 39.9], [-74.1, 40.1], [-73.9, 40.1], [-73.9, 39.9]
            ]]
        })
    }

    #[test]
    fn test_from_geojson_swaps_position_order() {
        let polygon =
            BoundaryPolygon::from_geojson(Uuid::new_v4(), EntityId::new("d1"), "Yard", &square())
                .unwrap();
        let outer = polygon.outer_ring().unwrap();
        assert_eq!(outer.len(), 4);
        assert_eq!(outer[0], Coordinate::new(39.9, -74.1));
        assert!(polygon.holes().is_empty());
    }

    #[test]
    fn test_from_geojson_with_hole_and_altitude() {
        let doc = json!({
            "type": "Polygon",
            "coordinates": [
                [[0.0, 0.0, 12.0], [10.0, 0.0, 12.0], [10.0, 10.0, 12.0], [0.0, 10.0, 12.0], [0.0, 0.0, 12.0]],
                [[4.0, 4.0], [6.0, 4.0], [6.0, 6.0], [4.0, 6.0]]
            ]
        });
        let polygon =
            BoundaryPolygon::from_geojson(Uuid::new_v4(), EntityId::new("d1"), "Park", &doc)
                .unwrap();
        assert_eq!(polygon.rings.len(), 2);
        assert_eq!(polygon.holes().len(), 1);
        assert_eq!(polygon.rings[0].len(), 5);
    }

    #[test]
    fn test_from_geojson_rejects_wrong_type() {
        let doc = json!({"type": "Point", "coordinates": [[[0.0, 0.0]]]});
        let err = BoundaryPolygon::from_geojson(Uuid::new_v4(), EntityId::new("d1"), "x", &doc)
            .unwrap_err();
        assert_eq!(err, BoundaryError::UnsupportedType("Point".to_string()));
    }

    #[test]
    fn test_from_geojson_rejects_missing_rings() {
        let doc = json!({"type": "Polygon", "coordinates": []});
        let err = BoundaryPolygon::from_geojson(Uuid::new_v4(), EntityId::new("d1"), "x", &doc)
            .unwrap_err();
        assert_eq!(err, BoundaryError::MissingOuterRing);
    }

    #[test]
    fn test_from_geojson_rejects_short_position() {
        let doc = json!({"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0], [1.0, 1.0]]]});
        let err = BoundaryPolygon::from_geojson(Uuid::new_v4(), EntityId::new("d1"), "x", &doc)
            .unwrap_err();
        assert_eq!(err, BoundaryError::InvalidPosition { ring: 0, index: 1 });
    }

    #[test]
    fn test_from_geojson_rejects_non_numeric() {
        let doc = json!({"type": "Polygon", "coordinates": [[["a", "b"]]]});
        let err = BoundaryPolygon::from_geojson(Uuid::new_v4(), EntityId::new("d1"), "x", &doc)
            .unwrap_err();
        assert!(matches!(err, BoundaryError::InvalidGeoJson(_)));
    }

    #[test]
    fn test_to_geojson_round_trip_preserves_rings() {
        let polygon =
            BoundaryPolygon::from_geojson(Uuid::new_v4(), EntityId::new("d1"), "Yard", &square())
                .unwrap();
        assert_eq!(polygon.to_geojson(), square());
    }

    #[test]
    fn test_create_boundary_request_accepts_geojson_alias() {
        let json = r#"{"name": "Yard", "geojson": {"type": "Polygon", "coordinates": []}}"#;
        let request: CreateBoundaryRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.name, "Yard");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_boundary_request_blank_name_is_invalid() {
        let json = r#"{"name": "   ", "geojson": {"type": "Polygon", "coordinates": []}}"#;
        let request: CreateBoundaryRequest = serde_json::from_str(json).unwrap();
        assert!(request.validate().is_ok());

        let request = request.normalized();
        assert_eq!(request.name, "");
        assert!(request.validate().is_err());
    }
}
