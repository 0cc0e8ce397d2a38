//! Planar point-in-polygon containment.
//!
//! Even-odd ray casting with hole support. Longitude is the x axis and
//! latitude the y axis; no projection is applied. A ray is cast from the
//! point towards increasing longitude, and an edge is crossed when its
//! endpoints straddle the point's latitude under the half-open rule
//! `(yi > y) != (yj > y)`.
//!
//! Edge policy: points lying exactly on a ring are classified by that rule,
//! so the result is deterministic. For an axis-aligned ring, points on the
//! southern and western edges (including the south-west corner) are inside,
//! and points on the northern and eastern edges are outside. Hole rings
//! follow the same rule, so a point on a hole's southern or western edge is
//! inside the hole and therefore not contained.
//!
//! Malformed polygons (no outer ring, fewer than three distinct vertices in a
//! ring, non-finite coordinates, self-intersecting rings) are never
//! contained. All functions are pure and safe to call from any thread.

use geo::{coord, Intersects, Line};
use thiserror::Error;

use crate::models::{BoundaryPolygon, Coordinate};

/// Reasons a boundary polygon is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("polygon has no outer ring")]
    MissingOuterRing,

    #[error("ring {ring} has {distinct} distinct vertices, at least 3 are required")]
    TooFewVertices { ring: usize, distinct: usize },

    #[error("ring {ring} contains a non-finite coordinate")]
    NonFiniteCoordinate { ring: usize },

    #[error("ring {ring} is self-intersecting")]
    SelfIntersecting { ring: usize },
}

/// Returns whether `point` lies inside `polygon`.
///
/// Malformed polygons and non-finite points yield `false`.
pub fn contains(point: Coordinate, polygon: &BoundaryPolygon) -> bool {
    try_contains(point, polygon).unwrap_or(false)
}

/// Like [`contains`], but reports why a polygon could not be evaluated.
///
/// Validation is quadratic in the ring size. Callers testing many points
/// against one polygon should validate once and use [`contains_validated`].
pub fn try_contains(point: Coordinate, polygon: &BoundaryPolygon) -> Result<bool, GeometryError> {
    validate_polygon(polygon)?;
    Ok(contains_validated(point, polygon))
}

/// Containment test for a polygon that already passed [`validate_polygon`].
///
/// Linear in the number of vertices. A polygon without an outer ring
/// contains nothing.
pub fn contains_validated(point: Coordinate, polygon: &BoundaryPolygon) -> bool {
    if !point.is_finite() {
        return false;
    }

    match polygon.outer_ring() {
        Some(outer) if ring_contains(point, outer) => !polygon
            .holes()
            .iter()
            .any(|hole| ring_contains(point, hole)),
        _ => false,
    }
}

/// Total number of vertices across all rings of a polygon.
pub fn vertex_count(polygon: &BoundaryPolygon) -> usize {
    polygon.rings.iter().map(Vec::len).sum()
}

/// Checks the minimal shape requirements of every ring of a polygon.
pub fn validate_polygon(polygon: &BoundaryPolygon) -> Result<(), GeometryError> {
    if polygon.rings.is_empty() {
        return Err(GeometryError::MissingOuterRing);
    }
    for (index, ring) in polygon.rings.iter().enumerate() {
        validate_ring(index, ring)?;
    }
    Ok(())
}

fn validate_ring(index: usize, ring: &[Coordinate]) -> Result<(), GeometryError> {
    if ring.iter().any(|c| !c.is_finite()) {
        return Err(GeometryError::NonFiniteCoordinate { ring: index });
    }

    let vertices = open_ring(ring);
    let distinct = distinct_vertex_count(&vertices);
    if distinct < 3 {
        return Err(GeometryError::TooFewVertices {
            ring: index,
            distinct,
        });
    }

    if !is_simple(&vertices) {
        return Err(GeometryError::SelfIntersecting { ring: index });
    }

    Ok(())
}

/// Crossing-number test against a single ring.
///
/// A duplicated closing vertex produces a zero-length edge, which never
/// straddles a latitude, so closed and open rings give identical results.
fn ring_contains(point: Coordinate, ring: &[Coordinate]) -> bool {
    let x = point.longitude;
    let y = point.latitude;

    let mut inside = false;
    let mut j = match ring.len().checked_sub(1) {
        Some(last) => last,
        None => return false,
    };

    for (i, vi) in ring.iter().enumerate() {
        let vj = ring[j];
        let (xi, yi) = (vi.longitude, vi.latitude);
        let (xj, yj) = (vj.longitude, vj.latitude);

        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Removes consecutive duplicates and the closing vertex, if any.
fn open_ring(ring: &[Coordinate]) -> Vec<Coordinate> {
    let mut vertices: Vec<Coordinate> = Vec::with_capacity(ring.len());
    for &c in ring {
        if vertices.last() != Some(&c) {
            vertices.push(c);
        }
    }
    while vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    vertices
}

fn distinct_vertex_count(vertices: &[Coordinate]) -> usize {
    let mut keys: Vec<(f64, f64)> = vertices
        .iter()
        .map(|c| (c.latitude, c.longitude))
        .collect();
    keys.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    keys.dedup();
    keys.len()
}

/// Returns false if any two non-adjacent edges of the open ring touch.
fn is_simple(vertices: &[Coordinate]) -> bool {
    let n = vertices.len();
    let edges: Vec<Line<f64>> = (0..n)
        .map(|i| {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            Line::new(
                coord! { x: a.longitude, y: a.latitude },
                coord! { x: b.longitude, y: b.latitude },
            )
        })
        .collect();

    for i in 0..n {
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            if !adjacent && edges[i].intersects(&edges[j]) {
                return false;
            }
        }
    }
    true
}
