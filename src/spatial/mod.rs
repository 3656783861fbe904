//! Geospatial queries: great-circle distance, destination projection and
//! boundary containment. All functions are pure.

pub mod geojson;

use geo::{
    Centroid, Coord, HaversineDestination, HaversineDistance, Intersects, LineString, Point,
    Polygon,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    fn to_point(self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }

    fn from_point(point: Point<f64>) -> Self {
        Self {
            lat: point.y(),
            lng: point.x(),
        }
    }
}

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("feature collection '{0}' contains no features")]
    EmptyCollection(String),
    #[error("feature {feature}: unsupported geometry type '{kind}'")]
    UnsupportedGeometry { feature: String, kind: String },
    #[error("feature {feature}: polygon ring needs at least 3 distinct positions, found {found}")]
    DegenerateRing { feature: String, found: usize },
    #[error("feature {feature}: position must hold finite [lng, lat] values")]
    InvalidPosition { feature: String },
    #[error("feature {feature}: missing or invalid property '{property}'")]
    MissingProperty { feature: String, property: &'static str },
    #[error("dwelling id '{0}' defined more than once")]
    DuplicateDwelling(String),
    #[error("invalid geojson: {0}")]
    Json(#[from] serde_json::Error),
}

/// Great-circle distance in meters.
pub fn distance(a: LatLng, b: LatLng) -> f64 {
    a.to_point().haversine_distance(&b.to_point())
}

/// Projects `origin` by `distance_m` meters along `bearing_deg` (clockwise
/// from north).
pub fn destination_point(origin: LatLng, distance_m: f64, bearing_deg: f64) -> LatLng {
    LatLng::from_point(
        origin
            .to_point()
            .haversine_destination(bearing_deg, distance_m),
    )
}

/// Containment test against the boundary polygon.
pub fn point_in_boundary(point: LatLng, boundary: &Boundary) -> bool {
    boundary.contains(point)
}

/// Validated simple polygon. Rings are stored as geo polygons so the
/// containment and centroid algorithms come from `geo`.
#[derive(Debug, Clone)]
pub struct Boundary {
    polygon: Polygon<f64>,
}

impl Boundary {
    pub fn from_ring(label: &str, ring: &[LatLng]) -> Result<Self, GeometryError> {
        Ok(Self {
            polygon: polygon_from_ring(label, ring)?,
        })
    }

    /// Points on the outline count as inside.
    pub fn contains(&self, point: LatLng) -> bool {
        point.is_finite() && self.polygon.intersects(&point.to_point())
    }
}

/// Centroid of a polygon ring, used once per dwelling at setup.
pub fn ring_centroid(label: &str, ring: &[LatLng]) -> Result<LatLng, GeometryError> {
    let polygon = polygon_from_ring(label, ring)?;
    polygon
        .centroid()
        .map(LatLng::from_point)
        .ok_or_else(|| GeometryError::DegenerateRing {
            feature: label.to_string(),
            found: 0,
        })
}

fn polygon_from_ring(label: &str, ring: &[LatLng]) -> Result<Polygon<f64>, GeometryError> {
    if ring.iter().any(|p| !p.is_finite()) {
        return Err(GeometryError::InvalidPosition {
            feature: label.to_string(),
        });
    }

    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(ring.len());
    for point in ring {
        let coord = Coord {
            x: point.lng,
            y: point.lat,
        };
        if coords.last() != Some(&coord) {
            coords.push(coord);
        }
    }
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }

    let mut distinct = coords.clone();
    distinct.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    distinct.dedup();
    if distinct.len() < 3 {
        return Err(GeometryError::DegenerateRing {
            feature: label.to_string(),
            found: distinct.len(),
        });
    }

    Ok(Polygon::new(LineString::from(coords), Vec::new()))
}
