//! Minimal GeoJSON reader for the static map layers (boundary and
//! dwellings). Only polygonal geometries are understood.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{GeometryError, LatLng};

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
    #[serde(other)]
    Unsupported,
}

impl FeatureCollection {
    pub fn from_json(text: &str) -> Result<Self, GeometryError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl Feature {
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.as_ref().and_then(|props| props.get(key))
    }

    /// Identifier from the `id` property, accepting numbers or strings.
    pub fn id(&self) -> Option<String> {
        match self.property("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn u32_property(&self, key: &str) -> Option<u32> {
        match self.property(key)? {
            Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Outer ring of the feature's polygon. For multipolygons the first
    /// member is used.
    pub fn outer_ring(&self, label: &str) -> Result<Vec<LatLng>, GeometryError> {
        let positions = match &self.geometry {
            Some(Geometry::Polygon { coordinates }) => coordinates.first(),
            Some(Geometry::MultiPolygon { coordinates }) => {
                coordinates.first().and_then(|polygon| polygon.first())
            }
            Some(Geometry::Unsupported) => {
                return Err(GeometryError::UnsupportedGeometry {
                    feature: label.to_string(),
                    kind: "non-polygon".to_string(),
                })
            }
            None => {
                return Err(GeometryError::UnsupportedGeometry {
                    feature: label.to_string(),
                    kind: "null".to_string(),
                })
            }
        };
        let positions = positions.ok_or_else(|| GeometryError::DegenerateRing {
            feature: label.to_string(),
            found: 0,
        })?;

        positions
            .iter()
            .map(|position| match position.as_slice() {
                [lng, lat, ..] if lng.is_finite() && lat.is_finite() => Ok(LatLng::new(*lat, *lng)),
                _ => Err(GeometryError::InvalidPosition {
                    feature: label.to_string(),
                }),
            })
            .collect()
    }
}
