//! Core data models used throughout Incident Atlas.
//!
//! These types represent the incident records produced by connectors and the
//! GeoJSON-like features that flow through the visualization and search
//! pipeline.

use serde::{Deserialize, Serialize};

/// Normalized incident event produced by a connector (CSV or vendor API)
/// before feature conversion.
#[derive(Debug, Clone)]
pub struct IncidentRecord {
    pub label: String,
    pub category: String,
    pub severity: String,
    /// Raw timestamp range string, e.g. `"1:23–1:38"`.
    pub timestamp: String,
    pub lat_start: f64,
    pub lon_start: f64,
    pub lat_end: f64,
    pub lon_end: f64,
    pub video_id: String,
    pub share_link: String,
}

/// Geometry of a feature: a single point or a start→end path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    /// `[lon, lat]`
    Point([f64; 2]),
    /// `[[lon, lat], ...]`
    LineString(Vec<[f64; 2]>),
}

/// Properties attached to every feature. Point and path features derived
/// from the same record share the same `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureProperties {
    pub id: String,
    pub label: String,
    pub severity: String,
    pub status: String,
    /// Start of the event as `"m:ss"`.
    pub time_str: String,
    /// Event start in epoch milliseconds (synthetic timeline).
    pub timestamp: i64,
    /// Event end in epoch milliseconds.
    pub timestamp_end: i64,
    pub description: String,
    pub video_id: String,
    pub video_url: String,
    /// Seconds into the video where the event starts.
    pub video_offset: i64,
    pub is_moving: bool,
    /// `"point"` or `"path"`.
    #[serde(rename = "type")]
    pub kind: String,
}

/// A single GeoJSON feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub feature_type: String,
    pub geometry: Geometry,
    pub properties: FeatureProperties,
}

/// The top-level response shape of `/api/visualize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub collection_type: String,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            collection_type: "FeatureCollection".to_string(),
            features,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_geometry_serializes_as_geojson() {
        let g = Geometry::Point([-122.41, 37.77]);
        let json = serde_json::to_value(&g).unwrap();
        assert_eq!(json["type"], "Point");
        assert_eq!(json["coordinates"][0], -122.41);
        assert_eq!(json["coordinates"][1], 37.77);
    }

    #[test]
    fn test_linestring_geometry_serializes_as_geojson() {
        let g = Geometry::LineString(vec![[-122.41, 37.77], [-122.40, 37.78]]);
        let json = serde_json::to_value(&g).unwrap();
        assert_eq!(json["type"], "LineString");
        assert_eq!(json["coordinates"][1][0], -122.40);
    }

    #[test]
    fn test_properties_kind_serializes_as_type() {
        let props = FeatureProperties {
            id: "abc".to_string(),
            label: "Hard Braking".to_string(),
            severity: "high".to_string(),
            status: "approved".to_string(),
            time_str: "0:42".to_string(),
            timestamp: 0,
            timestamp_end: 0,
            description: "Driving Behavior - Hard Braking".to_string(),
            video_id: "vid1".to_string(),
            video_url: "https://example.com/v/1".to_string(),
            video_offset: 42,
            is_moving: false,
            kind: "point".to_string(),
        };
        let json = serde_json::to_value(&props).unwrap();
        assert_eq!(json["type"], "point");
        assert!(json.get("kind").is_none());
    }
}
