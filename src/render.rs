//! Interactive HTML map rendering.
//!
//! Produces a single self-contained Leaflet page for a feature collection:
//! severity-colored markers at point features, polylines for path features,
//! and popups linking into the event's video at the stored offset. The page
//! is served by `GET /api/map/{batch_id}` and written to disk by
//! `atlas render`.

use crate::models::{Feature, FeatureCollection, Geometry};

/// Marker/polyline color per severity level.
fn severity_color(severity: &str) -> &'static str {
    match severity {
        "critical" => "#d73027",
        "high" => "#fc8d59",
        "medium" => "#fee08b",
        "low" => "#91cf60",
        _ => "#4575b4",
    }
}

/// Build the HTML popup for a feature.
///
/// All interpolated values are HTML-escaped; the video link opens in a new
/// tab at the event's offset.
pub fn popup_html(feature: &Feature) -> String {
    let props = &feature.properties;
    let mut html = format!(
        "<b>{}</b><br>severity: {}<br>at {}",
        escape_html(&props.label),
        escape_html(&props.severity),
        escape_html(&props.time_str),
    );
    if !props.video_url.is_empty() {
        html.push_str(&format!(
            "<br><a href=\"{}#t={}\" target=\"_blank\">watch video</a>",
            escape_html(&props.video_url),
            props.video_offset,
        ));
    }
    html
}

/// Render a feature collection as a complete Leaflet HTML page.
pub fn render_map(batch_id: &str, collection: &FeatureCollection) -> String {
    let mut overlays = String::new();

    for feature in &collection.features {
        let color = severity_color(&feature.properties.severity);
        let popup = serde_json::to_string(&popup_html(feature)).unwrap_or_default();

        match &feature.geometry {
            Geometry::Point([lon, lat]) => {
                overlays.push_str(&format!(
                    "L.circleMarker([{lat}, {lon}], {{radius: 7, color: \"{color}\", fillOpacity: 0.8}}).addTo(map).bindPopup({popup});\n"
                ));
            }
            Geometry::LineString(coords) => {
                let latlngs: Vec<String> = coords
                    .iter()
                    .map(|[lon, lat]| format!("[{lat}, {lon}]"))
                    .collect();
                overlays.push_str(&format!(
                    "L.polyline([{}], {{color: \"{color}\", weight: 3, dashArray: \"6 4\"}}).addTo(map).bindPopup({popup});\n",
                    latlngs.join(", ")
                ));
            }
        }
    }

    // Center on the first point feature, or a neutral default for empty batches
    let center = collection
        .features
        .iter()
        .find_map(|f| match &f.geometry {
            Geometry::Point([lon, lat]) => Some(format!("[{lat}, {lon}]")),
            _ => None,
        })
        .unwrap_or_else(|| "[0, 0]".to_string());

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Incident Atlas — batch {batch_id}</title>
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
var map = L.map("map").setView({center}, 13);
L.tileLayer("https://tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png", {{
  attribution: "&copy; OpenStreetMap contributors"
}}).addTo(map);
{overlays}</script>
</body>
</html>
"#,
        batch_id = escape_html(batch_id),
    )
}

/// Minimal HTML escaping for text interpolated into popups and titles.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeatureProperties, IncidentRecord};

    fn sample_collection() -> FeatureCollection {
        let record = IncidentRecord {
            label: "Hard Braking".to_string(),
            category: "Driving Behavior".to_string(),
            severity: "High".to_string(),
            timestamp: "1:23–1:38".to_string(),
            lat_start: 37.77,
            lon_start: -122.41,
            lat_end: 37.78,
            lon_end: -122.40,
            video_id: "vid1".to_string(),
            share_link: "https://example.com/v/1".to_string(),
        };
        FeatureCollection::new(crate::features::record_to_features(&record))
    }

    #[test]
    fn test_popup_contains_label_and_video_link() {
        let collection = sample_collection();
        let popup = popup_html(&collection.features[0]);
        assert!(popup.contains("Hard Braking"));
        assert!(popup.contains("severity: high"));
        assert!(popup.contains("at 1:23"));
        assert!(popup.contains("https://example.com/v/1#t=83"));
    }

    #[test]
    fn test_popup_escapes_html() {
        let props = FeatureProperties {
            id: "x".to_string(),
            label: "<script>alert(1)</script>".to_string(),
            severity: "high".to_string(),
            status: "approved".to_string(),
            time_str: "0:00".to_string(),
            timestamp: 0,
            timestamp_end: 0,
            description: String::new(),
            video_id: String::new(),
            video_url: String::new(),
            video_offset: 0,
            is_moving: false,
            kind: "point".to_string(),
        };
        let feature = crate::models::Feature {
            feature_type: "Feature".to_string(),
            geometry: Geometry::Point([0.0, 0.0]),
            properties: props,
        };
        let popup = popup_html(&feature);
        assert!(!popup.contains("<script>"));
        assert!(popup.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_render_map_contains_overlays() {
        let collection = sample_collection();
        let html = render_map("batch-1", &collection);
        assert!(html.contains("L.circleMarker([37.77, -122.41]"));
        assert!(html.contains("L.polyline("));
        assert!(html.contains("batch batch-1"));
        assert!(html.contains("leaflet"));
    }

    #[test]
    fn test_render_map_empty_batch() {
        let html = render_map("empty", &FeatureCollection::new(Vec::new()));
        assert!(html.contains("setView([0, 0]"));
        assert!(!html.contains("circleMarker"));
    }

    #[test]
    fn test_severity_colors_distinct() {
        assert_ne!(severity_color("critical"), severity_color("low"));
        assert_eq!(severity_color("unknown"), severity_color("other"));
    }
}
