//! Record → GeoJSON feature normalization.
//!
//! Events carry video-relative timestamps (`"m:ss"`). For map timeline
//! playback these are projected onto a synthetic clock starting at
//! 2025-01-01T12:00:00Z, so every batch animates over the same window
//! regardless of when its videos were recorded.

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use crate::models::{Feature, FeatureProperties, Geometry, IncidentRecord};

/// Fixed event duration used when the source provides only a start time.
const DEFAULT_DURATION_SECS: i64 = 15;

/// Parse `"m:ss"` into seconds. Returns 0 for anything unparseable.
pub fn timestamp_to_seconds(time_str: &str) -> i64 {
    let mut parts = time_str.splitn(2, ':');
    let minutes = parts.next().and_then(|p| p.trim().parse::<i64>().ok());
    let seconds = parts.next().and_then(|p| p.trim().parse::<i64>().ok());
    match (minutes, seconds) {
        (Some(m), Some(s)) => m * 60 + s,
        _ => 0,
    }
}

/// Convert a video-relative `"m:ss"` offset to epoch milliseconds on the
/// synthetic timeline. An empty string maps to 0.
pub fn to_timeline_millis(time_str: &str, extra_secs: i64) -> i64 {
    if time_str.is_empty() {
        return 0;
    }
    let seconds = timestamp_to_seconds(time_str);
    let base = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
    (base.timestamp() + seconds + extra_secs) * 1000
}

/// Extract the start of a timestamp range joined by an en dash.
///
/// Values without a dash fall back to `"0:00"` rather than being parsed
/// as a bare start time (vendor exports always use the range form).
pub fn range_start(raw: &str) -> &str {
    match raw.split_once('–') {
        Some((start, _)) => start,
        None => "0:00",
    }
}

/// Convert one incident record into its GeoJSON features.
///
/// Every record yields a Point feature at the start coordinate. Records
/// whose latitude changed between start and end additionally yield a
/// LineString feature sharing the same property id, so the client can
/// toggle paths without re-matching events.
pub fn record_to_features(record: &IncidentRecord) -> Vec<Feature> {
    let time_str = range_start(&record.timestamp).to_string();
    let timestamp = to_timeline_millis(&time_str, 0);
    let timestamp_end = to_timeline_millis(&time_str, DEFAULT_DURATION_SECS);
    let is_moving = record.lat_start != record.lat_end;

    let props = FeatureProperties {
        id: Uuid::new_v4().to_string(),
        label: record.label.clone(),
        severity: record.severity.to_lowercase(),
        status: "approved".to_string(),
        video_offset: timestamp_to_seconds(&time_str),
        time_str,
        timestamp,
        timestamp_end,
        description: format!("{} - {}", record.category, record.label),
        video_id: record.video_id.clone(),
        video_url: record.share_link.clone(),
        is_moving,
        kind: "point".to_string(),
    };

    let mut features = vec![Feature {
        feature_type: "Feature".to_string(),
        geometry: Geometry::Point([record.lon_start, record.lat_start]),
        properties: props.clone(),
    }];

    if is_moving {
        let mut path_props = props;
        path_props.kind = "path".to_string();
        features.push(Feature {
            feature_type: "Feature".to_string(),
            geometry: Geometry::LineString(vec![
                [record.lon_start, record.lat_start],
                [record.lon_end, record.lat_end],
            ]),
            properties: path_props,
        });
    }

    features
}

/// The text that represents a feature for embedding purposes.
pub fn embedding_text(props: &FeatureProperties) -> String {
    format!("{} {}", props.label, props.description)
}
