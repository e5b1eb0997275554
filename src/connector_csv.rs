//! Mock-dataset connector.
//!
//! Reads a vendor CSV export (one row per detected event) and normalizes
//! rows into [`IncidentRecord`]s. Rows with missing or non-numeric start
//! GPS coordinates are skipped and counted; a missing end coordinate falls
//! back to the start so stationary events still produce a point.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::config::Config;
use crate::models::IncidentRecord;

/// A raw CSV row, with column names matching the vendor export headers.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Label")]
    label: String,
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Severity")]
    severity: String,
    #[serde(rename = "Timestamp")]
    timestamp: String,
    #[serde(rename = "Frame Gps Lat Start")]
    lat_start: Option<f64>,
    #[serde(rename = "Frame Gps Lon Start")]
    lon_start: Option<f64>,
    #[serde(rename = "Frame Gps Lat End")]
    lat_end: Option<f64>,
    #[serde(rename = "Frame Gps Lon End")]
    lon_end: Option<f64>,
    #[serde(rename = "Video ID")]
    video_id: String,
    #[serde(rename = "Share Link")]
    share_link: String,
}

/// Result of a CSV scan: the usable records plus the number of rows
/// dropped for invalid GPS data.
#[derive(Debug)]
pub struct CsvScan {
    pub records: Vec<IncidentRecord>,
    pub skipped: usize,
}

/// Scan the configured mock CSV, applying the label filter.
pub fn scan_csv(config: &Config, filter: Option<&str>) -> Result<CsvScan> {
    let path = config
        .data
        .csv_path
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("data.csv_path not configured"))?;
    scan_csv_file(path, filter)
}

/// Scan a CSV file at an explicit path (used by tests and one-shot commands).
pub fn scan_csv_file(path: &Path, filter: Option<&str>) -> Result<CsvScan> {
    if !path.exists() {
        anyhow::bail!("mock dataset not found: {}", path.display());
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV: {}", path.display()))?;

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for row in reader.deserialize::<CsvRow>() {
        let row = match row {
            Ok(r) => r,
            Err(_) => {
                // Malformed row (wrong field count, unparseable number)
                skipped += 1;
                continue;
            }
        };

        if !matches_filter(&row.label, filter) {
            continue;
        }

        let (lat_start, lon_start) = match (row.lat_start, row.lon_start) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                skipped += 1;
                continue;
            }
        };

        records.push(IncidentRecord {
            label: row.label,
            category: row.category,
            severity: row.severity,
            timestamp: row.timestamp,
            lat_start,
            lon_start,
            lat_end: row.lat_end.unwrap_or(lat_start),
            lon_end: row.lon_end.unwrap_or(lon_start),
            video_id: row.video_id,
            share_link: row.share_link,
        });
    }

    Ok(CsvScan { records, skipped })
}

/// Case-insensitive substring label filter. `None`, empty, and `"all"`
/// match everything.
pub fn matches_filter(label: &str, filter: Option<&str>) -> bool {
    match filter {
        None => true,
        Some(f) if f.is_empty() || f.eq_ignore_ascii_case("all") => true,
        Some(f) => label.to_lowercase().contains(&f.to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "Label,Category,Severity,Timestamp,Frame Gps Lat Start,Frame Gps Lon Start,Frame Gps Lat End,Frame Gps Lon End,Video ID,Share Link";

    fn write_csv(rows: &[&str]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "{}", HEADER).unwrap();
        for row in rows {
            writeln!(f, "{}", row).unwrap();
        }
        f
    }

    #[test]
    fn test_scan_parses_valid_rows() {
        let f = write_csv(&[
            "Hard Braking,Driving Behavior,High,0:42–0:57,37.77,-122.41,37.78,-122.40,vid1,https://example.com/1",
            "Pedestrian,Road Hazard,Critical,1:03–1:18,37.70,-122.45,37.70,-122.45,vid2,https://example.com/2",
        ]);
        let scan = scan_csv_file(f.path(), None).unwrap();
        assert_eq!(scan.records.len(), 2);
        assert_eq!(scan.skipped, 0);
        assert_eq!(scan.records[0].label, "Hard Braking");
        assert_eq!(scan.records[0].lat_start, 37.77);
        assert_eq!(scan.records[1].video_id, "vid2");
    }

    #[test]
    fn test_scan_skips_missing_gps() {
        let f = write_csv(&[
            "Hard Braking,Driving Behavior,High,0:42–0:57,,,37.78,-122.40,vid1,https://example.com/1",
            "Pedestrian,Road Hazard,Critical,1:03–1:18,37.70,-122.45,37.70,-122.45,vid2,https://example.com/2",
        ]);
        let scan = scan_csv_file(f.path(), None).unwrap();
        assert_eq!(scan.records.len(), 1);
        assert_eq!(scan.skipped, 1);
        assert_eq!(scan.records[0].label, "Pedestrian");
    }

    #[test]
    fn test_scan_missing_end_gps_falls_back_to_start() {
        let f = write_csv(&[
            "Idle,Driving Behavior,Low,0:10–0:25,37.77,-122.41,,,vid1,https://example.com/1",
        ]);
        let scan = scan_csv_file(f.path(), None).unwrap();
        assert_eq!(scan.records.len(), 1);
        assert_eq!(scan.records[0].lat_end, 37.77);
        assert_eq!(scan.records[0].lon_end, -122.41);
    }

    #[test]
    fn test_scan_label_filter_case_insensitive() {
        let f = write_csv(&[
            "Hard Braking,Driving Behavior,High,0:42–0:57,37.77,-122.41,37.78,-122.40,vid1,https://example.com/1",
            "Pedestrian,Road Hazard,Critical,1:03–1:18,37.70,-122.45,37.70,-122.45,vid2,https://example.com/2",
        ]);
        let scan = scan_csv_file(f.path(), Some("braking")).unwrap();
        assert_eq!(scan.records.len(), 1);
        assert_eq!(scan.records[0].label, "Hard Braking");
    }

    #[test]
    fn test_filter_all_matches_everything() {
        assert!(matches_filter("Hard Braking", Some("all")));
        assert!(matches_filter("Hard Braking", Some("ALL")));
        assert!(matches_filter("Hard Braking", Some("")));
        assert!(matches_filter("Hard Braking", None));
        assert!(!matches_filter("Hard Braking", Some("pedestrian")));
    }

    #[test]
    fn test_scan_missing_file_errors() {
        let err = scan_csv_file(Path::new("/nonexistent/mock.csv"), None).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
