//! Impact marker presentation and host-side impact delivery.
//!
//! The impact time is computed by an external analysis task and handed to
//! the viewer once that task completes. It arrives either on the command
//! line or through a JSON sidecar next to the video file, which the app
//! polls until a value appears. `None` means no marker: all impact
//! affordances stay hidden.

use std::path::{Path, PathBuf};

use crate::timeline;

/// Fractional position of the marker on the track, or `None` while the
/// duration is unknown.
pub fn marker_fraction(impact_time: f64, duration: f64) -> Option<f32> {
    if duration <= 0.0 {
        return None;
    }
    Some(timeline::fraction_of(impact_time, duration))
}

/// Sidecar file the analysis task writes its result to:
/// `<video>.impact.json`.
pub fn sidecar_path(video: &Path) -> PathBuf {
    let mut name = video.file_name().unwrap_or_default().to_os_string();
    name.push(".impact.json");
    video.with_file_name(name)
}

/// Read an impact time from a sidecar file.
///
/// Accepts `{"impact_time_seconds": 45.5}`, a bare number, or `null` / a
/// null field for "analysis finished, nothing detected". A missing or
/// malformed file reads as "no result yet".
pub fn read_sidecar(path: &Path) -> Option<f64> {
    let content = std::fs::read_to_string(path).ok()?;
    let value: serde_json::Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("unreadable impact sidecar {:?}: {}", path, e);
            return None;
        }
    };
    let seconds = match &value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::Object(map) => map
            .get("impact_time_seconds")
            .and_then(serde_json::Value::as_f64),
        _ => None,
    }?;
    if seconds.is_finite() && seconds >= 0.0 {
        Some(seconds)
    } else {
        None
    }
}

/// Display form of a timestamp, `m:ss`.
pub fn format_time(seconds: f64) -> String {
    let whole = seconds.max(0.0) as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn marker_lands_at_impact_fraction() {
        let fraction = marker_fraction(45.5, 120.0).unwrap();
        assert!((fraction - 45.5 / 120.0).abs() < 1e-6);
    }

    #[test]
    fn no_marker_before_duration_known() {
        assert!(marker_fraction(45.5, 0.0).is_none());
    }

    #[test]
    fn marker_clamps_past_the_end() {
        assert_eq!(marker_fraction(500.0, 120.0), Some(1.0));
    }

    #[test]
    fn sidecar_path_appends_suffix() {
        let path = sidecar_path(Path::new("/data/clip.mp4"));
        assert_eq!(path, Path::new("/data/clip.mp4.impact.json"));
    }

    #[test]
    fn reads_object_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4.impact.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{{\"impact_time_seconds\": 45.5}}").unwrap();
        assert_eq!(read_sidecar(&path), Some(45.5));
    }

    #[test]
    fn reads_bare_number_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4.impact.json");
        std::fs::write(&path, "12.25").unwrap();
        assert_eq!(read_sidecar(&path), Some(12.25));
    }

    #[test]
    fn null_and_missing_sidecars_mean_no_impact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4.impact.json");
        std::fs::write(&path, "{\"impact_time_seconds\": null}").unwrap();
        assert_eq!(read_sidecar(&path), None);
        assert_eq!(read_sidecar(&dir.path().join("absent.json")), None);
    }

    #[test]
    fn negative_and_nan_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4.impact.json");
        std::fs::write(&path, "-3.0").unwrap();
        assert_eq!(read_sidecar(&path), None);
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(45.5), "0:45");
        assert_eq!(format_time(125.0), "2:05");
    }
}
