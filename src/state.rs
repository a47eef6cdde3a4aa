use std::path::PathBuf;
use std::time::Duration;

use crate::player::PlaybackController;
use crate::sync::{CaptureConfig, SyncEngine};
use crate::timeline::Timeline;

/// Pixel width of the scrub track.
pub const TRACK_WIDTH: f32 = 640.0;

/// Startup options parsed from the command line.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub source: Option<String>,
    pub impact_time: Option<f64>,
    pub frame_rate: Option<f64>,
    pub capture_delay_ms: Option<u64>,
    pub capture_retry_ms: Option<u64>,
}

impl Options {
    pub fn parse<I: Iterator<Item = String>>(mut args: I) -> Options {
        let mut options = Options::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--impact" => options.impact_time = args.next().and_then(|v| v.parse().ok()),
                "--frame-rate" => options.frame_rate = args.next().and_then(|v| v.parse().ok()),
                "--capture-delay-ms" => {
                    options.capture_delay_ms = args.next().and_then(|v| v.parse().ok())
                }
                "--capture-retry-ms" => {
                    options.capture_retry_ms = args.next().and_then(|v| v.parse().ok())
                }
                other if !other.starts_with("--") => {
                    if options.source.is_none() {
                        options.source = Some(other.to_string());
                    } else {
                        log::warn!("ignoring extra source argument: {}", other);
                    }
                }
                other => log::warn!("ignoring unknown flag: {}", other),
            }
        }
        options
    }

    pub fn capture_config(&self) -> CaptureConfig {
        let defaults = CaptureConfig::default();
        CaptureConfig {
            first_delay: self
                .capture_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.first_delay),
            retry_delay: self
                .capture_retry_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
            max_attempts: defaults.max_attempts,
        }
    }
}

/// Application state for one viewing session.
pub struct App {
    /// Media element owner; absent until a source is loaded.
    pub controller: Option<PlaybackController>,
    pub sync: SyncEngine,
    pub timeline: Timeline,
    /// Local file behind the current source, when there is one. Drives the
    /// impact sidecar lookup.
    pub source_path: Option<PathBuf>,
    pub impact_time: Option<f64>,
    /// Keep polling the sidecar until an impact value arrives.
    pub awaiting_impact: bool,
    /// Most recent window-global cursor x, the anchor for drag tracking.
    pub cursor_window_x: f32,
    pub error: Option<String>,
    pub status: String,
}

impl App {
    pub fn new(options: &Options) -> App {
        App {
            controller: None,
            sync: SyncEngine::new(
                options.capture_config(),
                options.frame_rate.unwrap_or(24.0),
            ),
            timeline: Timeline::new(TRACK_WIDTH),
            source_path: None,
            impact_time: options.impact_time,
            awaiting_impact: options.impact_time.is_none(),
            cursor_window_x: 0.0,
            error: None,
            status: "Drop a video file here to load it".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_source_and_flags() {
        let args = [
            "clip.mp4",
            "--impact",
            "45.5",
            "--frame-rate",
            "30",
            "--capture-delay-ms",
            "100",
        ]
        .iter()
        .map(|s| s.to_string());
        let options = Options::parse(args);
        assert_eq!(options.source.as_deref(), Some("clip.mp4"));
        assert_eq!(options.impact_time, Some(45.5));
        assert_eq!(options.frame_rate, Some(30.0));
        assert_eq!(options.capture_delay_ms, Some(100));
        assert_eq!(options.capture_retry_ms, None);
    }

    #[test]
    fn first_source_argument_wins() {
        let args = ["a.mp4", "b.mp4"].iter().map(|s| s.to_string());
        let options = Options::parse(args);
        assert_eq!(options.source.as_deref(), Some("a.mp4"));
    }

    #[test]
    fn capture_config_falls_back_to_defaults() {
        let options = Options::default();
        let config = options.capture_config();
        assert_eq!(config.first_delay, Duration::from_millis(150));
        assert_eq!(config.retry_delay, Duration::from_millis(300));
        assert_eq!(config.max_attempts, 2);
    }

    #[test]
    fn capture_config_honors_overrides() {
        let options = Options {
            capture_delay_ms: Some(50),
            capture_retry_ms: Some(500),
            ..Options::default()
        };
        let config = options.capture_config();
        assert_eq!(config.first_delay, Duration::from_millis(50));
        assert_eq!(config.retry_delay, Duration::from_millis(500));
    }
}
