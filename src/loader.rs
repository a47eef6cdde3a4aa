use std::path::PathBuf;

use crate::gst_backend::GstBackend;
use crate::player::PlaybackController;
use crate::state::App;

/// Bind a new media source, tearing down everything owned by the previous
/// one: any in-progress drag exits immediately, the displayed frame is
/// cleared, and time restarts at zero.
pub fn load_source(app: &mut App, raw: &str, impact_override: Option<f64>) {
    app.status = "Loading video...".to_string();
    app.timeline.cancel();
    app.sync.reset();
    app.controller = None;
    app.source_path = None;
    app.impact_time = impact_override;
    app.awaiting_impact = impact_override.is_none();

    let (source_url, source_path) = match url::Url::parse(raw) {
        Ok(parsed) if !parsed.cannot_be_a_base() => {
            let path = parsed.to_file_path().ok();
            (parsed, path)
        }
        _ => {
            let path = PathBuf::from(raw);
            match std::fs::metadata(&path) {
                Ok(_) => match url::Url::from_file_path(&path) {
                    Ok(parsed) => (parsed, Some(path)),
                    Err(_) => {
                        app.error = Some("Invalid video path".to_string());
                        return;
                    }
                },
                Err(e) => {
                    app.error = Some(format!("Video file not found: {}", e));
                    return;
                }
            }
        }
    };

    match GstBackend::new(&source_url) {
        Ok(backend) => {
            log::info!(
                "video loading: source={}, impact={:?}",
                source_url,
                impact_override
            );
            app.controller = Some(PlaybackController::new(Box::new(backend)));
            app.source_path = source_path;
            app.error = None;
            app.status = format!("Loaded {}", source_url);
        }
        Err(e) => {
            app.error = Some(format!("Failed to load video: {}", e));
        }
    }
}

/// Load a dropped or browsed file. Any previously supplied impact time
/// belongs to the previous source, so the sidecar poll starts over.
pub fn load_video_from_path(app: &mut App, video_path: PathBuf) {
    load_source(app, &video_path.to_string_lossy(), None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Options;

    #[test]
    fn load_tears_down_previous_session_even_on_failure() {
        let mut app = App::new(&Options::default());
        // Simulate a session in progress: mid-drag with an impact marker.
        app.timeline.press(320.0, 500.0, 120.0);
        app.impact_time = Some(45.5);
        assert!(app.timeline.is_dragging());

        load_source(&mut app, "/nonexistent/clip.mp4", None);

        // The drag exits immediately and all per-source state is gone.
        assert!(!app.timeline.is_dragging());
        assert!(app.sync.displayed().is_none());
        assert!(app.controller.is_none());
        assert!(app.impact_time.is_none());
        assert!(app.awaiting_impact);
        assert!(app.error.as_deref().unwrap_or("").contains("not found"));
    }

    #[test]
    fn cli_impact_survives_the_initial_load_attempt() {
        let mut app = App::new(&Options::default());
        load_source(&mut app, "/nonexistent/clip.mp4", Some(45.5));
        assert_eq!(app.impact_time, Some(45.5));
        assert!(!app.awaiting_impact);
    }
}
