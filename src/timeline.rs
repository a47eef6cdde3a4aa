//! Pointer-to-time mapping for the scrub track.
//!
//! The gesture state machine is pure: the view feeds it pointer events and
//! it hands back seek targets. While a drag is in progress the gesture is
//! tracked against window-global coordinates, anchored at the press point,
//! so leaving the track's bounds does not drop the gesture. The global
//! tracking is acquired on press and released on release, cancel, or
//! source change, never later.

/// Map a track-local x offset to a media time.
pub fn time_at(x: f32, width: f32, duration: f64) -> f64 {
    if width <= 0.0 || duration <= 0.0 {
        return 0.0;
    }
    (x / width).clamp(0.0, 1.0) as f64 * duration
}

/// Fraction of the track width for a given time, for rendering.
pub fn fraction_of(time: f64, duration: f64) -> f32 {
    if duration <= 0.0 {
        return 0.0;
    }
    (time / duration).clamp(0.0, 1.0) as f32
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Idle,
    /// Pointer over the track, not pressed. Drives the tooltip only.
    Hovering { preview_time: f64, offset_px: f32 },
    /// Pointer pressed; every move emits a live seek.
    Dragging {
        preview_time: f64,
        anchor_local_x: f32,
        anchor_window_x: f32,
    },
}

pub struct Timeline {
    width: f32,
    gesture: Gesture,
    /// Last known track-local pointer x, kept across gesture boundaries so
    /// a press without a preceding hover move (press, release, press again
    /// in place) still lands at the pointer, not at the track start.
    last_local_x: Option<f32>,
}

impl Timeline {
    pub fn new(width: f32) -> Self {
        Timeline {
            width,
            gesture: Gesture::Idle,
            last_local_x: None,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Dragging { .. })
    }

    pub fn hover_preview(&self) -> Option<(f64, f32)> {
        match self.gesture {
            Gesture::Hovering {
                preview_time,
                offset_px,
            } => Some((preview_time, offset_px)),
            _ => None,
        }
    }

    pub fn drag_preview(&self) -> Option<f64> {
        match self.gesture {
            Gesture::Dragging { preview_time, .. } => Some(preview_time),
            _ => None,
        }
    }

    /// Pointer moved over the track while not pressed.
    pub fn hover(&mut self, local_x: f32, duration: f64) {
        self.last_local_x = Some(local_x.clamp(0.0, self.width));
        if self.is_dragging() {
            return;
        }
        self.gesture = Gesture::Hovering {
            preview_time: time_at(local_x, self.width, duration),
            offset_px: local_x.clamp(0.0, self.width),
        };
    }

    /// Pointer left the track without a press.
    pub fn leave(&mut self) {
        if !self.is_dragging() {
            self.gesture = Gesture::Idle;
        }
    }

    /// Pointer pressed on the track. Starts the drag and emits the first
    /// live seek target.
    pub fn press(&mut self, local_x: f32, window_x: f32, duration: f64) -> Option<f64> {
        if duration <= 0.0 {
            return None;
        }
        let target = time_at(local_x, self.width, duration);
        self.last_local_x = Some(local_x.clamp(0.0, self.width));
        self.gesture = Gesture::Dragging {
            preview_time: target,
            anchor_local_x: local_x,
            anchor_window_x: window_x,
        };
        Some(target)
    }

    /// Press at the last known pointer position over the track. `None` when
    /// the pointer has never been seen (the press is dropped rather than
    /// misread as the track start).
    pub fn press_at_last_position(&mut self, window_x: f32, duration: f64) -> Option<f64> {
        let local_x = self.last_local_x?;
        self.press(local_x, window_x, duration)
    }

    /// Window-global pointer movement. Only meaningful mid-drag; the local
    /// offset is reconstructed from the press anchor.
    pub fn window_moved(&mut self, window_x: f32, duration: f64) -> Option<f64> {
        let Gesture::Dragging {
            anchor_local_x,
            anchor_window_x,
            ..
        } = self.gesture
        else {
            return None;
        };
        let local_x = anchor_local_x + (window_x - anchor_window_x);
        self.last_local_x = Some(local_x.clamp(0.0, self.width));
        let target = time_at(local_x, self.width, duration);
        self.gesture = Gesture::Dragging {
            preview_time: target,
            anchor_local_x,
            anchor_window_x,
        };
        Some(target)
    }

    /// Pointer released anywhere. Returns whether a drag just ended.
    pub fn release(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        self.gesture = Gesture::Idle;
        was_dragging
    }

    /// Abort the gesture outright (window left, source changed).
    pub fn cancel(&mut self) {
        self.gesture = Gesture::Idle;
    }
}
