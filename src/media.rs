//! Backend abstraction over the owned media element.
//!
//! The viewer never touches the decode pipeline directly; everything goes
//! through this trait so the controller and sync engine can be driven by a
//! scripted fake in tests.

use std::fmt;
use std::time::Duration;

/// Asynchronous notifications from the media element, drained by the
/// cooperative bus pump. Completion of a seek is only ever observed here.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Preroll finished: duration is known and the element can be captured.
    MetadataReady { duration: f64 },
    /// Refined duration estimate after preroll (VBR files settle late).
    /// Only overwrites the known duration; carries no readiness signal.
    DurationChanged { duration: f64 },
    /// A previously issued seek has settled at its final position.
    SeekDone,
    /// Fatal decode/playback error. The element is unusable until reloaded.
    Error(String),
    EndOfStream,
}

/// One decoded frame, straight from the element. Backends must return `None`
/// from `snapshot` rather than ever constructing a zero-dimension frame.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[derive(Debug)]
pub enum MediaError {
    Pipeline(String),
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaError::Pipeline(msg) => write!(f, "pipeline error: {}", msg),
        }
    }
}

impl std::error::Error for MediaError {}

/// The single underlying media element. Exclusively owned by the
/// `PlaybackController`; no other component holds a reference.
pub trait MediaBackend {
    /// Request an accurate, flushing move to `target`. Returns once the
    /// request is queued; settlement arrives later as `MediaEvent::SeekDone`.
    fn seek(&mut self, target: Duration) -> Result<(), MediaError>;

    fn set_paused(&mut self, paused: bool);
    fn paused(&self) -> bool;

    /// Current position in seconds, when the element can answer.
    fn position(&self) -> Option<f64>;

    /// Total duration in seconds, once preroll has completed.
    fn duration(&self) -> Option<f64>;

    /// Decoded frame dimensions; `(0, 0)` until a frame has been decoded.
    fn dimensions(&self) -> (u32, u32);

    /// Read-only grab of the most recently decoded frame. Must not disturb
    /// playback state. `None` while the decoder has nothing presentable.
    fn snapshot(&mut self) -> Option<RawFrame>;

    /// Drain pending asynchronous notifications without blocking.
    fn poll_events(&mut self) -> Vec<MediaEvent>;
}
