use std::path::PathBuf;

use iced::Event;

#[derive(Clone, Debug)]
pub enum Message {
    BrowseFile,
    FileDropped(PathBuf),
    EventOccurred(Event),
    /// Pump the media element's asynchronous notifications (60 Hz).
    MediaTick,
    /// Poll the playback clock (10 Hz).
    PositionTick,
    /// One scheduled capture attempt coming due. `attempt` is 1-based.
    CaptureAttempt { generation: u64, attempt: u32 },
    TogglePause,
    StepFrames(i64),
    /// Pointer moved over the track at a track-local x offset.
    TimelineHover(f32),
    TimelineLeave,
    TimelinePressed,
    JumpToImpact,
    RecaptureImpactFrame,
    /// Check the sidecar for a completed impact analysis (3 s).
    ImpactPoll,
}
