//! Playback controller: the single owner of play/pause/seek state.
//!
//! All other components read `PlaybackState` snapshots; none of them mutate
//! the media element directly.

use std::time::Duration;

use crate::media::{MediaBackend, MediaEvent};

/// Snapshot of the authoritative playback state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackState {
    pub current_time: f64,
    /// 0.0 until metadata has arrived.
    pub duration: f64,
    pub playing: bool,
    pub ready: bool,
    pub errored: bool,
}

/// Outcome of draining backend events, for the coordinator to act on.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    BecameReady,
    SeekSettled,
    DecodeFailed(String),
    ReachedEnd,
}

pub struct PlaybackController {
    backend: Box<dyn MediaBackend>,
    state: PlaybackState,
    /// Last seek requested before duration was known; replayed on readiness.
    pending_seek: Option<f64>,
}

impl PlaybackController {
    /// Bind a freshly constructed backend. State starts from zero.
    pub fn new(backend: Box<dyn MediaBackend>) -> Self {
        PlaybackController {
            backend,
            state: PlaybackState::default(),
            pending_seek: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn play(&mut self) {
        if self.state.errored || !self.state.ready {
            return;
        }
        self.backend.set_paused(false);
        self.state.playing = true;
    }

    pub fn pause(&mut self) {
        if self.state.errored || !self.state.ready {
            return;
        }
        self.backend.set_paused(true);
        self.state.playing = false;
    }

    /// Clamp `target` and ask the element to move there. Seeking always
    /// pauses, so a capture never races forward playback. Returns `true`
    /// when a seek was actually issued to the element.
    pub fn seek(&mut self, target: f64) -> bool {
        if self.state.errored || !target.is_finite() {
            return false;
        }
        let clamped = if self.state.ready && self.state.duration > 0.0 {
            target.clamp(0.0, self.state.duration)
        } else {
            target.max(0.0)
        };

        if !self.state.ready {
            // Accepted but deferred until metadata arrives.
            self.pending_seek = Some(clamped);
            return false;
        }

        self.backend.set_paused(true);
        self.state.playing = false;
        self.state.current_time = clamped;
        match self.backend.seek(Duration::from_secs_f64(clamped)) {
            Ok(()) => {
                log::debug!("seek issued: target={:.3}s", clamped);
                true
            }
            Err(e) => {
                log::warn!("seek to {:.3}s failed: {}", clamped, e);
                false
            }
        }
    }

    /// Poll the element's clock. Ignored mid-drag: the timeline gesture is
    /// the higher-priority input source and must not be overwritten.
    pub fn poll_position(&mut self, dragging: bool) {
        if dragging || self.state.errored || !self.state.ready {
            return;
        }
        if let Some(pos) = self.backend.position() {
            if pos.is_finite() && pos >= 0.0 {
                self.state.current_time = if self.state.duration > 0.0 {
                    pos.min(self.state.duration)
                } else {
                    pos
                };
            }
        }
    }

    /// Drain asynchronous element notifications and fold them into state.
    pub fn pump(&mut self) -> Vec<PlayerEvent> {
        let mut out = Vec::new();
        for event in self.backend.poll_events() {
            match event {
                MediaEvent::MetadataReady { duration } => {
                    if duration.is_finite() && duration >= 0.0 {
                        self.state.duration = duration;
                    }
                    self.state.ready = true;
                    log::info!("media ready: duration={:.3}s", self.state.duration);
                    out.push(PlayerEvent::BecameReady);
                    if let Some(target) = self.pending_seek.take() {
                        if self.seek(target) {
                            log::debug!("replayed deferred seek to {:.3}s", target);
                        }
                    }
                }
                MediaEvent::DurationChanged { duration } => {
                    // A refinement, not a readiness signal: nothing outside
                    // the duration field may react to it.
                    if duration.is_finite() && duration >= 0.0 {
                        self.state.duration = duration;
                        if self.state.duration > 0.0 {
                            self.state.current_time =
                                self.state.current_time.min(self.state.duration);
                        }
                        log::debug!("duration refined: {:.3}s", duration);
                    }
                }
                MediaEvent::SeekDone => {
                    // The decoder may have settled near a keyframe rather
                    // than exactly at the request; trust its clock.
                    if let Some(pos) = self.backend.position() {
                        if pos.is_finite() && pos >= 0.0 {
                            self.state.current_time = pos;
                        }
                    }
                    out.push(PlayerEvent::SeekSettled);
                }
                MediaEvent::Error(msg) => {
                    log::error!("decode error: {}", msg);
                    self.state.errored = true;
                    self.state.playing = false;
                    out.push(PlayerEvent::DecodeFailed(msg));
                }
                MediaEvent::EndOfStream => {
                    self.state.playing = false;
                    out.push(PlayerEvent::ReachedEnd);
                }
            }
        }
        out
    }

    pub fn backend_mut(&mut self) -> &mut dyn MediaBackend {
        self.backend.as_mut()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::media::{MediaError, RawFrame};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Shared handle into a boxed [`FakeBackend`], so tests can keep
    /// scripting it after ownership moves into the controller.
    #[derive(Clone, Default)]
    pub(crate) struct FakeHandle {
        inner: Arc<Mutex<FakeState>>,
    }

    #[derive(Default)]
    pub(crate) struct FakeState {
        pub events: VecDeque<MediaEvent>,
        pub seeks: Vec<f64>,
        pub paused: bool,
        pub position: Option<f64>,
        pub dimensions: (u32, u32),
        pub frame: Option<RawFrame>,
    }

    impl FakeHandle {
        pub fn push(&self, event: MediaEvent) {
            self.inner.lock().unwrap().events.push_back(event);
        }

        pub fn set_position(&self, pos: Option<f64>) {
            self.inner.lock().unwrap().position = pos;
        }

        pub fn set_frame(&self, dimensions: (u32, u32), frame: Option<RawFrame>) {
            let mut state = self.inner.lock().unwrap();
            state.dimensions = dimensions;
            state.frame = frame;
        }

        pub fn seeks(&self) -> Vec<f64> {
            self.inner.lock().unwrap().seeks.clone()
        }
    }

    /// Scripted backend: records calls, replays queued events.
    pub(crate) struct FakeBackend {
        handle: FakeHandle,
    }

    impl FakeBackend {
        pub fn new() -> (Self, FakeHandle) {
            let handle = FakeHandle::default();
            (
                FakeBackend {
                    handle: handle.clone(),
                },
                handle,
            )
        }
    }

    impl MediaBackend for FakeBackend {
        fn seek(&mut self, target: Duration) -> Result<(), MediaError> {
            self.handle
                .inner
                .lock()
                .unwrap()
                .seeks
                .push(target.as_secs_f64());
            Ok(())
        }

        fn set_paused(&mut self, paused: bool) {
            self.handle.inner.lock().unwrap().paused = paused;
        }

        fn paused(&self) -> bool {
            self.handle.inner.lock().unwrap().paused
        }

        fn position(&self) -> Option<f64> {
            self.handle.inner.lock().unwrap().position
        }

        fn duration(&self) -> Option<f64> {
            None
        }

        fn dimensions(&self) -> (u32, u32) {
            self.handle.inner.lock().unwrap().dimensions
        }

        fn snapshot(&mut self) -> Option<RawFrame> {
            self.handle.inner.lock().unwrap().frame.clone()
        }

        fn poll_events(&mut self) -> Vec<MediaEvent> {
            self.handle.inner.lock().unwrap().events.drain(..).collect()
        }
    }

    pub(crate) fn ready_controller(duration: f64) -> (PlaybackController, FakeHandle) {
        let (backend, handle) = FakeBackend::new();
        handle.push(MediaEvent::MetadataReady { duration });
        let mut controller = PlaybackController::new(Box::new(backend));
        controller.pump();
        (controller, handle)
    }

    #[test]
    fn metadata_sets_duration_and_ready() {
        let (controller, _handle) = ready_controller(120.0);
        let state = controller.state();
        assert!(state.ready);
        assert_eq!(state.duration, 120.0);
        assert_eq!(state.current_time, 0.0);
    }

    #[test]
    fn seek_clamps_to_duration() {
        let (mut controller, handle) = ready_controller(60.0);
        assert!(controller.seek(500.0));
        assert_eq!(controller.state().current_time, 60.0);
        assert!(controller.seek(-3.0));
        assert_eq!(controller.state().current_time, 0.0);
        assert_eq!(handle.seeks(), vec![60.0, 0.0]);
    }

    #[test]
    fn seek_always_pauses() {
        let (mut controller, _handle) = ready_controller(60.0);
        controller.play();
        assert!(controller.state().playing);
        controller.seek(10.0);
        assert!(!controller.state().playing);
    }

    #[test]
    fn seek_rejects_non_finite() {
        let (mut controller, handle) = ready_controller(60.0);
        assert!(!controller.seek(f64::NAN));
        assert!(!controller.seek(f64::INFINITY));
        assert_eq!(controller.state().current_time, 0.0);
        assert!(handle.seeks().is_empty());
    }

    #[test]
    fn seek_before_ready_is_deferred_then_replayed() {
        let (backend, handle) = FakeBackend::new();
        let mut controller = PlaybackController::new(Box::new(backend));
        // No metadata yet: accepted but not forwarded to the element.
        assert!(!controller.seek(42.0));
        assert!(handle.seeks().is_empty());
        handle.push(MediaEvent::MetadataReady { duration: 100.0 });
        controller.pump();
        assert!(controller.state().ready);
        assert_eq!(controller.state().current_time, 42.0);
        assert_eq!(handle.seeks(), vec![42.0]);
    }

    #[test]
    fn error_latches_and_disables_controls() {
        let (mut controller, handle) = ready_controller(30.0);
        handle.push(MediaEvent::Error("bad stream".into()));
        let events = controller.pump();
        assert!(events.contains(&PlayerEvent::DecodeFailed("bad stream".into())));
        assert!(controller.state().errored);
        assert!(!controller.seek(5.0));
        controller.play();
        assert!(!controller.state().playing);
    }

    #[test]
    fn position_poll_suppressed_while_dragging() {
        let (mut controller, handle) = ready_controller(30.0);
        handle.set_position(Some(12.0));
        controller.poll_position(true);
        assert_eq!(controller.state().current_time, 0.0);
        controller.poll_position(false);
        assert_eq!(controller.state().current_time, 12.0);
    }

    #[test]
    fn seek_settles_at_backend_reported_time() {
        let (mut controller, handle) = ready_controller(30.0);
        controller.seek(10.0);
        // The decoder settled slightly off the request, near a keyframe.
        handle.set_position(Some(9.96));
        handle.push(MediaEvent::SeekDone);
        let events = controller.pump();
        assert!(events.contains(&PlayerEvent::SeekSettled));
        assert_eq!(controller.state().current_time, 9.96);
    }

    #[test]
    fn duration_refinement_does_not_resignal_readiness() {
        let (mut controller, handle) = ready_controller(100.0);
        controller.seek(100.0);
        // A VBR duration refinement lands mid-session. It must update the
        // duration (clamping the position back into range) and nothing
        // else; re-announcing readiness would replay one-shot navigation.
        handle.push(MediaEvent::DurationChanged { duration: 98.5 });
        let events = controller.pump();
        assert!(events.is_empty());
        assert_eq!(controller.state().duration, 98.5);
        assert_eq!(controller.state().current_time, 98.5);
    }

    #[test]
    fn duration_refinement_rejects_invalid_values() {
        let (mut controller, handle) = ready_controller(100.0);
        handle.push(MediaEvent::DurationChanged { duration: f64::NAN });
        handle.push(MediaEvent::DurationChanged { duration: -1.0 });
        controller.pump();
        assert_eq!(controller.state().duration, 100.0);
    }

    #[test]
    fn end_of_stream_stops_playback() {
        let (mut controller, handle) = ready_controller(30.0);
        controller.play();
        handle.push(MediaEvent::EndOfStream);
        let events = controller.pump();
        assert!(events.contains(&PlayerEvent::ReachedEnd));
        assert!(!controller.state().playing);
    }
}
