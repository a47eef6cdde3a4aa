//! Coordination between seeks, decoder readiness and frame refresh.
//!
//! Every capture request walks the same pipeline: a seek is issued, a first
//! attempt is scheduled after a short settle delay, a failed attempt earns
//! at most one longer retry, and exhaustion silently keeps the last good
//! frame. In-flight attempts are never cancelled; a superseded attempt runs
//! to completion and its result is simply overwritten by the next one.

use std::time::Duration;

use crate::capture::FrameImage;

/// Retry budget for one capture request. The delays are empirical settle
/// times for the decoder, tunable from the command line.
#[derive(Debug, Clone, Copy)]
pub struct CaptureConfig {
    pub first_delay: Duration,
    pub retry_delay: Duration,
    pub max_attempts: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        CaptureConfig {
            first_delay: Duration::from_millis(150),
            retry_delay: Duration::from_millis(300),
            max_attempts: 2,
        }
    }
}

/// What the engine decided after one capture attempt.
#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    /// A new frame was accepted and now supersedes the displayed one.
    Published,
    /// Decoder not ready yet; try again after the given delay.
    RetryAfter(Duration),
    /// Retry budget exhausted; the previous frame stays on screen.
    Abandoned,
}

pub struct SyncEngine {
    config: CaptureConfig,
    frame_rate: f64,
    /// Monotonic request id, for log correlation only. Stale attempts are
    /// still accepted (last-completed-wins).
    generation: u64,
    displayed: Option<FrameImage>,
    last_sampled_second: Option<i64>,
}

impl SyncEngine {
    pub fn new(config: CaptureConfig, frame_rate: f64) -> Self {
        SyncEngine {
            config,
            frame_rate: if frame_rate > 0.0 { frame_rate } else { 24.0 },
            generation: 0,
            displayed: None,
            last_sampled_second: None,
        }
    }

    pub fn displayed(&self) -> Option<&FrameImage> {
        self.displayed.as_ref()
    }

    /// Begin a new capture request. Returns the request id and the delay
    /// before the first attempt should run.
    pub fn begin_request(&mut self) -> (u64, Duration) {
        self.generation += 1;
        log::debug!("capture request #{} scheduled", self.generation);
        (self.generation, self.config.first_delay)
    }

    /// Fold one attempt's result into the engine. `attempt` is 1-based.
    pub fn apply_attempt(
        &mut self,
        generation: u64,
        attempt: u32,
        result: Option<FrameImage>,
    ) -> AttemptOutcome {
        match result {
            Some(image) => {
                if generation != self.generation {
                    // Bounded staleness: a superseded attempt landed late.
                    log::debug!(
                        "late capture from request #{} published over #{}",
                        generation,
                        self.generation
                    );
                }
                log::debug!(
                    "capture request #{} published on attempt {}",
                    generation,
                    attempt
                );
                self.displayed = Some(image);
                AttemptOutcome::Published
            }
            None if attempt < self.config.max_attempts => {
                log::debug!(
                    "capture request #{} attempt {} unready, retrying",
                    generation,
                    attempt
                );
                AttemptOutcome::RetryAfter(self.config.retry_delay)
            }
            None => {
                log::info!(
                    "capture request #{} abandoned after {} attempts",
                    generation,
                    attempt
                );
                AttemptOutcome::Abandoned
            }
        }
    }

    /// Target time for stepping `n` frames from `current`, derived from the
    /// cosmetic frame-rate assumption and clamped into the media range.
    pub fn step_target(&self, current: f64, n: i64, duration: f64) -> f64 {
        let target = current + n as f64 / self.frame_rate;
        if duration > 0.0 {
            target.clamp(0.0, duration)
        } else {
            target.max(0.0)
        }
    }

    /// Human-readable frame index for `time`. Cosmetic only.
    pub fn frame_index(&self, time: f64) -> u64 {
        (time.max(0.0) * self.frame_rate).round() as u64
    }

    /// Opportunistic sampling during continuous playback: at most one
    /// capture per whole-second boundary crossing.
    pub fn should_sample(&mut self, position: f64) -> bool {
        let second = position.floor() as i64;
        if self.last_sampled_second == Some(second) {
            return false;
        }
        self.last_sampled_second = Some(second);
        true
    }

    /// Forget everything tied to the previous source.
    pub fn reset(&mut self) {
        self.displayed = None;
        self.last_sampled_second = None;
        self.generation += 1;
    }
}
