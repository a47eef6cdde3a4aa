//! GStreamer-backed media element.
//!
//! Pipeline: uridecodebin → videoconvert → appsink (RGBA). The appsink is
//! the capture surface: while paused the preroll sample holds the frame the
//! last seek settled on, while playing the most recent sample is kept
//! (`max-buffers=1, drop=true`). The bus is pumped non-blocking from the
//! UI event loop; nothing here spawns a thread.

use std::time::Duration;

use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;

use crate::media::{MediaBackend, MediaError, MediaEvent, RawFrame};

pub struct GstBackend {
    pipeline: gst::Pipeline,
    appsink: gst_app::AppSink,
    paused: bool,
    /// First ASYNC_DONE is preroll completion; later ones are seek settles.
    prerolled: bool,
    /// Last frame pulled from the appsink. Invalidated by flushing seeks so
    /// a stale pre-seek frame is never served as current content.
    cached_frame: Option<RawFrame>,
}

impl GstBackend {
    pub fn new(uri: &url::Url) -> Result<Self, MediaError> {
        gst::init().map_err(|e| MediaError::Pipeline(e.to_string()))?;

        let pipeline = gst::Pipeline::new();

        let source = gst::ElementFactory::make("uridecodebin")
            .property("uri", uri.as_str())
            .build()
            .map_err(|e| MediaError::Pipeline(format!("failed to create uridecodebin: {}", e)))?;

        let videoconvert = gst::ElementFactory::make("videoconvert")
            .build()
            .map_err(|e| MediaError::Pipeline(format!("failed to create videoconvert: {}", e)))?;

        let caps = gst::Caps::builder("video/x-raw")
            .field("format", "RGBA")
            .build();
        let appsink = gst_app::AppSink::builder()
            .name("capture-sink")
            .caps(&caps)
            .max_buffers(1)
            .drop(true)
            .sync(true)
            .build();

        pipeline
            .add_many([&source, &videoconvert, appsink.upcast_ref()])
            .map_err(|e| MediaError::Pipeline(format!("failed to add elements: {}", e)))?;

        videoconvert
            .link(appsink.upcast_ref::<gst::Element>())
            .map_err(|e| {
                MediaError::Pipeline(format!("failed to link videoconvert to appsink: {}", e))
            })?;

        // uridecodebin exposes pads late; link video pads as they appear and
        // ignore audio and subtitle streams.
        let videoconvert_weak = videoconvert.downgrade();
        source.connect_pad_added(move |_source, src_pad| {
            let Some(videoconvert) = videoconvert_weak.upgrade() else {
                return;
            };
            let caps = src_pad
                .current_caps()
                .or_else(|| Some(src_pad.query_caps(None)));
            if let Some(caps) = caps {
                if let Some(structure) = caps.structure(0) {
                    let name = structure.name().as_str();
                    if name.starts_with("video/") {
                        let sink_pad = videoconvert
                            .static_pad("sink")
                            .expect("videoconvert has a static sink pad");
                        if !sink_pad.is_linked() {
                            if let Err(e) = src_pad.link(&sink_pad) {
                                log::warn!("failed to link video pad: {:?}", e);
                            }
                        }
                    } else {
                        log::debug!("ignoring non-video pad with caps '{}'", name);
                    }
                }
            }
        });

        // Preroll paused; readiness arrives on the bus as ASYNC_DONE.
        pipeline
            .set_state(gst::State::Paused)
            .map_err(|e| MediaError::Pipeline(format!("failed to preroll pipeline: {:?}", e)))?;

        log::info!("pipeline created for {}", uri);

        Ok(GstBackend {
            pipeline,
            appsink,
            paused: true,
            prerolled: false,
            cached_frame: None,
        })
    }

    fn negotiated_dimensions(&self) -> (u32, u32) {
        let Some(pad) = self.appsink.static_pad("sink") else {
            return (0, 0);
        };
        let Some(caps) = pad.current_caps() else {
            return (0, 0);
        };
        let Some(structure) = caps.structure(0) else {
            return (0, 0);
        };
        let width = structure.get::<i32>("width").unwrap_or(0);
        let height = structure.get::<i32>("height").unwrap_or(0);
        (width.max(0) as u32, height.max(0) as u32)
    }

    fn sample_to_frame(sample: &gst::Sample) -> Option<RawFrame> {
        let caps = sample.caps()?;
        let structure = caps.structure(0)?;
        let width = structure.get::<i32>("width").ok()?;
        let height = structure.get::<i32>("height").ok()?;
        if width <= 0 || height <= 0 {
            return None;
        }
        let buffer = sample.buffer()?;
        let map = buffer.map_readable().ok()?;
        let expected = width as usize * height as usize * 4;
        if map.len() < expected {
            log::warn!("sample buffer too short: {} < {}", map.len(), expected);
            return None;
        }
        Some(RawFrame {
            width: width as u32,
            height: height as u32,
            rgba: map.as_slice()[..expected].to_vec(),
        })
    }
}

impl MediaBackend for GstBackend {
    fn seek(&mut self, target: Duration) -> Result<(), MediaError> {
        // A flush discards the appsink's current sample; the cached frame
        // is stale the moment the seek is queued.
        self.cached_frame = None;
        let position = gst::ClockTime::from_nseconds(target.as_nanos() as u64);
        self.pipeline
            .seek_simple(gst::SeekFlags::FLUSH | gst::SeekFlags::ACCURATE, position)
            .map_err(|e| MediaError::Pipeline(format!("seek failed: {}", e)))
    }

    fn set_paused(&mut self, paused: bool) {
        if paused == self.paused {
            return;
        }
        let state = if paused {
            gst::State::Paused
        } else {
            gst::State::Playing
        };
        if let Err(e) = self.pipeline.set_state(state) {
            log::warn!("state change to {:?} failed: {:?}", state, e);
            return;
        }
        self.paused = paused;
    }

    fn paused(&self) -> bool {
        self.paused
    }

    fn position(&self) -> Option<f64> {
        self.pipeline
            .query_position::<gst::ClockTime>()
            .map(|position| position.nseconds() as f64 / 1_000_000_000.0)
    }

    fn duration(&self) -> Option<f64> {
        self.pipeline
            .query_duration::<gst::ClockTime>()
            .map(|duration| duration.nseconds() as f64 / 1_000_000_000.0)
    }

    fn dimensions(&self) -> (u32, u32) {
        self.negotiated_dimensions()
    }

    fn snapshot(&mut self) -> Option<RawFrame> {
        let sample = if self.paused {
            self.appsink.try_pull_preroll(gst::ClockTime::ZERO)
        } else {
            self.appsink.try_pull_sample(gst::ClockTime::ZERO)
        };

        if let Some(sample) = sample {
            if let Some(frame) = Self::sample_to_frame(&sample) {
                self.cached_frame = Some(frame);
            }
        }

        self.cached_frame.clone()
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        let mut events = Vec::new();
        let Some(bus) = self.pipeline.bus() else {
            return events;
        };

        while let Some(msg) = bus.timed_pop(gst::ClockTime::ZERO) {
            use gst::MessageView;

            match msg.view() {
                MessageView::AsyncDone(_) => {
                    if !self.prerolled {
                        self.prerolled = true;
                        let duration = self.duration().unwrap_or(0.0);
                        log::info!("preroll complete, duration={:.3}s", duration);
                        events.push(MediaEvent::MetadataReady { duration });
                    } else {
                        log::debug!("ASYNC_DONE: seek settled");
                        events.push(MediaEvent::SeekDone);
                    }
                }
                MessageView::DurationChanged(_) => {
                    if self.prerolled {
                        if let Some(duration) = self.duration() {
                            log::debug!("duration changed: {:.3}s", duration);
                            events.push(MediaEvent::DurationChanged { duration });
                        }
                    }
                }
                MessageView::Error(err) => {
                    log::error!(
                        "pipeline error: {} (debug: {:?})",
                        err.error(),
                        err.debug()
                    );
                    events.push(MediaEvent::Error(err.error().to_string()));
                }
                MessageView::Warning(warn) => {
                    log::warn!(
                        "pipeline warning: {} (debug: {:?})",
                        warn.error(),
                        warn.debug()
                    );
                }
                MessageView::Eos(_) => {
                    log::debug!("end of stream");
                    events.push(MediaEvent::EndOfStream);
                }
                _ => {}
            }
        }

        events
    }
}

impl Drop for GstBackend {
    fn drop(&mut self) {
        self.pipeline.set_state(gst::State::Null).ok();
    }
}
