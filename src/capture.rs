//! Still-frame capture from the media element.
//!
//! A capture is a read-only pixel grab: it never touches playback state.
//! Frames with zero decoded dimensions mean "not decoded yet" and are
//! reported as `None` so the caller can retry, never published as blanks.

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};

use crate::media::MediaBackend;

/// A self-contained still image: PNG bytes plus the source dimensions.
#[derive(Debug, Clone)]
pub struct FrameImage {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl FrameImage {
    pub fn handle(&self) -> iced::widget::image::Handle {
        iced::widget::image::Handle::from_bytes(self.png.clone())
    }
}

/// Grab the element's current visual content as an encoded still.
///
/// Returns `None` whenever the decode surface is not presentable: no frame
/// pulled, stale zero dimensions right after a seek, or a short pixel
/// buffer. The caller owns the retry policy.
pub fn capture(backend: &mut dyn MediaBackend) -> Option<FrameImage> {
    let (width, height) = backend.dimensions();
    if width == 0 || height == 0 {
        log::trace!("capture skipped: no decoded dimensions yet");
        return None;
    }

    let frame = backend.snapshot()?;
    if frame.width == 0 || frame.height == 0 {
        log::trace!("capture skipped: zero-dimension frame");
        return None;
    }

    let expected = frame.width as usize * frame.height as usize * 4;
    if frame.rgba.len() < expected {
        log::warn!(
            "capture dropped: short pixel buffer ({} < {})",
            frame.rgba.len(),
            expected
        );
        return None;
    }

    let mut rgba = frame.rgba;
    rgba.truncate(expected);
    let img = RgbaImage::from_raw(frame.width, frame.height, rgba)?;

    let mut png = Vec::new();
    if let Err(e) = img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png) {
        log::warn!("PNG encode failed: {}", e);
        return None;
    }

    log::debug!("captured frame: {}x{}, {} bytes", frame.width, frame.height, png.len());
    Some(FrameImage {
        width: frame.width,
        height: frame.height,
        png,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MediaEvent, RawFrame};
    use crate::player::tests::FakeBackend;

    fn solid_frame(width: u32, height: u32) -> RawFrame {
        RawFrame {
            width,
            height,
            rgba: vec![0x7f; (width * height * 4) as usize],
        }
    }

    #[test]
    fn zero_dimensions_yield_none() {
        let (mut backend, handle) = FakeBackend::new();
        handle.set_frame((0, 0), Some(solid_frame(0, 0)));
        assert!(capture(&mut backend).is_none());
    }

    #[test]
    fn missing_frame_yields_none() {
        let (mut backend, handle) = FakeBackend::new();
        handle.set_frame((64, 48), None);
        assert!(capture(&mut backend).is_none());
    }

    #[test]
    fn short_buffer_is_dropped() {
        let (mut backend, handle) = FakeBackend::new();
        handle.set_frame(
            (64, 48),
            Some(RawFrame {
                width: 64,
                height: 48,
                rgba: vec![0; 16],
            }),
        );
        assert!(capture(&mut backend).is_none());
    }

    #[test]
    fn valid_frame_encodes_to_png() {
        let (mut backend, handle) = FakeBackend::new();
        handle.set_frame((64, 48), Some(solid_frame(64, 48)));
        let image = capture(&mut backend).expect("capture should succeed");
        assert_eq!(image.width, 64);
        assert_eq!(image.height, 48);
        // PNG magic header.
        assert_eq!(&image.png[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn capture_does_not_mutate_playback_state() {
        let (mut backend, handle) = FakeBackend::new();
        handle.set_frame((64, 48), Some(solid_frame(64, 48)));
        handle.push(MediaEvent::MetadataReady { duration: 10.0 });
        let paused_before = backend.paused();
        let _ = capture(&mut backend);
        assert_eq!(backend.paused(), paused_before);
        // The queued event is still there: capture did not pump the bus.
        assert_eq!(backend.poll_events().len(), 1);
    }
}
