// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic camera source
//!
//! SMPTE-style colour bars with a moving marker, so the whole booth can run on
//! machines without a webcam (and in tests). The first frame is published
//! before `start_stream` returns.

use super::CameraBackend;
use super::feed::{FrameSender, LiveFeed, frame_channel};
use super::types::*;
use crate::constants::camera as camera_consts;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

const BARS: [[u8; 4]; 7] = [
    [192, 192, 192, 255],
    [192, 192, 0, 255],
    [0, 192, 192, 255],
    [0, 192, 0, 255],
    [192, 0, 192, 255],
    [192, 0, 0, 255],
    [0, 0, 192, 255],
];

const DEVICE_PATH: &str = "test-pattern";

/// Colour bar generator
#[derive(Debug, Clone)]
pub struct TestPatternBackend {
    width: u32,
    height: u32,
    animated: bool,
}

impl Default for TestPatternBackend {
    fn default() -> Self {
        let (width, height) = camera_consts::TEST_PATTERN_SIZE;
        Self::new(width, height)
    }
}

impl TestPatternBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            animated: true,
        }
    }

    /// Publish a single frame and never update it
    pub fn frozen(mut self) -> Self {
        self.animated = false;
        self
    }

    fn device() -> CameraDevice {
        CameraDevice {
            name: "Test Pattern".to_string(),
            path: DEVICE_PATH.to_string(),
            device_info: Some(DeviceInfo {
                card: "Colour bars".to_string(),
                driver: "photobooth".to_string(),
                bus_info: "virtual".to_string(),
            }),
        }
    }

    fn format_for(&self, constraints: VideoConstraints) -> CameraFormat {
        let (width, height) = match constraints {
            VideoConstraints::Resolution { width, height } => (width, height),
            VideoConstraints::Enabled => (self.width, self.height),
        };
        CameraFormat {
            width,
            height,
            framerate: Some(Framerate::new(30, 1)),
            pixel_format: "RGBA".to_string(),
        }
    }
}

/// Render one frame of colour bars; `tick` moves the marker column
pub fn render_bars(width: u32, height: u32, tick: u32) -> CameraFrame {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    let bar_width = (width / BARS.len() as u32).max(1);
    let marker_x = if width > 0 { tick % width } else { 0 };
    let lower_band = height * 3 / 4;

    for y in 0..height {
        for x in 0..width {
            let px = if x == marker_x {
                [255, 255, 255, 255]
            } else if y >= lower_band {
                // Luma ramp along the bottom
                let v = ((x * 255) / width.max(1)) as u8;
                [v, v, v, 255]
            } else {
                BARS[((x / bar_width) as usize).min(BARS.len() - 1)]
            };
            data.extend_from_slice(&px);
        }
    }

    let mut frame = CameraFrame::from_rgba(width, height, data);
    frame.sequence = tick;
    frame
}

fn pattern_loop(
    width: u32,
    height: u32,
    sender: FrameSender,
    running: Arc<AtomicBool>,
) {
    let mut tick = 1u32;
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(camera_consts::TEST_PATTERN_FRAME_INTERVAL);
        if sender
            .send(Some(Arc::new(render_bars(width, height, tick))))
            .is_err()
        {
            break;
        }
        tick = tick.wrapping_add(1);
    }
    debug!("Test pattern loop ended");
}

impl CameraBackend for TestPatternBackend {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        vec![Self::device()]
    }

    fn get_formats(&self, _device: &CameraDevice) -> Vec<CameraFormat> {
        vec![self.format_for(VideoConstraints::Enabled)]
    }

    fn start_stream(&self, request: &StreamRequest) -> BackendResult<LiveFeed> {
        if let Some(path) = &request.device
            && path != DEVICE_PATH
        {
            return Err(BackendError::DeviceNotFound(path.clone()));
        }

        let format = self.format_for(request.constraints);
        if format.width == 0 || format.height == 0 {
            return Err(BackendError::FormatNotSupported(format.to_string()));
        }
        info!(format = %format, animated = self.animated, "Starting test pattern");

        let first = render_bars(format.width, format.height, 0);
        if !self.animated {
            return Ok(LiveFeed::still(Self::device(), first));
        }

        let (sender, receiver) = frame_channel();
        sender.send_replace(Some(Arc::new(first)));

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = Arc::clone(&running);
        let (width, height) = (format.width, format.height);
        let handle = std::thread::Builder::new()
            .name("test-pattern".to_string())
            .spawn(move || pattern_loop(width, height, sender, running_clone))
            .map_err(|e| BackendError::IoError(format!("failed to spawn pattern thread: {}", e)))?;

        Ok(LiveFeed::with_thread(
            Self::device(),
            format,
            receiver,
            running,
            handle,
        ))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::TestPattern
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_frame_is_ready_immediately() {
        let backend = TestPatternBackend::new(64, 48);
        let mut feed = backend.start_stream(&StreamRequest::default()).unwrap();
        let frame = feed.current_frame().expect("first frame");
        assert_eq!((frame.width, frame.height), (64, 48));
        feed.stop();
    }

    #[test]
    fn test_resolution_constraint_is_honoured() {
        let backend = TestPatternBackend::default().frozen();
        let request = StreamRequest {
            device: None,
            constraints: VideoConstraints::Resolution {
                width: 32,
                height: 16,
            },
        };
        let feed = backend.start_stream(&request).unwrap();
        assert_eq!(feed.native_size(), (32, 16));
    }

    #[test]
    fn test_unknown_device_is_rejected() {
        let backend = TestPatternBackend::default();
        let request = StreamRequest {
            device: Some("/dev/video7".into()),
            ..Default::default()
        };
        assert!(matches!(
            backend.start_stream(&request),
            Err(BackendError::DeviceNotFound(_))
        ));
    }

    #[test]
    fn test_bars_layout() {
        let frame = render_bars(70, 40, 69);
        // Leftmost bar is grey, rightmost is blue
        assert_eq!(frame.pixel(1, 0), BARS[0]);
        assert_eq!(frame.pixel(65, 0), BARS[6]);
        // Marker column
        assert_eq!(frame.pixel(69, 5), [255, 255, 255, 255]);
    }
}
