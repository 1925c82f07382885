// SPDX-License-Identifier: GPL-3.0-only

//! Direct V4L2 webcam capture
//!
//! Opens a `/dev/video*` node with the `v4l` crate, negotiates a format we can
//! convert (YUYV, MJPEG or RGB24), and runs a capture thread over an mmap
//! stream. Every buffer is converted to RGBA and published to the feed's
//! latest-frame channel.

use super::CameraBackend;
use super::feed::{FrameSender, LiveFeed, frame_channel};
use super::format_converters::SourceFormat;
use super::types::*;
use crate::constants::camera as camera_consts;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use v4l::buffer::Type;
use v4l::capability::Flags;
use v4l::framesize::FrameSizeEnum;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{FourCC, Format};

/// V4L2 camera backend
#[derive(Debug, Default)]
pub struct V4l2Backend;

impl V4l2Backend {
    pub fn new() -> Self {
        Self
    }
}

impl CameraBackend for V4l2Backend {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        let mut nodes = v4l::context::enum_devices();
        nodes.sort_by_key(|node| node.index());

        nodes
            .into_iter()
            .filter_map(|node| {
                let path = node.path().to_string_lossy().to_string();
                let dev = match Device::with_path(node.path()) {
                    Ok(dev) => dev,
                    Err(e) => {
                        debug!(path = %path, error = %e, "Skipping unreadable video node");
                        return None;
                    }
                };
                let caps = dev.query_caps().ok()?;
                // Metadata nodes share the same card name; only keep capture nodes
                if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
                    return None;
                }

                Some(CameraDevice {
                    name: node.name().unwrap_or_else(|| caps.card.clone()),
                    path,
                    device_info: Some(DeviceInfo {
                        card: caps.card,
                        driver: caps.driver,
                        bus_info: caps.bus,
                    }),
                })
            })
            .collect()
    }

    fn get_formats(&self, device: &CameraDevice) -> Vec<CameraFormat> {
        let Ok(dev) = Device::with_path(&device.path) else {
            return Vec::new();
        };
        let Ok(descriptions) = dev.enum_formats() else {
            return Vec::new();
        };

        let mut formats = Vec::new();
        for desc in descriptions {
            if SourceFormat::from_fourcc(&desc.fourcc.repr).is_none() {
                continue;
            }
            let pixel_format = desc.fourcc.str().unwrap_or("????").to_string();
            for size in dev.enum_framesizes(desc.fourcc).unwrap_or_default() {
                if let FrameSizeEnum::Discrete(discrete) = size.size {
                    let framerate = dev
                        .enum_frameintervals(desc.fourcc, discrete.width, discrete.height)
                        .ok()
                        .and_then(|intervals| {
                            intervals.into_iter().find_map(|i| match i.interval {
                                v4l::frameinterval::FrameIntervalEnum::Discrete(f) => {
                                    Some(Framerate::from_interval(f.numerator, f.denominator))
                                }
                                _ => None,
                            })
                        });
                    formats.push(CameraFormat {
                        width: discrete.width,
                        height: discrete.height,
                        framerate,
                        pixel_format: pixel_format.clone(),
                    });
                }
            }
        }

        formats.sort_by(|a, b| (b.width * b.height).cmp(&(a.width * a.height)));
        formats
    }

    fn start_stream(&self, request: &StreamRequest) -> BackendResult<LiveFeed> {
        let device = match &request.device {
            Some(path) => CameraDevice {
                name: path.clone(),
                path: path.clone(),
                device_info: None,
            },
            None => self.enumerate_cameras().into_iter().next().ok_or_else(|| {
                BackendError::DeviceNotFound("no V4L2 capture devices found".to_string())
            })?,
        };

        info!(device = %device.path, constraints = ?request.constraints, "Opening V4L2 device");

        // Opening here (not in the thread) surfaces EACCES to the caller
        let dev = Device::with_path(&device.path)
            .map_err(|e| BackendError::from_io(&device.path, e))?;
        let (source_format, negotiated) = negotiate_format(&dev, &device.path, request)?;

        let format = CameraFormat {
            width: negotiated.width,
            height: negotiated.height,
            framerate: None,
            pixel_format: negotiated.fourcc.str().unwrap_or("????").to_string(),
        };
        info!(device = %device.path, format = %format, "Negotiated capture format");

        let (sender, receiver) = frame_channel();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = Arc::clone(&running);
        let device_path = device.path.clone();
        let (width, height, stride) = (negotiated.width, negotiated.height, negotiated.stride);

        let thread_handle = std::thread::Builder::new()
            .name("v4l2-capture".to_string())
            .spawn(move || {
                if let Err(e) = capture_loop(
                    dev,
                    source_format,
                    width,
                    height,
                    stride,
                    sender,
                    running_clone,
                ) {
                    error!(device = %device_path, error = %e, "V4L2 capture loop failed");
                }
            })
            .map_err(|e| BackendError::IoError(format!("failed to spawn capture thread: {}", e)))?;

        Ok(LiveFeed::with_thread(
            device,
            format,
            receiver,
            running,
            thread_handle,
        ))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::V4l2
    }

    fn is_available(&self) -> bool {
        !v4l::context::enum_devices().is_empty()
    }
}

/// Pick a convertible pixel format and apply the requested size
fn negotiate_format(
    dev: &Device,
    path: &str,
    request: &StreamRequest,
) -> BackendResult<(SourceFormat, Format)> {
    let supported: Vec<FourCC> = dev
        .enum_formats()
        .map_err(|e| BackendError::from_io(path, e))?
        .into_iter()
        .map(|desc| desc.fourcc)
        .collect();

    let source_format = camera_consts::PREFERRED_FOURCCS
        .iter()
        .map(|code| FourCC::new(code))
        .find(|fourcc| supported.contains(fourcc))
        .and_then(|fourcc| SourceFormat::from_fourcc(&fourcc.repr))
        .ok_or_else(|| {
            BackendError::FormatNotSupported(format!(
                "{} offers none of YUYV, MJPG, RGB3 ({:?})",
                path, supported
            ))
        })?;

    let mut format = dev.format().map_err(|e| BackendError::from_io(path, e))?;
    format.fourcc = FourCC::new(source_format.fourcc());
    if let VideoConstraints::Resolution { width, height } = request.constraints {
        format.width = width;
        format.height = height;
    }

    let applied = dev
        .set_format(&format)
        .map_err(|e| BackendError::from_io(path, e))?;

    if applied.fourcc != format.fourcc {
        return Err(BackendError::FormatNotSupported(format!(
            "{} refused {:?}, got {:?}",
            path, format.fourcc, applied.fourcc
        )));
    }
    if (applied.width, applied.height) != (format.width, format.height) {
        // Drivers snap to the nearest supported size
        debug!(
            requested = format!("{}x{}", format.width, format.height),
            applied = format!("{}x{}", applied.width, applied.height),
            "Driver adjusted resolution"
        );
    }

    Ok((source_format, applied))
}

/// Main capture loop running in a separate thread
fn capture_loop(
    dev: Device,
    source_format: SourceFormat,
    width: u32,
    height: u32,
    stride: u32,
    frame_sender: FrameSender,
    running: Arc<AtomicBool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    static FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);

    let mut stream =
        MmapStream::with_buffers(&dev, Type::VideoCapture, camera_consts::V4L2_BUFFER_COUNT)
            .map_err(|e| format!("Failed to create buffer stream: {}", e))?;

    info!(width, height, stride, format = ?source_format, "V4L2 capture stream started");

    while running.load(Ordering::SeqCst) {
        let frame_start = Instant::now();

        let (buf, meta) = match stream.next() {
            Ok(next) => next,
            Err(e) => {
                warn!(error = %e, "Failed to dequeue frame");
                std::thread::sleep(std::time::Duration::from_millis(10));
                continue;
            }
        };

        let frame_num = FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);
        let used = (meta.bytesused as usize).min(buf.len());
        let payload = if used > 0 { &buf[..used] } else { buf };

        match source_format.to_rgba(payload, width, height, stride) {
            Ok(rgba) => {
                let mut frame = CameraFrame::from_rgba(width, height, rgba);
                frame.sequence = meta.sequence;
                frame.captured_at = frame_start;

                // Nobody listening means the feed was dropped
                if frame_sender.send(Some(Arc::new(frame))).is_err() {
                    debug!("Frame receiver gone, ending capture");
                    break;
                }

                if frame_num % camera_consts::FRAME_LOG_INTERVAL == 0 {
                    debug!(
                        frame = frame_num,
                        sequence = meta.sequence,
                        elapsed_us = frame_start.elapsed().as_micros(),
                        "Frame published"
                    );
                }
            }
            Err(e) => {
                if frame_num % camera_consts::FRAME_LOG_INTERVAL == 0 {
                    warn!(frame = frame_num, error = %e, "Dropping unconvertible frame");
                }
            }
        }
    }

    info!("V4L2 capture loop ended");
    Ok(())
}
