// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera backends

use crate::errors::CameraError;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Camera backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CameraBackendType {
    /// Video4Linux2 capture device
    #[default]
    V4l2,
    /// Synthetic colour bars, no hardware needed
    TestPattern,
    /// A still image file served as a frozen feed
    StillImage,
}

impl CameraBackendType {
    pub const ALL: [CameraBackendType; 3] = [
        CameraBackendType::V4l2,
        CameraBackendType::TestPattern,
        CameraBackendType::StillImage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CameraBackendType::V4l2 => "v4l2",
            CameraBackendType::TestPattern => "test-pattern",
            CameraBackendType::StillImage => "still-image",
        }
    }
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CameraBackendType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown backend '{}' (expected one of: v4l2, test-pattern, still-image)",
                    s
                )
            })
    }
}

/// Device information from V4L2 capability query
#[derive(Debug, Clone, Default)]
pub struct DeviceInfo {
    /// Name of the device (V4L2 card)
    pub card: String,
    /// Driver name (V4L2 driver)
    pub driver: String,
    /// Bus the device hangs off (e.g. usb-0000:00:14.0-1)
    pub bus_info: String,
}

/// Represents a camera device
#[derive(Debug, Clone)]
pub struct CameraDevice {
    pub name: String,
    /// Device node or source identifier (e.g. /dev/video0, test-pattern)
    pub path: String,
    pub device_info: Option<DeviceInfo>,
}

/// Framerate as a fraction (numerator/denominator)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Framerate {
    pub num: u32,
    pub denom: u32,
}

impl Framerate {
    pub fn new(num: u32, denom: u32) -> Self {
        Self {
            num,
            denom: if denom == 0 { 1 } else { denom },
        }
    }

    /// Build from a V4L2 frame interval (seconds per frame)
    pub fn from_interval(numerator: u32, denominator: u32) -> Self {
        Self::new(denominator, numerator)
    }

    /// Get the rounded-down integer framerate
    pub fn as_int(&self) -> u32 {
        self.num / self.denom
    }
}

impl std::fmt::Display for Framerate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.denom != 1 {
            write!(f, "{:.2}", self.num as f64 / self.denom as f64)
        } else {
            write!(f, "{}", self.num)
        }
    }
}

/// Camera format specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFormat {
    pub width: u32,
    pub height: u32,
    pub framerate: Option<Framerate>,
    /// FourCC code (e.g., "MJPG", "YUYV")
    pub pixel_format: String,
}

impl std::fmt::Display for CameraFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(fps) = &self.framerate {
            write!(
                f,
                "{}x{} @ {}fps ({})",
                self.width, self.height, fps, self.pixel_format
            )
        } else {
            write!(f, "{}x{} ({})", self.width, self.height, self.pixel_format)
        }
    }
}

/// What to ask of the camera when acquiring a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoConstraints {
    /// Any video the device produces by default
    #[default]
    Enabled,
    /// Prefer this resolution; the device may pick the nearest it supports
    Resolution { width: u32, height: u32 },
}

/// A request to start a live feed
#[derive(Debug, Clone, Default)]
pub struct StreamRequest {
    /// Specific device path; `None` picks the first usable device
    pub device: Option<String>,
    pub constraints: VideoConstraints,
}

/// A single frame from the camera
///
/// Backends convert to tightly packed or strided RGBA before publishing, so
/// consumers never deal with YUV or compressed payloads.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// RGBA pixels, `stride` bytes per row
    pub data: Arc<[u8]>,
    /// Row stride in bytes (>= width * 4)
    pub stride: u32,
    /// Driver sequence number, if the source reports one
    pub sequence: u32,
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Wrap packed RGBA pixels
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            stride: width * 4,
            sequence: 0,
            captured_at: Instant::now(),
        }
    }

    /// Whether the buffer holds every row the dimensions promise
    pub fn is_complete(&self) -> bool {
        if self.width == 0 || self.height == 0 || self.stride < self.width * 4 {
            return false;
        }
        let needed = (self.stride as usize) * (self.height as usize - 1)
            + (self.width as usize) * 4;
        self.data.len() >= needed
    }

    /// RGBA of the pixel at (x, y), clamped to the frame
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let x = x.min(self.width.saturating_sub(1));
        let y = y.min(self.height.saturating_sub(1));
        let idx = (y * self.stride + x * 4) as usize;
        match self.data.get(idx..idx + 4) {
            Some(px) => [px[0], px[1], px[2], px[3]],
            None => [0, 0, 0, 255],
        }
    }

    /// Copy a sub-rectangle into an owned image, dropping row padding
    pub fn crop_to_image(&self, x: u32, y: u32, width: u32, height: u32) -> Option<RgbaImage> {
        if !self.is_complete()
            || width == 0
            || height == 0
            || x.checked_add(width)? > self.width
            || y.checked_add(height)? > self.height
        {
            return None;
        }

        let row_bytes = (width * 4) as usize;
        let mut out = Vec::with_capacity(row_bytes * height as usize);
        for row in y..y + height {
            let start = (row * self.stride + x * 4) as usize;
            out.extend_from_slice(&self.data[start..start + row_bytes]);
        }
        RgbaImage::from_raw(width, height, out)
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone)]
pub enum BackendError {
    /// Backend is not available on this system
    NotAvailable(String),
    /// The OS denied access to the device
    PermissionDenied(String),
    /// Camera device not found
    DeviceNotFound(String),
    /// None of the device's formats can be converted
    FormatNotSupported(String),
    /// General I/O error
    IoError(String),
    /// Other errors
    Other(String),
}

impl BackendError {
    /// Classify an I/O error from opening or configuring a device
    pub fn from_io(path: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                BackendError::PermissionDenied(format!("{}: {}", path, err))
            }
            std::io::ErrorKind::NotFound => {
                BackendError::DeviceNotFound(format!("{}: {}", path, err))
            }
            _ => BackendError::IoError(format!("{}: {}", path, err)),
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

// Every acquisition failure collapses into the single camera error kind
impl From<BackendError> for CameraError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::PermissionDenied(msg) => CameraError::permission_denied(msg),
            other => CameraError::unavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DenialReason;

    #[test]
    fn test_crop_skips_row_padding() {
        // 2x2 frame with 4 bytes of padding per row
        let data = vec![
            1, 1, 1, 255, 2, 2, 2, 255, 0, 0, 0, 0, //
            3, 3, 3, 255, 4, 4, 4, 255, 0, 0, 0, 0,
        ];
        let frame = CameraFrame {
            width: 2,
            height: 2,
            data: Arc::from(data.into_boxed_slice()),
            stride: 12,
            sequence: 0,
            captured_at: Instant::now(),
        };

        let img = frame.crop_to_image(1, 0, 1, 2).unwrap();
        assert_eq!(img.dimensions(), (1, 2));
        assert_eq!(img.get_pixel(0, 0).0, [2, 2, 2, 255]);
        assert_eq!(img.get_pixel(0, 1).0, [4, 4, 4, 255]);
    }

    #[test]
    fn test_crop_out_of_bounds() {
        let frame = CameraFrame::from_rgba(4, 4, vec![0; 64]);
        assert!(frame.crop_to_image(2, 2, 3, 1).is_none());
        assert!(frame.crop_to_image(0, 0, 0, 1).is_none());
    }

    #[test]
    fn test_truncated_frame_is_incomplete() {
        let frame = CameraFrame::from_rgba(4, 4, vec![0; 60]);
        assert!(!frame.is_complete());
    }

    #[test]
    fn test_backend_error_maps_to_access_denied() {
        let err: CameraError = BackendError::PermissionDenied("/dev/video0".into()).into();
        assert_eq!(err.reason(), DenialReason::PermissionDenied);

        let err: CameraError = BackendError::DeviceNotFound("/dev/video9".into()).into();
        assert_eq!(err.reason(), DenialReason::DeviceUnavailable);
    }

    #[test]
    fn test_backend_type_parse() {
        assert_eq!(
            "test-pattern".parse::<CameraBackendType>().unwrap(),
            CameraBackendType::TestPattern
        );
        assert!("pipewire".parse::<CameraBackendType>().is_err());
    }

    #[test]
    fn test_framerate_from_interval() {
        // V4L2 reports 1/30 s per frame
        let fps = Framerate::from_interval(1, 30);
        assert_eq!(fps.as_int(), 30);
        assert_eq!(fps.to_string(), "30");
    }
}
