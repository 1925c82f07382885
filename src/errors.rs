// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the photo booth

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for the photo pipeline
pub type PhotoResult<T> = Result<T, PhotoError>;

/// Top-level application error
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera acquisition errors
    Camera(CameraError),
    /// Photo rendering/encoding errors
    Photo(PhotoError),
    /// Configuration errors
    Config(String),
    /// Filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Why the camera could not be acquired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// The OS refused access to the device (EACCES/EPERM)
    PermissionDenied,
    /// No usable device, or it vanished or refused our formats
    DeviceUnavailable,
}

/// Camera acquisition error
///
/// There is a single kind: the camera could not be acquired. The reason only
/// matters for diagnostics.
#[derive(Debug, Clone)]
pub enum CameraError {
    AccessDenied {
        reason: DenialReason,
        detail: String,
    },
}

impl CameraError {
    pub fn permission_denied(detail: impl Into<String>) -> Self {
        CameraError::AccessDenied {
            reason: DenialReason::PermissionDenied,
            detail: detail.into(),
        }
    }

    pub fn unavailable(detail: impl Into<String>) -> Self {
        CameraError::AccessDenied {
            reason: DenialReason::DeviceUnavailable,
            detail: detail.into(),
        }
    }

    pub fn reason(&self) -> DenialReason {
        match self {
            CameraError::AccessDenied { reason, .. } => *reason,
        }
    }
}

/// Photo pipeline errors
#[derive(Debug, Clone)]
pub enum PhotoError {
    /// The capture region or target surface is empty
    NoSurface,
    /// Frame buffer does not match its declared dimensions
    InvalidFrame(String),
    /// Overlay asset could not be loaded or decoded
    Overlay(String),
    /// Compositing failed
    Compose(String),
    /// PNG or data URI encoding failed
    EncodingFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Photo(e) => write!(f, "Photo error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::PermissionDenied => write!(f, "permission denied"),
            DenialReason::DeviceUnavailable => write!(f, "device unavailable"),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::AccessDenied { reason, detail } => {
                write!(f, "Camera access denied ({}): {}", reason, detail)
            }
        }
    }
}

impl fmt::Display for PhotoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoError::NoSurface => write!(f, "No drawing surface available"),
            PhotoError::InvalidFrame(msg) => write!(f, "Invalid frame: {}", msg),
            PhotoError::Overlay(msg) => write!(f, "Overlay failed: {}", msg),
            PhotoError::Compose(msg) => write!(f, "Compositing failed: {}", msg),
            PhotoError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for PhotoError {}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<PhotoError> for AppError {
    fn from(err: PhotoError) -> Self {
        AppError::Photo(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<image::ImageError> for PhotoError {
    fn from(err: image::ImageError) -> Self {
        PhotoError::EncodingFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_error_reason() {
        let err = CameraError::permission_denied("/dev/video0");
        assert_eq!(err.reason(), DenialReason::PermissionDenied);
        assert!(err.to_string().contains("permission denied"));

        let err = CameraError::unavailable("no devices");
        assert_eq!(err.reason(), DenialReason::DeviceUnavailable);
    }

    #[test]
    fn test_app_error_wraps_camera_error() {
        let err: AppError = CameraError::unavailable("gone").into();
        assert!(err.to_string().starts_with("Camera error:"));
    }
}
