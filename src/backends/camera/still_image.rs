// SPDX-License-Identifier: GPL-3.0-only

//! Still image source
//!
//! Serves a picture from disk as a frozen camera feed.

use super::CameraBackend;
use super::feed::LiveFeed;
use super::types::*;
use std::path::{Path, PathBuf};
use tracing::info;

/// Backend that "films" a single image file
#[derive(Debug, Clone)]
pub struct StillImageBackend {
    path: Option<PathBuf>,
}

impl StillImageBackend {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    fn device_for(path: &Path) -> CameraDevice {
        CameraDevice {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "Still image".to_string()),
            path: path.display().to_string(),
            device_info: None,
        }
    }
}

/// Load an image file and convert it to a CameraFrame
pub fn load_image_as_frame(path: &Path) -> BackendResult<CameraFrame> {
    info!(path = %path.display(), "Loading still image");

    let img = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(io) => BackendError::from_io(&path.display().to_string(), io),
        other => BackendError::FormatNotSupported(format!("{}: {}", path.display(), other)),
    })?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(CameraFrame::from_rgba(width, height, rgba.into_raw()))
}

impl CameraBackend for StillImageBackend {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        self.path
            .iter()
            .filter(|p| p.is_file())
            .map(|p| Self::device_for(p))
            .collect()
    }

    fn get_formats(&self, device: &CameraDevice) -> Vec<CameraFormat> {
        image::image_dimensions(&device.path)
            .map(|(width, height)| {
                vec![CameraFormat {
                    width,
                    height,
                    framerate: None,
                    pixel_format: "RGBA".to_string(),
                }]
            })
            .unwrap_or_default()
    }

    fn start_stream(&self, request: &StreamRequest) -> BackendResult<LiveFeed> {
        // An explicit device path wins over the configured image
        let path = request
            .device
            .as_deref()
            .map(PathBuf::from)
            .or_else(|| self.path.clone())
            .ok_or_else(|| BackendError::NotAvailable("no still image configured".to_string()))?;

        let frame = load_image_as_frame(&path)?;
        Ok(LiveFeed::still(Self::device_for(&path), frame))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::StillImage
    }

    fn is_available(&self) -> bool {
        self.path.as_deref().is_some_and(Path::is_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serves_image_file() {
        let path = std::env::temp_dir().join(format!("booth-still-{}.png", std::process::id()));
        image::RgbaImage::from_pixel(12, 8, image::Rgba([9, 8, 7, 255]))
            .save(&path)
            .unwrap();

        let backend = StillImageBackend::new(Some(path.clone()));
        assert!(backend.is_available());
        let feed = backend.start_stream(&StreamRequest::default()).unwrap();
        let frame = feed.current_frame().unwrap();
        assert_eq!((frame.width, frame.height), (12, 8));
        assert_eq!(frame.pixel(3, 3), [9, 8, 7, 255]);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let backend = StillImageBackend::new(Some("/nonexistent/booth.png".into()));
        assert!(!backend.is_available());
        assert!(matches!(
            backend.start_stream(&StreamRequest::default()),
            Err(BackendError::DeviceNotFound(_))
        ));
    }

    #[test]
    fn test_unconfigured() {
        let backend = StillImageBackend::new(None);
        assert!(backend.enumerate_cameras().is_empty());
        assert!(matches!(
            backend.start_stream(&StreamRequest::default()),
            Err(BackendError::NotAvailable(_))
        ));
    }
}
