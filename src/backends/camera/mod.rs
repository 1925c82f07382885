// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │     PhotoBooth      │
//! └──────────┬──────────┘
//!            │ start_stream()
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackend Trait │  ← Common interface
//! └──────────┬──────────┘
//!            │
//!    ┌───────┼────────────┐
//!    ▼       ▼            ▼
//!  V4L2  TestPattern  StillImage
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │      LiveFeed       │  ← latest frame via tokio::sync::watch
//! └─────────────────────┘
//! ```

pub mod feed;
pub mod format_converters;
pub mod still_image;
pub mod test_pattern;
pub mod types;
pub mod v4l2;

pub use feed::{FrameReceiver, FrameSender, LiveFeed, frame_channel};
pub use still_image::StillImageBackend;
pub use test_pattern::TestPatternBackend;
pub use types::*;
pub use v4l2::V4l2Backend;

use std::path::Path;

/// Camera backend trait
///
/// Backends only acquire a stream; everything after the first frame is the
/// feed's job.
pub trait CameraBackend: Send + Sync {
    /// Enumerate available cameras on this backend
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Get supported formats for a specific camera device, largest first
    fn get_formats(&self, device: &CameraDevice) -> Vec<CameraFormat>;

    /// Acquire the camera and start delivering frames
    ///
    /// Blocking: opening a V4L2 node and negotiating a format can take a while,
    /// so async callers should go through `spawn_blocking`.
    ///
    /// # Errors
    /// * `BackendError::PermissionDenied` - the OS refused access
    /// * `BackendError::DeviceNotFound` / `NotAvailable` - nothing to open
    fn start_stream(&self, request: &StreamRequest) -> BackendResult<LiveFeed>;

    /// Get the backend type identifier
    fn backend_type(&self) -> CameraBackendType;

    /// Check if this backend is available on the current system
    fn is_available(&self) -> bool;
}

/// Get a concrete backend instance
///
/// `still_image` is only consulted by the still image backend.
pub fn get_backend(kind: CameraBackendType, still_image: Option<&Path>) -> Box<dyn CameraBackend> {
    match kind {
        CameraBackendType::V4l2 => Box::new(V4l2Backend::new()),
        CameraBackendType::TestPattern => Box::new(TestPatternBackend::default()),
        CameraBackendType::StillImage => {
            Box::new(StillImageBackend::new(still_image.map(Path::to_path_buf)))
        }
    }
}

/// Get the default backend
pub fn get_default_backend() -> CameraBackendType {
    CameraBackendType::default()
}
