// SPDX-License-Identifier: GPL-3.0-only

//! Photobooth - an instant photo booth for webcams
//!
//! Captures a still from a live camera feed, composites it onto a print
//! surface with a frame overlay and a date stamp, encodes it as a PNG data
//! URI and keeps a newest-first gallery for the session.
//!
//! # Architecture
//!
//! - [`backends`]: Camera backends (V4L2, test pattern, still image) and live feeds
//! - [`pipelines`]: Region crop, compositing and PNG encoding
//! - [`booth`]: Session controller, gallery and develop timers
//! - [`config`]: User configuration handling
//! - [`terminal`]: Terminal front-end
//!
//! # Example
//!
//! ```ignore
//! let booth = PhotoBooth::new(CaptureProfile::default());
//! booth.mount(get_backend(CameraBackendType::V4l2, None), StreamRequest::default()).await;
//! let id = booth.capture().await;
//! ```

pub mod backends;
pub mod booth;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod terminal;

// Re-export commonly used types
pub use booth::{CaptureProfile, PhotoBooth, ProfileKind, Shot, ShotId, ShotStatus};
pub use config::Config;
pub use errors::{AppError, AppResult, CameraError, DenialReason, PhotoError};
