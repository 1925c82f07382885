// SPDX-License-Identifier: GPL-3.0-only

//! Capture region selection
//!
//! Decides which rectangle of the live frame ends up on the print.

use crate::backends::camera::types::CameraFrame;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Region of the source frame copied onto the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureRegion {
    /// The whole frame, aspect ratio left to the destination rect
    FullFrame,
    /// Largest centred square (side = shorter native dimension)
    #[default]
    CenterSquare,
    /// Fixed pixel crop, clamped to the frame
    Fixed(Rect),
}

impl CaptureRegion {
    /// Resolve against a source of `width` x `height`
    ///
    /// Returns `None` when nothing of the region is left inside the frame.
    pub fn resolve(&self, width: u32, height: u32) -> Option<Rect> {
        let rect = match *self {
            CaptureRegion::FullFrame => Rect::new(0, 0, width, height),
            CaptureRegion::CenterSquare => {
                let side = width.min(height);
                Rect::new((width - side) / 2, (height - side) / 2, side, side)
            }
            CaptureRegion::Fixed(r) => {
                if r.x >= width || r.y >= height {
                    return None;
                }
                Rect::new(
                    r.x,
                    r.y,
                    r.width.min(width - r.x),
                    r.height.min(height - r.y),
                )
            }
        };

        (!rect.is_empty()).then_some(rect)
    }

    /// Copy this region out of a frame
    pub fn extract(&self, frame: &CameraFrame) -> Option<RgbaImage> {
        let rect = self.resolve(frame.width, frame.height)?;
        debug!(
            frame = format!("{}x{}", frame.width, frame.height),
            region = ?rect,
            "Extracting capture region"
        );
        frame.crop_to_image(rect.x, rect.y, rect.width, rect.height)
    }
}
