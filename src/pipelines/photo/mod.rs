// SPDX-License-Identifier: GPL-3.0-only

//! Async photo pipeline
//!
//! ```text
//! Live frame → Region crop → Composite (overlay + stamp) → PNG → data URI
//!      ↓
//! Preview continues uninterrupted
//! ```
//!
//! The overlay asset is loaded once, on the first render, and every render
//! waits for that load before compositing. CPU work runs on the blocking pool.

pub mod capture;
pub mod encoding;
pub mod overlay;
pub mod processing;

pub use capture::{CaptureRegion, Rect};
pub use encoding::{decode_data_uri, encode_data_uri};
pub use overlay::OverlaySource;

use crate::backends::camera::types::CameraFrame;
use crate::errors::{PhotoError, PhotoResult};
use image::RgbaImage;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Baseline anchor of the centred date stamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StampPosition {
    pub x: u32,
    pub y: u32,
}

/// Geometry of the print surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceLayout {
    /// Output photograph width in pixels
    pub width: u32,
    /// Output photograph height in pixels
    pub height: u32,
    /// Which part of the frame to capture
    pub region: CaptureRegion,
    /// Where the captured region is drawn on the surface
    pub video_rect: Rect,
    pub overlay: OverlaySource,
    /// Date stamp anchor, if the print is stamped
    pub stamp: Option<StampPosition>,
}

/// A finished print
#[derive(Debug, Clone)]
pub struct RenderedPhoto {
    /// `data:image/png;base64,...`
    pub data_uri: String,
    pub width: u32,
    pub height: u32,
}

/// Complete photo pipeline for one surface layout
pub struct PhotoPipeline {
    layout: SurfaceLayout,
    overlay: OnceCell<Option<Arc<RgbaImage>>>,
}

impl PhotoPipeline {
    pub fn new(layout: SurfaceLayout) -> Self {
        Self {
            layout,
            overlay: OnceCell::new(),
        }
    }

    /// Overlay for this layout, loading it on first use
    ///
    /// A broken asset is logged once and the pipeline carries on without it.
    pub async fn overlay(&self) -> Option<Arc<RgbaImage>> {
        self.overlay
            .get_or_init(|| async {
                let layout = &self.layout;
                match layout
                    .overlay
                    .load(layout.width, layout.height, layout.video_rect)
                    .await
                {
                    Ok(Some(img)) => {
                        info!(source = ?layout.overlay, "Overlay ready");
                        Some(Arc::new(img))
                    }
                    Ok(None) => None,
                    Err(e) => {
                        warn!(error = %e, source = ?layout.overlay, "Overlay unavailable, rendering without it");
                        None
                    }
                }
            })
            .await
            .clone()
    }

    /// Render one frame into an encoded print
    ///
    /// # Arguments
    /// * `frame` - Latest live frame (RGBA)
    /// * `date` - Stamp text, ignored when the layout has no stamp
    pub async fn render(&self, frame: Arc<CameraFrame>, date: String) -> PhotoResult<RenderedPhoto> {
        let overlay = self.overlay().await;
        let layout = self.layout.clone();

        tokio::task::spawn_blocking(move || render_blocking(&layout, &frame, overlay.as_deref(), &date))
            .await
            .map_err(|e| PhotoError::Compose(format!("render task error: {}", e)))?
    }
}

fn render_blocking(
    layout: &SurfaceLayout,
    frame: &CameraFrame,
    overlay: Option<&RgbaImage>,
    date: &str,
) -> PhotoResult<RenderedPhoto> {
    let start = Instant::now();

    if !frame.is_complete() {
        return Err(PhotoError::InvalidFrame(format!(
            "{}x{} frame with {} bytes",
            frame.width,
            frame.height,
            frame.data.len()
        )));
    }
    let region = layout.region.extract(frame).ok_or(PhotoError::NoSurface)?;

    let stamp = match layout.stamp {
        Some(pos) => Some(overlay::render_stamp(
            date,
            layout.width,
            layout.height,
            pos.x,
            pos.y,
        )?),
        None => None,
    };

    let surface = processing::composite(layout, &region, overlay, stamp.as_ref())?;
    let data_uri = encoding::encode_data_uri(&surface)?;

    debug!(
        elapsed_ms = start.elapsed().as_millis(),
        width = surface.width(),
        height = surface.height(),
        "Print rendered"
    );

    Ok(RenderedPhoto {
        data_uri,
        width: surface.width(),
        height: surface.height(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(overlay: OverlaySource) -> SurfaceLayout {
        SurfaceLayout {
            width: 60,
            height: 72,
            region: CaptureRegion::CenterSquare,
            video_rect: Rect::new(6, 6, 48, 48),
            overlay,
            stamp: Some(StampPosition { x: 30, y: 66 }),
        }
    }

    #[tokio::test]
    async fn test_render_produces_surface_sized_png() {
        let pipeline = PhotoPipeline::new(layout(OverlaySource::BuiltinFrame));
        let frame = Arc::new(CameraFrame::from_rgba(32, 24, vec![128; 32 * 24 * 4]));

        let photo = pipeline.render(frame, "19 Oct 2026".into()).await.unwrap();
        assert_eq!((photo.width, photo.height), (60, 72));
        let img = decode_data_uri(&photo.data_uri).unwrap();
        assert_eq!(img.dimensions(), (60, 72));
    }

    #[tokio::test]
    async fn test_polaroid_print_carries_date_stamp() {
        if overlay::font_db().is_empty() {
            return;
        }
        let layout = crate::booth::CaptureProfile::preset(crate::booth::ProfileKind::Polaroid).layout;
        let pipeline = PhotoPipeline::new(layout);
        let frame = Arc::new(CameraFrame::from_rgba(64, 48, vec![255; 64 * 48 * 4]));

        let photo = pipeline.render(frame, "19 Oct 2026".into()).await.unwrap();
        let img = decode_data_uri(&photo.data_uri).unwrap();
        // The stamp band sits on plain card stock, so dark pixels there are glyphs
        let dark = (425..446)
            .flat_map(|y| (100..300).map(move |x| (x, y)))
            .filter(|&(x, y)| img.get_pixel(x, y).0[0] < 160)
            .count();
        assert!(dark > 0, "polaroid print has no date stamp");
    }

    #[tokio::test]
    async fn test_missing_overlay_degrades() {
        let pipeline = PhotoPipeline::new(layout(OverlaySource::File("/nonexistent.png".into())));
        assert!(pipeline.overlay().await.is_none());

        let frame = Arc::new(CameraFrame::from_rgba(8, 8, vec![0; 256]));
        assert!(pipeline.render(frame, String::new()).await.is_ok());
    }

    #[tokio::test]
    async fn test_truncated_frame_is_rejected() {
        let pipeline = PhotoPipeline::new(layout(OverlaySource::None));
        let frame = Arc::new(CameraFrame::from_rgba(8, 8, vec![0; 10]));
        assert!(matches!(
            pipeline.render(frame, String::new()).await,
            Err(PhotoError::InvalidFrame(_))
        ));
    }
}
