// SPDX-License-Identifier: GPL-3.0-only

//! Surface compositing
//!
//! Paints, in order: white card, captured region scaled into the video rect,
//! overlay, date stamp. All layers are straight-alpha RGBA.

use super::SurfaceLayout;
use crate::constants::surface;
use crate::errors::{PhotoError, PhotoResult};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use tracing::debug;

/// Compose the print surface
///
/// `region` is the already-cropped capture region at native resolution.
pub fn composite(
    layout: &SurfaceLayout,
    region: &RgbaImage,
    overlay: Option<&RgbaImage>,
    stamp: Option<&RgbaImage>,
) -> PhotoResult<RgbaImage> {
    if layout.width == 0 || layout.height == 0 || layout.video_rect.is_empty() {
        return Err(PhotoError::NoSurface);
    }
    if region.width() == 0 || region.height() == 0 {
        return Err(PhotoError::InvalidFrame("empty capture region".to_string()));
    }

    let mut canvas = RgbaImage::from_pixel(layout.width, layout.height, Rgba(surface::BACKGROUND));

    let rect = layout.video_rect;
    let scaled = if region.dimensions() == (rect.width, rect.height) {
        region.clone()
    } else {
        imageops::resize(region, rect.width, rect.height, FilterType::Triangle)
    };
    debug!(
        from = format!("{}x{}", region.width(), region.height()),
        to = ?rect,
        "Drawing capture region"
    );
    imageops::replace(&mut canvas, &scaled, rect.x as i64, rect.y as i64);

    for layer in [overlay, stamp].into_iter().flatten() {
        if layer.dimensions() != canvas.dimensions() {
            return Err(PhotoError::Compose(format!(
                "layer is {}x{}, surface is {}x{}",
                layer.width(),
                layer.height(),
                canvas.width(),
                canvas.height()
            )));
        }
        imageops::overlay(&mut canvas, layer, 0, 0);
    }

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::photo::capture::{CaptureRegion, Rect};
    use crate::pipelines::photo::overlay::OverlaySource;

    fn layout() -> SurfaceLayout {
        SurfaceLayout {
            width: 100,
            height: 120,
            region: CaptureRegion::FullFrame,
            video_rect: Rect::new(10, 10, 80, 75),
            overlay: OverlaySource::None,
            stamp: None,
        }
    }

    #[test]
    fn test_region_lands_in_video_rect() {
        let region = RgbaImage::from_pixel(16, 12, Rgba([10, 200, 30, 255]));
        let out = composite(&layout(), &region, None, None).unwrap();

        assert_eq!(out.dimensions(), (100, 120));
        assert_eq!(out.get_pixel(50, 50).0, [10, 200, 30, 255]);
        // Outside the rect stays white
        assert_eq!(out.get_pixel(5, 5).0, surface::BACKGROUND);
        assert_eq!(out.get_pixel(50, 100).0, surface::BACKGROUND);
    }

    #[test]
    fn test_overlay_is_drawn_on_top() {
        let region = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
        let mut overlay = RgbaImage::new(100, 120);
        overlay.put_pixel(50, 50, Rgba([255, 0, 0, 255]));

        let out = composite(&layout(), &region, Some(&overlay), None).unwrap();
        assert_eq!(out.get_pixel(50, 50).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(51, 50).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_mismatched_layer_is_rejected() {
        let region = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
        let overlay = RgbaImage::new(10, 10);
        assert!(matches!(
            composite(&layout(), &region, Some(&overlay), None),
            Err(PhotoError::Compose(_))
        ));
    }

    #[test]
    fn test_empty_surface() {
        let mut layout = layout();
        layout.width = 0;
        let region = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
        assert!(matches!(
            composite(&layout, &region, None, None),
            Err(PhotoError::NoSurface)
        ));
    }
}
