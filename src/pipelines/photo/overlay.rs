// SPDX-License-Identifier: GPL-3.0-only

//! Decorative overlay and date stamp rasterization
//!
//! Overlays are either a built-in SVG print frame, or a user asset (PNG/JPEG
//! via `image`, SVG via `resvg`). The date stamp is rendered as SVG text so
//! it goes through the same font database as vector overlays.

use super::capture::Rect;
use crate::constants::{file_formats, stamp, surface};
use crate::errors::{PhotoError, PhotoResult};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Where the overlay comes from
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlaySource {
    #[default]
    None,
    /// Plain card frame drawn around the photo window
    BuiltinFrame,
    /// Image file stretched over the whole surface
    File(PathBuf),
}

static FONT_DB: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();

/// Serif families tried when the generic `serif` name is not installed
const SERIF_CANDIDATES: &[&str] = &[
    "DejaVu Serif",
    "Liberation Serif",
    "Noto Serif",
    "FreeSerif",
    "Times New Roman",
];

fn has_family(db: &usvg::fontdb::Database, family: usvg::fontdb::Family<'_>) -> bool {
    let families = [family];
    db.query(&usvg::fontdb::Query {
        families: &families,
        ..Default::default()
    })
    .is_some()
}

/// Point generic `serif` at a serif face that is actually installed
fn resolve_serif_family(db: &mut usvg::fontdb::Database) {
    if has_family(db, usvg::fontdb::Family::Serif) {
        return;
    }

    let installed = SERIF_CANDIDATES
        .iter()
        .map(|name| name.to_string())
        .find(|name| has_family(db, usvg::fontdb::Family::Name(name)))
        .or_else(|| {
            db.faces()
                .flat_map(|face| face.families.iter().map(|(name, _)| name))
                .find(|name| name.contains("Serif") && !name.contains("Sans"))
                .cloned()
        });

    if let Some(name) = installed {
        debug!(family = %name, "Using installed serif family");
        db.set_serif_family(name);
    }
}

pub(crate) fn font_db() -> Arc<usvg::fontdb::Database> {
    FONT_DB
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            if db.is_empty() {
                warn!("No system fonts found, date stamps will be blank");
            } else {
                resolve_serif_family(&mut db);
            }
            debug!(faces = db.len(), "Loaded system fonts for SVG text");
            Arc::new(db)
        })
        .clone()
}

/// Font selection with generic fallbacks, then any face at all
fn font_resolver() -> usvg::FontResolver<'static> {
    usvg::FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families: Vec<usvg::fontdb::Family<'_>> = font
                .families()
                .iter()
                .map(|family| match family {
                    usvg::FontFamily::Serif => usvg::fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => usvg::fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => usvg::fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => usvg::fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => usvg::fontdb::Family::Monospace,
                    usvg::FontFamily::Named(name) => usvg::fontdb::Family::Name(name),
                })
                .collect();
            families.push(usvg::fontdb::Family::Serif);
            families.push(usvg::fontdb::Family::SansSerif);

            let style = match font.style() {
                usvg::FontStyle::Normal => usvg::fontdb::Style::Normal,
                usvg::FontStyle::Italic => usvg::fontdb::Style::Italic,
                usvg::FontStyle::Oblique => usvg::fontdb::Style::Oblique,
            };
            let query = usvg::fontdb::Query {
                families: &families,
                weight: usvg::fontdb::Weight(font.weight()),
                style,
                ..Default::default()
            };

            fontdb
                .query(&query)
                .or_else(|| fontdb.faces().next().map(|face| face.id))
        }),
        select_fallback: usvg::FontResolver::default_fallback_selector(),
    }
}

/// Rasterize SVG markup to exactly `width` x `height` (straight alpha)
pub fn rasterize_svg(svg: &[u8], width: u32, height: u32) -> PhotoResult<RgbaImage> {
    let opts = usvg::Options {
        fontdb: font_db(),
        font_resolver: font_resolver(),
        ..Default::default()
    };
    let tree = usvg::Tree::from_data(svg, &opts)
        .map_err(|e| PhotoError::Overlay(format!("failed to parse SVG: {}", e)))?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| PhotoError::Overlay(format!("cannot allocate {}x{} pixmap", width, height)))?;

    let sx = width as f32 / tree.size().width();
    let sy = height as f32 / tree.size().height();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );

    // tiny-skia stores premultiplied colour; image expects straight alpha
    let mut out = Vec::with_capacity((width * height * 4) as usize);
    for px in pixmap.pixels() {
        let c = px.demultiply();
        out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    RgbaImage::from_raw(width, height, out)
        .ok_or_else(|| PhotoError::Overlay("pixmap size mismatch".to_string()))
}

/// SVG for the built-in frame: card stock with a window over `window`
pub fn builtin_frame_svg(width: u32, height: u32, window: Rect) -> String {
    let Rect {
        x,
        y,
        width: w,
        height: h,
    } = window;
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">
  <path fill="{fill}" fill-rule="evenodd" d="M0 0H{width}V{height}H0Z M{x} {y}V{y2}H{x2}V{y}Z"/>
  <rect x="{x}" y="{y}" width="{w}" height="{h}" fill="none" stroke="{edge}" stroke-width="1"/>
</svg>"#,
        fill = surface::FRAME_COLOR,
        edge = surface::FRAME_EDGE_COLOR,
        x2 = x + w,
        y2 = y + h,
    )
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Render `text` centred on (`x`, `y`) baseline into a transparent layer
pub fn render_stamp(text: &str, width: u32, height: u32, x: u32, y: u32) -> PhotoResult<RgbaImage> {
    let svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">
  <text x="{x}" y="{y}" font-family="{family}" font-size="{size}" fill="{color}" text-anchor="middle">{text}</text>
</svg>"#,
        family = stamp::FONT_FAMILY,
        size = stamp::FONT_SIZE,
        color = stamp::COLOR,
        text = escape_xml(text),
    );
    rasterize_svg(svg.as_bytes(), width, height)
}

/// Decode an overlay asset and fit it to the surface
pub fn decode_overlay(path: &Path, bytes: &[u8], width: u32, height: u32) -> PhotoResult<RgbaImage> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    if file_formats::is_vector_extension(ext) {
        return rasterize_svg(bytes, width, height);
    }
    if !file_formats::is_raster_extension(ext) {
        return Err(PhotoError::Overlay(format!(
            "unsupported overlay format: {}",
            path.display()
        )));
    }

    let img = image::load_from_memory(bytes)
        .map_err(|e| PhotoError::Overlay(format!("{}: {}", path.display(), e)))?
        .to_rgba8();
    if img.dimensions() == (width, height) {
        return Ok(img);
    }
    debug!(
        from = format!("{}x{}", img.width(), img.height()),
        to = format!("{}x{}", width, height),
        "Stretching overlay to surface"
    );
    Ok(image::imageops::resize(
        &img,
        width,
        height,
        image::imageops::FilterType::Triangle,
    ))
}

impl OverlaySource {
    /// Load and rasterize the overlay for a surface
    ///
    /// `Ok(None)` means the profile has no overlay.
    pub async fn load(
        &self,
        width: u32,
        height: u32,
        window: Rect,
    ) -> PhotoResult<Option<RgbaImage>> {
        match self {
            OverlaySource::None => Ok(None),
            OverlaySource::BuiltinFrame => {
                let svg = builtin_frame_svg(width, height, window);
                tokio::task::spawn_blocking(move || rasterize_svg(svg.as_bytes(), width, height))
                    .await
                    .map_err(|e| PhotoError::Overlay(format!("overlay task error: {}", e)))?
                    .map(Some)
            }
            OverlaySource::File(path) => {
                info!(path = %path.display(), "Loading overlay asset");
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|e| PhotoError::Overlay(format!("{}: {}", path.display(), e)))?;
                let path = path.clone();
                tokio::task::spawn_blocking(move || decode_overlay(&path, &bytes, width, height))
                    .await
                    .map_err(|e| PhotoError::Overlay(format!("overlay task error: {}", e)))?
                    .map(Some)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_frame_has_transparent_window() {
        let window = Rect::new(40, 40, 320, 300);
        let svg = builtin_frame_svg(400, 480, window);
        let img = rasterize_svg(svg.as_bytes(), 400, 480).unwrap();

        assert_eq!(img.dimensions(), (400, 480));
        assert_eq!(img.get_pixel(200, 200).0[3], 0, "window must be clear");
        assert_eq!(img.get_pixel(5, 5).0[3], 255, "border must be opaque");
        assert_eq!(img.get_pixel(200, 460).0[3], 255);
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b & 'c'"), "a&lt;b &amp; &apos;c&apos;");
    }

    #[test]
    fn test_stamp_layer_size() {
        let layer = render_stamp("19 Oct 2026", 400, 480, 200, 440).unwrap();
        assert_eq!(layer.dimensions(), (400, 480));
        assert_eq!(layer.get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn test_stamp_is_inked_around_anchor() {
        if font_db().is_empty() {
            return;
        }
        let layer = render_stamp("19 Oct 2026", 400, 480, 200, 440).unwrap();
        let inked = (420..446)
            .flat_map(|y| (100..300).map(move |x| (x, y)))
            .filter(|&(x, y)| layer.get_pixel(x, y).0[3] > 0)
            .count();
        assert!(inked > 0, "date stamp rendered no glyphs");
    }

    #[test]
    fn test_generic_serif_resolves() {
        let db = font_db();
        if db.is_empty() {
            return;
        }
        let has_serif_face = db.faces().any(|face| {
            face.families
                .iter()
                .any(|(name, _)| name.contains("Serif") && !name.contains("Sans"))
        });
        if has_serif_face {
            assert!(has_family(&db, usvg::fontdb::Family::Serif));
        }
    }

    #[test]
    fn test_raster_overlay_is_stretched() {
        let img = RgbaImage::from_pixel(10, 10, image::Rgba([1, 2, 3, 128]));
        let mut png = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let out = decode_overlay(Path::new("frame.PNG"), &png, 40, 20).unwrap();
        assert_eq!(out.dimensions(), (40, 20));
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        assert!(decode_overlay(Path::new("frame.tiff"), b"", 4, 4).is_err());
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let source = OverlaySource::File("/nonexistent/frame.png".into());
        let result = source.load(10, 10, Rect::new(0, 0, 5, 5)).await;
        assert!(matches!(result, Err(PhotoError::Overlay(_))));
    }

    #[tokio::test]
    async fn test_none_is_empty() {
        let overlay = OverlaySource::None.load(10, 10, Rect::new(0, 0, 5, 5)).await;
        assert!(overlay.unwrap().is_none());
    }
}
