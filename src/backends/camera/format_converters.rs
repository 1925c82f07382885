// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion to RGBA
//!
//! Capture threads run every dequeued buffer through one of these before
//! publishing, so the rest of the booth only ever sees RGBA.

use super::types::{BackendError, BackendResult};

/// Source formats the V4L2 backend knows how to convert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Packed YUV 4:2:2 (Y0 U Y1 V)
    Yuyv,
    /// Motion JPEG, one JPEG per buffer
    Mjpeg,
    /// Packed 24-bit RGB
    Rgb24,
}

impl SourceFormat {
    pub fn from_fourcc(fourcc: &[u8; 4]) -> Option<Self> {
        match fourcc {
            b"YUYV" => Some(SourceFormat::Yuyv),
            b"MJPG" => Some(SourceFormat::Mjpeg),
            b"RGB3" => Some(SourceFormat::Rgb24),
            _ => None,
        }
    }

    pub fn fourcc(&self) -> &'static [u8; 4] {
        match self {
            SourceFormat::Yuyv => b"YUYV",
            SourceFormat::Mjpeg => b"MJPG",
            SourceFormat::Rgb24 => b"RGB3",
        }
    }

    /// Convert one buffer of this format to packed RGBA
    ///
    /// `stride` is the driver's bytes per row; 0 means tightly packed.
    /// Compressed formats ignore it.
    pub fn to_rgba(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        stride: u32,
    ) -> BackendResult<Vec<u8>> {
        let rgba = match self {
            SourceFormat::Yuyv => yuyv_to_rgba(data, width, height, stride),
            SourceFormat::Mjpeg => mjpeg_to_rgba(data, width, height)?,
            SourceFormat::Rgb24 => rgb_to_rgba(data, width, height, stride),
        };

        if rgba.len() < (width * height * 4) as usize {
            return Err(BackendError::Other(format!(
                "short {:?} buffer: {} bytes for {}x{}",
                self,
                data.len(),
                width,
                height
            )));
        }
        Ok(rgba)
    }
}

/// Rows of `row_bytes` each, `stride` apart; stops at the first short row
fn rows(data: &[u8], height: u32, row_bytes: usize, stride: u32) -> impl Iterator<Item = &[u8]> {
    let stride = (stride as usize).max(row_bytes);
    (0..height as usize).map_while(move |row| data.get(row * stride..row * stride + row_bytes))
}

/// Convert YUYV (YUV 4:2:2) to RGBA
///
/// YUYV format: Y0 U0 Y1 V0 - each 4-byte group encodes 2 pixels.
/// Uses BT.601 coefficients for YUV to RGB conversion. Row padding past
/// `width` pixels is skipped.
pub fn yuyv_to_rgba(data: &[u8], width: u32, height: u32, stride: u32) -> Vec<u8> {
    let pixel_count = (width * height) as usize;
    let mut rgba = Vec::with_capacity(pixel_count * 4);
    // Odd widths still carry a whole macropixel at the end of the row
    let row_bytes = (width as usize).div_ceil(2) * 4;

    for row in rows(data, height, row_bytes, stride) {
        let mut emitted = 0;
        for chunk in row.chunks_exact(4) {
            let y0 = chunk[0] as f32;
            let u = chunk[1] as f32 - 128.0;
            let y1 = chunk[2] as f32;
            let v = chunk[3] as f32 - 128.0;

            for y in [y0, y1] {
                if emitted == width {
                    break;
                }
                let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
                let g = (y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8;
                let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;
                rgba.extend_from_slice(&[r, g, b, 255]);
                emitted += 1;
            }
        }
    }

    rgba
}

/// Decode an MJPEG buffer to RGBA
///
/// Some webcams emit a JPEG whose size differs from the negotiated format;
/// those are rejected rather than silently rescaled.
pub fn mjpeg_to_rgba(data: &[u8], width: u32, height: u32) -> BackendResult<Vec<u8>> {
    let img = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
        .map_err(|e| BackendError::Other(format!("MJPEG decode failed: {}", e)))?;
    let rgba = img.to_rgba8();
    if rgba.dimensions() != (width, height) {
        return Err(BackendError::FormatNotSupported(format!(
            "MJPEG frame is {}x{}, expected {}x{}",
            rgba.width(),
            rgba.height(),
            width,
            height
        )));
    }
    Ok(rgba.into_raw())
}

/// Convert RGB (3 bytes per pixel) to RGBA
pub fn rgb_to_rgba(rgb: &[u8], width: u32, height: u32, stride: u32) -> Vec<u8> {
    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for row in rows(rgb, height, width as usize * 3, stride) {
        for chunk in row.chunks_exact(3) {
            rgba.extend_from_slice(&[chunk[0], chunk[1], chunk[2], 255]);
        }
    }
    rgba
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuyv_to_rgba() {
        // Neutral chroma: grey pixels at the given luma
        let data = [16u8, 128, 235, 128];
        let rgba = yuyv_to_rgba(&data, 2, 1, 0);
        assert_eq!(rgba, vec![16, 16, 16, 255, 235, 235, 235, 255]);
    }

    #[test]
    fn test_yuyv_stops_at_pixel_count() {
        let data = [0u8; 16];
        assert_eq!(yuyv_to_rgba(&data, 2, 1, 0).len(), 8);
    }

    #[test]
    fn test_yuyv_skips_row_padding() {
        // 2x2 image, 8-byte stride: each row is one macropixel plus 4 pad bytes
        let data = [
            50u8, 128, 50, 128, 255, 255, 255, 255, //
            200, 128, 200, 128, 255, 255, 255, 255,
        ];
        let rgba = SourceFormat::Yuyv.to_rgba(&data, 2, 2, 8).unwrap();
        assert_eq!(rgba.len(), 2 * 2 * 4);
        assert_eq!(&rgba[..4], &[50, 50, 50, 255]);
        assert_eq!(&rgba[8..12], &[200, 200, 200, 255]);
        assert_eq!(&rgba[12..], &[200, 200, 200, 255]);
    }

    #[test]
    fn test_rgb_to_rgba() {
        let rgba = rgb_to_rgba(&[10, 20, 30, 40, 50, 60], 2, 1, 0);
        assert_eq!(rgba, vec![10, 20, 30, 255, 40, 50, 60, 255]);

        // One pad byte per row
        let padded = rgb_to_rgba(&[1, 2, 3, 0, 4, 5, 6, 0], 1, 2, 4);
        assert_eq!(padded, vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        let err = SourceFormat::Yuyv.to_rgba(&[0u8; 4], 4, 4, 0);
        assert!(err.is_err());
    }

    #[test]
    fn test_mjpeg_round_trip_through_decoder() {
        let img = image::RgbImage::from_pixel(8, 8, image::Rgb([200, 10, 10]));
        let mut jpeg = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
            .unwrap();

        let rgba = SourceFormat::Mjpeg.to_rgba(&jpeg, 8, 8, 0).unwrap();
        assert_eq!(rgba.len(), 8 * 8 * 4);
        assert!(rgba[0] > 150, "red channel should survive JPEG");
        assert!(SourceFormat::Mjpeg.to_rgba(&jpeg, 16, 16, 0).is_err());
    }

    #[test]
    fn test_fourcc_mapping() {
        assert_eq!(SourceFormat::from_fourcc(b"YUYV"), Some(SourceFormat::Yuyv));
        assert_eq!(SourceFormat::from_fourcc(b"H264"), None);
        assert_eq!(SourceFormat::Mjpeg.fourcc(), b"MJPG");
    }
}
