// SPDX-License-Identifier: GPL-3.0-only

//! PNG data URI encoding
//!
//! Shots never touch the disk: the surface is PNG-encoded in memory and
//! wrapped as `data:image/png;base64,...`.

use crate::constants::encoding::PNG_DATA_URI_PREFIX;
use crate::errors::{PhotoError, PhotoResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, RgbaImage};
use tracing::debug;

/// Encode image as PNG
pub fn encode_png(image: &RgbaImage) -> PhotoResult<Vec<u8>> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| PhotoError::EncodingFailed(format!("PNG encoding failed: {}", e)))?;
    Ok(buffer)
}

/// Encode image as a PNG data URI
pub fn encode_data_uri(image: &RgbaImage) -> PhotoResult<String> {
    let png = encode_png(image)?;
    let mut uri = String::with_capacity(PNG_DATA_URI_PREFIX.len() + png.len().div_ceil(3) * 4);
    uri.push_str(PNG_DATA_URI_PREFIX);
    STANDARD.encode_string(&png, &mut uri);

    debug!(
        width = image.width(),
        height = image.height(),
        png_bytes = png.len(),
        uri_len = uri.len(),
        "Encoded data URI"
    );
    Ok(uri)
}

/// Decode a PNG data URI back into pixels
///
/// Used by the terminal gallery thumbnail and by anything inspecting shots.
pub fn decode_data_uri(uri: &str) -> PhotoResult<RgbaImage> {
    let payload = uri.strip_prefix(PNG_DATA_URI_PREFIX).ok_or_else(|| {
        PhotoError::EncodingFailed("not a base64 PNG data URI".to_string())
    })?;
    let png = STANDARD
        .decode(payload)
        .map_err(|e| PhotoError::EncodingFailed(format!("invalid base64: {}", e)))?;
    let img = image::load_from_memory_with_format(&png, ImageFormat::Png)?;
    Ok(img.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_uri_prefix_and_size() {
        let img = RgbaImage::from_pixel(6, 4, image::Rgba([1, 2, 3, 255]));
        let uri = encode_data_uri(&img).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));

        let back = decode_data_uri(&uri).unwrap();
        assert_eq!(back.dimensions(), (6, 4));
        assert_eq!(back.get_pixel(5, 3).0, [1, 2, 3, 255]);
    }

    #[test]
    fn test_decode_rejects_other_uris() {
        assert!(decode_data_uri("data:image/jpeg;base64,AAAA").is_err());
        assert!(decode_data_uri("data:image/png;base64,***").is_err());
    }
}
