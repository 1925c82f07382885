// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Shot lifecycle timing
pub mod timing {
    use super::Duration;

    /// How long a fresh shot stays `developing` before it is `reviewed`
    pub const DEVELOP_DELAY: Duration = Duration::from_millis(3000);

    /// Capture cooldown for profiles without a developing stage
    pub const CAPTURE_COOLDOWN: Duration = Duration::from_millis(1000);

    /// How long to wait for the first frame after the camera starts
    pub const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(5);

    /// Poll interval while waiting for the capture guard to clear
    pub const CAPTURE_RETRY_INTERVAL: Duration = Duration::from_millis(50);

    /// Terminal UI input poll interval (~60Hz redraw)
    pub const UI_POLL_INTERVAL: Duration = Duration::from_millis(16);
}

/// Output surface geometry for the built-in profiles
pub mod surface {
    /// Classic polaroid card (portrait)
    pub const POLAROID_SIZE: (u32, u32) = (400, 480);

    /// Square instant print
    pub const INSTANT_SIZE: (u32, u32) = (600, 600);

    /// Borderless square studio print
    pub const STUDIO_SIZE: (u32, u32) = (800, 800);

    /// Surface background (card stock)
    pub const BACKGROUND: [u8; 4] = [255, 255, 255, 255];

    /// Border colour of the built-in frame overlay
    pub const FRAME_COLOR: &str = "#fdfcf7";

    /// Hairline around the photo window of the built-in frame
    pub const FRAME_EDGE_COLOR: &str = "#d8d4c8";
}

/// Date stamp rendering
pub mod stamp {
    /// Font family passed to the SVG text renderer
    pub const FONT_FAMILY: &str = "serif";

    /// Font size in surface pixels
    pub const FONT_SIZE: f32 = 20.0;

    /// Text colour
    pub const COLOR: &str = "#333333";

    /// strftime pattern: two-digit day, abbreviated month, full year
    pub const DATE_FORMAT: &str = "%d %b %Y";
}

/// Camera acquisition defaults
pub mod camera {
    /// Resolution requested by `snap --hd`
    pub const DEFAULT_RESOLUTION_HINT: (u32, u32) = (1280, 720);

    /// Size of the synthetic test pattern source
    pub const TEST_PATTERN_SIZE: (u32, u32) = (640, 480);

    /// Frame interval of the animated test pattern (~30fps)
    pub const TEST_PATTERN_FRAME_INTERVAL: std::time::Duration =
        std::time::Duration::from_millis(33);

    /// Number of mmap buffers requested from V4L2
    pub const V4L2_BUFFER_COUNT: u32 = 4;

    /// Pixel formats we can convert, in order of preference
    pub const PREFERRED_FOURCCS: &[&[u8; 4]] = &[b"YUYV", b"MJPG", b"RGB3"];

    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 60;
}

/// Data URI framing for encoded shots
pub mod encoding {
    /// Prefix of every encoded shot
    pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";
}

/// Supported overlay asset formats
pub mod file_formats {
    /// Raster overlay extensions (decoded with the `image` crate)
    pub const RASTER_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp"];

    /// Vector overlay extensions (rasterized with resvg)
    pub const VECTOR_EXTENSIONS: &[&str] = &["svg"];

    pub fn is_raster_extension(ext: &str) -> bool {
        RASTER_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }

    pub fn is_vector_extension(ext: &str) -> bool {
        VECTOR_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}
