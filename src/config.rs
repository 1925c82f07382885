// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON at `$XDG_CONFIG_HOME/photobooth/config.json`. Every field
//! has a default, so partial files are fine. CLI flags override on top.

use crate::backends::camera::{CameraBackendType, StreamRequest, VideoConstraints};
use crate::booth::{CaptureProfile, ProfileKind};
use crate::errors::{AppError, AppResult};
use crate::pipelines::photo::OverlaySource;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const APP_DIR: &str = "photobooth";
const CONFIG_FILE: &str = "config.json";

/// Resolution request sent to the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionHint {
    pub width: u32,
    pub height: u32,
}

/// Overlay choice in the config file
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlaySetting {
    /// Whatever the profile ships with
    #[default]
    Profile,
    /// No overlay at all
    None,
    /// An image or SVG file
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera backend to use
    pub backend: CameraBackendType,
    /// Camera device path (e.g. /dev/video0); `None` picks the first
    pub device_path: Option<String>,
    /// Requested capture size; `None` asks for plain "video enabled"
    pub resolution_hint: Option<ResolutionHint>,
    /// Active booth profile
    pub profile: ProfileKind,
    pub overlay: OverlaySetting,
    /// Image served by the still-image backend
    pub still_image_path: Option<PathBuf>,
    /// Mirror the live preview horizontally (selfie mode); shots are never mirrored
    pub mirror_preview: bool,
    /// Override of the developing delay
    pub develop_delay_ms: Option<u64>,
    /// Override of the capture cooldown
    pub cooldown_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: CameraBackendType::default(),
            device_path: None,
            resolution_hint: None,
            profile: ProfileKind::default(),
            overlay: OverlaySetting::default(),
            still_image_path: None,
            mirror_preview: true, // Default to mirrored (selfie mode)
            develop_delay_ms: None,
            cooldown_ms: None,
        }
    }
}

impl Config {
    /// Default config file location
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from the default location; a missing file yields defaults
    pub fn load() -> AppResult<Self> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory on this system, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(AppError::Storage(format!("{}: {}", path.display(), e))),
        };

        let config: Config = serde_json::from_str(&text)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Stream request for the configured device and resolution
    pub fn stream_request(&self) -> StreamRequest {
        StreamRequest {
            device: self.device_path.clone(),
            constraints: match self.resolution_hint {
                Some(ResolutionHint { width, height }) => {
                    VideoConstraints::Resolution { width, height }
                }
                None => VideoConstraints::Enabled,
            },
        }
    }

    /// Profile preset with the configured overrides applied
    pub fn capture_profile(&self) -> CaptureProfile {
        let mut profile = CaptureProfile::preset(self.profile);
        match &self.overlay {
            OverlaySetting::Profile => {}
            OverlaySetting::None => profile = profile.with_overlay(OverlaySource::None),
            OverlaySetting::File(path) => {
                profile = profile.with_overlay(OverlaySource::File(path.clone()))
            }
        }
        if let Some(ms) = self.develop_delay_ms {
            profile = profile.with_develop_delay(Duration::from_millis(ms));
        }
        if let Some(ms) = self.cooldown_ms {
            profile = profile.with_cooldown(Duration::from_millis(ms));
        }
        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booth::ShotLifecycle;

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{ "profile": "studio" }"#).unwrap();
        assert_eq!(config.profile, ProfileKind::Studio);
        assert_eq!(config.backend, CameraBackendType::V4l2);
        assert!(config.mirror_preview);
    }

    #[test]
    fn test_stream_request() {
        let config = Config {
            device_path: Some("/dev/video2".into()),
            resolution_hint: Some(ResolutionHint {
                width: 1280,
                height: 720,
            }),
            ..Default::default()
        };
        let request = config.stream_request();
        assert_eq!(request.device.as_deref(), Some("/dev/video2"));
        assert_eq!(
            request.constraints,
            VideoConstraints::Resolution {
                width: 1280,
                height: 720
            }
        );
        assert_eq!(Config::default().stream_request().constraints, VideoConstraints::Enabled);
    }

    #[test]
    fn test_capture_profile_overrides() {
        let config = Config {
            overlay: OverlaySetting::File("/tmp/frame.png".into()),
            develop_delay_ms: Some(500),
            ..Default::default()
        };
        let profile = config.capture_profile();
        assert_eq!(
            profile.layout.overlay,
            OverlaySource::File("/tmp/frame.png".into())
        );
        assert_eq!(
            profile.lifecycle,
            ShotLifecycle::Developing {
                delay: Duration::from_millis(500)
            }
        );
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let path = std::env::temp_dir().join(format!("booth-config-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::load_from(&path), Err(AppError::Config(_))));
        let _ = std::fs::remove_file(path);
    }
}
