// SPDX-License-Identifier: GPL-3.0-only

//! Capture profiles
//!
//! A profile is the full set of constants for one booth variant: surface
//! geometry, capture region, overlay, stamp and what happens after a shot.

use crate::constants::{surface, timing};
use crate::pipelines::photo::{CaptureRegion, OverlaySource, Rect, StampPosition, SurfaceLayout};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Built-in profile presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    /// 400x480 card, whole frame, short cooldown
    Polaroid,
    /// 600x600 square print that develops before it can be reviewed
    #[default]
    Instant,
    /// 800x800 borderless square, short cooldown
    Studio,
}

impl ProfileKind {
    pub const ALL: [ProfileKind; 3] = [
        ProfileKind::Polaroid,
        ProfileKind::Instant,
        ProfileKind::Studio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileKind::Polaroid => "polaroid",
            ProfileKind::Instant => "instant",
            ProfileKind::Studio => "studio",
        }
    }
}

impl std::fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProfileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown profile '{}' (expected one of: polaroid, instant, studio)",
                    s
                )
            })
    }
}

/// What holds the capture guard after a shot is admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotLifecycle {
    /// Shot starts `developing`, becomes `reviewed` after `delay`; guard held until then
    Developing { delay: Duration },
    /// Shot has no status; guard held for `duration`
    Cooldown { duration: Duration },
}

impl ShotLifecycle {
    /// How long the capture guard stays set
    pub fn guard_duration(&self) -> Duration {
        match *self {
            ShotLifecycle::Developing { delay } => delay,
            ShotLifecycle::Cooldown { duration } => duration,
        }
    }

    pub fn develops(&self) -> bool {
        matches!(self, ShotLifecycle::Developing { .. })
    }
}

/// One active booth variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureProfile {
    pub kind: ProfileKind,
    pub layout: SurfaceLayout,
    pub lifecycle: ShotLifecycle,
}

impl CaptureProfile {
    pub fn preset(kind: ProfileKind) -> Self {
        match kind {
            ProfileKind::Polaroid => {
                let (width, height) = surface::POLAROID_SIZE;
                Self {
                    kind,
                    layout: SurfaceLayout {
                        width,
                        height,
                        region: CaptureRegion::FullFrame,
                        video_rect: Rect::new(40, 40, 320, 300),
                        overlay: OverlaySource::BuiltinFrame,
                        stamp: Some(StampPosition { x: 200, y: 440 }),
                    },
                    lifecycle: ShotLifecycle::Cooldown {
                        duration: timing::CAPTURE_COOLDOWN,
                    },
                }
            }
            ProfileKind::Instant => {
                let (width, height) = surface::INSTANT_SIZE;
                Self {
                    kind,
                    layout: SurfaceLayout {
                        width,
                        height,
                        region: CaptureRegion::CenterSquare,
                        video_rect: Rect::new(60, 30, 480, 480),
                        overlay: OverlaySource::BuiltinFrame,
                        stamp: Some(StampPosition { x: 300, y: 560 }),
                    },
                    lifecycle: ShotLifecycle::Developing {
                        delay: timing::DEVELOP_DELAY,
                    },
                }
            }
            ProfileKind::Studio => {
                let (width, height) = surface::STUDIO_SIZE;
                Self {
                    kind,
                    layout: SurfaceLayout {
                        width,
                        height,
                        region: CaptureRegion::CenterSquare,
                        video_rect: Rect::new(0, 0, width, height),
                        overlay: OverlaySource::None,
                        stamp: None,
                    },
                    lifecycle: ShotLifecycle::Cooldown {
                        duration: timing::CAPTURE_COOLDOWN,
                    },
                }
            }
        }
    }

    /// Replace the overlay (e.g. with a user asset)
    pub fn with_overlay(mut self, overlay: OverlaySource) -> Self {
        self.layout.overlay = overlay;
        self
    }

    /// Override the developing delay; no effect on cooldown profiles
    pub fn with_develop_delay(mut self, delay: Duration) -> Self {
        if let ShotLifecycle::Developing { .. } = self.lifecycle {
            self.lifecycle = ShotLifecycle::Developing { delay };
        }
        self
    }

    /// Override the cooldown; no effect on developing profiles
    pub fn with_cooldown(mut self, duration: Duration) -> Self {
        if let ShotLifecycle::Cooldown { .. } = self.lifecycle {
            self.lifecycle = ShotLifecycle::Cooldown { duration };
        }
        self
    }
}

impl Default for CaptureProfile {
    fn default() -> Self {
        Self::preset(ProfileKind::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_instant() {
        let profile = CaptureProfile::default();
        assert_eq!(profile.kind, ProfileKind::Instant);
        assert!(profile.lifecycle.develops());
        assert_eq!(profile.lifecycle.guard_duration(), Duration::from_secs(3));
    }

    #[test]
    fn test_video_rects_fit_surfaces() {
        for kind in ProfileKind::ALL {
            let layout = CaptureProfile::preset(kind).layout;
            let r = layout.video_rect;
            assert!(r.x + r.width <= layout.width, "{kind}");
            assert!(r.y + r.height <= layout.height, "{kind}");
            if let Some(stamp) = layout.stamp {
                assert!(stamp.y > r.y + r.height, "{kind} stamp overlaps photo");
            }
        }
    }

    #[test]
    fn test_square_profiles() {
        for kind in [ProfileKind::Instant, ProfileKind::Studio] {
            let layout = CaptureProfile::preset(kind).layout;
            assert_eq!(layout.width, layout.height);
            assert_eq!(layout.region, CaptureRegion::CenterSquare);
        }
    }

    #[test]
    fn test_overrides_respect_lifecycle_kind() {
        let studio = CaptureProfile::preset(ProfileKind::Studio)
            .with_develop_delay(Duration::from_secs(9))
            .with_cooldown(Duration::from_millis(200));
        assert_eq!(
            studio.lifecycle,
            ShotLifecycle::Cooldown {
                duration: Duration::from_millis(200)
            }
        );
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("Polaroid".parse::<ProfileKind>().unwrap(), ProfileKind::Polaroid);
        assert!("sepia".parse::<ProfileKind>().is_err());
    }
}
