// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for booth operations
//!
//! - Listing available cameras
//! - Taking a batch of shots and printing them as JSON

use photobooth::backends::camera::{self, CameraBackendType};
use photobooth::booth::{CaptureProfile, PhotoBooth, ProfileKind, Shot};
use photobooth::config::{Config, OverlaySetting, ResolutionHint};
use photobooth::constants::timing;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

/// Flag overrides for `snap`
#[derive(Debug, Default)]
pub struct SnapOptions {
    pub count: usize,
    pub profile: Option<ProfileKind>,
    pub backend: Option<CameraBackendType>,
    pub device: Option<String>,
    pub resolution: Option<(u32, u32)>,
    pub overlay: Option<PathBuf>,
    pub wait: bool,
    pub summary: bool,
}

impl SnapOptions {
    fn apply(&self, config: &mut Config) {
        if let Some(profile) = self.profile {
            config.profile = profile;
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(device) = &self.device {
            if config.backend == CameraBackendType::StillImage {
                config.still_image_path = Some(PathBuf::from(device));
            } else {
                config.device_path = Some(device.clone());
            }
        }
        if let Some((width, height)) = self.resolution {
            config.resolution_hint = Some(ResolutionHint { width, height });
        }
        if let Some(overlay) = &self.overlay {
            config.overlay = OverlaySetting::File(overlay.clone());
        }
    }
}

/// List all available cameras
pub fn list_cameras(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    for kind in CameraBackendType::ALL {
        let backend = camera::get_backend(kind, config.still_image_path.as_deref());
        if !backend.is_available() {
            debug!(backend = %kind, "Backend not available");
            continue;
        }

        let cameras = backend.enumerate_cameras();
        if cameras.is_empty() {
            continue;
        }

        println!("{} cameras:", kind);
        println!();
        for (index, device) in cameras.iter().enumerate() {
            println!("  [{}] {} ({})", index, device.name, device.path);
            if let Some(info) = &device.device_info {
                println!("      Driver: {} on {}", info.driver, info.bus_info);
            }

            // Group formats by resolution and show best framerate
            let mut resolutions: Vec<(u32, u32, u32)> = Vec::new();
            for format in backend.get_formats(device) {
                let fps = format.framerate.map(|f| f.as_int()).unwrap_or(0);
                if let Some(existing) = resolutions
                    .iter_mut()
                    .find(|(w, h, _)| *w == format.width && *h == format.height)
                {
                    existing.2 = existing.2.max(fps);
                } else {
                    resolutions.push((format.width, format.height, fps));
                }
            }
            resolutions.sort_by(|a, b| (b.0 * b.1).cmp(&(a.0 * a.1)));

            if !resolutions.is_empty() {
                let res_strs: Vec<String> = resolutions
                    .iter()
                    .take(3)
                    .map(|(w, h, fps)| match fps {
                        0 => format!("{}x{}", w, h),
                        fps => format!("{}x{}@{}fps", w, h, fps),
                    })
                    .collect();
                println!("      Formats: {}", res_strs.join(", "));
            }
            println!();
        }
    }

    Ok(())
}

async fn take_shots(
    config: &Config,
    profile: CaptureProfile,
    options: &SnapOptions,
) -> Result<Vec<Shot>, Box<dyn std::error::Error>> {
    let booth = PhotoBooth::new(profile);
    let backend = camera::get_backend(config.backend, config.still_image_path.as_deref());

    booth.try_mount(backend, config.stream_request()).await?;
    if !booth.wait_for_frame(timing::FIRST_FRAME_TIMEOUT).await {
        return Err("camera produced no frames".into());
    }

    for taken in 0..options.count {
        // The guard holds for the whole developing delay; wait it out
        while booth.is_capturing() {
            tokio::time::sleep(timing::CAPTURE_RETRY_INTERVAL).await;
        }
        match booth.capture().await {
            Some(id) => eprintln!("Captured {}/{}: {}", taken + 1, options.count, id),
            None => return Err("capture failed".into()),
        }
    }

    if options.wait && booth.profile().lifecycle.develops() {
        eprintln!(
            "Waiting {:?} for shots to develop...",
            booth.profile().lifecycle.guard_duration()
        );
        while booth.pending_transitions() > 0 {
            tokio::time::sleep(timing::CAPTURE_RETRY_INTERVAL).await;
        }
    }

    let shots = booth.shots();
    booth.shutdown();
    Ok(shots)
}

/// Mount a camera, take `count` shots and print the gallery as JSON lines
pub fn snap(mut config: Config, options: SnapOptions) -> Result<(), Box<dyn std::error::Error>> {
    options.apply(&mut config);
    let profile = config.capture_profile();
    info!(profile = %profile.kind, count = options.count, "Starting snap");

    let rt = tokio::runtime::Runtime::new()?;
    let shots = rt.block_on(take_shots(&config, profile, &options))?;

    let mut out = std::io::stdout().lock();
    for shot in &shots {
        if options.summary {
            let mut value = serde_json::to_value(shot)?;
            if let Some(image) = value.get_mut("image") {
                *image = serde_json::Value::from(format!("<{} bytes>", shot.image.len()));
            }
            writeln!(out, "{}", value)?;
        } else {
            writeln!(out, "{}", serde_json::to_string(shot)?)?;
        }
    }

    Ok(())
}
