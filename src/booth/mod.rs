// SPDX-License-Identifier: GPL-3.0-only

//! Photo booth controller
//!
//! `PhotoBooth` owns everything that changes during a session: the attached
//! live feed, the gallery, the capture guard and the pending develop timers.
//!
//! ```text
//! capture() ──▶ guard check ──▶ PhotoPipeline::render ──▶ gallery.add_shot
//!                                                              │
//!                    DevelopScheduler ◀── spawn(lifecycle) ◀───┘
//!                          │ after delay
//!                          ▼
//!                  mark_reviewed + clear guard
//! ```
//!
//! The state mutex is never held across an await.

pub mod gallery;
pub mod profile;
pub mod scheduler;
pub mod shot;

pub use gallery::ShotGallery;
pub use profile::{CaptureProfile, ProfileKind, ShotLifecycle};
pub use scheduler::DevelopScheduler;
pub use shot::{Shot, ShotId, ShotStatus, format_capture_date};

use crate::backends::camera::{CameraBackend, CameraFrame, LiveFeed, StreamRequest};
use crate::errors::CameraError;
use crate::pipelines::photo::PhotoPipeline;
use chrono::{DateTime, Local};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Source of "now" for date stamps
pub type Clock = Arc<dyn Fn() -> DateTime<Local> + Send + Sync>;

#[derive(Debug, Default)]
struct BoothState {
    gallery: ShotGallery,
    is_capturing: bool,
    /// Shot whose lifecycle currently holds the guard
    in_flight: Option<ShotId>,
    scheduler: DevelopScheduler,
    /// Bumped by reset and shutdown so renders started before them are discarded
    epoch: u64,
}

fn lock(state: &Mutex<BoothState>) -> MutexGuard<'_, BoothState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Session controller for one capture profile
pub struct PhotoBooth {
    profile: CaptureProfile,
    pipeline: PhotoPipeline,
    feed: Mutex<Option<LiveFeed>>,
    state: Arc<Mutex<BoothState>>,
    clock: Clock,
}

impl PhotoBooth {
    pub fn new(profile: CaptureProfile) -> Self {
        Self {
            pipeline: PhotoPipeline::new(profile.layout.clone()),
            profile,
            feed: Mutex::new(None),
            state: Arc::new(Mutex::new(BoothState::default())),
            clock: Arc::new(Local::now),
        }
    }

    /// Use a fixed or simulated clock for date stamps
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn profile(&self) -> &CaptureProfile {
        &self.profile
    }

    // ===== Camera =====

    /// Acquire a camera and attach it
    ///
    /// # Errors
    /// `CameraError::AccessDenied` when the device is refused or missing.
    pub async fn try_mount(
        &self,
        backend: Box<dyn CameraBackend>,
        request: StreamRequest,
    ) -> Result<(), CameraError> {
        let kind = backend.backend_type();
        info!(backend = %kind, device = ?request.device, "Requesting camera stream");

        let feed = tokio::task::spawn_blocking(move || backend.start_stream(&request))
            .await
            .map_err(|e| CameraError::unavailable(format!("camera task failed: {}", e)))??;

        info!(device = %feed.device().name, format = %feed.format(), "Camera stream acquired");
        self.attach(feed);
        Ok(())
    }

    /// Acquire a camera; a refusal is logged and the booth stays without a source
    pub async fn mount(&self, backend: Box<dyn CameraBackend>, request: StreamRequest) -> bool {
        match self.try_mount(backend, request).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, reason = %e.reason(), "Camera unavailable; captures are disabled");
                false
            }
        }
    }

    /// Attach an already running feed, stopping any previous one
    pub fn attach(&self, feed: LiveFeed) {
        let previous = self
            .feed
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .replace(feed);
        if let Some(mut old) = previous {
            old.stop();
        }
    }

    /// Detach the feed without stopping it
    pub fn detach(&self) -> Option<LiveFeed> {
        self.feed.lock().unwrap_or_else(|p| p.into_inner()).take()
    }

    pub fn has_source(&self) -> bool {
        self.feed
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .is_some_and(LiveFeed::is_running)
    }

    /// Latest live frame, for previews
    pub fn current_frame(&self) -> Option<Arc<CameraFrame>> {
        self.feed
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .and_then(LiveFeed::current_frame)
    }

    /// Wait for the attached feed to deliver its first frame
    pub async fn wait_for_frame(&self, timeout: Duration) -> bool {
        let receiver = match self.feed.lock().unwrap_or_else(|p| p.into_inner()).as_ref() {
            Some(feed) => feed.subscribe(),
            None => return false,
        };
        let mut receiver = receiver;
        matches!(
            tokio::time::timeout(timeout, receiver.wait_for(|f| f.is_some())).await,
            Ok(Ok(_))
        )
    }

    // ===== Capture =====

    /// Capture one shot
    ///
    /// Returns the new shot id, or `None` when the capture was a no-op: no
    /// source, no frame yet, a degenerate capture region, or a capture
    /// already in flight.
    pub async fn capture(&self) -> Option<ShotId> {
        let Some(frame) = self.current_frame() else {
            debug!("Capture ignored: no live frame");
            return None;
        };
        if self
            .profile
            .layout
            .region
            .resolve(frame.width, frame.height)
            .is_none()
        {
            debug!(width = frame.width, height = frame.height, "Capture ignored: no surface");
            return None;
        }

        let epoch = {
            let mut state = lock(&self.state);
            if state.is_capturing {
                debug!("Capture ignored: already capturing");
                return None;
            }
            state.is_capturing = true;
            state.epoch
        };

        debug!(
            sequence = frame.sequence,
            age_ms = frame.captured_at.elapsed().as_millis(),
            "Capturing frame"
        );
        let date = format_capture_date(&(self.clock)());
        let photo = match self.pipeline.render(frame, date.clone()).await {
            Ok(photo) => photo,
            Err(e) => {
                warn!(error = %e, "Failed to render shot");
                let mut state = lock(&self.state);
                if state.epoch == epoch {
                    state.is_capturing = false;
                }
                return None;
            }
        };

        let lifecycle = self.profile.lifecycle;
        let shot = Shot {
            id: ShotId::new(),
            image: photo.data_uri,
            date,
            status: lifecycle.develops().then_some(ShotStatus::Developing),
        };
        let id = shot.id;

        let mut state = lock(&self.state);
        if state.epoch != epoch {
            // reset() or shutdown() ran while we were rendering; the guard is already clear
            debug!("Discarding shot rendered across a reset");
            return None;
        }
        state.gallery.add_shot(shot);
        state.in_flight = Some(id);

        // Spawned under the lock, so the task cannot forget itself before it is tracked
        let handle = tokio::spawn(run_lifecycle(
            Arc::clone(&self.state),
            id,
            lifecycle.guard_duration(),
        ));
        state.scheduler.insert(id, handle);

        info!(%id, status = ?lifecycle, total = state.gallery.len(), "Shot captured");
        Some(id)
    }

    // ===== Gallery =====

    /// Snapshot of the gallery, newest first
    pub fn shots(&self) -> Vec<Shot> {
        lock(&self.state).gallery.iter().cloned().collect()
    }

    pub fn shot(&self, id: ShotId) -> Option<Shot> {
        lock(&self.state).gallery.get(id).cloned()
    }

    pub fn shot_count(&self) -> usize {
        lock(&self.state).gallery.len()
    }

    pub fn is_capturing(&self) -> bool {
        lock(&self.state).is_capturing
    }

    pub fn pending_transitions(&self) -> usize {
        lock(&self.state).scheduler.pending_count()
    }

    /// Drop one shot, cancelling its pending transition
    pub fn remove(&self, id: ShotId) -> Option<Shot> {
        let mut state = lock(&self.state);
        state.scheduler.cancel(id);
        if state.in_flight == Some(id) {
            state.in_flight = None;
            state.is_capturing = false;
        }
        state.gallery.remove(id)
    }

    /// Clear the gallery, cancel pending transitions and release the guard
    pub fn reset(&self) {
        let mut state = lock(&self.state);
        state.scheduler.cancel_all();
        state.gallery.reset();
        state.in_flight = None;
        state.is_capturing = false;
        state.epoch = state.epoch.wrapping_add(1);
        info!("Booth reset");
    }

    /// Cancel pending transitions and release the camera
    ///
    /// Shots keep whatever status they had.
    pub fn shutdown(&self) {
        {
            let mut state = lock(&self.state);
            state.scheduler.cancel_all();
            state.in_flight = None;
            state.is_capturing = false;
            state.epoch = state.epoch.wrapping_add(1);
        }
        if let Some(mut feed) = self.detach() {
            feed.stop();
        }
        info!("Booth shut down");
    }
}

impl Drop for PhotoBooth {
    fn drop(&mut self) {
        lock(&self.state).scheduler.cancel_all();
    }
}

/// Wait out the guard, then promote the shot and release the guard
async fn run_lifecycle(state: Arc<Mutex<BoothState>>, id: ShotId, wait: Duration) {
    tokio::time::sleep(wait).await;

    let mut state = lock(&state);
    if state.gallery.mark_reviewed(id) {
        debug!(%id, "Shot reviewed");
    }
    if state.in_flight == Some(id) {
        state.in_flight = None;
        state.is_capturing = false;
    }
    state.scheduler.forget(id);
}
