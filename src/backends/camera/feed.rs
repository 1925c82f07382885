// SPDX-License-Identifier: GPL-3.0-only

//! Live camera feed handle
//!
//! A `LiveFeed` is what a backend hands back once the camera is acquired. It
//! always exposes the most recent frame (like a `<video>` element showing the
//! current picture) through a `tokio::sync::watch` channel, so readers never
//! queue up stale frames.

use super::types::{CameraDevice, CameraFormat, CameraFrame};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Sending half used by capture threads
pub type FrameSender = watch::Sender<Option<Arc<CameraFrame>>>;

/// Receiving half held by the feed
pub type FrameReceiver = watch::Receiver<Option<Arc<CameraFrame>>>;

/// Create an empty latest-frame channel
pub fn frame_channel() -> (FrameSender, FrameReceiver) {
    watch::channel(None)
}

/// An acquired camera stream
pub struct LiveFeed {
    device: CameraDevice,
    format: CameraFormat,
    frames: FrameReceiver,
    running: Arc<AtomicBool>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

impl LiveFeed {
    /// Feed backed by a capture thread that publishes into `frames`
    ///
    /// The thread must exit promptly once `running` goes false.
    pub fn with_thread(
        device: CameraDevice,
        format: CameraFormat,
        frames: FrameReceiver,
        running: Arc<AtomicBool>,
        thread_handle: std::thread::JoinHandle<()>,
    ) -> Self {
        Self {
            device,
            format,
            frames,
            running,
            thread_handle: Some(thread_handle),
        }
    }

    /// Feed that serves one frozen frame forever
    pub fn still(device: CameraDevice, frame: CameraFrame) -> Self {
        let format = CameraFormat {
            width: frame.width,
            height: frame.height,
            framerate: None,
            pixel_format: "RGBA".to_string(),
        };
        // The receiver keeps the last value after the sender is gone
        let (_sender, frames) = watch::channel(Some(Arc::new(frame)));
        Self {
            device,
            format,
            frames,
            running: Arc::new(AtomicBool::new(true)),
            thread_handle: None,
        }
    }

    pub fn device(&self) -> &CameraDevice {
        &self.device
    }

    pub fn format(&self) -> &CameraFormat {
        &self.format
    }

    /// Whether the feed is still delivering
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The newest frame, if any has arrived yet
    pub fn current_frame(&self) -> Option<Arc<CameraFrame>> {
        if !self.is_running() {
            return None;
        }
        self.frames.borrow().clone()
    }

    /// Native size of the source: the latest frame, else the negotiated format
    pub fn native_size(&self) -> (u32, u32) {
        match self.frames.borrow().as_ref() {
            Some(frame) => (frame.width, frame.height),
            None => (self.format.width, self.format.height),
        }
    }

    /// Independent handle on the latest-frame channel
    pub fn subscribe(&self) -> FrameReceiver {
        self.frames.clone()
    }

    /// Wait until the first frame shows up, or give up after `timeout`
    pub async fn wait_for_frame(&self, timeout: Duration) -> Option<Arc<CameraFrame>> {
        let mut frames = self.frames.clone();
        let ready = tokio::time::timeout(timeout, frames.wait_for(|f| f.is_some())).await;
        match ready {
            Ok(Ok(frame)) => frame.clone(),
            Ok(Err(_)) => {
                warn!(device = %self.device.name, "Capture thread exited before the first frame");
                None
            }
            Err(_) => {
                warn!(device = %self.device.name, ?timeout, "Timed out waiting for first frame");
                None
            }
        }
    }

    /// Stop the capture thread and wait for it to finish
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            match handle.join() {
                Ok(()) => info!(device = %self.device.name, "Capture thread stopped"),
                Err(_) => warn!(device = %self.device.name, "Capture thread panicked"),
            }
        }
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        debug!(device = %self.device.name, "Dropping live feed");
        // Don't join in drop, the thread may be blocked on a dequeue
        self.running.store(false, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for LiveFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveFeed")
            .field("device", &self.device.name)
            .field("format", &self.format)
            .field("running", &self.is_running())
            .finish()
    }
}
