// SPDX-License-Identifier: GPL-3.0-only

//! Cancelable delayed shot transitions, keyed by shot id

use super::shot::ShotId;
use std::collections::HashMap;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Default)]
pub struct DevelopScheduler {
    pending: HashMap<ShotId, JoinHandle<()>>,
}

impl DevelopScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a spawned transition task; replaces (and aborts) any previous one
    pub fn insert(&mut self, id: ShotId, handle: JoinHandle<()>) {
        if let Some(old) = self.pending.insert(id, handle) {
            old.abort();
        }
    }

    /// Drop bookkeeping for a task that has run to completion
    pub fn forget(&mut self, id: ShotId) {
        self.pending.remove(&id);
    }

    /// Abort the pending transition for `id`
    pub fn cancel(&mut self, id: ShotId) -> bool {
        match self.pending.remove(&id) {
            Some(handle) => {
                handle.abort();
                debug!(%id, "Cancelled pending transition");
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        if !self.pending.is_empty() {
            debug!(count = self.pending.len(), "Cancelling all pending transitions");
        }
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for DevelopScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_transition() {
        let fired = Arc::new(AtomicBool::new(false));
        let fired_clone = Arc::clone(&fired);
        let id = ShotId::new();

        let mut scheduler = DevelopScheduler::new();
        scheduler.insert(
            id,
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(3)).await;
                fired_clone.store(true, Ordering::SeqCst);
            }),
        );
        assert_eq!(scheduler.pending_count(), 1);
        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all() {
        let mut scheduler = DevelopScheduler::new();
        for _ in 0..3 {
            scheduler.insert(
                ShotId::new(),
                tokio::spawn(tokio::time::sleep(Duration::from_secs(1))),
            );
        }
        assert_eq!(scheduler.pending_count(), 3);
        scheduler.cancel_all();
        assert_eq!(scheduler.pending_count(), 0);
    }
}
