// SPDX-License-Identifier: GPL-3.0-only

//! In-memory, newest-first shot collection

use super::shot::{Shot, ShotId, ShotStatus};
use std::collections::VecDeque;
use tracing::debug;

/// Session gallery; unbounded and never persisted
#[derive(Debug, Default, Clone)]
pub struct ShotGallery {
    shots: VecDeque<Shot>,
}

impl ShotGallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the front
    pub fn add_shot(&mut self, shot: Shot) {
        debug!(id = %shot.id, total = self.shots.len() + 1, "Shot added");
        self.shots.push_front(shot);
    }

    /// Move a developing shot to reviewed
    ///
    /// Returns false if the shot is unknown or was not developing.
    pub fn mark_reviewed(&mut self, id: ShotId) -> bool {
        match self.shots.iter_mut().find(|s| s.id == id) {
            Some(shot) if shot.is_developing() => {
                shot.status = Some(ShotStatus::Reviewed);
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, id: ShotId) -> Option<Shot> {
        let idx = self.shots.iter().position(|s| s.id == id)?;
        self.shots.remove(idx)
    }

    pub fn reset(&mut self) {
        self.shots.clear();
    }

    pub fn get(&self, id: ShotId) -> Option<&Shot> {
        self.shots.iter().find(|s| s.id == id)
    }

    /// Newest first
    pub fn iter(&self) -> impl Iterator<Item = &Shot> {
        self.shots.iter()
    }

    pub fn len(&self) -> usize {
        self.shots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shot(status: Option<ShotStatus>) -> Shot {
        Shot {
            id: ShotId::new(),
            image: "data:image/png;base64,".into(),
            date: "01 Jan 2026".into(),
            status,
        }
    }

    #[test]
    fn test_prepend_order() {
        let mut gallery = ShotGallery::new();
        let first = shot(None);
        let second = shot(None);
        gallery.add_shot(first.clone());
        gallery.add_shot(second.clone());

        let ids: Vec<_> = gallery.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn test_mark_reviewed_once() {
        let mut gallery = ShotGallery::new();
        let s = shot(Some(ShotStatus::Developing));
        let id = s.id;
        gallery.add_shot(s.clone());

        assert!(gallery.mark_reviewed(id));
        assert!(!gallery.mark_reviewed(id), "reviewed is terminal");

        let after = gallery.get(id).unwrap();
        assert_eq!(after.status, Some(ShotStatus::Reviewed));
        assert_eq!(after.image, s.image);
        assert_eq!(after.date, s.date);
    }

    #[test]
    fn test_mark_reviewed_ignores_plain_shots() {
        let mut gallery = ShotGallery::new();
        let s = shot(None);
        let id = s.id;
        gallery.add_shot(s);
        assert!(!gallery.mark_reviewed(id));
        assert!(!gallery.mark_reviewed(ShotId::new()));
    }

    #[test]
    fn test_remove_and_reset() {
        let mut gallery = ShotGallery::new();
        let s = shot(Some(ShotStatus::Developing));
        let id = s.id;
        gallery.add_shot(s);
        gallery.add_shot(shot(None));
        assert_eq!(gallery.iter().filter(|s| s.is_developing()).count(), 1);

        assert!(gallery.remove(id).is_some());
        assert_eq!(gallery.len(), 1);
        gallery.reset();
        assert!(gallery.is_empty());
    }
}
