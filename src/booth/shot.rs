// SPDX-License-Identifier: GPL-3.0-only

//! Shot records

use crate::constants::stamp;
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique shot identifier (UUID v4, never reused)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShotId(Uuid);

impl ShotId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ShotId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ShotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Simulated film processing state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShotStatus {
    Developing,
    Reviewed,
}

/// One captured photograph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shot {
    pub id: ShotId,
    /// PNG data URI
    pub image: String,
    /// Capture date, e.g. `19 Oct 2026`
    pub date: String,
    /// Only set by profiles with a developing stage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ShotStatus>,
}

impl Shot {
    pub fn is_developing(&self) -> bool {
        self.status == Some(ShotStatus::Developing)
    }
}

/// Format the stamp date: two-digit day, short month, full year
pub fn format_capture_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(stamp::DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_date_format() {
        let at = Utc.with_ymd_and_hms(2026, 3, 7, 18, 30, 0).unwrap();
        assert_eq!(format_capture_date(&at), "07 Mar 2026");
    }

    #[test]
    fn test_ids_are_unique() {
        let ids: std::collections::HashSet<_> = (0..100).map(|_| ShotId::new()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_serialized_shape() {
        let shot = Shot {
            id: ShotId::new(),
            image: "data:image/png;base64,AA==".into(),
            date: "19 Oct 2026".into(),
            status: Some(ShotStatus::Developing),
        };
        let json = serde_json::to_value(&shot).unwrap();
        assert_eq!(json["status"], "developing");
        assert_eq!(json["id"], shot.id.to_string());

        let plain = Shot {
            status: None,
            ..shot
        };
        let json = serde_json::to_value(&plain).unwrap();
        assert!(json.get("status").is_none());
    }
}
