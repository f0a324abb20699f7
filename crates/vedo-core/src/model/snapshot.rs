// ── Status snapshot ──

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use super::area::{Area, Zone};
use super::scope::ZoneFilter;
use super::status::AlarmStatus;

/// Point-in-time capture of every area and zone.
///
/// Produced whole from one successful panel read and never updated in
/// place; the status cache swaps in a new one instead.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub areas: Vec<Area>,
    pub zones: Vec<Zone>,
    pub captured_at: DateTime<Utc>,
    captured: Instant,
}

impl StatusSnapshot {
    pub fn new(areas: Vec<Area>, zones: Vec<Zone>) -> Self {
        Self {
            areas,
            zones,
            captured_at: Utc::now(),
            captured: Instant::now(),
        }
    }

    pub fn age(&self) -> Duration {
        self.captured.elapsed()
    }

    pub fn area(&self, id: u32) -> Option<&Area> {
        self.areas.iter().find(|a| a.id == id)
    }

    pub fn zones(&self, filter: ZoneFilter) -> impl Iterator<Item = &Zone> {
        self.zones.iter().filter(move |z| filter.matches(z))
    }

    /// Panel-wide status.
    ///
    /// First match wins: any alarm, then all areas fully armed (true for
    /// an empty panel), then any area armed, otherwise not entered.
    pub fn general_status(&self) -> AlarmStatus {
        if self.areas.iter().any(|a| a.alarm) {
            AlarmStatus::Alarm
        } else if self.areas.iter().all(|a| a.status == AlarmStatus::Active) {
            AlarmStatus::Active
        } else if self.areas.iter().any(|a| a.armed) {
            AlarmStatus::PartialActive
        } else {
            AlarmStatus::NotEntered
        }
    }

    /// Any area fully or partially armed.
    pub fn is_alarm_active(&self) -> bool {
        self.areas.iter().any(|a| a.status.is_armed())
    }
}
