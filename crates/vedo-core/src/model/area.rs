// ── Area and zone domain types ──

use serde::{Deserialize, Serialize};

use super::status::AlarmStatus;

/// A partition of the premises, armed and disarmed as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    /// Panel index of the area.
    pub id: u32,
    pub name: String,
    pub armed: bool,
    pub alarm: bool,
    pub status: AlarmStatus,
    /// No open zone prevents arming.
    pub ready: bool,
    pub sabotage: bool,
    pub anomaly: bool,
    /// An alarm went off since the area was last armed.
    pub alarm_memory: bool,
}

impl Area {
    /// Armed, or counting down to armed.
    pub fn is_active(&self) -> bool {
        matches!(self.status, AlarmStatus::Active | AlarmStatus::Activating)
    }
}

/// A single sensor input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: u32,
    pub area_id: u32,
    pub name: String,
    pub excluded: bool,
    pub isolated: bool,
    pub open: bool,
    pub triggered: bool,
}
