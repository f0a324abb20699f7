// ── Panel readout to domain conversions ──
//
// Bridges the raw per-index arrays from `vedo_api::models` into `Area` and
// `Zone` values. The panel reports everything as parallel arrays indexed by
// area or zone number; a missing trailing entry means "no data".

use tracing::debug;

use vedo_api::models::{AreaDescriptions, AreaStatus, ZoneDescriptions, ZoneStatus};

use crate::error::CoreError;
use crate::model::{AlarmStatus, Area, StatusSnapshot, Zone};

// ── Zone status word bits ──────────────────────────────────────────

const ZONE_OPEN: u16 = 0x0001;
const ZONE_TRIGGERED: u16 = 0x0002;
const ZONE_EXCLUDED: u16 = 0x0080;
const ZONE_ISOLATED: u16 = 0x0100;

/// `armed` code for total arming; 1..=3 are the partial programmes.
const ARMED_TOTAL: u8 = 4;

/// One complete read of the four status endpoints.
#[derive(Debug, Clone, Default)]
pub struct PanelReadout {
    pub area_descriptions: AreaDescriptions,
    pub area_status: AreaStatus,
    pub zone_descriptions: ZoneDescriptions,
    pub zone_status: ZoneStatus,
}

fn flag(values: &[u8], index: usize) -> bool {
    values.get(index).is_some_and(|v| *v != 0)
}

fn name_at(names: &[String], index: usize) -> String {
    names.get(index).map(|n| n.trim().to_owned()).unwrap_or_default()
}

// ── Areas ──────────────────────────────────────────────────────────

/// Derive the status of the area at `index`. First match wins.
pub fn area_status(stat: &AreaStatus, index: usize) -> AlarmStatus {
    if flag(&stat.alarm, index) {
        return AlarmStatus::Alarm;
    }
    let Some(&armed) = stat.armed.get(index) else {
        return AlarmStatus::Unknown;
    };
    match armed {
        0 => AlarmStatus::NotEntered,
        _ if flag(&stat.out_time, index) => AlarmStatus::Activating,
        ARMED_TOTAL => AlarmStatus::Active,
        1..=3 => AlarmStatus::PartialActive,
        _ => AlarmStatus::Unknown,
    }
}

/// Build every present area, in panel order.
pub fn areas(desc: &AreaDescriptions, stat: &AreaStatus) -> Vec<Area> {
    (0u32..)
        .zip(desc.present.iter().enumerate())
        .filter(|(_, (_, present))| **present != 0)
        .map(|(id, (i, _))| Area {
            id,
            name: name_at(&desc.description, i),
            armed: flag(&stat.armed, i),
            alarm: flag(&stat.alarm, i),
            status: area_status(stat, i),
            ready: flag(&stat.ready, i),
            sabotage: flag(&stat.sabotage, i),
            anomaly: flag(&stat.anomaly, i),
            alarm_memory: flag(&stat.alarm_memory, i),
        })
        .collect()
}

// ── Zones ──────────────────────────────────────────────────────────

/// Area a zone belongs to: the lowest bit set in its `in_area` mask.
fn owning_area(mask: u32) -> Option<u32> {
    (mask != 0).then(|| mask.trailing_zeros())
}

/// Build every present zone whose area is in `areas`, in panel order.
///
/// Zones pointing at an unknown area are dropped. A present zone without a
/// valid status word fails the whole conversion.
pub fn zones(
    desc: &ZoneDescriptions,
    stat: &ZoneStatus,
    areas: &[Area],
) -> Result<Vec<Zone>, CoreError> {
    let words = stat
        .words()
        .map_err(|tok| CoreError::protocol(format!("bad zone status word `{tok}`")))?;

    let mut zones = Vec::new();
    for (id, (i, present)) in (0u32..).zip(desc.present.iter().enumerate()) {
        if *present == 0 {
            continue;
        }

        let mask = desc.in_area.get(i).copied().unwrap_or_default();
        let Some(area_id) = owning_area(mask).filter(|a| areas.iter().any(|x| x.id == *a))
        else {
            debug!(zone = id, mask, "dropping zone with no known area");
            continue;
        };

        let word = words
            .get(i)
            .copied()
            .ok_or_else(|| CoreError::protocol(format!("no status word for zone {id}")))?;

        zones.push(Zone {
            id,
            area_id,
            name: name_at(&desc.description, i),
            excluded: word & ZONE_EXCLUDED != 0,
            isolated: word & ZONE_ISOLATED != 0,
            open: word & ZONE_OPEN != 0,
            triggered: word & ZONE_TRIGGERED != 0,
        });
    }
    Ok(zones)
}

// ── Snapshot ───────────────────────────────────────────────────────

/// Turn one complete readout into a snapshot stamped now.
pub fn snapshot(readout: &PanelReadout) -> Result<StatusSnapshot, CoreError> {
    let areas = areas(&readout.area_descriptions, &readout.area_status);
    let zones = zones(&readout.zone_descriptions, &readout.zone_status, &areas)?;
    debug!(areas = areas.len(), zones = zones.len(), "panel status converted");
    Ok(StatusSnapshot::new(areas, zones))
}
