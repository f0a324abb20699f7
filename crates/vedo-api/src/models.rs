// Raw panel response types
//
// Models for the Vedo web interface JSON. Every payload carries a `logged`
// flag; the arrays are positional (index == area/zone number). Fields use
// `#[serde(default)]` liberally because firmware revisions omit arrays
// they have nothing to report in.

use serde::{Deserialize, Serialize};

/// The `logged` flag shared by every panel payload.
///
/// Parsed before the real payload so an expired session is reported as
/// such instead of as a shape mismatch.
#[derive(Debug, Deserialize)]
pub(crate) struct LoggedFlag {
    #[serde(default)]
    pub logged: Option<u8>,
}

// ── Login ────────────────────────────────────────────────────────────

/// Reply to `POST /login.cgi`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginReply {
    #[serde(default)]
    pub logged: u8,
    /// Seconds of inactivity before the panel drops the session, when reported.
    #[serde(default)]
    pub life: Option<u64>,
}

// ── Areas ────────────────────────────────────────────────────────────

/// `GET /user/area_desc.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AreaDescriptions {
    #[serde(default)]
    pub present: Vec<u8>,
    #[serde(default)]
    pub description: Vec<String>,
    /// Partial programme P1 enabled per area.
    #[serde(default)]
    pub p1_pres: Vec<u8>,
    /// Partial programme P2 enabled per area.
    #[serde(default)]
    pub p2_pres: Vec<u8>,
}

/// `GET /user/area_stat.json`
///
/// `armed` codes: 0 = disarmed, 1 = P1, 2 = P2, 3 = P1+P2, 4 = total.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AreaStatus {
    #[serde(default)]
    pub ready: Vec<u8>,
    #[serde(default)]
    pub armed: Vec<u8>,
    #[serde(default)]
    pub alarm: Vec<u8>,
    #[serde(default)]
    pub alarm_memory: Vec<u8>,
    #[serde(default)]
    pub sabotage: Vec<u8>,
    #[serde(default)]
    pub anomaly: Vec<u8>,
    /// Entry delay running.
    #[serde(default)]
    pub in_time: Vec<u8>,
    /// Exit delay running.
    #[serde(default)]
    pub out_time: Vec<u8>,
}

// ── Zones ────────────────────────────────────────────────────────────

/// `GET /user/zone_desc.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneDescriptions {
    #[serde(default)]
    pub present: Vec<u8>,
    /// Bitmask of the areas each zone belongs to.
    #[serde(default)]
    pub in_area: Vec<u32>,
    #[serde(default)]
    pub description: Vec<String>,
}

/// `GET /user/zone_stat.json`
///
/// `status` is a comma-separated list of hex words, one per zone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneStatus {
    #[serde(default)]
    pub status: String,
}

impl ZoneStatus {
    /// Split the status string into per-zone words.
    ///
    /// Returns the offending token on the first word that is not valid hex.
    pub fn words(&self) -> Result<Vec<u16>, String> {
        let trimmed = self.status.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        trimmed
            .split(',')
            .map(|tok| {
                let tok = tok.trim();
                u16::from_str_radix(tok, 16).map_err(|_| tok.to_owned())
            })
            .collect()
    }
}

// ── Actions ──────────────────────────────────────────────────────────

/// Reply to `GET /action.cgi`.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionReply {
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_status_words_parse_hex() {
        let stat = ZoneStatus {
            status: "0001,0000, 0180,0002".into(),
        };
        assert_eq!(stat.words(), Ok(vec![0x0001, 0x0000, 0x0180, 0x0002]));
    }

    #[test]
    fn zone_status_empty_string_has_no_words() {
        assert_eq!(ZoneStatus::default().words(), Ok(Vec::new()));
    }

    #[test]
    fn zone_status_reports_bad_token() {
        let stat = ZoneStatus {
            status: "0001,zz01".into(),
        };
        assert_eq!(stat.words(), Err("zz01".to_owned()));
    }
}
