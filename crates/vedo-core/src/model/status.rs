// ── Alarm status ──

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumIter, IntoEnumIterator};

/// Alarm state of one area, or of the whole panel.
///
/// Serialized as its numeric code (`NotEntered = 0` .. `Unknown = 5`) so
/// existing dashboards keep working; `Display` gives the variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum AlarmStatus {
    NotEntered,
    Activating,
    Active,
    PartialActive,
    Alarm,
    Unknown,
}

impl AlarmStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::NotEntered => 0,
            Self::Activating => 1,
            Self::Active => 2,
            Self::PartialActive => 3,
            Self::Alarm => 4,
            Self::Unknown => 5,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::iter().find(|status| status.code() == code)
    }

    /// Fully or partially armed (exit delay not included).
    pub fn is_armed(self) -> bool {
        matches!(self, Self::Active | Self::PartialActive)
    }
}

impl Serialize for AlarmStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for AlarmStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        Self::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown alarm status code {code}")))
    }
}

/// Panel-wide status as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralStatus {
    pub id: AlarmStatus,
    pub description: String,
}

impl GeneralStatus {
    pub fn unknown() -> Self {
        Self::from(AlarmStatus::Unknown)
    }
}

impl From<AlarmStatus> for GeneralStatus {
    fn from(id: AlarmStatus) -> Self {
        Self {
            id,
            description: id.to_string(),
        }
    }
}
