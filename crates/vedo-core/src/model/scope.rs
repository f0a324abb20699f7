// ── Command and query scopes ──
//
// Both scopes arrive as a path segment: `all` or a decimal panel index.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use thiserror::Error;
use vedo_api::AreaTarget;

use super::area::Zone;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected `all` or an area number, got `{input}`")]
pub struct ScopeParseError {
    pub input: String,
}

fn parse_scope(s: &str) -> Result<Option<u32>, ScopeParseError> {
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    trimmed.parse().map(Some).map_err(|_| ScopeParseError {
        input: s.to_owned(),
    })
}

/// Target of arm, disarm and toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaScope {
    All,
    Area(u32),
}

impl AreaScope {
    pub(crate) fn target(self) -> AreaTarget {
        match self {
            Self::All => AreaTarget::All,
            Self::Area(id) => AreaTarget::Index(id),
        }
    }
}

impl FromStr for AreaScope {
    type Err = ScopeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(parse_scope(s)?.map_or(Self::All, Self::Area))
    }
}

impl fmt::Display for AreaScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Area(id) => write!(f, "{id}"),
        }
    }
}

impl<'de> Deserialize<'de> for AreaScope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Which zones a zone listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneFilter {
    All,
    Area(u32),
}

impl ZoneFilter {
    pub fn matches(self, zone: &Zone) -> bool {
        match self {
            Self::All => true,
            Self::Area(id) => zone.area_id == id,
        }
    }
}

impl FromStr for ZoneFilter {
    type Err = ScopeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(parse_scope(s)?.map_or(Self::All, Self::Area))
    }
}

impl<'de> Deserialize<'de> for ZoneFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl From<AreaScope> for ZoneFilter {
    fn from(scope: AreaScope) -> Self {
        match scope {
            AreaScope::All => Self::All,
            AreaScope::Area(id) => Self::Area(id),
        }
    }
}
