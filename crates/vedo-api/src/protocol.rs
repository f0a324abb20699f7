// Panel request/reply vocabulary
//
// The session speaks in `PanelRequest` / `PanelReply` pairs so it can stay
// ignorant of HTTP details. `PanelTransport` is the seam between the
// session and the wire; `VedoClient` is the production implementation.

use std::fmt;
use std::future::Future;

use secrecy::SecretString;

use crate::error::Error;
use crate::models::{AreaDescriptions, AreaStatus, ZoneDescriptions, ZoneStatus};

/// Panel index that addresses every area at once.
pub const ALL_AREAS_INDEX: u32 = 32;

/// Which area(s) an arming command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaTarget {
    All,
    Index(u32),
}

impl AreaTarget {
    /// Index value sent on the wire.
    pub fn wire_index(self) -> u32 {
        match self {
            Self::All => ALL_AREAS_INDEX,
            Self::Index(i) => i,
        }
    }
}

/// A state-mutating panel action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    Arm(AreaTarget),
    Disarm(AreaTarget),
    ExcludeZone(u32),
    IncludeZone(u32),
    IsolateZone(u32),
    UnisolateZone(u32),
}

impl PanelAction {
    /// `action.cgi` verb for this action.
    pub fn verb(self) -> &'static str {
        match self {
            Self::Arm(_) => "tot",
            Self::Disarm(_) => "dis",
            Self::ExcludeZone(_) => "excl",
            Self::IncludeZone(_) => "incl",
            Self::IsolateZone(_) => "isol",
            Self::UnisolateZone(_) => "unisol",
        }
    }

    /// Index argument for the verb.
    pub fn index(self) -> u32 {
        match self {
            Self::Arm(target) | Self::Disarm(target) => target.wire_index(),
            Self::ExcludeZone(z)
            | Self::IncludeZone(z)
            | Self::IsolateZone(z)
            | Self::UnisolateZone(z) => z,
        }
    }
}

impl fmt::Display for PanelAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.verb(), self.index())
    }
}

/// One request/response exchange with the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelRequest {
    AreaDescriptions,
    AreaStatus,
    ZoneDescriptions,
    ZoneStatus,
    Action(PanelAction),
}

/// How the panel acknowledged an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Accepted,
    /// The target was already in the requested state; treated as success.
    AlreadyInState,
}

/// Parsed reply to a [`PanelRequest`].
#[derive(Debug, Clone)]
pub enum PanelReply {
    AreaDescriptions(AreaDescriptions),
    AreaStatus(AreaStatus),
    ZoneDescriptions(ZoneDescriptions),
    ZoneStatus(ZoneStatus),
    Action(ActionOutcome),
}

impl PanelReply {
    fn kind(&self) -> &'static str {
        match self {
            Self::AreaDescriptions(_) => "area descriptions",
            Self::AreaStatus(_) => "area status",
            Self::ZoneDescriptions(_) => "zone descriptions",
            Self::ZoneStatus(_) => "zone status",
            Self::Action(_) => "action acknowledgement",
        }
    }

    fn mismatch(self, expected: &str) -> Error {
        Error::Protocol {
            message: format!("expected {expected}, got {}", self.kind()),
        }
    }

    pub fn into_area_descriptions(self) -> Result<AreaDescriptions, Error> {
        match self {
            Self::AreaDescriptions(v) => Ok(v),
            other => Err(other.mismatch("area descriptions")),
        }
    }

    pub fn into_area_status(self) -> Result<AreaStatus, Error> {
        match self {
            Self::AreaStatus(v) => Ok(v),
            other => Err(other.mismatch("area status")),
        }
    }

    pub fn into_zone_descriptions(self) -> Result<ZoneDescriptions, Error> {
        match self {
            Self::ZoneDescriptions(v) => Ok(v),
            other => Err(other.mismatch("zone descriptions")),
        }
    }

    pub fn into_zone_status(self) -> Result<ZoneStatus, Error> {
        match self {
            Self::ZoneStatus(v) => Ok(v),
            other => Err(other.mismatch("zone status")),
        }
    }

    pub fn into_action_outcome(self) -> Result<ActionOutcome, Error> {
        match self {
            Self::Action(v) => Ok(v),
            other => Err(other.mismatch("action acknowledgement")),
        }
    }
}

/// Wire-level access to a panel.
///
/// Implementations perform exactly one network round trip per call and keep
/// no ordering guarantees of their own -- serialization, renewal, and
/// deadlines are the [`Session`](crate::Session)'s job.
pub trait PanelTransport: Send + Sync + 'static {
    /// Authenticate with the panel key.
    fn login(&self, key: &SecretString) -> impl Future<Output = Result<(), Error>> + Send;

    /// End the current panel session.
    fn logout(&self) -> impl Future<Output = Result<(), Error>> + Send;

    /// Perform one request and parse its reply.
    fn send(&self, request: PanelRequest) -> impl Future<Output = Result<PanelReply, Error>> + Send;
}
