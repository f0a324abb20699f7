// ── Domain model ──
//
// Canonical types consumers see. Nothing here knows about the panel's
// wire format; `convert` builds these from raw readouts.

pub mod area;
pub mod scope;
pub mod snapshot;
pub mod status;

pub use area::{Area, Zone};
pub use scope::{AreaScope, ScopeParseError, ZoneFilter};
pub use snapshot::StatusSnapshot;
pub use status::{AlarmStatus, GeneralStatus};
