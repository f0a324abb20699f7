// vedo-core: Domain layer between vedo-api and consumers (HTTP gateway).

pub mod command;
pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod model;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::Command;
pub use config::{PanelConfig, TlsVerification};
pub use controller::{ConnectionState, Vedo};
pub use error::CoreError;
pub use store::StatusCache;

pub use model::{
    AlarmStatus, Area, AreaScope, GeneralStatus, ScopeParseError, StatusSnapshot, Zone,
    ZoneFilter,
};
