// vedo-api: Async Rust client and session management for Comelit Vedo alarm panels

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod protocol;
pub mod session;
pub mod transport;

pub use client::VedoClient;
pub use error::Error;
pub use protocol::{
    ALL_AREAS_INDEX, ActionOutcome, AreaTarget, PanelAction, PanelReply, PanelRequest,
    PanelTransport,
};
pub use session::{Session, SessionConfig};
pub use transport::{TlsMode, TransportConfig};
