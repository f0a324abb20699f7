//! HTTP gateway for a Comelit Vedo alarm panel.
//!
//! The binary wires config, tracing and signal handling around
//! [`routes::router`]; the library half exists so the router can be driven
//! in tests without a socket.

pub mod cli;
pub mod error;
pub mod routes;

pub use error::{ApiError, StartupError};
pub use routes::router;
