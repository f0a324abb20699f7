use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the `vedo-api` crate.
///
/// Covers every failure mode of the panel wire protocol and session
/// lifecycle. `vedo-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected (wrong key, panel locked out, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The panel answered with `logged: 0` -- the session cookie is gone.
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    /// Transparent renewal of an expired session failed.
    #[error("Session renewal failed: {message}")]
    SessionRenewal { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error that is neither a timeout nor a connect failure.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The panel could not be reached (connection refused, reset, DNS).
    #[error("Panel unreachable: {message}")]
    Unreachable { message: String },

    /// No reply within the configured deadline.
    #[error("Request timed out after {after:?}")]
    Timeout { after: Duration },

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Panel replies ───────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Reply was well-formed JSON but not what the request expected.
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// The panel explicitly refused an action (unknown area/zone, etc.)
    #[error("Command rejected by panel: {message}")]
    Rejected { message: String },
}

impl Error {
    /// Classify a `reqwest` failure into timeout / unreachable / other.
    pub(crate) fn from_reqwest(err: reqwest::Error, deadline: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout { after: deadline }
        } else if is_channel_loss(&err) {
            Self::Unreachable {
                message: err.to_string(),
            }
        } else {
            Self::Transport(err)
        }
    }

    /// Returns `true` if the channel to the panel was lost.
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::Unreachable { .. } => true,
            Self::Transport(e) => !e.is_timeout() && is_channel_loss(e),
            _ => false,
        }
    }
}

/// Connect failures, and connections dropped before any HTTP status arrived.
fn is_channel_loss(err: &reqwest::Error) -> bool {
    err.is_connect() || ((err.is_request() || err.is_body()) && err.status().is_none())
}
