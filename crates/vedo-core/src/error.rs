// ── Core error types ──
//
// Domain-level errors from vedo-core. Consumers never see HTTP status codes
// or JSON parse failures directly; `From<vedo_api::Error>` folds the
// wire-level variants into the kinds below.

use thiserror::Error;

/// Unified error type for the core crate.
///
/// `Clone` so a single in-flight status refresh can hand the same failure
/// to every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Session errors ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Panel session error: {message}")]
    Session { message: String },

    // ── Connectivity errors ──────────────────────────────────────────
    #[error("Panel unreachable: {message}")]
    Unreachable { message: String },

    #[error("Panel did not answer in time: {message}")]
    Timeout { message: String },

    // ── Panel replies ────────────────────────────────────────────────
    #[error("Unexpected reply from panel: {message}")]
    Protocol { message: String },

    #[error("Command rejected by panel: {message}")]
    CommandRejected { message: String },

    // ── Lifecycle ────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Panel client is not connected")]
    Disconnected,
}

impl CoreError {
    /// Returns `true` if the channel to the panel was lost and a fresh
    /// session might succeed.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }

    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

// ── Conversion from wire-level errors ────────────────────────────────

impl From<vedo_api::Error> for CoreError {
    fn from(err: vedo_api::Error) -> Self {
        let lost = err.is_unreachable();
        match err {
            vedo_api::Error::Authentication { message } => CoreError::Authentication { message },
            vedo_api::Error::SessionExpired => CoreError::Session {
                message: "session expired -- re-authentication required".into(),
            },
            vedo_api::Error::SessionRenewal { message } => CoreError::Session {
                message: format!("renewal failed: {message}"),
            },
            vedo_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout {
                        message: e.to_string(),
                    }
                } else if lost {
                    CoreError::Unreachable {
                        message: e.to_string(),
                    }
                } else {
                    CoreError::Protocol {
                        message: e.to_string(),
                    }
                }
            }
            vedo_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid panel URL: {e}"),
            },
            vedo_api::Error::Unreachable { message } => CoreError::Unreachable { message },
            vedo_api::Error::Timeout { after } => CoreError::Timeout {
                message: format!("no reply within {after:?}"),
            },
            vedo_api::Error::Tls(msg) => CoreError::Unreachable {
                message: format!("TLS error: {msg}"),
            },
            vedo_api::Error::Deserialization { message, body: _ } => {
                CoreError::Protocol { message }
            }
            vedo_api::Error::Protocol { message } => CoreError::Protocol { message },
            vedo_api::Error::Rejected { message } => CoreError::CommandRejected { message },
        }
    }
}
