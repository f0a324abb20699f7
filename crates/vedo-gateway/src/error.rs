//! Gateway error types.
//!
//! `ApiError` turns panel failures into HTTP responses; `StartupError`
//! carries miette diagnostics for everything that stops the binary before
//! it starts serving.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use miette::Diagnostic;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use vedo_config::ConfigError;
use vedo_core::{CoreError, ScopeParseError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

// ── HTTP errors ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Panel(#[from] CoreError),

    #[error("invalid {what} `{input}`: expected `all` or a decimal id")]
    BadPath { what: &'static str, input: String },
}

impl ApiError {
    pub(crate) fn bad_area(err: &ScopeParseError) -> Self {
        Self::BadPath {
            what: "area",
            input: err.input.clone(),
        }
    }

    pub(crate) fn bad_zone(input: &str) -> Self {
        Self::BadPath {
            what: "zone",
            input: input.to_owned(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadPath { .. } | Self::Panel(CoreError::CommandRejected { .. }) => {
                StatusCode::BAD_REQUEST
            }
            Self::Panel(
                CoreError::Authentication { .. }
                | CoreError::Session { .. }
                | CoreError::Protocol { .. },
            ) => StatusCode::BAD_GATEWAY,
            Self::Panel(CoreError::Unreachable { .. } | CoreError::Disconnected) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Panel(CoreError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            Self::Panel(CoreError::Config { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %message, "request failed");
        }
        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));
        (status, body).into_response()
    }
}

// ── Startup errors ──────────────────────────────────────────────────

#[derive(Debug, Error, Diagnostic)]
pub enum StartupError {
    #[error("Panel {field} is not configured")]
    #[diagnostic(
        code(vedo::no_credentials),
        help(
            "Set {env} in the environment, or write a config file with:\n\
             vedo-gateway --init-config"
        )
    )]
    MissingSetting {
        field: &'static str,
        env: &'static str,
    },

    #[error(transparent)]
    #[diagnostic(code(vedo::config))]
    Config(ConfigError),

    #[error("Panel rejected the configured key")]
    #[diagnostic(
        code(vedo::auth_failed),
        help("Check VEDO_KEY: it is the user code typed on the panel keypad.")
    )]
    AuthFailed(#[source] CoreError),

    #[error("Could not reach the panel")]
    #[diagnostic(
        code(vedo::connection_failed),
        help(
            "Check that the panel is powered and reachable from this host.\n\
             For self-signed certificates set `insecure = true` or `ca_cert`."
        )
    )]
    ConnectionFailed(#[source] CoreError),

    #[error("Panel did not answer in time")]
    #[diagnostic(
        code(vedo::timeout),
        help("Raise `timeout_secs` or check the panel's network link.")
    )]
    Timeout(#[source] CoreError),

    #[error("Panel connection failed")]
    #[diagnostic(code(vedo::panel))]
    Panel(#[source] CoreError),

    #[error("Could not listen on {addr}")]
    #[diagnostic(
        code(vedo::bind),
        help("Pick a free address with --listen or VEDO_LISTEN.")
    )]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for StartupError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Missing { field, env } => Self::MissingSetting { field, env },
            other => Self::Config(other),
        }
    }
}

impl From<CoreError> for StartupError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Authentication { .. } => Self::AuthFailed(err),
            CoreError::Unreachable { .. } => Self::ConnectionFailed(err),
            CoreError::Timeout { .. } => Self::Timeout(err),
            _ => Self::Panel(err),
        }
    }
}

impl StartupError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingSetting { .. } | Self::Config(_) | Self::Bind { .. } => {
                exit_code::USAGE
            }
            Self::AuthFailed(_) => exit_code::AUTH,
            Self::ConnectionFailed(_) => exit_code::CONNECTION,
            Self::Timeout(_) => exit_code::TIMEOUT,
            Self::Panel(_) | Self::Io(_) => exit_code::GENERAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable() -> CoreError {
        CoreError::Unreachable {
            message: "connection refused".into(),
        }
    }

    #[test]
    fn panel_errors_map_to_gateway_statuses() {
        let cases = [
            (
                CoreError::CommandRejected {
                    message: "no".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                CoreError::Authentication {
                    message: "bad key".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                CoreError::Session {
                    message: "expired".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (unreachable(), StatusCode::SERVICE_UNAVAILABLE),
            (CoreError::Disconnected, StatusCode::SERVICE_UNAVAILABLE),
            (
                CoreError::Timeout {
                    message: "10s".into(),
                },
                StatusCode::GATEWAY_TIMEOUT,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err.clone()).status_code(), expected, "{err}");
        }
    }

    #[test]
    fn bad_path_is_client_error() {
        let err = ApiError::bad_zone("kitchen");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("kitchen"));
    }

    #[test]
    fn missing_key_exits_with_usage_code() {
        let err = StartupError::from(ConfigError::Missing {
            field: "key",
            env: "VEDO_KEY",
        });
        assert!(matches!(err, StartupError::MissingSetting { env: "VEDO_KEY", .. }));
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn connect_failures_pick_exit_codes() {
        assert_eq!(
            StartupError::from(unreachable()).exit_code(),
            exit_code::CONNECTION
        );
        let auth = CoreError::Authentication {
            message: "bad key".into(),
        };
        assert_eq!(StartupError::from(auth).exit_code(), exit_code::AUTH);
    }
}
