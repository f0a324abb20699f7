//! Configuration for the Vedo gateway.
//!
//! Serialized defaults, then an optional TOML file, then `VEDO_*`
//! environment variables, resolved into `vedo_core::PanelConfig` plus the
//! listen address.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vedo_core::{PanelConfig, TlsVerification};

/// Prefix of every environment override (`VEDO_URL`, `VEDO_KEY`, ...).
pub const ENV_PREFIX: &str = "VEDO_";

/// Environment variable holding the panel key, read verbatim.
pub const KEY_ENV: &str = "VEDO_KEY";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing {field}: set `{field}` in the config file or {env} in the environment")]
    Missing {
        field: &'static str,
        env: &'static str,
    },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Flat gateway configuration; every field maps to `VEDO_<FIELD>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Panel base URL (e.g., "http://192.168.1.50").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Panel user key (plaintext -- prefer `VEDO_KEY`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Address the HTTP gateway binds to.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Accept self-signed panel certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_renew_timeout_secs")]
    pub renew_timeout_secs: u64,

    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    #[serde(default = "default_renew_margin_secs")]
    pub renew_margin_secs: u64,

    /// Status snapshots younger than this are served from cache.
    #[serde(default = "default_status_max_age_ms")]
    pub status_max_age_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: None,
            key: None,
            listen: default_listen(),
            insecure: false,
            ca_cert: None,
            timeout_secs: default_timeout_secs(),
            renew_timeout_secs: default_renew_timeout_secs(),
            session_ttl_secs: default_session_ttl_secs(),
            renew_margin_secs: default_renew_margin_secs(),
            status_max_age_ms: default_status_max_age_ms(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_timeout_secs() -> u64 {
    PanelConfig::DEFAULT_EXCHANGE_TIMEOUT.as_secs()
}
fn default_renew_timeout_secs() -> u64 {
    PanelConfig::DEFAULT_RENEW_TIMEOUT.as_secs()
}
fn default_session_ttl_secs() -> u64 {
    PanelConfig::DEFAULT_SESSION_TTL.as_secs()
}
fn default_renew_margin_secs() -> u64 {
    PanelConfig::DEFAULT_RENEW_MARGIN.as_secs()
}
fn default_status_max_age_ms() -> u64 {
    2_000
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "comelit", "vedo-gateway").map_or_else(
        || PathBuf::from("vedo-gateway.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Provider stack: defaults, then `path` if it exists, then environment.
///
/// The key is left out of the environment provider: figment would read a
/// numeric keypad code as an integer and drop its leading zeros.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["key"]))
}

/// Load the config from `path` (or the platform default) and environment.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    let mut config: Config = figment(&path).extract()?;
    if let Ok(key) = std::env::var(KEY_ENV) {
        config.key = Some(key);
    }
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Write `cfg` as TOML, creating parent directories.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Resolution ──────────────────────────────────────────────────────

impl Config {
    /// Build the runtime panel config. Fails when the URL or key is absent.
    pub fn to_panel_config(&self) -> Result<PanelConfig, ConfigError> {
        let raw_url = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::Missing {
                field: "url",
                env: "VEDO_URL",
            })?;
        let url: url::Url = raw_url.parse().map_err(|e| ConfigError::Validation {
            field: "url".into(),
            reason: format!("{e}: {raw_url}"),
        })?;

        let key = self
            .key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::Missing {
                field: "key",
                env: KEY_ENV,
            })?;

        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation {
                field: "timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }

        let tls = if self.insecure {
            TlsVerification::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsVerification::CustomCa(ca_path.clone())
        } else {
            TlsVerification::SystemDefaults
        };

        let mut panel = PanelConfig::new(url, SecretString::from(key.to_owned()));
        panel.tls = tls;
        panel.exchange_timeout = Duration::from_secs(self.timeout_secs);
        panel.renew_timeout = Duration::from_secs(self.renew_timeout_secs);
        panel.session_ttl = Duration::from_secs(self.session_ttl_secs);
        panel.renew_margin = Duration::from_secs(self.renew_margin_secs);
        panel.status_max_age = Duration::from_millis(self.status_max_age_ms);
        Ok(panel)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen.parse().map_err(|e| ConfigError::Validation {
            field: "listen".into(),
            reason: format!("{e}: {}", self.listen),
        })
    }
}
