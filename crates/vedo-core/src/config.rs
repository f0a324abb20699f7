// ── Runtime panel configuration ──
//
// Describes *how* to reach a panel: endpoint, key, TLS policy and
// deadlines. Never touches disk; vedo-config builds one from files and
// environment and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;
use vedo_api::{SessionConfig, TlsMode, TransportConfig};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed panel certificates).
    DangerAcceptInvalid,
}

/// Everything needed to talk to one panel.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Panel base URL, e.g. `http://192.168.1.50`.
    pub url: Url,
    /// User key typed on the keypad.
    pub key: SecretString,
    pub tls: TlsVerification,
    /// Deadline for one exchange, and for waiting in the exchange queue.
    pub exchange_timeout: Duration,
    /// Deadline for each login performed during an exchange.
    pub renew_timeout: Duration,
    /// Inactivity after which the panel drops its session.
    pub session_ttl: Duration,
    /// Renew this long before `session_ttl` runs out.
    pub renew_margin: Duration,
    /// A cached status snapshot younger than this is served without a read.
    pub status_max_age: Duration,
}

impl PanelConfig {
    pub const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_RENEW_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(300);
    pub const DEFAULT_RENEW_MARGIN: Duration = Duration::from_secs(15);
    pub const DEFAULT_STATUS_MAX_AGE: Duration = Duration::from_secs(2);

    /// Config with default deadlines.
    pub fn new(url: Url, key: SecretString) -> Self {
        Self {
            url,
            key,
            tls: TlsVerification::default(),
            exchange_timeout: Self::DEFAULT_EXCHANGE_TIMEOUT,
            renew_timeout: Self::DEFAULT_RENEW_TIMEOUT,
            session_ttl: Self::DEFAULT_SESSION_TTL,
            renew_margin: Self::DEFAULT_RENEW_MARGIN,
            status_max_age: Self::DEFAULT_STATUS_MAX_AGE,
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            exchange_timeout: self.exchange_timeout,
            renew_timeout: self.renew_timeout.min(self.exchange_timeout),
            idle_ttl: self.session_ttl,
            renew_margin: self.renew_margin,
        }
    }

    pub fn transport_config(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig::new(tls, self.exchange_timeout)
    }
}
