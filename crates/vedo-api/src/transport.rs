// How the panel's reqwest::Client is built.
//
// The panel keeps its session in a cookie, so every client gets its own
// cookie store; two clients never share a login.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

/// Connecting to a LAN panel never legitimately takes longer than this.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// How the panel certificate is checked on `https://` URLs.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    #[default]
    System,
    /// Trust an extra CA read from a PEM file.
    CustomCa(PathBuf),
    /// Accept whatever certificate the panel presents.
    DangerAcceptInvalid,
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Ceiling reqwest applies to each request, body included.
    pub timeout: Duration,
}

impl TransportConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(tls: TlsMode, timeout: Duration) -> Self {
        Self { tls, timeout }
    }

    /// Build a cookie-holding `reqwest::Client`.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let builder = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(self.timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(self.timeout))
            .user_agent(concat!("vedo-gateway/", env!("CARGO_PKG_VERSION")));

        let builder = match &self.tls {
            TlsMode::System => builder,
            TlsMode::CustomCa(path) => {
                let pem = std::fs::read(path).map_err(|e| {
                    Error::Tls(format!("cannot read CA file {}: {e}", path.display()))
                })?;
                let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                    Error::Tls(format!("CA file {} is not PEM: {e}", path.display()))
                })?;
                builder.add_root_certificate(cert)
            }
            TlsMode::DangerAcceptInvalid => builder.danger_accept_invalid_certs(true),
        };

        builder
            .build()
            .map_err(|e| Error::Tls(format!("cannot build HTTP client: {e}")))
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::new(TlsMode::default(), Self::DEFAULT_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_ca_file_is_tls_error() {
        let config = TransportConfig::new(
            TlsMode::CustomCa("/nonexistent/vedo-ca.pem".into()),
            Duration::from_secs(1),
        );
        let err = config.build_client().unwrap_err();
        assert!(matches!(err, Error::Tls(ref msg) if msg.contains("vedo-ca.pem")), "{err}");
    }

    #[test]
    fn insecure_client_builds() {
        let config = TransportConfig::new(TlsMode::DangerAcceptInvalid, Duration::from_secs(1));
        assert!(config.build_client().is_ok());
    }
}
