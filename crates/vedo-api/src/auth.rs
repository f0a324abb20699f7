// Panel authentication
//
// Cookie-based session login/logout. The login endpoint sets the session
// cookie in the client's jar; subsequent requests carry it automatically.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::VedoClient;
use crate::error::Error;
use crate::models::LoginReply;

impl VedoClient {
    /// Authenticate with the panel key.
    ///
    /// `POST /login.cgi` with form `code=<key>`. The panel answers HTTP 200
    /// in both cases; success is `{"logged": 1}`.
    pub async fn login(&self, key: &SecretString) -> Result<(), Error> {
        let url = self.panel_url("login.cgi")?;
        debug!("logging in at {}", url);

        let resp = self
            .http()
            .post(url)
            .form(&[("code", key.expose_secret())])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Authentication {
                message: format!("login refused (HTTP {status})"),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Protocol {
                message: format!("login failed (HTTP {status}): {body}"),
            });
        }

        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        let reply: LoginReply = serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("login reply: {e}"),
            body: body.clone(),
        })?;

        if reply.logged != 1 {
            return Err(Error::Authentication {
                message: "panel rejected the key".into(),
            });
        }

        debug!(life = ?reply.life, "login successful");
        Ok(())
    }

    /// End the current session.
    ///
    /// `POST /login.cgi` with form `logout=1`.
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.panel_url("login.cgi")?;
        debug!("logging out at {}", url);

        let _resp = self
            .http()
            .post(url)
            .form(&[("logout", "1")])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        debug!("logout complete");
        Ok(())
    }
}
