// Vedo HTTP client
//
// Wraps `reqwest::Client` with panel URL construction and `logged` flag
// checking. Login/logout live in `auth.rs`; status and action endpoints are
// inherent methods here, and the `PanelTransport` impl routes requests to
// them.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{
    ActionReply, AreaDescriptions, AreaStatus, LoggedFlag, ZoneDescriptions, ZoneStatus,
};
use crate::protocol::{ActionOutcome, PanelAction, PanelReply, PanelRequest};
use crate::transport::TransportConfig;

/// Raw HTTP client for the Vedo panel web interface.
///
/// Holds the session cookie in its jar once [`login`](Self::login) succeeds.
/// Performs no locking or renewal on its own -- wrap it in a
/// [`Session`](crate::Session) for that.
pub struct VedoClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl VedoClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            base_url,
            timeout: transport.timeout,
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            timeout: TransportConfig::DEFAULT_TIMEOUT,
        }
    }

    /// The underlying HTTP client (for auth flows that need direct access).
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn transport_error(&self, err: reqwest::Error) -> Error {
        Error::from_reqwest(err, self.timeout)
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Join a panel path onto the base URL, keeping any base path prefix.
    pub(crate) fn panel_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// GET a panel JSON document, rejecting `logged: 0` replies.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.parse_payload(resp).await
    }

    /// Check HTTP status and the `logged` flag, then decode the payload.
    pub(crate) async fn parse_payload<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::SessionExpired);
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Protocol {
                message: format!("HTTP {status}: {}", preview(&body)),
            });
        }

        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        trace!(len = body.len(), "panel payload received");

        let flag: LoggedFlag = serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })?;
        if flag.logged == Some(0) {
            return Err(Error::SessionExpired);
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })
    }

    // ── Status endpoints ─────────────────────────────────────────────

    /// `GET /user/area_desc.json`
    pub async fn area_descriptions(&self) -> Result<AreaDescriptions, Error> {
        self.get_json(self.panel_url("user/area_desc.json")?).await
    }

    /// `GET /user/area_stat.json`
    pub async fn area_status(&self) -> Result<AreaStatus, Error> {
        self.get_json(self.panel_url("user/area_stat.json")?).await
    }

    /// `GET /user/zone_desc.json`
    pub async fn zone_descriptions(&self) -> Result<ZoneDescriptions, Error> {
        self.get_json(self.panel_url("user/zone_desc.json")?).await
    }

    /// `GET /user/zone_stat.json`
    pub async fn zone_status(&self) -> Result<ZoneStatus, Error> {
        self.get_json(self.panel_url("user/zone_stat.json")?).await
    }

    // ── Actions ──────────────────────────────────────────────────────

    /// Issue an action.
    ///
    /// `GET /action.cgi?vedo=1&{verb}={index}&force=1`
    pub async fn perform(&self, action: PanelAction) -> Result<ActionOutcome, Error> {
        let mut url = self.panel_url("action.cgi")?;
        url.query_pairs_mut()
            .append_pair("vedo", "1")
            .append_pair(action.verb(), &action.index().to_string())
            .append_pair("force", "1");

        debug!(%action, "sending panel action");
        let reply: ActionReply = self.get_json(url).await?;

        match reply.result.as_str() {
            "ok" => Ok(ActionOutcome::Accepted),
            "already" => Ok(ActionOutcome::AlreadyInState),
            other => Err(Error::Rejected {
                message: reply
                    .reason
                    .unwrap_or_else(|| format!("{action} returned result={other:?}")),
            }),
        }
    }
}

impl crate::protocol::PanelTransport for VedoClient {
    async fn login(&self, key: &secrecy::SecretString) -> Result<(), Error> {
        VedoClient::login(self, key).await
    }

    async fn logout(&self) -> Result<(), Error> {
        VedoClient::logout(self).await
    }

    async fn send(&self, request: PanelRequest) -> Result<PanelReply, Error> {
        match request {
            PanelRequest::AreaDescriptions => {
                self.area_descriptions().await.map(PanelReply::AreaDescriptions)
            }
            PanelRequest::AreaStatus => self.area_status().await.map(PanelReply::AreaStatus),
            PanelRequest::ZoneDescriptions => {
                self.zone_descriptions().await.map(PanelReply::ZoneDescriptions)
            }
            PanelRequest::ZoneStatus => self.zone_status().await.map(PanelReply::ZoneStatus),
            PanelRequest::Action(action) => self.perform(action).await.map(PanelReply::Action),
        }
    }
}

fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
