// Panel session lifecycle
//
// One authenticated channel per panel. Exchanges are serialized through a
// FIFO `tokio::sync::Mutex`; each runs on its own task so an abandoned
// caller never aborts a request the panel is already processing.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::Mutex;
use tokio::time::{Instant, timeout};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::client::VedoClient;
use crate::error::Error;
use crate::protocol::{PanelReply, PanelRequest, PanelTransport};
use crate::transport::TransportConfig;

/// Deadlines and renewal policy for a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Deadline for a single exchange, renewal and resend included, and for
    /// waiting in the exchange queue.
    pub exchange_timeout: Duration,
    /// Deadline for each login an exchange performs. Shorter than
    /// `exchange_timeout`.
    pub renew_timeout: Duration,
    /// Inactivity after which the panel drops the session.
    pub idle_ttl: Duration,
    /// Renew this long before `idle_ttl` runs out.
    pub renew_margin: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            exchange_timeout: Duration::from_secs(10),
            renew_timeout: Duration::from_secs(5),
            idle_ttl: Duration::from_secs(300),
            renew_margin: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelState {
    Closed,
    Open,
    /// The panel reported `logged: 0`; renew before the next exchange.
    Expired,
}

#[derive(Debug)]
struct Channel {
    state: ChannelState,
    last_activity: Option<Instant>,
}

/// Authenticated, serialized channel to a panel.
///
/// Cheaply cloneable; all clones share one channel.
pub struct Session<T: PanelTransport = VedoClient> {
    inner: Arc<SessionInner<T>>,
}

impl<T: PanelTransport> Clone for Session<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct SessionInner<T> {
    transport: T,
    key: SecretString,
    config: SessionConfig,
    channel: Mutex<Channel>,
    exchanges: AtomicU64,
}

impl Session<VedoClient> {
    /// Build a session over the HTTP client for `base_url`.
    pub fn over_http(
        base_url: Url,
        key: SecretString,
        transport: &TransportConfig,
        config: SessionConfig,
    ) -> Result<Self, Error> {
        let client = VedoClient::new(base_url, transport)?;
        Ok(Self::new(client, key, config))
    }
}

impl<T: PanelTransport> Session<T> {
    /// Wrap a transport. Does NOT log in -- call [`open()`](Self::open), or
    /// let the first exchange do it.
    pub fn new(transport: T, key: SecretString, config: SessionConfig) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                transport,
                key,
                config,
                channel: Mutex::new(Channel {
                    state: ChannelState::Closed,
                    last_activity: None,
                }),
                exchanges: AtomicU64::new(0),
            }),
        }
    }

    /// Number of exchanges that reached the transport.
    pub fn exchange_count(&self) -> u64 {
        self.inner.exchanges.load(Ordering::Relaxed)
    }

    /// The channel is logged in and not known to be expired.
    pub async fn is_open(&self) -> bool {
        self.inner.channel.lock().await.state == ChannelState::Open
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Authenticate. A no-op when the session is already open.
    pub async fn open(&self) -> Result<(), Error> {
        let mut channel = self.inner.channel.lock().await;
        if channel.state == ChannelState::Open {
            debug!("session already open");
            return Ok(());
        }
        match self
            .inner
            .login(&mut channel, self.inner.config.exchange_timeout)
            .await
        {
            Err(Error::Timeout { after }) => Err(Error::Unreachable {
                message: format!("no login reply within {after:?}"),
            }),
            other => other,
        }
    }

    /// Best-effort logout. Never fails.
    pub async fn close(&self) {
        let mut channel = self.inner.channel.lock().await;
        if channel.state == ChannelState::Closed {
            return;
        }

        let deadline = self.inner.config.renew_timeout;
        match timeout(deadline, self.inner.transport.logout()).await {
            Ok(Ok(())) => debug!("panel session closed"),
            Ok(Err(e)) => warn!(error = %e, "logout failed (non-fatal)"),
            Err(_) => warn!(?deadline, "logout timed out (non-fatal)"),
        }

        channel.state = ChannelState::Closed;
        channel.last_activity = None;
    }

    /// Forget the current login so the next exchange authenticates again.
    pub async fn reset(&self) {
        let mut channel = self.inner.channel.lock().await;
        if channel.state != ChannelState::Closed {
            debug!("resetting panel session");
        }
        channel.state = ChannelState::Closed;
        channel.last_activity = None;
    }

    // ── Exchange ─────────────────────────────────────────────────────

    /// Send one request and wait for its reply.
    ///
    /// Exchanges run one at a time in arrival order. Dropping the returned
    /// future does not cancel an exchange that already started; its result
    /// is discarded and the channel is released when it completes.
    pub async fn exchange(&self, request: PanelRequest) -> Result<PanelReply, Error> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.exchange(request).await })
            .await
            .map_err(|e| Error::Unreachable {
                message: format!("exchange task aborted: {e}"),
            })?
    }
}

impl<T: PanelTransport> SessionInner<T> {
    async fn exchange(&self, request: PanelRequest) -> Result<PanelReply, Error> {
        let deadline = self.config.exchange_timeout;

        let mut channel = timeout(deadline, self.channel.lock()).await.map_err(|_| {
            warn!(?request, "gave up waiting for the panel channel");
            Error::Timeout { after: deadline }
        })?;

        // Renewal and send share one deadline: the channel is never held longer.
        match timeout(deadline, self.exchange_locked(&mut channel, request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(?request, ?deadline, "exchange deadline passed");
                Err(Error::Timeout { after: deadline })
            }
        }
    }

    /// `logged: 0` means the panel dropped the request unprocessed, so it is
    /// sent once more on a renewed session.
    async fn exchange_locked(
        &self,
        channel: &mut Channel,
        request: PanelRequest,
    ) -> Result<PanelReply, Error> {
        self.ensure_live(channel).await?;

        match self.send(channel, request).await {
            Err(Error::SessionExpired) => {
                debug!(?request, "panel dropped the session, renewing and resending");
                self.renew(channel).await?;
                self.send(channel, request).await
            }
            other => other,
        }
    }

    async fn send(
        &self,
        channel: &mut Channel,
        request: PanelRequest,
    ) -> Result<PanelReply, Error> {
        self.exchanges.fetch_add(1, Ordering::Relaxed);
        trace!(?request, "exchange");

        let result = self.transport.send(request).await;

        match &result {
            Ok(_) | Err(Error::Rejected { .. }) => {
                channel.last_activity = Some(Instant::now());
            }
            Err(Error::SessionExpired) => {
                debug!("panel reported the session as expired");
                channel.state = ChannelState::Expired;
            }
            Err(e) if e.is_unreachable() => {
                channel.state = ChannelState::Closed;
                channel.last_activity = None;
            }
            Err(_) => {}
        }

        result
    }

    /// Log in if the channel is closed, expired, or about to go idle.
    async fn ensure_live(&self, channel: &mut Channel) -> Result<(), Error> {
        let renew_after = self
            .config
            .idle_ttl
            .saturating_sub(self.config.renew_margin);

        match channel.state {
            ChannelState::Closed => self.login(channel, self.config.renew_timeout).await,
            ChannelState::Expired => self.renew(channel).await,
            ChannelState::Open => {
                let idle = channel
                    .last_activity
                    .map_or(Duration::MAX, |t| t.elapsed());
                if idle >= renew_after {
                    debug!(?idle, "session close to idle expiry, renewing");
                    self.renew(channel).await
                } else {
                    Ok(())
                }
            }
        }
    }

    async fn renew(&self, channel: &mut Channel) -> Result<(), Error> {
        match self.login(channel, self.config.renew_timeout).await {
            Err(Error::Authentication { message }) => Err(Error::SessionRenewal { message }),
            other => other,
        }
    }

    async fn login(&self, channel: &mut Channel, deadline: Duration) -> Result<(), Error> {
        let result = match timeout(deadline, self.transport.login(&self.key)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout { after: deadline }),
        };

        match result {
            Ok(()) => {
                channel.state = ChannelState::Open;
                channel.last_activity = Some(Instant::now());
                info!("panel session opened");
                Ok(())
            }
            Err(e) => {
                channel.state = ChannelState::Closed;
                channel.last_activity = None;
                warn!(error = %e, "panel login failed");
                Err(e)
            }
        }
    }
}
