// ── Vedo facade ──
//
// Full lifecycle for one panel: a shared session, the single-flight status
// cache, and the command processor that serializes every mutating
// operation. Consumers hold a cheap clone of `Vedo` and never touch the
// pieces directly.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use vedo_api::{ActionOutcome, PanelReply, PanelRequest, PanelTransport, Session, VedoClient};

use crate::command::{Command, CommandEnvelope};
use crate::config::PanelConfig;
use crate::convert::{self, PanelReadout};
use crate::error::CoreError;
use crate::model::{Area, AreaScope, GeneralStatus, StatusSnapshot, Zone, ZoneFilter};
use crate::store::StatusCache;

const COMMAND_CHANNEL_SIZE: usize = 64;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

// ── Vedo ─────────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable; all clones share one session, one cache and one
/// command processor. Reads work as soon as the value exists (the session
/// logs in lazily); commands need [`connect()`](Self::connect).
pub struct Vedo<T: PanelTransport = VedoClient> {
    inner: Arc<VedoInner<T>>,
}

impl<T: PanelTransport> Clone for Vedo<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct VedoInner<T: PanelTransport> {
    session: Session<T>,
    cache: Arc<StatusCache>,
    status_max_age: Duration,
    connection_state: watch::Sender<ConnectionState>,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Vedo<VedoClient> {
    /// Build a client for the panel described by `config`. Does NOT
    /// connect -- call [`connect()`](Self::connect) to log in and start
    /// the command processor.
    pub fn new(config: &PanelConfig) -> Result<Self, CoreError> {
        let session = Session::over_http(
            config.url.clone(),
            config.key.clone(),
            &config.transport_config(),
            config.session_config(),
        )?;
        Ok(Self::from_session(session, config.status_max_age))
    }
}

impl<T: PanelTransport> Vedo<T> {
    /// Build a client over any panel transport, using the deadlines and
    /// key from `config`. The URL in `config` is ignored.
    pub fn with_transport(transport: T, config: &PanelConfig) -> Self {
        let session = Session::new(transport, config.key.clone(), config.session_config());
        Self::from_session(session, config.status_max_age)
    }

    fn from_session(session: Session<T>, status_max_age: Duration) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

        Self {
            inner: Arc::new(VedoInner {
                session,
                cache: Arc::new(StatusCache::new()),
                status_max_age,
                connection_state,
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn session(&self) -> &Session<T> {
        &self.inner.session
    }

    pub fn cache(&self) -> &StatusCache {
        &self.inner.cache
    }

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Log in and start the command processor.
    pub async fn connect(&self) -> Result<(), CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::Disconnected);
        }

        self.inner.session.open().await?;

        let mut handles = self.inner.task_handles.lock().await;
        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            handles.push(tokio::spawn(command_processor_task(
                self.inner.session.clone(),
                Arc::clone(&self.inner.cache),
                rx,
                self.inner.cancel.clone(),
            )));
        }

        self.inner
            .connection_state
            .send_replace(ConnectionState::Connected);
        info!("connected to panel");
        Ok(())
    }

    /// Stop the command processor and log out.
    ///
    /// A command already executing finishes first. Commands issued
    /// afterwards fail with [`CoreError::Disconnected`].
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        self.inner.session.close().await;
        self.inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        debug!("panel client shut down");
    }

    // ── Status queries ───────────────────────────────────────────

    /// Current snapshot, read from the panel when the cached one is too
    /// old or was invalidated by a command.
    pub async fn snapshot(&self) -> Result<Arc<StatusSnapshot>, CoreError> {
        let session = self.inner.session.clone();
        self.inner
            .cache
            .get_snapshot(self.inner.status_max_age, move || read_snapshot(session))
            .await
    }

    pub async fn get_areas_status(&self) -> Result<Vec<Area>, CoreError> {
        Ok(self.snapshot().await?.areas.clone())
    }

    pub async fn get_area_status(&self, id: u32) -> Result<Option<Area>, CoreError> {
        Ok(self.snapshot().await?.area(id).cloned())
    }

    /// The area is armed or its exit delay is running. Unknown areas are
    /// not active.
    pub async fn is_area_active(&self, id: u32) -> Result<bool, CoreError> {
        Ok(self.snapshot().await?.area(id).is_some_and(Area::is_active))
    }

    /// Any area is fully or partially armed.
    pub async fn is_alarm_active(&self) -> Result<bool, CoreError> {
        Ok(self.snapshot().await?.is_alarm_active())
    }

    pub async fn get_zone_list(&self, filter: ZoneFilter) -> Result<Vec<Zone>, CoreError> {
        Ok(self.snapshot().await?.zones(filter).cloned().collect())
    }

    /// Panel-wide status. Never fails: any error reads as `Unknown`.
    pub async fn get_general_status(&self) -> GeneralStatus {
        match self.snapshot().await {
            Ok(snapshot) => GeneralStatus::from(snapshot.general_status()),
            Err(e) => {
                warn!(error = %e, "general status unavailable");
                GeneralStatus::unknown()
            }
        }
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Queue a command for the processor and wait for the panel's answer.
    pub async fn execute(&self, command: Command) -> Result<ActionOutcome, CoreError> {
        if *self.inner.connection_state.borrow() != ConnectionState::Connected {
            return Err(CoreError::Disconnected);
        }

        let (tx, rx) = oneshot::channel();

        self.inner
            .command_tx
            .send(CommandEnvelope {
                command,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::Disconnected)?;

        rx.await.map_err(|_| CoreError::Disconnected)?
    }

    pub async fn arm_alarm(&self, scope: AreaScope) -> Result<bool, CoreError> {
        self.execute(Command::Arm(scope)).await.map(|_| true)
    }

    pub async fn disarm_alarm(&self, scope: AreaScope) -> Result<bool, CoreError> {
        self.execute(Command::Disarm(scope)).await.map(|_| true)
    }

    /// Arm a disarmed scope or disarm an armed one. Returns `true` when the
    /// scope is now armed.
    ///
    /// For `All`, any armed area means "disarm everything". An unknown
    /// area returns `false` without sending anything. Reading the state and
    /// acting on it are two steps: concurrent toggles may both arm, which
    /// the panel accepts as a duplicate.
    pub async fn toggle_alarm(&self, scope: AreaScope) -> Result<bool, CoreError> {
        let snapshot = self.snapshot().await?;

        let arm = match scope {
            AreaScope::All => !snapshot.areas.iter().any(|a| a.armed),
            AreaScope::Area(id) => {
                let Some(area) = snapshot.area(id) else {
                    debug!(area = id, "toggle on unknown area ignored");
                    return Ok(false);
                };
                !area.armed
            }
        };

        if arm {
            self.arm_alarm(scope).await?;
        } else {
            self.disarm_alarm(scope).await?;
        }
        Ok(arm)
    }

    pub async fn exclude_zone(&self, id: u32) -> Result<bool, CoreError> {
        self.execute(Command::ExcludeZone(id)).await.map(|_| true)
    }

    pub async fn include_zone(&self, id: u32) -> Result<bool, CoreError> {
        self.execute(Command::IncludeZone(id)).await.map(|_| true)
    }

    pub async fn isolate_zone(&self, id: u32) -> Result<bool, CoreError> {
        self.execute(Command::IsolateZone(id)).await.map(|_| true)
    }

    pub async fn unisolate_zone(&self, id: u32) -> Result<bool, CoreError> {
        self.execute(Command::UnisolateZone(id)).await.map(|_| true)
    }
}

// ── Panel reads ──────────────────────────────────────────────────

/// Read all four status endpoints. A lost channel gets one retry on a
/// fresh session; every other failure surfaces as-is.
async fn read_snapshot<T: PanelTransport>(
    session: Session<T>,
) -> Result<StatusSnapshot, CoreError> {
    match read_once(&session).await {
        Err(e) if e.is_unreachable() => {
            warn!(error = %e, "panel read failed, retrying on a fresh session");
            session.reset().await;
            read_once(&session).await
        }
        other => other,
    }
}

async fn read_once<T: PanelTransport>(session: &Session<T>) -> Result<StatusSnapshot, CoreError> {
    let readout = PanelReadout {
        area_descriptions: session
            .exchange(PanelRequest::AreaDescriptions)
            .await?
            .into_area_descriptions()?,
        area_status: session
            .exchange(PanelRequest::AreaStatus)
            .await?
            .into_area_status()?,
        zone_descriptions: session
            .exchange(PanelRequest::ZoneDescriptions)
            .await?
            .into_zone_descriptions()?,
        zone_status: session
            .exchange(PanelRequest::ZoneStatus)
            .await?
            .into_zone_status()?,
    };
    convert::snapshot(&readout)
}

// ── Background tasks ─────────────────────────────────────────────

/// Execute queued commands one at a time, in arrival order.
async fn command_processor_task<T: PanelTransport>(
    session: Session<T>,
    cache: Arc<StatusCache>,
    mut rx: mpsc::Receiver<CommandEnvelope>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = route_command(&session, &cache, envelope.command).await;
                if envelope.response_tx.send(result).is_err() {
                    debug!(command = ?envelope.command, "caller went away, result discarded");
                }
            }
        }
    }
    debug!("command processor stopped");
}

async fn route_command<T: PanelTransport>(
    session: &Session<T>,
    cache: &StatusCache,
    command: Command,
) -> Result<ActionOutcome, CoreError> {
    let action = command.action();
    debug!(%action, "sending command");

    let result = session
        .exchange(PanelRequest::Action(action))
        .await
        .and_then(PanelReply::into_action_outcome);

    match result {
        Ok(outcome) => {
            cache.invalidate();
            info!(?command, ?outcome, "command acknowledged");
            Ok(outcome)
        }
        Err(e) => {
            warn!(?command, error = %e, "command failed");
            Err(e.into())
        }
    }
}
