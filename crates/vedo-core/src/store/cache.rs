// ── Single-flight status cache ──
//
// Holds the latest snapshot and at most one in-flight refresh. Callers
// that find the snapshot stale join the in-flight refresh instead of
// starting their own.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::{debug, trace, warn};

use crate::error::CoreError;
use crate::model::StatusSnapshot;

type RefreshResult = Result<Arc<StatusSnapshot>, CoreError>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshResult>>;

#[derive(Default)]
struct CacheState {
    current: Option<Arc<StatusSnapshot>>,
    /// Set by `invalidate()`; a stale snapshot is never served.
    stale: bool,
    /// Bumped on every invalidation so late refreshes can tell they lost.
    generation: u64,
    inflight: Option<SharedRefresh>,
}

impl CacheState {
    fn fresh(&self, max_age: Duration) -> Option<Arc<StatusSnapshot>> {
        if self.stale {
            return None;
        }
        self.current
            .as_ref()
            .filter(|s| s.age() <= max_age)
            .map(Arc::clone)
    }
}

/// Latest panel snapshot plus refresh coordination.
#[derive(Default)]
pub struct StatusCache {
    state: Arc<Mutex<CacheState>>,
    refreshes: AtomicU64,
}

fn lock(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a snapshot no older than `max_age`, refreshing through
    /// `refresh` when needed.
    ///
    /// `refresh` is only called when no refresh is already running. It runs
    /// on its own task, so dropping this future does not cancel it.
    pub async fn get_snapshot<F, Fut>(
        &self,
        max_age: Duration,
        refresh: F,
    ) -> Result<Arc<StatusSnapshot>, CoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<StatusSnapshot, CoreError>> + Send + 'static,
    {
        let pending = {
            let mut state = lock(&self.state);
            if let Some(snapshot) = state.fresh(max_age) {
                trace!(age = ?snapshot.age(), "serving cached snapshot");
                return Ok(snapshot);
            }
            if let Some(inflight) = &state.inflight {
                trace!("joining in-flight refresh");
                inflight.clone()
            } else {
                self.refreshes.fetch_add(1, Ordering::Relaxed);
                let pending = spawn_refresh(Arc::clone(&self.state), state.generation, refresh());
                state.inflight = Some(pending.clone());
                pending
            }
        };
        pending.await
    }

    /// Mark the current snapshot stale and detach any in-flight refresh.
    ///
    /// Callers already waiting on that refresh still get its result, but it
    /// is never stored; the next `get_snapshot` reads the panel again.
    pub fn invalidate(&self) {
        let mut state = lock(&self.state);
        state.generation += 1;
        state.stale = true;
        state.inflight = None;
        debug!(generation = state.generation, "status cache invalidated");
    }

    /// Latest stored snapshot, whether or not it is stale.
    pub fn current(&self) -> Option<Arc<StatusSnapshot>> {
        lock(&self.state).current.clone()
    }

    pub fn is_stale(&self) -> bool {
        let state = lock(&self.state);
        state.stale || state.current.is_none()
    }

    /// Number of refreshes started since creation.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }
}

fn spawn_refresh<Fut>(state: Arc<Mutex<CacheState>>, generation: u64, read: Fut) -> SharedRefresh
where
    Fut: Future<Output = Result<StatusSnapshot, CoreError>> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let result = read.await.map(Arc::new);

        let mut st = lock(&state);
        if st.generation != generation {
            debug!("discarding refresh that started before an invalidation");
            return result;
        }
        st.inflight = None;
        match &result {
            Ok(snapshot) => {
                st.current = Some(Arc::clone(snapshot));
                st.stale = false;
            }
            Err(e) => warn!(error = %e, "status refresh failed, keeping previous snapshot"),
        }
        result
    });

    async move {
        handle.await.unwrap_or_else(|e| {
            Err(CoreError::Unreachable {
                message: format!("status refresh aborted: {e}"),
            })
        })
    }
    .boxed()
    .shared()
}
