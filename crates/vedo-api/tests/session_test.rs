#![allow(clippy::unwrap_used)]
// Session lifecycle tests against a scripted in-memory transport.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use secrecy::SecretString;

use vedo_api::models::ZoneStatus;
use vedo_api::{
    ActionOutcome, AreaTarget, Error, PanelAction, PanelReply, PanelRequest, PanelTransport,
    Session, SessionConfig,
};

// ── Scripted transport ──────────────────────────────────────────────

#[derive(Default)]
struct Scripted {
    logins: AtomicU32,
    logouts: AtomicU32,
    reject_login: AtomicBool,
    login_delay: Mutex<Duration>,
    /// Queued results for `send`; empty queue answers with an empty zone status.
    replies: Mutex<VecDeque<Result<PanelReply, Error>>>,
    delay: Mutex<Duration>,
    in_flight: AtomicBool,
    overlapped: AtomicBool,
    sent: Mutex<Vec<PanelRequest>>,
}

impl Scripted {
    fn push(&self, reply: Result<PanelReply, Error>) {
        self.replies.lock().unwrap().push_back(reply);
    }
}

/// Shares the script with the test body.
struct Fake(Arc<Scripted>);

impl PanelTransport for Fake {
    async fn login(&self, _key: &SecretString) -> Result<(), Error> {
        self.0.logins.fetch_add(1, Ordering::SeqCst);
        let delay = *self.0.login_delay.lock().unwrap();
        tokio::time::sleep(delay).await;
        if self.0.reject_login.load(Ordering::SeqCst) {
            return Err(Error::Authentication {
                message: "bad key".into(),
            });
        }
        Ok(())
    }

    async fn logout(&self) -> Result<(), Error> {
        self.0.logouts.fetch_add(1, Ordering::SeqCst);
        Err(Error::Unreachable {
            message: "panel went away".into(),
        })
    }

    async fn send(&self, request: PanelRequest) -> Result<PanelReply, Error> {
        if self.0.in_flight.swap(true, Ordering::SeqCst) {
            self.0.overlapped.store(true, Ordering::SeqCst);
        }
        self.0.sent.lock().unwrap().push(request);
        let delay = *self.0.delay.lock().unwrap();
        tokio::time::sleep(delay).await;
        let reply = self
            .0
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(PanelReply::ZoneStatus(ZoneStatus::default())));
        self.0.in_flight.store(false, Ordering::SeqCst);
        reply
    }
}

fn session(script: &Arc<Scripted>) -> Session<Fake> {
    Session::new(
        Fake(Arc::clone(script)),
        SecretString::from("1234".to_string()),
        SessionConfig {
            exchange_timeout: Duration::from_secs(2),
            renew_timeout: Duration::from_secs(1),
            idle_ttl: Duration::from_secs(60),
            renew_margin: Duration::from_secs(5),
        },
    )
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn open_is_idempotent() {
    let script = Arc::new(Scripted::default());
    let session = session(&script);

    session.open().await.unwrap();
    session.open().await.unwrap();

    assert_eq!(script.logins.load(Ordering::SeqCst), 1);
    assert!(session.is_open().await);
}

#[tokio::test]
async fn open_with_bad_key_is_authentication_error() {
    let script = Arc::new(Scripted::default());
    script.reject_login.store(true, Ordering::SeqCst);
    let session = session(&script);

    let result = session.open().await;
    assert!(matches!(result, Err(Error::Authentication { .. })), "got: {result:?}");
    assert!(!session.is_open().await);
}

#[tokio::test]
async fn first_exchange_logs_in_lazily() {
    let script = Arc::new(Scripted::default());
    let session = session(&script);

    session.exchange(PanelRequest::ZoneStatus).await.unwrap();
    session.exchange(PanelRequest::ZoneStatus).await.unwrap();

    assert_eq!(script.logins.load(Ordering::SeqCst), 1);
    assert_eq!(session.exchange_count(), 2);
}

#[tokio::test]
async fn close_swallows_logout_errors() {
    let script = Arc::new(Scripted::default());
    let session = session(&script);
    session.open().await.unwrap();

    session.close().await;

    assert_eq!(script.logouts.load(Ordering::SeqCst), 1);
    assert!(!session.is_open().await);

    // Closing twice does not log out twice.
    session.close().await;
    assert_eq!(script.logouts.load(Ordering::SeqCst), 1);
}

// ── Renewal ─────────────────────────────────────────────────────────

#[tokio::test]
async fn expired_session_is_renewed_and_request_resent() {
    let script = Arc::new(Scripted::default());
    let session = session(&script);
    session.open().await.unwrap();

    script.push(Err(Error::SessionExpired));
    session.exchange(PanelRequest::AreaStatus).await.unwrap();

    assert_eq!(script.logins.load(Ordering::SeqCst), 2);
    assert_eq!(
        *script.sent.lock().unwrap(),
        vec![PanelRequest::AreaStatus, PanelRequest::AreaStatus]
    );
    assert!(session.is_open().await);
}

#[tokio::test]
async fn request_is_resent_only_once() {
    let script = Arc::new(Scripted::default());
    let session = session(&script);

    script.push(Err(Error::SessionExpired));
    script.push(Err(Error::SessionExpired));
    let result = session.exchange(PanelRequest::ZoneStatus).await;

    assert!(matches!(result, Err(Error::SessionExpired)), "got: {result:?}");
    assert_eq!(session.exchange_count(), 2);

    // The next exchange renews first and goes through.
    session.exchange(PanelRequest::ZoneStatus).await.unwrap();
    assert_eq!(script.logins.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn rejected_renewal_is_session_error() {
    let script = Arc::new(Scripted::default());
    let session = session(&script);
    session.open().await.unwrap();

    script.reject_login.store(true, Ordering::SeqCst);
    script.push(Err(Error::SessionExpired));
    let result = session.exchange(PanelRequest::AreaStatus).await;

    assert!(matches!(result, Err(Error::SessionRenewal { .. })), "got: {result:?}");
    assert_eq!(script.sent.lock().unwrap().len(), 1, "nothing resent");
}

#[tokio::test(start_paused = true)]
async fn idle_session_is_renewed_before_ttl() {
    let script = Arc::new(Scripted::default());
    let session = session(&script);

    session.exchange(PanelRequest::ZoneStatus).await.unwrap();
    tokio::time::advance(Duration::from_secs(30)).await;
    session.exchange(PanelRequest::ZoneStatus).await.unwrap();
    assert_eq!(script.logins.load(Ordering::SeqCst), 1, "still within ttl - margin");

    tokio::time::advance(Duration::from_secs(56)).await;
    session.exchange(PanelRequest::ZoneStatus).await.unwrap();
    assert_eq!(script.logins.load(Ordering::SeqCst), 2, "renewed after idling");
}

#[tokio::test]
async fn unreachable_reply_forces_fresh_login() {
    let script = Arc::new(Scripted::default());
    let session = session(&script);

    script.push(Err(Error::Unreachable {
        message: "reset by peer".into(),
    }));
    let _ = session.exchange(PanelRequest::AreaStatus).await;
    assert!(!session.is_open().await);

    session.exchange(PanelRequest::AreaStatus).await.unwrap();
    assert_eq!(script.logins.load(Ordering::SeqCst), 2);
}

// ── Deadlines and ordering ──────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn slow_reply_times_out() {
    let script = Arc::new(Scripted::default());
    *script.delay.lock().unwrap() = Duration::from_secs(5);
    let session = session(&script);

    let result = session.exchange(PanelRequest::ZoneStatus).await;
    assert!(matches!(result, Err(Error::Timeout { .. })), "got: {result:?}");
}

#[tokio::test(start_paused = true)]
async fn slow_login_is_bounded_by_renew_timeout() {
    let script = Arc::new(Scripted::default());
    *script.login_delay.lock().unwrap() = Duration::from_millis(1500);
    let session = session(&script);

    let result = session.exchange(PanelRequest::ZoneStatus).await;

    match result {
        Err(Error::Timeout { after }) => assert_eq!(after, Duration::from_secs(1)),
        other => panic!("expected login timeout, got: {other:?}"),
    }
    assert!(script.sent.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn login_and_send_share_one_deadline() {
    let script = Arc::new(Scripted::default());
    *script.login_delay.lock().unwrap() = Duration::from_millis(900);
    *script.delay.lock().unwrap() = Duration::from_millis(1500);
    let session = session(&script);

    let started = tokio::time::Instant::now();
    let result = session.exchange(PanelRequest::ZoneStatus).await;

    match result {
        Err(Error::Timeout { after }) => assert_eq!(after, Duration::from_secs(2)),
        other => panic!("expected exchange timeout, got: {other:?}"),
    }
    assert!(
        started.elapsed() <= Duration::from_millis(2050),
        "took {:?}",
        started.elapsed()
    );
}

#[tokio::test(start_paused = true)]
async fn concurrent_exchanges_never_overlap_and_keep_order() {
    let script = Arc::new(Scripted::default());
    *script.delay.lock().unwrap() = Duration::from_millis(50);
    let session = session(&script);
    session.open().await.unwrap();

    let mut handles = Vec::new();
    for zone in 0..5 {
        let session = session.clone();
        handles.push(tokio::spawn(async move {
            session
                .exchange(PanelRequest::Action(PanelAction::ExcludeZone(zone)))
                .await
        }));
        // Give each task a chance to queue before spawning the next.
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert!(!script.overlapped.load(Ordering::SeqCst));
    let sent = script.sent.lock().unwrap().clone();
    let expected: Vec<_> = (0..5)
        .map(|z| PanelRequest::Action(PanelAction::ExcludeZone(z)))
        .collect();
    assert_eq!(sent, expected);
}

#[tokio::test(start_paused = true)]
async fn abandoned_exchange_still_completes() {
    let script = Arc::new(Scripted::default());
    *script.delay.lock().unwrap() = Duration::from_millis(500);
    script.push(Ok(PanelReply::Action(ActionOutcome::Accepted)));
    let session = session(&script);

    let abandoned = tokio::time::timeout(
        Duration::from_millis(100),
        session.exchange(PanelRequest::Action(PanelAction::Arm(AreaTarget::All))),
    )
    .await;
    assert!(abandoned.is_err(), "caller gave up first");

    // The next exchange queues behind the abandoned one, which still runs to the end.
    session.exchange(PanelRequest::ZoneStatus).await.unwrap();
    assert_eq!(session.exchange_count(), 2);
    assert_eq!(
        script.sent.lock().unwrap()[0],
        PanelRequest::Action(PanelAction::Arm(AreaTarget::All))
    );
}
