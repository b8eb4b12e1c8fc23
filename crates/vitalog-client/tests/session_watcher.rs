//! Integration tests for the session watcher.
//!
//! Uses `start_paused` so Tokio's clock only moves when every task is
//! idle; `sleep` then jumps straight to the next timer. A mock API counts
//! calls and can be told to reject the session.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use vitalog_client::{
    CheckOutcome, ClientError, SessionApi, SessionCache, SessionClient, WatcherConfig,
};
use vitalog_protocol::{Session, SessionUser, UserId};

// =========================================================================
// Mock API
// =========================================================================

#[derive(Default)]
struct MockApi {
    checks: AtomicUsize,
    logouts: AtomicUsize,
    reject: AtomicBool,
    fail_logout: AtomicBool,
    /// How long each check takes.
    delay: Duration,
    running: AtomicUsize,
    max_running: AtomicUsize,
}

impl MockApi {
    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

impl SessionApi for MockApi {
    async fn check_session(&self) -> Result<SessionUser, ClientError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(running, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.running.fetch_sub(1, Ordering::SeqCst);

        if self.reject.load(Ordering::SeqCst) {
            Err(ClientError::Unauthenticated)
        } else {
            Ok(user())
        }
    }

    async fn logout(&self) -> Result<(), ClientError> {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        if self.fail_logout.load(Ordering::SeqCst) {
            Err(ClientError::Rejected {
                status: 500,
                message: "internal error".into(),
                details: None,
            })
        } else {
            Ok(())
        }
    }
}

// =========================================================================
// Helpers
// =========================================================================

const INTERVAL: Duration = Duration::from_secs(60);

fn user() -> SessionUser {
    SessionUser {
        id: UserId(uuid::Uuid::nil()),
        name: "ana".into(),
        image: None,
    }
}

fn session() -> Session {
    Session {
        access_token: "tok".into(),
        email: "ana@x.com".into(),
        user: user(),
    }
}

/// A client over `api`, plus a counter of refresh-hook invocations.
fn client(api: MockApi, initial: Option<Session>) -> (SessionClient<MockApi>, Arc<AtomicUsize>) {
    let refreshes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&refreshes);
    let client = SessionClient::new(Arc::new(api), SessionCache::new(initial), move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (client, refreshes)
}

// =========================================================================
// WatcherConfig
// =========================================================================

#[test]
fn test_default_interval_is_one_minute() {
    assert_eq!(WatcherConfig::default().interval, INTERVAL);
}

#[test]
fn test_validated_clamps_short_interval() {
    let config = WatcherConfig::with_interval(Duration::from_millis(10)).validated();

    assert_eq!(config.interval, WatcherConfig::MIN_INTERVAL);
}

// =========================================================================
// Polling
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_watcher_anonymous_makes_no_calls() {
    let (client, _) = client(MockApi::default(), None);

    let _watcher = client.spawn_watcher(WatcherConfig::with_interval(INTERVAL));
    tokio::time::sleep(INTERVAL * 5).await;

    assert_eq!(client.api().checks(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_watcher_checks_immediately_then_every_interval() {
    let (client, refreshes) = client(MockApi::default(), Some(session()));

    let _watcher = client.spawn_watcher(WatcherConfig::with_interval(INTERVAL));
    // Ticks at 0 s, 60 s and 120 s.
    tokio::time::sleep(Duration::from_secs(150)).await;

    assert_eq!(client.api().checks(), 3);
    assert!(client.cache().is_authenticated());
    assert_eq!(refreshes.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_watcher_rejection_clears_session_refreshes_and_stops_polling() {
    let api = MockApi::default();
    api.reject.store(true, Ordering::SeqCst);
    let (client, refreshes) = client(api, Some(session()));

    let _watcher = client.spawn_watcher(WatcherConfig::with_interval(INTERVAL));
    tokio::time::sleep(INTERVAL * 5).await;

    assert_eq!(client.api().checks(), 1, "no polling once signed out");
    assert_eq!(client.cache().current(), None);
    assert_eq!(refreshes.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_watcher_resumes_when_session_is_set_again() {
    let api = MockApi::default();
    api.reject.store(true, Ordering::SeqCst);
    let (client, _) = client(api, Some(session()));
    let _watcher = client.spawn_watcher(WatcherConfig::with_interval(INTERVAL));
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(client.api().checks(), 1);

    // Signing in again restarts polling one interval later.
    client.api().reject.store(false, Ordering::SeqCst);
    client.cache().set(Some(session()));
    tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;

    assert_eq!(client.api().checks(), 2);
    assert!(client.cache().is_authenticated());
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_cancels_watcher() {
    let (client, _) = client(MockApi::default(), Some(session()));
    let watcher = client.spawn_watcher(WatcherConfig::with_interval(INTERVAL));
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(client.api().checks(), 1);

    drop(watcher);
    tokio::time::sleep(INTERVAL * 5).await;

    assert_eq!(client.api().checks(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_watcher() {
    let (client, _) = client(MockApi::default(), Some(session()));
    let watcher = client.spawn_watcher(WatcherConfig::with_interval(INTERVAL));
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!watcher.is_finished());

    watcher.stop().await;
    tokio::time::sleep(INTERVAL * 5).await;

    assert_eq!(client.api().checks(), 1);
}

// =========================================================================
// Single flight
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_check_now_while_in_flight_is_skipped() {
    let (client, _) = client(MockApi::slow(Duration::from_secs(10)), Some(session()));

    let first = {
        let client = client.clone();
        tokio::spawn(async move { client.check_now().await })
    };
    tokio::task::yield_now().await;

    assert_eq!(client.check_now().await, CheckOutcome::InFlight);
    assert_eq!(first.await.unwrap(), CheckOutcome::Valid(user()));
    assert_eq!(client.api().checks(), 1);

    // The flag is released afterwards.
    assert_eq!(client.check_now().await, CheckOutcome::Valid(user()));
}

#[tokio::test(start_paused = true)]
async fn test_slow_checks_never_overlap() {
    // Each check outlasts the interval; manual checks pile on top.
    let (client, _) = client(MockApi::slow(Duration::from_secs(90)), Some(session()));
    let _watcher = client.spawn_watcher(WatcherConfig::with_interval(INTERVAL));

    for _ in 0..10 {
        tokio::time::sleep(Duration::from_secs(25)).await;
        client.check_now().await;
    }

    assert_eq!(client.api().max_running.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_check_now_anonymous_does_nothing() {
    let (client, _) = client(MockApi::default(), None);

    assert_eq!(client.check_now().await, CheckOutcome::Anonymous);
    assert_eq!(client.api().checks(), 0);
}

// =========================================================================
// Logout
// =========================================================================

#[tokio::test]
async fn test_logout_success_clears_session() {
    let (client, refreshes) = client(MockApi::default(), Some(session()));

    client.logout().await.unwrap();

    assert_eq!(client.cache().current(), None);
    assert_eq!(client.api().logouts.load(Ordering::SeqCst), 1);
    assert_eq!(refreshes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_logout_failure_keeps_session() {
    let api = MockApi::default();
    api.fail_logout.store(true, Ordering::SeqCst);
    let (client, refreshes) = client(api, Some(session()));

    let result = client.logout().await;

    assert!(matches!(result, Err(ClientError::Rejected { status: 500, .. })));
    assert!(client.cache().is_authenticated());
    assert_eq!(refreshes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_logout_without_session_skips_server() {
    let (client, _) = client(MockApi::default(), None);

    client.logout().await.unwrap();

    assert_eq!(client.api().logouts.load(Ordering::SeqCst), 0);
}
