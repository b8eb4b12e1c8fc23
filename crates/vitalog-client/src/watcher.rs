//! Session liveness watcher.
//!
//! The server can invalidate a session at any time (sign-in on another
//! device, logout elsewhere, a lost rotation race). The client only finds
//! out by asking, so a background task polls the liveness endpoint on a
//! fixed interval while a session is cached.
//!
//! # Behavior
//!
//! ```text
//! ┌──────────── session cached? ───── no ──→ wait until one is set
//! │                 │ yes
//! │            tick (interval)
//! │                 │
//! │           check_session()
//! │         ok │         │ rejected by server
//! └────────────┘         ▼
//!               clear cache + refresh hook
//! ```
//!
//! - The first check runs immediately; then one per interval.
//! - Missed ticks are skipped, never bursted.
//! - Checks are single-flight: a check while another is running is a
//!   no-op ([`CheckOutcome::InFlight`]).
//! - A transport failure keeps the session; the next tick retries.
//! - Dropping the [`WatcherHandle`] cancels the task.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};
use vitalog_protocol::SessionUser;

use crate::{ClientError, SessionApi, SessionCache};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the liveness watcher.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Time between liveness checks. Default: 60 s.
    pub interval: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
        }
    }
}

impl WatcherConfig {
    /// Shortest accepted interval.
    pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

    /// Creates a config polling every `interval`.
    pub fn with_interval(interval: Duration) -> Self {
        Self { interval }
    }

    /// Clamps the interval to at least [`Self::MIN_INTERVAL`].
    pub fn validated(mut self) -> Self {
        if self.interval < Self::MIN_INTERVAL {
            warn!(
                interval_ms = millis(self.interval),
                "watcher interval too short, clamping"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        self
    }
}

/// Whole milliseconds in `d` for log fields, saturating at `u64::MAX`.
fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

// ---------------------------------------------------------------------------
// SessionClient
// ---------------------------------------------------------------------------

/// What a single liveness check did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// No session cached; nothing to check.
    Anonymous,
    /// Another check was already running; this one did nothing.
    InFlight,
    /// The server accepted (and rotated) the session.
    Valid(SessionUser),
    /// The server rejected the session; the cache was cleared.
    Invalidated,
    /// The server couldn't be reached; the session was kept.
    Unreachable,
}

type RefreshHook = Arc<dyn Fn() + Send + Sync>;

/// Ties a [`SessionApi`] to a [`SessionCache`].
///
/// Cheap to clone; clones share the cache, the in-flight flag and the
/// refresh hook.
pub struct SessionClient<A: SessionApi> {
    api: Arc<A>,
    cache: SessionCache,
    in_flight: Arc<AtomicBool>,
    on_invalidated: RefreshHook,
}

impl<A: SessionApi> Clone for SessionClient<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            cache: self.cache.clone(),
            in_flight: Arc::clone(&self.in_flight),
            on_invalidated: Arc::clone(&self.on_invalidated),
        }
    }
}

impl<A: SessionApi> SessionClient<A> {
    /// Creates a client.
    ///
    /// `on_invalidated` runs whenever the server rejects the cached
    /// session, after the cache has been cleared (the place to re-fetch
    /// whatever the UI showed for the signed-in user).
    pub fn new(
        api: Arc<A>,
        cache: SessionCache,
        on_invalidated: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            api,
            cache,
            in_flight: Arc::new(AtomicBool::new(false)),
            on_invalidated: Arc::new(on_invalidated),
        }
    }

    /// The session cache.
    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    /// The API this client talks to.
    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    /// Runs one liveness check now.
    pub async fn check_now(&self) -> CheckOutcome {
        if !self.cache.is_authenticated() {
            return CheckOutcome::Anonymous;
        }
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            debug!("liveness check already in flight, skipping");
            return CheckOutcome::InFlight;
        };

        match self.api.check_session().await {
            Ok(user) => {
                self.cache.refresh_user(user.clone());
                CheckOutcome::Valid(user)
            }
            Err(e) if e.is_server_rejection() => {
                info!(error = %e, "session rejected by server, signing out locally");
                self.invalidate();
                CheckOutcome::Invalidated
            }
            Err(e) => {
                warn!(error = %e, "liveness check failed, keeping session");
                CheckOutcome::Unreachable
            }
        }
    }

    /// Signs out on the server, then locally.
    ///
    /// Without a cached session this is a no-op. The cache is only
    /// cleared once the server confirms.
    ///
    /// # Errors
    /// Whatever the API returned; the session is kept in that case.
    pub async fn logout(&self) -> Result<(), ClientError> {
        if !self.cache.is_authenticated() {
            return Ok(());
        }
        self.api.logout().await?;
        self.cache.clear();
        (self.on_invalidated)();
        info!("signed out");
        Ok(())
    }

    /// Starts the background watcher.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn_watcher(&self, config: WatcherConfig) -> WatcherHandle {
        let config = config.validated();
        let client = self.clone();
        let task = tokio::spawn(async move { client.watch(config.interval).await });
        debug!(interval_ms = millis(config.interval), "session watcher started");
        WatcherHandle { task }
    }

    fn invalidate(&self) {
        if self.cache.clear() {
            (self.on_invalidated)();
        }
    }

    async fn watch(self, interval: Duration) {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut sessions = self.cache.subscribe();

        loop {
            if sessions.borrow_and_update().is_none() {
                // Signed out: stop polling until a session shows up again.
                if sessions.changed().await.is_err() {
                    return;
                }
                ticker.reset();
                continue;
            }

            ticker.tick().await;
            self.check_now().await;
        }
    }
}

/// Clears the in-flight flag when the check ends, even if the check's
/// future is dropped halfway.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// WatcherHandle
// ---------------------------------------------------------------------------

/// Owns the watcher task. Dropping it cancels the task.
#[derive(Debug)]
pub struct WatcherHandle {
    task: JoinHandle<()>,
}

impl WatcherHandle {
    /// Cancels the watcher and waits for it to wind down.
    pub async fn stop(mut self) {
        self.task.abort();
        // The join error is the cancellation we just asked for.
        let _ = (&mut self.task).await;
    }

    /// Returns `true` once the task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
