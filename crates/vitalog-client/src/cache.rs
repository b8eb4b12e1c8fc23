//! The client's last-known session.

use std::sync::Arc;

use tokio::sync::watch;
use vitalog_protocol::{Session, SessionUser};

/// Holds the session the client believes it has.
///
/// Backed by a `watch` channel: the UI (or anything else) can
/// [`subscribe`](Self::subscribe) and react when the session appears or
/// disappears. Cloning shares the same underlying value.
#[derive(Debug, Clone)]
pub struct SessionCache {
    tx: Arc<watch::Sender<Option<Session>>>,
}

impl SessionCache {
    /// Creates a cache seeded with `initial` (`None` = signed out).
    pub fn new(initial: Option<Session>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// A copy of the current session, if any.
    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    /// Returns `true` while a session is cached.
    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Replaces the cached session (e.g. after sign-in).
    pub fn set(&self, session: Option<Session>) {
        self.tx.send_replace(session);
    }

    /// Forgets the session.
    ///
    /// Returns `true` if there was one to forget.
    pub fn clear(&self) -> bool {
        self.tx.send_replace(None).is_some()
    }

    /// Updates the user snapshot of the cached session, if it changed.
    ///
    /// Subscribers are only notified when something actually changed.
    pub fn refresh_user(&self, user: SessionUser) {
        self.tx.send_if_modified(|current| match current {
            Some(session) if session.user != user => {
                session.user = user;
                true
            }
            _ => false,
        });
    }

    /// A receiver that sees every change to the session.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use vitalog_protocol::UserId;

    use super::*;

    fn session() -> Session {
        Session {
            access_token: "tok".into(),
            email: "ana@x.com".into(),
            user: SessionUser {
                id: UserId::new(),
                name: "ana".into(),
                image: None,
            },
        }
    }

    #[test]
    fn test_new_seeds_initial_value() {
        let cache = SessionCache::new(Some(session()));

        assert!(cache.is_authenticated());
        assert_eq!(cache.current().unwrap().email, "ana@x.com");
        assert!(!SessionCache::default().is_authenticated());
    }

    #[test]
    fn test_clear_reports_whether_anything_was_cleared() {
        let cache = SessionCache::new(Some(session()));

        assert!(cache.clear());
        assert!(!cache.clear());
        assert_eq!(cache.current(), None);
    }

    #[test]
    fn test_clones_share_state() {
        let cache = SessionCache::default();
        let other = cache.clone();

        other.set(Some(session()));

        assert!(cache.is_authenticated());
    }

    #[tokio::test]
    async fn test_subscriber_sees_changes() {
        let cache = SessionCache::new(Some(session()));
        let mut rx = cache.subscribe();

        cache.clear();

        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }

    #[test]
    fn test_refresh_user_only_notifies_on_change() {
        let original = session();
        let cache = SessionCache::new(Some(original.clone()));
        let rx = cache.subscribe();

        cache.refresh_user(original.user.clone());
        assert!(!rx.has_changed().unwrap());

        let mut renamed = original.user.clone();
        renamed.name = "ana maria".into();
        cache.refresh_user(renamed);
        assert!(rx.has_changed().unwrap());
        assert_eq!(cache.current().unwrap().user.name, "ana maria");
    }

    #[test]
    fn test_refresh_user_when_signed_out_is_noop() {
        let cache = SessionCache::default();

        cache.refresh_user(session().user);

        assert_eq!(cache.current(), None);
    }
}
