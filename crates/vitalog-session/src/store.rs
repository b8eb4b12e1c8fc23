//! The user store: who owns which access token.
//!
//! The session layer needs very little from persistence: create a user,
//! find one by email or by token, and swap a token. [`UserStore`] is that
//! contract. [`InMemoryUserStore`] implements it with hash maps, which is
//! what the server runs with out of the box and what the tests use.
//!
//! # Concurrency note
//!
//! `swap_access_token` is a compare-and-swap: it only replaces the token
//! if the caller still holds the current one. Two concurrent rotations of
//! the same session therefore can't both win; the second sees that the
//! token moved and fails instead of silently overwriting the first.

use std::collections::HashMap;
use std::future::Future;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use vitalog_protocol::{SessionUser, UserId};

use crate::StoreError;

/// A registered user, as persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    /// Lowercased display name.
    pub name: String,
    /// Lowercased, unique email.
    pub email: String,
    /// Salted password hash (never the password itself).
    pub password_hash: String,
    pub image: Option<String>,
    /// The single live access token. Replacing it invalidates every
    /// session carrying the previous value.
    pub access_token: String,
    pub cep: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// The snapshot of this user that goes into a session.
    pub fn snapshot(&self) -> SessionUser {
        SessionUser {
            id: self.id,
            name: self.name.clone(),
            image: self.image.clone(),
        }
    }
}

/// Persistence contract for user records.
///
/// Same pattern as [`PasswordHasher`](crate::PasswordHasher): methods
/// return `Send` futures so implementations can be async (a database
/// pool) or not (the in-memory store).
pub trait UserStore: Send + Sync + 'static {
    /// Inserts a new user.
    ///
    /// # Errors
    /// [`StoreError::EmailTaken`] if the email is already registered.
    fn create(
        &self,
        user: UserRecord,
    ) -> impl Future<Output = Result<UserRecord, StoreError>> + Send;

    /// Looks a user up by (already lowercased) email.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<UserRecord>, StoreError>> + Send;

    /// Looks up the user whose CURRENT token is `token`.
    fn find_by_access_token(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Option<UserRecord>, StoreError>> + Send;

    /// Replaces the user's token with `new` if it is still `expected`.
    ///
    /// Returns `Ok(true)` if the swap happened, `Ok(false)` if the user is
    /// gone or the token had already changed.
    fn swap_access_token(
        &self,
        id: UserId,
        expected: &str,
        new: &str,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
}

// ---------------------------------------------------------------------------
// InMemoryUserStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Tables {
    /// All users, keyed by id.
    users: HashMap<UserId, UserRecord>,

    /// Index: email → user id. Kept in sync with `users`.
    emails: HashMap<String, UserId>,

    /// Index: current access token → user id. Kept in sync with `users`.
    ///
    /// A token that has been swapped out is removed from this map, which
    /// is exactly what makes an old cookie stop working.
    tokens: HashMap<String, UserId>,
}

/// A [`UserStore`] kept entirely in memory.
///
/// All three maps live behind ONE `RwLock`, so an update that touches
/// several of them (a token swap edits `users` and `tokens`) is atomic.
/// No lock is ever held across an `.await`.
#[derive(Default)]
pub struct InMemoryUserStore {
    tables: RwLock<Tables>,
}

impl InMemoryUserStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered users.
    ///
    /// # Errors
    /// [`StoreError::Unavailable`] if the lock is poisoned.
    pub fn len(&self) -> Result<usize, StoreError> {
        let tables = self.tables.read().map_err(Self::poisoned)?;
        Ok(tables.users.len())
    }

    /// Returns `true` if nobody is registered.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn poisoned<T>(_: T) -> StoreError {
        StoreError::Unavailable("user table lock poisoned".into())
    }
}

impl UserStore for InMemoryUserStore {
    async fn create(&self, user: UserRecord) -> Result<UserRecord, StoreError> {
        let mut tables = self.tables.write().map_err(Self::poisoned)?;

        if tables.emails.contains_key(&user.email) {
            return Err(StoreError::EmailTaken);
        }

        tables.emails.insert(user.email.clone(), user.id);
        tables.tokens.insert(user.access_token.clone(), user.id);
        tables.users.insert(user.id, user.clone());

        tracing::debug!(user_id = %user.id, "user stored");
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let tables = self.tables.read().map_err(Self::poisoned)?;
        Ok(tables
            .emails
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn find_by_access_token(&self, token: &str) -> Result<Option<UserRecord>, StoreError> {
        let tables = self.tables.read().map_err(Self::poisoned)?;
        Ok(tables
            .tokens
            .get(token)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn swap_access_token(
        &self,
        id: UserId,
        expected: &str,
        new: &str,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().map_err(Self::poisoned)?;

        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(false);
        };
        if user.access_token != expected {
            return Ok(false);
        }

        user.access_token = new.to_owned();
        tables.tokens.remove(expected);
        tables.tokens.insert(new.to_owned(), id);
        Ok(true)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str, token: &str) -> UserRecord {
        UserRecord {
            id: UserId::new(),
            name: "ana".into(),
            email: email.into(),
            password_hash: "$2b$04$hash".into(),
            image: None,
            access_token: token.into(),
            cep: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_then_find_by_email_and_token() {
        let store = InMemoryUserStore::new();
        let created = store.create(user("ana@x.com", "t1")).await.unwrap();

        let by_email = store.find_by_email("ana@x.com").await.unwrap();
        let by_token = store.find_by_access_token("t1").await.unwrap();

        assert_eq!(by_email.as_ref(), Some(&created));
        assert_eq!(by_token.as_ref(), Some(&created));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_duplicate_email_returns_email_taken() {
        let store = InMemoryUserStore::new();
        store.create(user("ana@x.com", "t1")).await.unwrap();

        let result = store.create(user("ana@x.com", "t2")).await;

        assert!(matches!(result, Err(StoreError::EmailTaken)));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_len_poisoned_lock_returns_unavailable() {
        let store = std::sync::Arc::new(InMemoryUserStore::new());
        let poisoner = std::sync::Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.tables.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(matches!(store.len(), Err(StoreError::Unavailable(_))));
        assert!(store.is_empty().is_err());
    }

    #[tokio::test]
    async fn test_find_unknown_returns_none() {
        let store = InMemoryUserStore::new();

        assert!(store.find_by_email("who@x.com").await.unwrap().is_none());
        assert!(store.find_by_access_token("nope").await.unwrap().is_none());
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_swap_access_token_with_current_token_succeeds() {
        let store = InMemoryUserStore::new();
        let created = store.create(user("ana@x.com", "old")).await.unwrap();

        let swapped = store
            .swap_access_token(created.id, "old", "new")
            .await
            .unwrap();

        assert!(swapped);
        // The old token no longer resolves; the new one does.
        assert!(store.find_by_access_token("old").await.unwrap().is_none());
        let found = store.find_by_access_token("new").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.access_token, "new");
    }

    #[tokio::test]
    async fn test_swap_access_token_with_stale_token_fails() {
        let store = InMemoryUserStore::new();
        let created = store.create(user("ana@x.com", "old")).await.unwrap();
        store
            .swap_access_token(created.id, "old", "winner")
            .await
            .unwrap();

        // A second rotation still holding "old" lost the race.
        let swapped = store
            .swap_access_token(created.id, "old", "loser")
            .await
            .unwrap();

        assert!(!swapped);
        assert!(store.find_by_access_token("loser").await.unwrap().is_none());
        assert!(store.find_by_access_token("winner").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_swap_access_token_unknown_user_fails() {
        let store = InMemoryUserStore::new();

        let swapped = store
            .swap_access_token(UserId::new(), "a", "b")
            .await
            .unwrap();

        assert!(!swapped);
    }

    #[test]
    fn test_snapshot_copies_public_fields_only() {
        let record = user("ana@x.com", "t1");

        let snapshot = record.snapshot();

        assert_eq!(snapshot.id, record.id);
        assert_eq!(snapshot.name, "ana");
        assert_eq!(snapshot.image, None);
    }
}
