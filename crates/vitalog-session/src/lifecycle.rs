//! The session lifecycle controller.
//!
//! This is the central piece of the session layer. It's responsible for:
//! - Issuing sessions at sign-up and sign-in
//! - Rotating the access token on every liveness check
//! - Terminating sessions at logout
//! - Confirming that a decoded session is still the user's current one
//!
//! # Lifecycle
//!
//! From the client's point of view a session moves through:
//!
//! ```text
//!             sign_up() / sign_in()            rotate()
//! Anonymous ───────────────────────→ Authenticated ──→ Authenticated'
//!     ↑                                    │  (new token, same label)
//!     └──── terminate() / failed rotate() ─┘
//! ```
//!
//! # Ordering guarantee
//!
//! Every issuing path persists the token BEFORE it encodes the cookie.
//! If persisting fails, no cookie value exists to leak, so a client can
//! never hold a cookie whose token the store has never seen.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use vitalog_protocol::{Session, SigninRequest, SignupRequest, UserId};

use crate::{
    IssuedSession, PasswordHasher, SessionCodec, SessionConfig, SessionError, UserRecord,
    UserStore, generate_token,
};

/// How many times sign-in retries the token swap when another login for
/// the same user changed the token between the read and the swap.
const MAX_SWAP_ATTEMPTS: usize = 3;

/// Issues, rotates and terminates sessions.
///
/// Generic over the store and the hasher, so tests run against
/// [`InMemoryUserStore`](crate::InMemoryUserStore) with a cheap bcrypt
/// cost while production can plug in anything that implements the traits.
pub struct SessionLifecycle<S: UserStore, H: PasswordHasher> {
    store: Arc<S>,
    hasher: H,
    codec: SessionCodec,
    config: SessionConfig,
}

impl<S: UserStore, H: PasswordHasher> SessionLifecycle<S, H> {
    /// Creates a controller. `config` is validated on the way in.
    pub fn new(store: Arc<S>, hasher: H, codec: SessionCodec, config: SessionConfig) -> Self {
        Self {
            store,
            hasher,
            codec,
            config: config.validated(),
        }
    }

    /// The codec used to sign cookies (the verifier needs the same one).
    pub fn codec(&self) -> &SessionCodec {
        &self.codec
    }

    /// The validated configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The backing user store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Registers a new user and issues their first session.
    ///
    /// Name and email are lowercased before storage. The request is
    /// expected to be validated already.
    ///
    /// # Errors
    /// - [`SessionError::EmailTaken`]: the email is already registered
    /// - [`SessionError::Hashing`] / [`SessionError::Store`]: internal
    pub async fn sign_up(&self, req: SignupRequest) -> Result<IssuedSession, SessionError> {
        let email = req.email.trim().to_lowercase();
        let name = req.name.trim().to_lowercase();
        let password_hash = self.hasher.hash(&req.password).await?;

        let user = UserRecord {
            id: UserId::new(),
            name,
            email,
            password_hash,
            image: None,
            access_token: generate_token(),
            cep: req.cep.map(|cep| cep.trim().to_string()),
            created_at: Utc::now(),
        };

        // Persist first: the cookie is only built from what was stored.
        let user = self.store.create(user).await?;
        tracing::info!(user_id = %user.id, "user registered");

        self.issue(&user)
    }

    /// Checks credentials and issues a session with a FRESH token.
    ///
    /// The new token replaces the stored one, so signing in on one device
    /// signs every other device out (one live session per user).
    ///
    /// # Errors
    /// - [`SessionError::InvalidCredentials`]: unknown email OR wrong
    ///   password; the two cases are indistinguishable to the caller
    pub async fn sign_in(&self, req: SigninRequest) -> Result<IssuedSession, SessionError> {
        let email = req.email.trim().to_lowercase();

        let Some(user) = self.store.find_by_email(&email).await? else {
            tracing::warn!("sign-in rejected: unknown email");
            return Err(SessionError::InvalidCredentials);
        };
        if !self.hasher.verify(&req.password, &user.password_hash).await {
            tracing::warn!(user_id = %user.id, "sign-in rejected: wrong password");
            return Err(SessionError::InvalidCredentials);
        }

        let mut current = user;
        for _ in 0..MAX_SWAP_ATTEMPTS {
            let token = generate_token();
            if self
                .store
                .swap_access_token(current.id, &current.access_token, &token)
                .await?
            {
                current.access_token = token;
                tracing::info!(user_id = %current.id, "user signed in");
                return self.issue(&current);
            }

            // Someone else moved the token. Re-read and try again.
            current = match self.store.find_by_email(&email).await? {
                Some(user) => user,
                None => return Err(SessionError::InvalidCredentials),
            };
        }

        Err(SessionError::Store(crate::StoreError::Unavailable(
            "access token kept changing during sign-in".into(),
        )))
    }

    /// Replaces the session's token with a fresh one and re-issues it.
    ///
    /// The presented token must still be the user's current token. The
    /// swap is a compare-and-swap, so of two concurrent rotations of the
    /// same session exactly one succeeds.
    ///
    /// # Errors
    /// - [`SessionError::Unauthenticated`]: the token was already
    ///   rotated, the user logged out elsewhere, or the user is gone
    pub async fn rotate(&self, session: &Session) -> Result<IssuedSession, SessionError> {
        let mut user = self.current_user(session).await?;

        let token = generate_token();
        if !self
            .store
            .swap_access_token(user.id, &session.access_token, &token)
            .await?
        {
            tracing::info!(user_id = %user.id, "rotation lost to a concurrent rotation");
            return Err(SessionError::Unauthenticated);
        }
        user.access_token = token;

        tracing::info!(user_id = %user.id, "access token rotated");
        self.issue(&user)
    }

    /// Ends a session.
    ///
    /// Clearing the cookie is the HTTP layer's job. Here, if the caller
    /// presented a session that is still current, its token is replaced
    /// with one nobody holds, so a copy of the old cookie can't be
    /// replayed. Anything else (no session, stale session) is already
    /// signed out and is a no-op.
    pub async fn terminate(&self, session: Option<&Session>) -> Result<(), SessionError> {
        let Some(session) = session else {
            return Ok(());
        };
        let user = match self.current_user(session).await {
            Ok(user) => user,
            Err(SessionError::Unauthenticated) => return Ok(()),
            Err(e) => return Err(e),
        };

        self.store
            .swap_access_token(user.id, &session.access_token, &generate_token())
            .await?;
        tracing::info!(user_id = %user.id, "user signed out");
        Ok(())
    }

    /// Returns the user that owns `session`, if its token is current.
    ///
    /// This is the store cross-check the cookie signature alone can't
    /// give: a perfectly signed cookie with a rotated-away token is
    /// rejected here.
    ///
    /// # Errors
    /// [`SessionError::Unauthenticated`] if the token isn't current.
    pub async fn current_user(&self, session: &Session) -> Result<UserRecord, SessionError> {
        match self.store.find_by_access_token(&session.access_token).await? {
            Some(user) if user.id == session.user.id => Ok(user),
            _ => Err(SessionError::Unauthenticated),
        }
    }

    /// Builds the session for an already-persisted user and signs it.
    fn issue(&self, user: &UserRecord) -> Result<IssuedSession, SessionError> {
        let max_age = TimeDelta::from_std(self.config.max_age)
            .map_err(|e| SessionError::Encode(e.to_string()))?;
        let expires_at = Utc::now()
            .checked_add_signed(max_age)
            .ok_or_else(|| SessionError::Encode("session expiry out of range".into()))?;

        let session = Session {
            access_token: user.access_token.clone(),
            email: user.email.clone(),
            user: user.snapshot(),
        };
        let cookie_value = self.codec.encode(&session, expires_at)?;

        Ok(IssuedSession {
            session,
            cookie_value,
            expires_at,
        })
    }
}

// =========================================================================
// Tests
// =========================================================================
