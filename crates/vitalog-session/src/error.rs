//! Error types for the session layer.

/// Errors raised by a [`UserStore`](crate::UserStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another user already registered this (lowercased) email.
    #[error("email already registered")]
    EmailTaken,

    /// The backing store could not serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur while issuing, rotating, or checking sessions.
///
/// The variants map one-to-one onto what the HTTP layer must say:
/// credentials and stale sessions are "401, no detail", everything else
/// is either a fixable input problem or an internal failure.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Sign-in failed. The message is the same whether the email is
    /// unknown or the password is wrong, so it can't be used to probe
    /// which emails are registered.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No session, or a session whose token is no longer the user's
    /// current token (rotated elsewhere, logged out, user deleted).
    #[error("unauthenticated")]
    Unauthenticated,

    /// Sign-up with an email that already has an account.
    #[error("email already registered")]
    EmailTaken,

    /// The session secret is too short to sign cookies safely.
    #[error("session secret must be at least {min} bytes, got {got}")]
    WeakSecret { min: usize, got: usize },

    /// Encoding a session into a cookie failed.
    #[error("session encode failed: {0}")]
    Encode(String),

    /// Password hashing failed (bad cost, worker panicked, ...).
    #[error("password hashing failed: {0}")]
    Hashing(String),

    /// The user store failed.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EmailTaken => SessionError::EmailTaken,
            other => SessionError::Store(other),
        }
    }
}
