//! Password hashing hook.
//!
//! The lifecycle never looks at a password hash itself. It goes through
//! the [`PasswordHasher`] trait, so production uses bcrypt while tests can
//! plug in something fast.

use std::future::Future;

use crate::SessionError;

/// Hashes and verifies passwords.
///
/// # Trait bounds
///
/// - `Send + Sync` → the hasher is shared by every request handler.
/// - `'static` → it lives as long as the server.
///
/// The returned futures must be `Send` because axum may poll a handler on
/// any worker thread.
pub trait PasswordHasher: Send + Sync + 'static {
    /// Produces a salted, one-way hash of `plain`.
    fn hash(&self, plain: &str) -> impl Future<Output = Result<String, SessionError>> + Send;

    /// Returns `true` if `plain` matches `hash`.
    ///
    /// A malformed `hash` is a mismatch, not an error: whatever is in the
    /// store, the caller only needs to know whether to let the user in.
    fn verify(&self, plain: &str, hash: &str) -> impl Future<Output = bool> + Send;
}

/// Bcrypt with a configurable work factor.
///
/// Bcrypt is deliberately slow (that's the point), so both operations run
/// on Tokio's blocking pool via `spawn_blocking` instead of stalling an
/// async worker thread.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    /// Lowest cost bcrypt accepts. Only suitable for tests.
    pub const MIN_COST: u32 = 4;

    /// Creates a hasher with the given cost (log2 of the round count).
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// The configured cost.
    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher for BcryptHasher {
    async fn hash(&self, plain: &str) -> Result<String, SessionError> {
        let plain = plain.to_owned();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost))
            .await
            .map_err(|e| SessionError::Hashing(e.to_string()))?
            .map_err(|e| SessionError::Hashing(e.to_string()))
    }

    async fn verify(&self, plain: &str, hash: &str) -> bool {
        let plain = plain.to_owned();
        let hash = hash.to_owned();
        match tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hash)).await {
            Ok(Ok(matches)) => matches,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "stored password hash is unreadable");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "password verification task failed");
                false
            }
        }
    }
}
