//! HTTP handlers.
//!
//! - [`auth`]: sign-up, sign-in, liveness/rotation, logout
//! - [`readings`]: the signed-in user's readings

pub(crate) mod auth;
pub(crate) mod readings;

/// `GET /health`
pub(crate) async fn health() -> &'static str {
    "ok"
}
