//! Error types for the client.

use vitalog_protocol::ValidationDetails;

/// Errors returned by a [`SessionApi`](crate::SessionApi).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered 401: there is no valid session.
    #[error("not signed in")]
    Unauthenticated,

    /// The server answered with some other non-success status.
    #[error("server rejected the request ({status}): {message}")]
    Rejected {
        status: u16,
        message: String,
        details: Option<ValidationDetails>,
    },

    /// The request never got a response (connection refused, timeout, ...).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    /// Returns `true` if the server itself said no.
    ///
    /// A transport failure says nothing about the session, so the watcher
    /// keeps the session and tries again on the next tick.
    pub fn is_server_rejection(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::Rejected { .. })
    }
}
