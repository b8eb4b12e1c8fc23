//! Error types for the readings layer.

use vitalog_protocol::ReadingId;

/// Errors that can occur during reading operations.
#[derive(Debug, thiserror::Error)]
pub enum ReadingError {
    /// The reading does not exist, or belongs to someone else.
    ///
    /// The two cases are deliberately the same error: a user can't probe
    /// for other users' reading ids.
    #[error("reading {0} not found")]
    NotFound(ReadingId),

    /// The backing store can't serve the request.
    #[error("reading store unavailable: {0}")]
    Unavailable(String),
}
