//! Error types for the protocol layer.
//!
//! Each crate in Vitalog defines its own error enum. When you see a
//! `ProtocolError`, you know the problem is in the shape of a message
//! (bad JSON, missing fields, out-of-range values), not in authentication
//! or storage.

use crate::ValidationDetails;

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, wrong data types, or a body that
    /// isn't an object at all.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The payload parsed, but one or more fields broke a validation rule.
    ///
    /// The details are safe to show to the user: they only describe what
    /// THEY sent, never server state.
    #[error("invalid data")]
    Invalid(ValidationDetails),
}

impl ProtocolError {
    /// Converts this error into the field-level detail shown to clients.
    ///
    /// Decode failures become a single form-level message, so a client
    /// always gets the same `{formErrors, fieldErrors}` shape back.
    pub fn into_details(self) -> ValidationDetails {
        match self {
            ProtocolError::Invalid(details) => details,
            ProtocolError::Decode(e) | ProtocolError::Encode(e) => {
                let mut details = ValidationDetails::default();
                details.form(format!("malformed body: {e}"));
                details
            }
        }
    }
}
