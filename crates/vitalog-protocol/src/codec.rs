//! Codec trait and implementation for serializing/deserializing messages.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The rest of Vitalog doesn't care HOW a session payload or a request
//! body becomes bytes: it just needs something that implements
//! [`Codec`]. The session cookie signer, for example, asks the codec for
//! the payload bytes and then signs whatever comes back.
//!
//! Currently we provide [`JsonCodec`], which is also what HTTP clients
//! speak, so the same codec serves request bodies and cookie payloads.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → safe to share between threads (axum handlers run on
///   any thread of Tokio's pool).
/// - `'static` → the codec owns everything it needs, so it can live
///   inside long-lived shared server state.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use vitalog_protocol::{Codec, JsonCodec, Session, SessionUser, UserId};
///
/// let codec = JsonCodec;
///
/// let session = Session {
///     access_token: "ab12".into(),
///     email: "ana@x.com".into(),
///     user: SessionUser {
///         id: UserId::new(),
///         name: "ana".into(),
///         image: None,
///     },
/// };
///
/// let bytes = codec.encode(&session).unwrap();
/// let decoded: Session = codec.decode(&bytes).unwrap();
/// assert_eq!(session, decoded);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SigninRequest;

    #[test]
    fn test_decode_malformed_json_returns_decode_error() {
        let result: Result<SigninRequest, _> = JsonCodec.decode(b"{not json");

        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_wrong_shape_returns_decode_error() {
        // A JSON array is valid JSON but not a sign-in body.
        let result: Result<SigninRequest, _> = JsonCodec.decode(b"[1, 2, 3]");

        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_error_becomes_form_level_detail() {
        let err = JsonCodec
            .decode::<SigninRequest>(b"")
            .expect_err("empty body should fail");

        let details = err.into_details();

        assert_eq!(details.form_errors.len(), 1);
        assert!(details.field_errors.is_empty());
    }
}
