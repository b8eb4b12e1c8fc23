//! Signed session cookies.
//!
//! A session travels to the browser and back inside a cookie. The browser
//! can read and edit cookies freely, so the value must be *tamper-evident*:
//! anyone can look at it, but nobody without the server secret can produce
//! a value that decodes to a session.
//!
//! # Format
//!
//! ```text
//! v1.<base64url(payload)>.<base64url(hmac_sha256(secret, payload_part))>
//! ```
//!
//! The payload is JSON `{"session": {...}, "exp": <unix seconds>}`. The
//! expiry lives inside the signed part, so extending a cookie's lifetime in
//! the browser doesn't extend the session.
//!
//! # Decoding never fails
//!
//! [`SessionCodec::decode`] returns `Option<Session>`, not a `Result`. A
//! missing, truncated, re-signed, expired or otherwise broken cookie
//! simply means "nobody is signed in". Callers can't accidentally turn a
//! bad cookie into a 500.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use vitalog_protocol::{Codec, JsonCodec, Session};

use crate::SessionError;

type HmacSha256 = Hmac<Sha256>;

const COOKIE_VERSION_V1: &str = "v1";

/// Browsers cap a cookie at roughly 4 KiB; anything longer didn't come
/// from us.
const MAX_COOKIE_LEN: usize = 4096;

/// Minimum secret length in bytes (the HMAC-SHA256 block strength).
pub const MIN_SECRET_LEN: usize = 32;

/// What actually gets signed.
#[derive(Serialize, Deserialize)]
struct SignedPayload {
    session: Session,
    /// Absolute expiry, unix seconds.
    exp: i64,
}

/// Encodes sessions into signed cookie values and back.
///
/// Cheap to share: wrap it in an `Arc` (or put it in server state) and
/// call it from any number of request handlers at once. It holds no
/// mutable state.
#[derive(Clone)]
pub struct SessionCodec {
    secret: Vec<u8>,
    codec: JsonCodec,
}

/// Hand-written so the secret never ends up in a log line.
impl fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCodec")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl SessionCodec {
    /// Creates a codec signing with `secret`.
    ///
    /// # Errors
    /// Returns [`SessionError::WeakSecret`] if the secret is shorter than
    /// [`MIN_SECRET_LEN`] bytes.
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, SessionError> {
        let secret = secret.into();
        if secret.len() < MIN_SECRET_LEN {
            return Err(SessionError::WeakSecret {
                min: MIN_SECRET_LEN,
                got: secret.len(),
            });
        }
        Ok(Self {
            secret,
            codec: JsonCodec,
        })
    }

    /// Encodes `session` into a cookie value valid until `expires_at`.
    ///
    /// # Errors
    /// Returns [`SessionError::Encode`] if the payload can't be serialized.
    pub fn encode(
        &self,
        session: &Session,
        expires_at: DateTime<Utc>,
    ) -> Result<String, SessionError> {
        let payload = SignedPayload {
            session: session.clone(),
            exp: expires_at.timestamp(),
        };
        let payload_bytes = self
            .codec
            .encode(&payload)
            .map_err(|e| SessionError::Encode(e.to_string()))?;
        let payload_part = URL_SAFE_NO_PAD.encode(payload_bytes);

        let mut mac = self.mac().map_err(SessionError::Encode)?;
        mac.update(payload_part.as_bytes());
        let sig_part = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{COOKIE_VERSION_V1}.{payload_part}.{sig_part}"))
    }

    /// Decodes a cookie value against the current wall clock.
    ///
    /// `None` in, `None` out: an absent cookie is just another way of
    /// being signed out.
    pub fn decode(&self, value: Option<&str>) -> Option<Session> {
        self.decode_at(value, Utc::now())
    }

    /// Decodes a cookie value as of `now`.
    ///
    /// Pure function of its inputs, which makes expiry testable without
    /// sleeping.
    pub fn decode_at(&self, value: Option<&str>, now: DateTime<Utc>) -> Option<Session> {
        let value = value?;
        match self.try_decode(value, now) {
            Ok(session) => Some(session),
            Err(reason) => {
                tracing::debug!(reason, "rejected session cookie");
                None
            }
        }
    }

    /// The fallible core of `decode_at`. The error is only a reason for
    /// the debug log; it never reaches a caller.
    fn try_decode(&self, value: &str, now: DateTime<Utc>) -> Result<Session, &'static str> {
        if value.len() > MAX_COOKIE_LEN {
            return Err("cookie too long");
        }

        let mut parts = value.split('.');
        let (Some(version), Some(payload_part), Some(sig_part), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err("wrong number of parts");
        };
        if version != COOKIE_VERSION_V1 {
            return Err("unsupported version");
        }

        // Check the signature BEFORE looking at the payload, so nothing
        // attacker-controlled gets parsed unless it was signed by us.
        let signature = URL_SAFE_NO_PAD
            .decode(sig_part)
            .map_err(|_| "signature is not base64")?;
        let mut mac = self.mac().map_err(|_| "bad key")?;
        mac.update(payload_part.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| "signature mismatch")?;

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(payload_part)
            .map_err(|_| "payload is not base64")?;
        let payload: SignedPayload = self
            .codec
            .decode(&payload_bytes)
            .map_err(|_| "payload is not a session")?;

        if payload.exp <= now.timestamp() {
            return Err("expired");
        }

        Ok(payload.session)
    }

    fn mac(&self) -> Result<HmacSha256, String> {
        HmacSha256::new_from_slice(&self.secret).map_err(|e| e.to_string())
    }
}

// =========================================================================
// Tests
// =========================================================================
