//! Core protocol types for Vitalog's wire format.
//!
//! Every type here travels "on the wire": it is serialized to JSON, sent
//! over HTTP (or stored inside the session cookie), and deserialized on
//! the other side. Field names are camelCase on the wire because that is
//! what browser clients expect.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a registered user.
///
/// A newtype around a UUID v4, so a `UserId` can never be passed where a
/// [`ReadingId`] is expected. `#[serde(transparent)]` makes it serialize
/// as the bare UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generates a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique identifier for a single blood-pressure reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadingId(pub Uuid);

impl ReadingId {
    /// Generates a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReadingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReadingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The denormalized user snapshot carried inside a [`Session`].
///
/// This is a COPY taken when the session was encoded. If the user later
/// changes their name, old cookies keep the old name until the next
/// rotation re-encodes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub name: String,
    /// Avatar URL. `None` serializes as `null`.
    pub image: Option<String>,
}

/// Client-held proof of authentication.
///
/// A session is never stored on the server. It is derived from the user
/// record, encoded into a signed cookie, and decoded again on each
/// request. Rotation does not mutate a session: it produces a new one
/// that replaces the old cookie.
///
/// ```text
/// {"accessToken":"9f…","email":"ana@x.com","user":{"id":"…","name":"ana","image":null}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// The opaque token that must match the user's stored token.
    pub access_token: String,
    /// Lowercased email, copied from the user record.
    pub email: String,
    pub user: SessionUser,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body of `POST /signup`.
///
/// Every field has `#[serde(default)]` so that a missing field becomes an
/// empty value and is reported by validation as a field-level error,
/// instead of failing the whole body with an opaque decode error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Brazilian postal code. Optional, but must be non-empty if present.
    pub cep: Option<String>,
}

/// Body of `POST /signin`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

/// A numeric measurement as the client sent it.
///
/// Form inputs in browsers produce strings (`"120"`), while scripted
/// clients send numbers (`120`). Both are accepted on the wire and parsed
/// during validation, so a non-numeric string is reported against its
/// field rather than rejecting the whole body.
///
/// `#[serde(untagged)]` tells serde to try each variant in order until
/// one fits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Measurement {
    Number(i64),
    Text(String),
}

/// Body of `POST /readings` and `PUT /readings/{id}`.
///
/// `date` is `YYYY-MM-DD` and `time` is `HH:MM`, exactly as a date and a
/// time input produce them. Validation turns this into a
/// [`ReadingDraft`](crate::ReadingDraft).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReadingInput {
    pub date: String,
    pub time: String,
    pub systolic: Option<Measurement>,
    pub diastolic: Option<Measurement>,
    pub heart_rate: Option<Measurement>,
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// A stored reading, as returned by the reading endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub id: ReadingId,
    pub user_id: UserId,
    /// Local date-time of the measurement (`2025-03-01T08:30:00`).
    pub date: NaiveDateTime,
    pub systolic: u16,
    pub diastolic: u16,
    pub heart_rate: u16,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// The JSON body of every non-2xx response.
///
/// `details` is only present for validation failures; authentication and
/// internal errors deliberately carry a bare message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<crate::ValidationDetails>,
}

impl ErrorBody {
    /// An error with just a message.
    pub fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }
}

/// Body of a successful `POST /logout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub success: bool,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_session() -> Session {
        Session {
            access_token: "deadbeef".into(),
            email: "ana@x.com".into(),
            user: SessionUser {
                id: UserId(Uuid::nil()),
                name: "ana".into(),
                image: None,
            },
        }
    }

    #[test]
    fn test_session_json_uses_camel_case_keys() {
        let json = serde_json::to_value(sample_session()).unwrap();

        assert_eq!(json["accessToken"], "deadbeef");
        assert_eq!(json["email"], "ana@x.com");
        assert_eq!(json["user"]["name"], "ana");
        // `None` image is sent as an explicit null.
        assert!(json["user"]["image"].is_null());
    }

    #[test]
    fn test_user_id_serializes_as_plain_string() {
        let json = serde_json::to_value(UserId(Uuid::nil())).unwrap();

        assert_eq!(json, "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn test_signup_request_missing_fields_default_to_empty() {
        let req: SignupRequest = serde_json::from_str(r#"{"name":"Ana"}"#).unwrap();

        assert_eq!(req.name, "Ana");
        assert_eq!(req.email, "");
        assert_eq!(req.cep, None);
    }

    #[test]
    fn test_reading_input_accepts_numbers_and_strings() {
        let input: ReadingInput = serde_json::from_str(
            r#"{"date":"2025-03-01","time":"08:30","systolic":"120","diastolic":80,"heartRate":"72"}"#,
        )
        .unwrap();

        assert_eq!(input.systolic, Some(Measurement::Text("120".into())));
        assert_eq!(input.diastolic, Some(Measurement::Number(80)));
        assert_eq!(input.heart_rate, Some(Measurement::Text("72".into())));
        assert_eq!(input.notes, None);
    }

    #[test]
    fn test_error_body_without_details_omits_key() {
        let json = serde_json::to_value(ErrorBody::message("invalid credentials")).unwrap();

        assert_eq!(json["error"], "invalid credentials");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_reading_json_format() {
        let reading = Reading {
            id: ReadingId(Uuid::nil()),
            user_id: UserId(Uuid::nil()),
            date: NaiveDateTime::parse_from_str("2025-03-01T08:30:00", "%Y-%m-%dT%H:%M:%S")
                .unwrap(),
            systolic: 120,
            diastolic: 80,
            heart_rate: 72,
            notes: String::new(),
            created_at: DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
        };

        let json = serde_json::to_value(&reading).unwrap();

        assert_eq!(json["date"], "2025-03-01T08:30:00");
        assert_eq!(json["heartRate"], 72);
        assert!(json.get("userId").is_some());
    }
}
