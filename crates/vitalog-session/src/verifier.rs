//! Request-scoped session verification.
//!
//! One request may ask "who is signed in?" several times: an extractor,
//! a handler, a log line. Checking the HMAC each time is wasted work, so a
//! [`SessionVerifier`] is built once per request around the raw cookie and
//! remembers its first answer. Nothing is shared across requests.

use std::sync::OnceLock;

use vitalog_protocol::Session;

use crate::SessionCodec;

/// Decodes a request's session cookie at most once.
#[derive(Debug, Default)]
pub struct SessionVerifier {
    cookie: Option<String>,
    result: OnceLock<Option<Session>>,
}

impl SessionVerifier {
    /// Wraps the raw cookie value of one request (`None` if absent).
    pub fn new(cookie: Option<String>) -> Self {
        Self {
            cookie,
            result: OnceLock::new(),
        }
    }

    /// Returns the session carried by the cookie, or `None` if there is no
    /// valid one.
    ///
    /// The first call decodes; later calls return the cached answer.
    pub fn verify(&self, codec: &SessionCodec) -> Option<&Session> {
        self.result
            .get_or_init(|| codec.decode(self.cookie.as_deref()))
            .as_ref()
    }

    /// Returns `true` once `verify` has run.
    pub fn is_resolved(&self) -> bool {
        self.result.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use vitalog_protocol::{SessionUser, UserId};

    use super::*;

    fn codec() -> SessionCodec {
        SessionCodec::new(vec![1u8; 32]).unwrap()
    }

    fn session() -> Session {
        Session {
            access_token: "tok".into(),
            email: "ana@x.com".into(),
            user: SessionUser {
                id: UserId::new(),
                name: "ana".into(),
                image: None,
            },
        }
    }

    #[test]
    fn test_verify_valid_cookie_returns_session() {
        let codec = codec();
        let original = session();
        let cookie = codec
            .encode(&original, Utc::now() + Duration::hours(1))
            .unwrap();

        let verifier = SessionVerifier::new(Some(cookie));

        assert_eq!(verifier.verify(&codec), Some(&original));
    }

    #[test]
    fn test_verify_without_cookie_returns_none() {
        let verifier = SessionVerifier::new(None);

        assert_eq!(verifier.verify(&codec()), None);
        assert!(verifier.is_resolved());
    }

    #[test]
    fn test_verify_caches_first_answer() {
        let codec = codec();
        let cookie = codec
            .encode(&session(), Utc::now() + Duration::hours(1))
            .unwrap();
        let verifier = SessionVerifier::new(Some(cookie));
        assert!(!verifier.is_resolved());

        let first = verifier.verify(&codec).cloned();
        // A different key would reject the cookie if it were decoded again.
        let other = SessionCodec::new(vec![2u8; 32]).unwrap();
        let second = verifier.verify(&other).cloned();

        assert!(first.is_some());
        assert_eq!(first, second);
    }
}
