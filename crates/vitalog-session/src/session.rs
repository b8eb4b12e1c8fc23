//! Session configuration and the result of issuing a session.

use std::time::Duration;

use chrono::{DateTime, Utc};
use vitalog_protocol::Session;

use crate::BcryptHasher;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
///
/// Sensible defaults are provided; the server overrides individual fields
/// from its environment.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Name of the session cookie.
    ///
    /// Default: `"session"`.
    pub cookie_name: String,

    /// How long an issued (or rotated) cookie stays valid.
    ///
    /// Default: 7 days. Each rotation starts a fresh period.
    pub max_age: Duration,

    /// Whether the cookie carries the `Secure` attribute.
    ///
    /// Default: `true`. Only turn this off for plain-HTTP local setups.
    pub secure_cookie: bool,

    /// Bcrypt work factor for new password hashes.
    ///
    /// Default: 12.
    pub bcrypt_cost: u32,
}

impl SessionConfig {
    /// Shortest accepted cookie lifetime.
    pub const MIN_MAX_AGE: Duration = Duration::from_secs(60);

    /// Longest accepted cookie lifetime (400 days, the browser cap).
    pub const MAX_MAX_AGE: Duration = Duration::from_secs(400 * 24 * 60 * 60);

    /// Highest bcrypt cost the algorithm supports.
    pub const MAX_BCRYPT_COST: u32 = 31;

    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// Rules:
    /// - `max_age` within [`Self::MIN_MAX_AGE`]`..=`[`Self::MAX_MAX_AGE`].
    /// - `bcrypt_cost` within `BcryptHasher::MIN_COST..=MAX_BCRYPT_COST`.
    /// - an empty `cookie_name` falls back to the default.
    pub fn validated(mut self) -> Self {
        if self.max_age < Self::MIN_MAX_AGE {
            tracing::warn!(
                max_age_secs = self.max_age.as_secs(),
                "session max_age too short, clamping"
            );
            self.max_age = Self::MIN_MAX_AGE;
        } else if self.max_age > Self::MAX_MAX_AGE {
            tracing::warn!(
                max_age_secs = self.max_age.as_secs(),
                "session max_age too long, clamping"
            );
            self.max_age = Self::MAX_MAX_AGE;
        }
        let clamped = self
            .bcrypt_cost
            .clamp(BcryptHasher::MIN_COST, Self::MAX_BCRYPT_COST);
        if clamped != self.bcrypt_cost {
            tracing::warn!(
                cost = self.bcrypt_cost,
                clamped,
                "bcrypt cost out of range, clamping"
            );
            self.bcrypt_cost = clamped;
        }
        if self.cookie_name.trim().is_empty() {
            self.cookie_name = Self::default().cookie_name;
        }
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session".to_string(),
            max_age: Duration::from_secs(7 * 24 * 60 * 60),
            secure_cookie: true,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

// ---------------------------------------------------------------------------
// IssuedSession
// ---------------------------------------------------------------------------

/// A session that has just been issued or rotated.
///
/// By the time one of these exists, the token inside `session` is already
/// persisted. All that's left is to hand `cookie_value` to the client with
/// an absolute expiry of `expires_at`.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// The decoded session (also what signup/signin return as JSON).
    pub session: Session,
    /// The signed value to put in the cookie.
    pub cookie_value: String,
    /// Absolute expiry, baked into both the signed value and the cookie.
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = SessionConfig::default();

        assert_eq!(config.cookie_name, "session");
        assert_eq!(config.max_age, Duration::from_secs(604_800));
        assert!(config.secure_cookie);
        assert_eq!(config.bcrypt_cost, 12);
    }

    #[test]
    fn test_validated_clamps_out_of_range_values() {
        let config = SessionConfig {
            cookie_name: "  ".into(),
            max_age: Duration::from_secs(1),
            secure_cookie: false,
            bcrypt_cost: 99,
        }
        .validated();

        assert_eq!(config.cookie_name, "session");
        assert_eq!(config.max_age, SessionConfig::MIN_MAX_AGE);
        assert_eq!(config.bcrypt_cost, 31);
        assert!(!config.secure_cookie, "unrelated fields are untouched");
    }

    #[test]
    fn test_validated_clamps_huge_max_age() {
        let config = SessionConfig {
            max_age: Duration::from_secs(10_000_000_000_000),
            ..SessionConfig::default()
        }
        .validated();

        assert_eq!(config.max_age, SessionConfig::MAX_MAX_AGE);
    }

    #[test]
    fn test_validated_keeps_max_age_at_upper_bound() {
        let config = SessionConfig {
            max_age: SessionConfig::MAX_MAX_AGE,
            ..SessionConfig::default()
        }
        .validated();

        assert_eq!(config.max_age, SessionConfig::MAX_MAX_AGE);
    }

    #[test]
    fn test_validated_raises_low_bcrypt_cost() {
        let config = SessionConfig {
            bcrypt_cost: 1,
            ..SessionConfig::default()
        }
        .validated();

        assert_eq!(config.bcrypt_cost, BcryptHasher::MIN_COST);
    }
}
