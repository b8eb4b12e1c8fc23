//! Server configuration from the environment.
//!
//! | Variable                      | Default          |
//! |-------------------------------|------------------|
//! | `VITALOG_BIND`                | `127.0.0.1:8080` |
//! | `VITALOG_SESSION_SECRET`      | random per boot  |
//! | `VITALOG_COOKIE_MAX_AGE_SECS` | `604800` (7 d)   |
//! | `VITALOG_COOKIE_SECURE`       | `true`           |
//! | `VITALOG_BCRYPT_COST`         | `12`             |
//!
//! A missing or unparsable variable falls back to its default with a
//! warning. Startup never fails on configuration alone, except for a
//! secret that is present but too short.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};
use vitalog_session::{MIN_SECRET_LEN, SessionConfig};

const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Everything needed to start a server.
#[derive(Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: String,
    /// Cookie signing secret. `None` means "generate one at startup".
    pub session_secret: Option<String>,
    pub session: SessionConfig,
}

/// Hand-written so the secret never ends up in a log line.
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("session_secret", &self.session_secret.as_ref().map(|_| "<redacted>"))
            .field("session", &self.session)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            session_secret: None,
            session: SessionConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup` (a variable name → value
    /// function), so tests don't have to touch the real environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let bind_addr = lookup("VITALOG_BIND").unwrap_or_else(|| {
            info!(default = DEFAULT_BIND, "VITALOG_BIND not set, using default");
            defaults.bind_addr.clone()
        });
        let session_secret = lookup("VITALOG_SESSION_SECRET").filter(|s| !s.is_empty());

        let session = SessionConfig {
            max_age: Duration::from_secs(parse_or(
                &lookup,
                "VITALOG_COOKIE_MAX_AGE_SECS",
                defaults.session.max_age.as_secs(),
            )),
            secure_cookie: parse_or(
                &lookup,
                "VITALOG_COOKIE_SECURE",
                defaults.session.secure_cookie,
            ),
            bcrypt_cost: parse_or(&lookup, "VITALOG_BCRYPT_COST", defaults.session.bcrypt_cost),
            ..defaults.session
        };

        Self {
            bind_addr,
            session_secret,
            session,
        }
        .validated()
    }

    /// Clamps out-of-range values (delegates to [`SessionConfig::validated`]).
    pub fn validated(mut self) -> Self {
        self.session = self.session.validated();
        self
    }

    /// The secret to sign cookies with.
    ///
    /// Without a configured secret a random one is generated, which means
    /// every restart signs everyone out.
    pub fn resolve_secret(&self) -> Vec<u8> {
        match &self.session_secret {
            Some(secret) => secret.as_bytes().to_vec(),
            None => {
                warn!(
                    "VITALOG_SESSION_SECRET not set, generating an ephemeral secret; \
                     sessions will not survive a restart"
                );
                let bytes: [u8; MIN_SECRET_LEN] = rand::rng().random();
                hex::encode(bytes).into_bytes()
            }
        }
    }
}

/// Parses `key` if present and valid, otherwise returns `default`.
fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!(key, value = %raw, error = %e, %default, "invalid value, using default");
            default
        }),
    }
}
