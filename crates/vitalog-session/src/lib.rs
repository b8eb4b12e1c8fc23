//! Session management for Vitalog.
//!
//! This crate handles everything between "a user typed a password" and
//! "this request belongs to user X":
//!
//! 1. **Tokens**: minting opaque access tokens ([`generate_token`])
//! 2. **Cookies**: signing sessions into tamper-evident cookie values
//!    ([`SessionCodec`])
//! 3. **Passwords**: salted hashing and verification ([`PasswordHasher`])
//! 4. **Storage seam**: the user records that own the tokens
//!    ([`UserStore`], with [`InMemoryUserStore`])
//! 5. **Lifecycle**: issuing, rotating and terminating sessions
//!    ([`SessionLifecycle`])
//! 6. **Verification**: decoding the inbound cookie once per request
//!    ([`SessionVerifier`])
//!
//! # How it fits in the stack
//!
//! ```text
//! HTTP server (above)   ← reads/writes cookies, maps errors to statuses
//!     ↕
//! Session layer (this crate)  ← decides who the caller is
//!     ↕
//! Protocol layer (below)  ← provides Session, UserId, request types
//! ```

mod codec;
mod error;
mod lifecycle;
mod password;
mod session;
mod store;
mod token;
mod verifier;

pub use codec::{MIN_SECRET_LEN, SessionCodec};
pub use error::{SessionError, StoreError};
pub use lifecycle::SessionLifecycle;
pub use password::{BcryptHasher, PasswordHasher};
pub use session::{IssuedSession, SessionConfig};
pub use store::{InMemoryUserStore, UserRecord, UserStore};
pub use token::generate_token;
pub use verifier::SessionVerifier;
