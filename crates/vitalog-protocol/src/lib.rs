//! Wire protocol for Vitalog.
//!
//! This crate defines the "language" that the browser (or any HTTP client)
//! and the server speak:
//!
//! - **Types** ([`Session`], [`SessionUser`], [`Reading`], request bodies):
//!   the JSON structures that travel over HTTP.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those structures
//!   are converted to/from bytes.
//! - **Validation** ([`Validate`], [`ValidationDetails`]): the gate that
//!   rejects malformed payloads with field-level detail before they reach
//!   the session or reading layers.
//! - **Errors** ([`ProtocolError`]): what can go wrong while doing any of
//!   the above.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about cookies, stores, or HTTP status
//! codes. It only knows the shapes of the messages.
//!
//! ```text
//! HTTP body (bytes) → Protocol (typed, validated) → Session / Readings
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod codec;
mod error;
mod types;
mod validate;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ErrorBody, LogoutResponse, Measurement, Reading, ReadingId, ReadingInput,
    Session, SessionUser, SigninRequest, SignupRequest, UserId,
};
pub use validate::{ReadingDraft, Validate, ValidationDetails};
