//! # Vitalog
//!
//! Blood-pressure tracking server with cookie-based sessions.
//!
//! Users sign up or sign in and receive a signed session cookie carrying
//! an opaque access token. Every liveness check (`POST /session`) rotates
//! that token, so a copied cookie goes stale on the next check. Reading
//! endpoints only accept a cookie whose token is still the user's current
//! one.
//!
//! ## Layers
//!
//! - `vitalog-protocol`: wire types and validation
//! - `vitalog-session`: tokens, signed cookies, the session lifecycle
//! - `vitalog-readings`: readings, classification, dashboard, export
//! - this crate: the axum server wiring it all to HTTP
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vitalog::{ServerConfig, VitalogServer};
//!
//! # async fn run() -> Result<(), vitalog::VitalogError> {
//! let server = VitalogServer::builder()
//!     .config(ServerConfig::from_env())
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod extract;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::{ApiError, VitalogError};
pub use extract::{AuthenticatedUser, CurrentSession, ValidJson};
pub use server::{AppState, VitalogServer, VitalogServerBuilder, router};
