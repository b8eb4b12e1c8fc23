//! Client-side session handling for Vitalog.
//!
//! Keeps the session a client believes it has, and notices when the server
//! stops agreeing.
//!
//! # Key types
//!
//! - [`SessionCache`]: the last-known session, observable via `watch`
//! - [`SessionApi`]: the server's session endpoints ([`HttpSessionApi`]
//!   over reqwest)
//! - [`SessionClient`]: liveness checks and logout against the cache
//! - [`WatcherHandle`]: the background polling task; drop to cancel
//!
//! # Integration
//!
//! ```ignore
//! let api = Arc::new(HttpSessionApi::new("http://127.0.0.1:8080")?);
//! let session = api.signin(&credentials).await?;
//!
//! let client = SessionClient::new(api, SessionCache::new(Some(session)), || {
//!     // re-render as signed out
//! });
//! let _watcher = client.spawn_watcher(WatcherConfig::default());
//! ```

mod api;
mod cache;
mod error;
mod watcher;

pub use api::{HttpSessionApi, SessionApi};
pub use cache::SessionCache;
pub use error::ClientError;
pub use watcher::{CheckOutcome, SessionClient, WatcherConfig, WatcherHandle};
