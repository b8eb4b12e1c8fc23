//! `VitalogServer` builder and server loop.
//!
//! This is the entry point for running a Vitalog server. It ties the
//! layers together: configuration → session lifecycle + reading store →
//! axum router → TCP listener.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use tokio::net::TcpListener;
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;
use vitalog_readings::{InMemoryReadingStore, ReadingStore};
use vitalog_session::{
    BcryptHasher, InMemoryUserStore, SessionCodec, SessionConfig, SessionLifecycle, UserStore,
};

use crate::handler::{auth, health, readings};
use crate::{ServerConfig, VitalogError};

/// Shared state handed to every request handler.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The stores
/// synchronize internally; nothing here needs an outer lock.
pub struct AppState<U: UserStore, R: ReadingStore> {
    pub sessions: SessionLifecycle<U, BcryptHasher>,
    pub readings: Arc<R>,
}

/// Builds the router for `state`.
///
/// Exposed separately from [`VitalogServer`] so tests can drive it
/// without a socket.
pub fn router<U: UserStore, R: ReadingStore>(state: Arc<AppState<U, R>>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/signup", post(auth::signup::<U, R>))
        .route("/signin", post(auth::signin::<U, R>))
        .route("/session", post(auth::session::<U, R>))
        .route("/logout", post(auth::logout::<U, R>))
        .route(
            "/readings",
            get(readings::list::<U, R>).post(readings::create::<U, R>),
        )
        .route("/readings/dashboard", get(readings::dashboard::<U, R>))
        .route("/readings/history", get(readings::history::<U, R>))
        .route("/readings/export", get(readings::export::<U, R>))
        .route(
            "/readings/{id}",
            put(readings::update::<U, R>).delete(readings::delete::<U, R>),
        )
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Builder for configuring and starting a Vitalog server.
///
/// # Example
///
/// ```rust,ignore
/// let server = VitalogServer::builder()
///     .bind("0.0.0.0:8080")
///     .session_secret(secret)
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct VitalogServerBuilder {
    config: ServerConfig,
}

impl VitalogServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces the whole configuration (e.g. with [`ServerConfig::from_env`]).
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the cookie signing secret (at least 32 bytes).
    pub fn session_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.session_secret = Some(secret.into());
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    /// Binds the listener and builds a server backed by in-memory stores.
    pub async fn build(
        self,
    ) -> Result<VitalogServer<InMemoryUserStore, InMemoryReadingStore>, VitalogError> {
        self.build_with(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryReadingStore::new()),
        )
        .await
    }

    /// Binds the listener and builds a server backed by the given stores.
    ///
    /// # Errors
    /// - [`VitalogError::Session`] if the secret is too short
    /// - [`VitalogError::Io`] if the address can't be bound
    pub async fn build_with<U: UserStore, R: ReadingStore>(
        self,
        users: Arc<U>,
        readings: Arc<R>,
    ) -> Result<VitalogServer<U, R>, VitalogError> {
        let config = self.config.validated();
        let codec = SessionCodec::new(config.resolve_secret())?;
        let hasher = BcryptHasher::new(config.session.bcrypt_cost);

        let state = Arc::new(AppState {
            sessions: SessionLifecycle::new(users, hasher, codec, config.session.clone()),
            readings,
        });

        let listener = TcpListener::bind(&config.bind_addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "bound");

        Ok(VitalogServer { listener, state })
    }
}

impl Default for VitalogServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Vitalog server.
///
/// Call [`run()`](Self::run) to start serving requests.
pub struct VitalogServer<U: UserStore, R: ReadingStore> {
    listener: TcpListener,
    state: Arc<AppState<U, R>>,
}

impl VitalogServer<InMemoryUserStore, InMemoryReadingStore> {
    /// Creates a new builder.
    pub fn builder() -> VitalogServerBuilder {
        VitalogServerBuilder::new()
    }
}

impl<U: UserStore, R: ReadingStore> VitalogServer<U, R> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The shared state (stores and session lifecycle).
    pub fn state(&self) -> &Arc<AppState<U, R>> {
        &self.state
    }

    /// Serves until Ctrl+C or SIGTERM, then drains in-flight requests.
    pub async fn run(self) -> Result<(), VitalogError> {
        self.run_until(shutdown_signal()).await
    }

    /// Serves until `shutdown` completes, then drains in-flight requests.
    pub async fn run_until(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), VitalogError> {
        tracing::info!("Vitalog server running");
        axum::serve(self.listener, router(self.state))
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!("Vitalog server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!(error = %e, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

// =========================================================================
// Tests
// =========================================================================
