//! The server endpoints the client talks to.

use std::future::Future;

use reqwest::{Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use vitalog_protocol::{
    ErrorBody, LogoutResponse, Session, SessionUser, SigninRequest, SignupRequest,
};

use crate::ClientError;

/// The session endpoints, as seen from the client.
///
/// [`HttpSessionApi`] is the real implementation; tests substitute a mock
/// to drive the watcher without a server.
pub trait SessionApi: Send + Sync + 'static {
    /// Calls the liveness endpoint, which also rotates the session cookie.
    fn check_session(&self) -> impl Future<Output = Result<SessionUser, ClientError>> + Send;

    /// Asks the server to end the session.
    fn logout(&self) -> impl Future<Output = Result<(), ClientError>> + Send;
}

/// [`SessionApi`] over HTTP, with a cookie jar so the session cookie set
/// by sign-in (and re-set by every rotation) rides along automatically.
#[derive(Debug, Clone)]
pub struct HttpSessionApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSessionApi {
    /// Creates a client for the server at `base_url` (e.g.
    /// `http://127.0.0.1:8080`).
    ///
    /// # Errors
    /// Returns [`ClientError::Transport`] if the HTTP client can't be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Registers a user. On success the jar holds the new session cookie.
    pub async fn signup(&self, req: &SignupRequest) -> Result<Session, ClientError> {
        self.post_json("/signup", req).await
    }

    /// Signs in. On success the jar holds the new session cookie.
    pub async fn signin(&self, req: &SigninRequest) -> Result<Session, ClientError> {
        self.post_json("/signin", req).await
    }

    /// The underlying HTTP client (shares the cookie jar).
    pub fn http(&self) -> &reqwest::Client {
        &self.client
    }

    /// Absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Ok(expect_success(response).await?.json().await?)
    }
}

impl SessionApi for HttpSessionApi {
    async fn check_session(&self) -> Result<SessionUser, ClientError> {
        let response = self.client.post(self.url("/session")).send().await?;
        Ok(expect_success(response).await?.json().await?)
    }

    async fn logout(&self) -> Result<(), ClientError> {
        let response = self.client.post(self.url("/logout")).send().await?;
        let body: LogoutResponse = expect_success(response).await?.json().await?;
        if body.success {
            Ok(())
        } else {
            Err(ClientError::Rejected {
                status: StatusCode::OK.as_u16(),
                message: "logout not acknowledged".into(),
                details: None,
            })
        }
    }
}

/// Passes a 2xx response through and turns anything else into a
/// [`ClientError`], reading the server's `{error, details}` body if any.
async fn expect_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ClientError::Unauthenticated);
    }

    let text = response.text().await.unwrap_or_default();
    let (message, details) = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => (body.error, body.details),
        Err(_) => (text, None),
    };
    Err(ClientError::Rejected {
        status: status.as_u16(),
        message,
        details,
    })
}
