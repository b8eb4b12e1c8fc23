//! Request extractors.
//!
//! - [`CurrentSession`]: the session in the cookie, if it verifies
//! - [`AuthenticatedUser`]: a session whose token is still current
//! - [`ValidJson`]: a JSON body that passed [`Validate`]

use std::sync::Arc;

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use tower_cookies::Cookies;
use vitalog_protocol::{Session, Validate};
use vitalog_readings::ReadingStore;
use vitalog_session::{SessionVerifier, UserRecord, UserStore};

use crate::{ApiError, AppState};

/// The verified session of this request, or `None`.
///
/// The cookie is decoded once per request: the first extraction stores
/// a [`SessionVerifier`] in the request extensions, later ones reuse it.
/// This does NOT consult the user store; see [`AuthenticatedUser`].
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Option<Session>);

impl<U: UserStore, R: ReadingStore> FromRequestParts<Arc<AppState<U, R>>> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<U, R>>,
    ) -> Result<Self, Self::Rejection> {
        let verifier = match parts.extensions.get::<Arc<SessionVerifier>>() {
            Some(verifier) => Arc::clone(verifier),
            None => {
                let cookies = Cookies::from_request_parts(parts, state)
                    .await
                    .map_err(|(_, reason)| ApiError::Malformed(reason.to_string()))?;
                let cookie_name = &state.sessions.config().cookie_name;
                let raw = cookies.get(cookie_name).map(|c| c.value().to_string());

                let verifier = Arc::new(SessionVerifier::new(raw));
                parts.extensions.insert(Arc::clone(&verifier));
                verifier
            }
        };

        Ok(Self(verifier.verify(state.sessions.codec()).cloned()))
    }
}

/// The user behind a verified session whose token is still current.
///
/// Rejects with 401 when there is no cookie, the cookie doesn't verify,
/// or the token has been rotated away or revoked since it was issued.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserRecord);

impl<U: UserStore, R: ReadingStore> FromRequestParts<Arc<AppState<U, R>>> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<U, R>>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentSession(session) = CurrentSession::from_request_parts(parts, state).await?;
        let session = session.ok_or(ApiError::Unauthenticated)?;
        let user = state.sessions.current_user(&session).await?;
        Ok(Self(user))
    }
}

/// A JSON body of type `T`, deserialized and then validated.
///
/// Holds `T`'s validated form (`T::Output`). Bad JSON and failed rules
/// both become a 400 with `{formErrors, fieldErrors}` details.
pub struct ValidJson<T: Validate>(pub T::Output);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: Validate + DeserializeOwned + Send,
    T::Output: Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Malformed(rejection.body_text()))?;
        Ok(Self(value.validate()?))
    }
}
