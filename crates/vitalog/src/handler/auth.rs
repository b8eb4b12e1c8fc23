//! Session endpoints.
//!
//! Every handler that issues a session follows the same order: the
//! lifecycle persists the token, and only then is the cookie written.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use time::OffsetDateTime;
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};
use vitalog_protocol::{LogoutResponse, Session, SessionUser, SigninRequest, SignupRequest};
use vitalog_readings::ReadingStore;
use vitalog_session::{IssuedSession, SessionConfig, SessionError, UserStore};

use crate::extract::{CurrentSession, ValidJson};
use crate::{ApiError, AppState};

/// `POST /signup`
pub(crate) async fn signup<U: UserStore, R: ReadingStore>(
    State(state): State<Arc<AppState<U, R>>>,
    cookies: Cookies,
    ValidJson(req): ValidJson<SignupRequest>,
) -> Result<Json<Session>, ApiError> {
    let issued = state.sessions.sign_up(req).await?;
    set_session_cookie(&cookies, state.sessions.config(), &issued);
    Ok(Json(issued.session))
}

/// `POST /signin`
pub(crate) async fn signin<U: UserStore, R: ReadingStore>(
    State(state): State<Arc<AppState<U, R>>>,
    cookies: Cookies,
    ValidJson(req): ValidJson<SigninRequest>,
) -> Result<Json<Session>, ApiError> {
    let issued = state.sessions.sign_in(req).await?;
    set_session_cookie(&cookies, state.sessions.config(), &issued);
    Ok(Json(issued.session))
}

/// `POST /session`: liveness check.
///
/// A current session is rotated (fresh token, fresh cookie) and its user
/// returned. Anything else is a 401 and the cookie is cleared.
pub(crate) async fn session<U: UserStore, R: ReadingStore>(
    State(state): State<Arc<AppState<U, R>>>,
    cookies: Cookies,
    CurrentSession(session): CurrentSession,
) -> Result<Json<SessionUser>, ApiError> {
    let config = state.sessions.config();
    let Some(session) = session else {
        clear_session_cookie(&cookies, config);
        return Err(ApiError::Unauthenticated);
    };

    match state.sessions.rotate(&session).await {
        Ok(issued) => {
            set_session_cookie(&cookies, config, &issued);
            Ok(Json(issued.session.user))
        }
        Err(SessionError::Unauthenticated) => {
            clear_session_cookie(&cookies, config);
            Err(ApiError::Unauthenticated)
        }
        Err(e) => Err(e.into()),
    }
}

/// `POST /logout`: always succeeds.
///
/// The cookie is cleared unconditionally. If the request carried a current
/// session, its token is revoked too; a failure there is logged, not
/// reported, since the client is signed out either way.
pub(crate) async fn logout<U: UserStore, R: ReadingStore>(
    State(state): State<Arc<AppState<U, R>>>,
    cookies: Cookies,
    CurrentSession(session): CurrentSession,
) -> Json<LogoutResponse> {
    if let Err(e) = state.sessions.terminate(session.as_ref()).await {
        tracing::warn!(error = %e, "could not revoke token at logout");
    }
    clear_session_cookie(&cookies, state.sessions.config());
    Json(LogoutResponse { success: true })
}

// ---------------------------------------------------------------------------
// Cookies
// ---------------------------------------------------------------------------

/// Writes the session cookie: `HttpOnly`, `SameSite=Lax`, `Path=/`,
/// `Secure` unless disabled, with both `Max-Age` and an absolute `Expires`
/// matching the expiry signed into the value.
fn set_session_cookie(cookies: &Cookies, config: &SessionConfig, issued: &IssuedSession) {
    let expires = OffsetDateTime::from_unix_timestamp(issued.expires_at.timestamp())
        .unwrap_or_else(|_| OffsetDateTime::now_utc());
    let max_age = time::Duration::seconds(
        i64::try_from(config.max_age.as_secs()).unwrap_or(i64::MAX),
    );

    let cookie = Cookie::build((config.cookie_name.clone(), issued.cookie_value.clone()))
        .http_only(true)
        .secure(config.secure_cookie)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .expires(expires)
        .build();
    cookies.add(cookie);
}

fn clear_session_cookie(cookies: &Cookies, config: &SessionConfig) {
    let cookie = Cookie::build((config.cookie_name.clone(), ""))
        .http_only(true)
        .secure(config.secure_cookie)
        .same_site(SameSite::Lax)
        .path("/")
        .build();
    cookies.remove(cookie);
}
