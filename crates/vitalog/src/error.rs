//! Error types for the server.
//!
//! Two layers:
//! - [`VitalogError`]: startup failures (binding, bad secret). Returned by
//!   the builder and `run`.
//! - [`ApiError`]: everything a request handler can fail with. Wraps
//!   each crate's error via `#[from]`, so handlers just use `?`, and maps
//!   it to a status code and a JSON [`ErrorBody`] in one place.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use vitalog_protocol::{ErrorBody, ProtocolError, ValidationDetails};
use vitalog_readings::ReadingError;
use vitalog_session::SessionError;

/// Errors that stop the server from starting or running.
#[derive(Debug, thiserror::Error)]
pub enum VitalogError {
    /// Binding or serving failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The session layer couldn't be set up (e.g. a weak secret).
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Errors returned by request handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A body failed to parse or validate.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Authentication or session lifecycle failure.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Reading storage failure.
    #[error(transparent)]
    Reading(#[from] ReadingError),

    /// No valid, current session on a route that needs one.
    #[error("unauthorized")]
    Unauthenticated,

    /// The request was rejected before it reached validation (bad query
    /// string, bad path parameter, wrong content type).
    #[error("malformed request: {0}")]
    Malformed(String),
}

const INVALID_DATA: &str = "invalid data";
const UNAUTHORIZED: &str = "unauthorized";
const INVALID_CREDENTIALS: &str = "invalid credentials";
const INTERNAL: &str = "internal server error";

impl ApiError {
    /// The HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Protocol(ProtocolError::Encode(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Protocol(_) | Self::Malformed(_) => StatusCode::BAD_REQUEST,
            Self::Session(SessionError::EmailTaken) => StatusCode::BAD_REQUEST,
            Self::Session(SessionError::InvalidCredentials | SessionError::Unauthenticated)
            | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Reading(ReadingError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Reading(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The JSON body for this error.
    ///
    /// Only validation failures carry details. Internal errors get an
    /// opaque message; the real cause goes to the log instead.
    pub fn body(self) -> ErrorBody {
        match self {
            Self::Protocol(ProtocolError::Encode(_)) => ErrorBody::message(INTERNAL),
            Self::Protocol(e) => invalid(e.into_details()),
            Self::Malformed(reason) => {
                let mut details = ValidationDetails::default();
                details.form(reason);
                invalid(details)
            }
            Self::Session(SessionError::EmailTaken) => {
                let mut details = ValidationDetails::default();
                details.field("email", "already registered");
                invalid(details)
            }
            Self::Session(SessionError::InvalidCredentials) => {
                ErrorBody::message(INVALID_CREDENTIALS)
            }
            Self::Session(SessionError::Unauthenticated) | Self::Unauthenticated => {
                ErrorBody::message(UNAUTHORIZED)
            }
            Self::Session(_) => ErrorBody::message(INTERNAL),
            Self::Reading(ReadingError::NotFound(_)) => ErrorBody::message("reading not found"),
            Self::Reading(_) => ErrorBody::message(INTERNAL),
        }
    }
}

fn invalid(details: ValidationDetails) -> ErrorBody {
    ErrorBody {
        error: INVALID_DATA.to_string(),
        details: Some(details),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use vitalog_protocol::ReadingId;
    use vitalog_session::StoreError;

    use super::*;

    #[test]
    fn test_validation_error_is_400_with_details() {
        let mut details = ValidationDetails::default();
        details.field("systolic", "required");
        let err: ApiError = ProtocolError::Invalid(details.clone()).into();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let body = err.body();
        assert_eq!(body.error, "invalid data");
        assert_eq!(body.details, Some(details));
    }

    #[test]
    fn test_email_taken_is_400_on_email_field() {
        let err: ApiError = SessionError::EmailTaken.into();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let details = err.body().details.unwrap();
        assert_eq!(details.field_errors["email"], vec!["already registered"]);
    }

    #[test]
    fn test_auth_errors_are_401_without_details() {
        for err in [
            ApiError::from(SessionError::InvalidCredentials),
            ApiError::from(SessionError::Unauthenticated),
            ApiError::Unauthenticated,
        ] {
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(err.body().details, None);
        }
    }

    #[test]
    fn test_signin_failure_message_is_uniform() {
        let body = ApiError::from(SessionError::InvalidCredentials).body();

        assert_eq!(body.error, "invalid credentials");
    }

    #[test]
    fn test_not_found_is_404() {
        let err: ApiError = ReadingError::NotFound(ReadingId::new()).into();

        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_errors_are_opaque() {
        let err: ApiError =
            SessionError::Store(StoreError::Unavailable("db password is hunter2".into())).into();

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = err.body();
        assert_eq!(body.error, "internal server error");
        assert_eq!(body.details, None);
    }

    #[test]
    fn test_malformed_request_is_400_form_error() {
        let body = ApiError::Malformed("bad query".into()).body();

        assert_eq!(body.error, "invalid data");
        assert_eq!(body.details.unwrap().form_errors, vec!["bad query"]);
    }
}
