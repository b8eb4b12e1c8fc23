//! Reading endpoints. All of them require a current session.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use chrono::{Local, NaiveDateTime};
use vitalog_protocol::{Reading, ReadingId, ReadingInput};
use vitalog_readings::{Dashboard, HistoryFilter, ReadingStore, to_csv};
use vitalog_session::UserStore;

use crate::extract::{AuthenticatedUser, ValidJson};
use crate::{ApiError, AppState};

/// Reading dates are wall-clock times as the user typed them, so "now"
/// is the server's local time.
fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn reading_id(path: Result<Path<ReadingId>, PathRejection>) -> Result<ReadingId, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|e| ApiError::Malformed(e.body_text()))
}

fn history_filter(
    query: Result<Query<HistoryFilter>, QueryRejection>,
) -> Result<HistoryFilter, ApiError> {
    query
        .map(|Query(filter)| filter)
        .map_err(|e| ApiError::Malformed(e.body_text()))
}

/// `GET /readings`
pub(crate) async fn list<U: UserStore, R: ReadingStore>(
    State(state): State<Arc<AppState<U, R>>>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Reading>>, ApiError> {
    Ok(Json(state.readings.list(user.id).await?))
}

/// `POST /readings`
pub(crate) async fn create<U: UserStore, R: ReadingStore>(
    State(state): State<Arc<AppState<U, R>>>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidJson(draft): ValidJson<ReadingInput>,
) -> Result<(StatusCode, Json<Reading>), ApiError> {
    let reading = state.readings.create(user.id, draft).await?;
    tracing::info!(user_id = %user.id, reading_id = %reading.id, "reading recorded");
    Ok((StatusCode::CREATED, Json(reading)))
}

/// `PUT /readings/{id}`
pub(crate) async fn update<U: UserStore, R: ReadingStore>(
    State(state): State<Arc<AppState<U, R>>>,
    AuthenticatedUser(user): AuthenticatedUser,
    path: Result<Path<ReadingId>, PathRejection>,
    ValidJson(draft): ValidJson<ReadingInput>,
) -> Result<Json<Reading>, ApiError> {
    let id = reading_id(path)?;
    Ok(Json(state.readings.update(user.id, id, draft).await?))
}

/// `DELETE /readings/{id}`
pub(crate) async fn delete<U: UserStore, R: ReadingStore>(
    State(state): State<Arc<AppState<U, R>>>,
    AuthenticatedUser(user): AuthenticatedUser,
    path: Result<Path<ReadingId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = reading_id(path)?;
    state.readings.delete(user.id, id).await?;
    tracing::info!(user_id = %user.id, reading_id = %id, "reading deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /readings/dashboard`
pub(crate) async fn dashboard<U: UserStore, R: ReadingStore>(
    State(state): State<Arc<AppState<U, R>>>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Dashboard>, ApiError> {
    let readings = state.readings.list(user.id).await?;
    Ok(Json(Dashboard::build(&readings, now())))
}

/// `GET /readings/history`
pub(crate) async fn history<U: UserStore, R: ReadingStore>(
    State(state): State<Arc<AppState<U, R>>>,
    AuthenticatedUser(user): AuthenticatedUser,
    query: Result<Query<HistoryFilter>, QueryRejection>,
) -> Result<Json<Vec<Reading>>, ApiError> {
    let filter = history_filter(query)?;
    let readings = state.readings.list(user.id).await?;
    Ok(Json(filter.apply(&readings, now())))
}

/// `GET /readings/export`: same filters as history, as a CSV download.
pub(crate) async fn export<U: UserStore, R: ReadingStore>(
    State(state): State<Arc<AppState<U, R>>>,
    AuthenticatedUser(user): AuthenticatedUser,
    query: Result<Query<HistoryFilter>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = history_filter(query)?;
    let readings = state.readings.list(user.id).await?;
    let csv = to_csv(&filter.apply(&readings, now()));

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"readings.csv\"",
            ),
        ],
        csv,
    ))
}
