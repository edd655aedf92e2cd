//! services/api/src/web/sessions.rs
//!
//! Handlers for booked sessions and their lifecycle.

use crate::error::ApiError;
use crate::web::dto::{
    BookSessionPayload, FeedbackPayload, MessageResponse, SessionResponse, StatusPayload,
};
use crate::web::extract::{ApiJson, ApiPath};
use crate::web::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use mentorship_core::domain::Actor;
use std::sync::Arc;
use uuid::Uuid;

/// A mentee books a session with a mentor.
#[utoipa::path(
    post,
    path = "/sessions",
    request_body = BookSessionPayload,
    responses(
        (status = 201, description = "Session booked", body = SessionResponse),
        (status = 400, description = "Missing or invalid fields", body = MessageResponse),
        (status = 403, description = "Caller is not a mentee", body = MessageResponse)
    )
)]
pub async fn book_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    ApiJson(payload): ApiJson<BookSessionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.services.sessions.book(actor, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(SessionResponse::from(&session))))
}

/// An admin schedules a session between a mentor and a mentee.
#[utoipa::path(
    post,
    path = "/admin/sessions",
    request_body = BookSessionPayload,
    responses(
        (status = 201, description = "Session created", body = SessionResponse),
        (status = 400, description = "Missing or invalid fields", body = MessageResponse),
        (status = 403, description = "Caller is not an admin", body = MessageResponse)
    )
)]
pub async fn admin_create_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    ApiJson(payload): ApiJson<BookSessionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .services
        .sessions
        .admin_create(actor, payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(SessionResponse::from(&session))))
}

/// The caller's sessions; every session for an admin.
#[utoipa::path(
    get,
    path = "/sessions",
    responses((status = 200, description = "Sessions", body = [SessionResponse]))
)]
pub async fn list_sessions_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<SessionResponse>>, ApiError> {
    let sessions = state.services.sessions.list(actor).await?;
    Ok(Json(sessions.iter().map(SessionResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/sessions/{id}",
    params(("id" = Uuid, Path, description = "The session ID.")),
    responses(
        (status = 200, description = "Session found", body = SessionResponse),
        (status = 403, description = "Not a party to the session", body = MessageResponse),
        (status = 404, description = "Session not found", body = MessageResponse)
    )
)]
pub async fn get_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    ApiPath(session_id): ApiPath<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.services.sessions.get(actor, session_id).await?;
    Ok(Json(SessionResponse::from(&session)))
}

/// The session's mentor changes its status.
#[utoipa::path(
    put,
    path = "/sessions/{id}",
    params(("id" = Uuid, Path, description = "The session ID.")),
    request_body = StatusPayload,
    responses(
        (status = 200, description = "Session updated", body = SessionResponse),
        (status = 400, description = "Invalid status or transition", body = MessageResponse),
        (status = 403, description = "Caller is not the session's mentor", body = MessageResponse),
        (status = 404, description = "Session not found", body = MessageResponse)
    )
)]
pub async fn update_session_status_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    ApiPath(session_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<StatusPayload>,
) -> Result<Json<SessionResponse>, ApiError> {
    let status = payload.status.unwrap_or_default();
    let session = state
        .services
        .sessions
        .update_status(actor, session_id, &status)
        .await?;
    Ok(Json(SessionResponse::from(&session)))
}

#[utoipa::path(
    put,
    path = "/sessions/{id}/complete",
    params(("id" = Uuid, Path, description = "The session ID.")),
    responses(
        (status = 200, description = "Session completed", body = SessionResponse),
        (status = 400, description = "Session cannot be completed", body = MessageResponse),
        (status = 403, description = "Caller is neither the mentor nor an admin", body = MessageResponse),
        (status = 404, description = "Session not found", body = MessageResponse)
    )
)]
pub async fn complete_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    ApiPath(session_id): ApiPath<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state
        .services
        .sessions
        .mark_complete(actor, session_id)
        .await?;
    Ok(Json(SessionResponse::from(&session)))
}

/// The session's mentee rates it, once.
#[utoipa::path(
    put,
    path = "/sessions/{id}/feedback",
    params(("id" = Uuid, Path, description = "The session ID.")),
    request_body = FeedbackPayload,
    responses(
        (status = 200, description = "Feedback recorded", body = SessionResponse),
        (status = 400, description = "Invalid or repeated feedback", body = MessageResponse),
        (status = 403, description = "Caller is not the session's mentee", body = MessageResponse),
        (status = 404, description = "Session not found", body = MessageResponse)
    )
)]
pub async fn session_feedback_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    ApiPath(session_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<FeedbackPayload>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state
        .services
        .sessions
        .attach_feedback(actor, session_id, payload.into())
        .await?;
    Ok(Json(SessionResponse::from(&session)))
}
