//! services/api/src/web/requests.rs
//!
//! Handlers for mentorship requests.

use crate::error::ApiError;
use crate::web::dto::{
    CancelRequestResponse, CreateRequestPayload, MessageResponse, RequestResponse,
    RequestStatusResponse, SessionResponse, StatusPayload, UserSummary,
};
use crate::web::extract::{ApiJson, ApiPath};
use crate::web::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use mentorship_core::domain::{Actor, MentorshipRequest};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Renders a listing with the counterpart of each request embedded.
async fn with_counterparts(
    state: &AppState,
    requests: Vec<MentorshipRequest>,
    counterpart: impl Fn(&MentorshipRequest) -> Uuid,
) -> Result<Vec<RequestResponse>, ApiError> {
    let mut ids: Vec<Uuid> = requests.iter().map(&counterpart).collect();
    ids.sort();
    ids.dedup();
    let users: HashMap<Uuid, UserSummary> = state
        .db
        .get_users(&ids)
        .await?
        .iter()
        .map(|u| (u.user_id, UserSummary::from(u)))
        .collect();
    Ok(requests
        .iter()
        .map(|r| RequestResponse::from(r).with_parties(&users))
        .collect())
}

/// Open a mentorship request.
#[utoipa::path(
    post,
    path = "/requests",
    request_body = CreateRequestPayload,
    responses(
        (status = 201, description = "Request created", body = RequestResponse),
        (status = 400, description = "Invalid request or a pending one already exists", body = MessageResponse),
        (status = 404, description = "Target user not found", body = MessageResponse)
    )
)]
pub async fn create_request_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    ApiJson(payload): ApiJson<CreateRequestPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let request = state
        .services
        .requests
        .create(actor, payload.into_input(actor))
        .await?;
    Ok((StatusCode::CREATED, Json(RequestResponse::from(&request))))
}

/// Requests addressed to the calling mentor, with each mentee embedded.
#[utoipa::path(
    get,
    path = "/requests/mentor",
    responses((status = 200, description = "Requests for the mentor", body = [RequestResponse]))
)]
pub async fn mentor_requests_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<RequestResponse>>, ApiError> {
    let requests = state.services.requests.list_for_mentor(actor).await?;
    Ok(Json(with_counterparts(&state, requests, |r| r.mentee_id).await?))
}

/// Requests involving the calling mentee, with each mentor embedded.
#[utoipa::path(
    get,
    path = "/requests/mentee",
    responses((status = 200, description = "Requests for the mentee", body = [RequestResponse]))
)]
pub async fn mentee_requests_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<RequestResponse>>, ApiError> {
    let requests = state.services.requests.list_for_mentee(actor).await?;
    Ok(Json(with_counterparts(&state, requests, |r| r.mentor_id).await?))
}

/// Requests the calling mentor initiated.
#[utoipa::path(
    get,
    path = "/requests/mentor/sent",
    responses((status = 200, description = "Requests sent by the mentor", body = [RequestResponse]))
)]
pub async fn sent_requests_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<RequestResponse>>, ApiError> {
    let requests = state.services.requests.list_sent_by_mentor(actor).await?;
    Ok(Json(with_counterparts(&state, requests, |r| r.mentee_id).await?))
}

/// Accept or reject a pending request. Accepting schedules a session.
#[utoipa::path(
    put,
    path = "/requests/{id}/status",
    params(("id" = Uuid, Path, description = "The request ID.")),
    request_body = StatusPayload,
    responses(
        (status = 200, description = "Request updated", body = RequestStatusResponse),
        (status = 400, description = "Invalid status, missing slot, or request not pending", body = MessageResponse),
        (status = 404, description = "Request not found or unauthorized", body = MessageResponse)
    )
)]
pub async fn update_request_status_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    ApiPath(request_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<StatusPayload>,
) -> Result<Json<RequestStatusResponse>, ApiError> {
    let status = payload.status.unwrap_or_default();
    let outcome = state
        .services
        .requests
        .update_status(actor, request_id, &status)
        .await?;
    Ok(Json(RequestStatusResponse {
        message: format!("Request {}", outcome.request.status.as_str()),
        request: RequestResponse::from(&outcome.request),
        session: outcome.session.as_ref().map(SessionResponse::from),
    }))
}

/// Cancel a pending or accepted request, along with its session.
#[utoipa::path(
    delete,
    path = "/requests/{id}",
    params(("id" = Uuid, Path, description = "The request ID.")),
    responses(
        (status = 200, description = "Request cancelled", body = CancelRequestResponse),
        (status = 400, description = "Request can no longer be cancelled", body = MessageResponse),
        (status = 404, description = "Request not found or unauthorized", body = MessageResponse)
    )
)]
pub async fn cancel_request_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    ApiPath(request_id): ApiPath<Uuid>,
) -> Result<Json<CancelRequestResponse>, ApiError> {
    let outcome = state.services.requests.cancel(actor, request_id).await?;
    Ok(Json(CancelRequestResponse {
        message: "Request cancelled successfully".to_string(),
        request: RequestResponse::from(&outcome.request),
        cancelled_sessions: outcome
            .cancelled_sessions
            .iter()
            .map(SessionResponse::from)
            .collect(),
    }))
}
