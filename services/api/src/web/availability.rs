//! services/api/src/web/availability.rs
//!
//! Handlers for a mentor's recurring weekly availability.

use crate::error::ApiError;
use crate::web::dto::{
    AvailabilityResponse, DaySlotsBody, MentorSlotsResponse, MessageResponse, SlotOptionResponse,
    SlotsPayload,
};
use crate::web::extract::ApiPath;
use crate::web::state::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use mentorship_core::domain::Actor;
use std::sync::Arc;
use uuid::Uuid;

/// Create or replace the caller's availability.
#[utoipa::path(
    post,
    path = "/availability",
    request_body = SlotsPayload,
    responses(
        (status = 201, description = "Availability created", body = AvailabilityResponse),
        (status = 200, description = "Availability replaced", body = AvailabilityResponse),
        (status = 400, description = "Malformed slots", body = MessageResponse),
        (status = 403, description = "Caller is not a mentor", body = MessageResponse)
    )
)]
pub async fn set_availability_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let (availability, created) = state
        .services
        .availability
        .set(actor, SlotsPayload::from_body(&body).into_input())
        .await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(AvailabilityResponse::from(&availability))))
}

/// Replace the caller's availability.
#[utoipa::path(
    put,
    path = "/availability",
    request_body = SlotsPayload,
    responses(
        (status = 200, description = "Availability saved", body = AvailabilityResponse),
        (status = 400, description = "Malformed slots", body = MessageResponse),
        (status = 403, description = "Caller is not a mentor", body = MessageResponse)
    )
)]
pub async fn update_availability_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    body: Bytes,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let (availability, _) = state
        .services
        .availability
        .set(actor, SlotsPayload::from_body(&body).into_input())
        .await?;
    Ok(Json(AvailabilityResponse::from(&availability)))
}

/// The caller's own availability.
#[utoipa::path(
    get,
    path = "/availability",
    responses(
        (status = 200, description = "Availability found", body = AvailabilityResponse),
        (status = 404, description = "No availability found", body = MessageResponse)
    )
)]
pub async fn get_my_availability_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let availability = state.services.availability.get_mine(actor).await?;
    Ok(Json(AvailabilityResponse::from(&availability)))
}

/// Remove the caller's availability.
#[utoipa::path(
    delete,
    path = "/availability",
    responses(
        (status = 200, description = "Availability deleted", body = MessageResponse),
        (status = 403, description = "Caller is not a mentor", body = MessageResponse),
        (status = 404, description = "No availability found to delete", body = MessageResponse)
    )
)]
pub async fn delete_availability_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.services.availability.delete(actor).await?;
    Ok(Json(MessageResponse::new("Availability deleted successfully")))
}

/// Any mentor's weekly slots. A mentor without availability has an empty list.
#[utoipa::path(
    get,
    path = "/availability/{mentor_id}",
    params(("mentor_id" = Uuid, Path, description = "The mentor's user ID.")),
    responses(
        (status = 200, description = "The mentor's slots", body = MentorSlotsResponse)
    )
)]
pub async fn get_mentor_availability_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(mentor_id): ApiPath<Uuid>,
) -> Result<Json<MentorSlotsResponse>, ApiError> {
    let slots = state.services.availability.get_for_mentor(mentor_id).await?;
    Ok(Json(MentorSlotsResponse {
        mentor_id,
        slots: slots.iter().map(DaySlotsBody::from).collect(),
    }))
}

/// Every window of a mentor as a slot token with its next occurrence, soonest first.
#[utoipa::path(
    get,
    path = "/availability/{mentor_id}/options",
    params(("mentor_id" = Uuid, Path, description = "The mentor's user ID.")),
    responses(
        (status = 200, description = "Bookable slot options", body = [SlotOptionResponse])
    )
)]
pub async fn slot_options_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(mentor_id): ApiPath<Uuid>,
) -> Result<Json<Vec<SlotOptionResponse>>, ApiError> {
    let options = state.services.availability.upcoming_options(mentor_id).await?;
    Ok(Json(options.iter().map(SlotOptionResponse::from).collect()))
}
