//! services/api/src/web/rest.rs
//!
//! Builds the REST router and holds the master definition for the OpenAPI
//! specification.

use crate::error::ApiError;
use crate::web::{availability, dto, middleware::require_auth, requests, sessions, state::AppState};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        availability::set_availability_handler,
        availability::update_availability_handler,
        availability::get_my_availability_handler,
        availability::delete_availability_handler,
        availability::get_mentor_availability_handler,
        availability::slot_options_handler,
        requests::create_request_handler,
        requests::mentor_requests_handler,
        requests::mentee_requests_handler,
        requests::sent_requests_handler,
        requests::update_request_status_handler,
        requests::cancel_request_handler,
        sessions::book_session_handler,
        sessions::admin_create_session_handler,
        sessions::list_sessions_handler,
        sessions::get_session_handler,
        sessions::update_session_status_handler,
        sessions::complete_session_handler,
        sessions::session_feedback_handler,
    ),
    components(
        schemas(
            dto::SlotsPayload,
            dto::CreateRequestPayload,
            dto::StatusPayload,
            dto::BookSessionPayload,
            dto::FeedbackPayload,
            dto::MessageResponse,
            dto::UserSummary,
            dto::TimeRangeBody,
            dto::DaySlotsBody,
            dto::AvailabilityResponse,
            dto::MentorSlotsResponse,
            dto::SlotOptionResponse,
            dto::RequestResponse,
            dto::FeedbackBody,
            dto::SessionResponse,
            dto::RequestStatusResponse,
            dto::CancelRequestResponse,
        )
    ),
    tags(
        (name = "Mentorship API", description = "Availability, mentorship requests and sessions.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Router
//=========================================================================================

/// Every API route behind the auth middleware, with request tracing and CORS.
pub fn router(state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = state.config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!(
            "Invalid CORS origin '{}': {}",
            state.config.cors_origin, e
        ))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    let protected_routes = Router::new()
        // Availability
        .route(
            "/availability",
            post(availability::set_availability_handler)
                .get(availability::get_my_availability_handler)
                .put(availability::update_availability_handler)
                .delete(availability::delete_availability_handler),
        )
        .route(
            "/availability/{mentor_id}",
            get(availability::get_mentor_availability_handler),
        )
        .route(
            "/availability/{mentor_id}/options",
            get(availability::slot_options_handler),
        )
        // Requests
        .route("/requests", post(requests::create_request_handler))
        .route("/requests/mentor", get(requests::mentor_requests_handler))
        .route("/requests/mentee", get(requests::mentee_requests_handler))
        .route("/requests/mentor/sent", get(requests::sent_requests_handler))
        .route(
            "/requests/{id}/status",
            put(requests::update_request_status_handler),
        )
        .route(
            "/requests/{id}",
            delete(requests::cancel_request_handler),
        )
        // Sessions
        .route(
            "/sessions",
            post(sessions::book_session_handler).get(sessions::list_sessions_handler),
        )
        .route(
            "/sessions/{id}",
            get(sessions::get_session_handler).put(sessions::update_session_status_handler),
        )
        .route(
            "/sessions/{id}/complete",
            put(sessions::complete_session_handler),
        )
        .route(
            "/sessions/{id}/feedback",
            put(sessions::session_feedback_handler),
        )
        .route(
            "/admin/sessions",
            post(sessions::admin_create_session_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Ok(protected_routes
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}
