//! crates/mentorship_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or mailers.

use crate::domain::{
    Availability, DaySlots, Feedback, MentorshipRequest, NewRequest, NewSession, Notification,
    RequestStatus, Session, SessionStatus, User,
};
use crate::schedule::ScheduleError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error type shared by every port and core service.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl From<ScheduleError> for PortError {
    fn from(err: ScheduleError) -> Self {
        PortError::Validation(err.to_string())
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Query Filters
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestFilter {
    /// Every request addressed to the mentor.
    ForMentor(Uuid),
    /// Every request involving the mentee.
    ForMentee(Uuid),
    /// Requests the mentor opened themselves.
    InitiatedByMentor(Uuid),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionFilter {
    pub mentor_id: Option<Uuid>,
    pub mentee_id: Option<Uuid>,
    pub include_cancelled: bool,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Persistence for availability, requests and sessions.
///
/// Operations that touch more than one record (`create_request`,
/// `accept_request`, `cancel_request`) must be atomic: callers observe either
/// all of their effects or none.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users & Auth ---
    async fn get_user(&self, user_id: Uuid) -> PortResult<User>;

    /// Unknown ids are skipped rather than reported.
    async fn get_users(&self, user_ids: &[Uuid]) -> PortResult<Vec<User>>;

    async fn validate_auth_session(&self, token: &str) -> PortResult<Uuid>;

    // --- Availability ---
    async fn get_availability(&self, mentor_id: Uuid) -> PortResult<Option<Availability>>;

    /// Replaces the mentor's slots wholesale. Returns `true` when a new record was created.
    async fn upsert_availability(
        &self,
        mentor_id: Uuid,
        slots: Vec<DaySlots>,
    ) -> PortResult<(Availability, bool)>;

    /// Returns `false` when the mentor had no availability.
    async fn delete_availability(&self, mentor_id: Uuid) -> PortResult<bool>;

    // --- Mentorship Requests ---

    /// Fails with `Conflict` if a pending request already exists for the pair.
    async fn create_request(&self, request: NewRequest) -> PortResult<MentorshipRequest>;

    async fn get_request(&self, request_id: Uuid) -> PortResult<MentorshipRequest>;

    async fn list_requests(&self, filter: RequestFilter) -> PortResult<Vec<MentorshipRequest>>;

    /// Moves the request from `from` to `to`. Fails with `Conflict` if its status
    /// is no longer `from`.
    async fn transition_request(
        &self,
        request_id: Uuid,
        from: RequestStatus,
        to: RequestStatus,
    ) -> PortResult<MentorshipRequest>;

    /// Marks a pending request accepted and inserts its session in one step.
    async fn accept_request(
        &self,
        request_id: Uuid,
        session: NewSession,
    ) -> PortResult<(MentorshipRequest, Session)>;

    /// Marks the request cancelled (it must still be in `from`) and cancels any
    /// non-terminal sessions materialized from it. Returns the sessions it cancelled.
    async fn cancel_request(
        &self,
        request_id: Uuid,
        from: RequestStatus,
    ) -> PortResult<(MentorshipRequest, Vec<Session>)>;

    // --- Sessions ---
    async fn create_session(&self, session: NewSession) -> PortResult<Session>;

    async fn get_session(&self, session_id: Uuid) -> PortResult<Session>;

    async fn list_sessions(&self, filter: SessionFilter) -> PortResult<Vec<Session>>;

    /// Fails with `Conflict` if the session's status is no longer `from`.
    async fn transition_session(
        &self,
        session_id: Uuid,
        from: SessionStatus,
        to: SessionStatus,
    ) -> PortResult<Session>;

    /// Fails with `Conflict` if feedback was already attached.
    async fn attach_feedback(&self, session_id: Uuid, feedback: Feedback) -> PortResult<Session>;
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Delivers a message to one user.
    async fn notify(&self, notification: Notification) -> PortResult<()>;
}

/// Source of "now" for everything that resolves slots or stamps records.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
