//! crates/mentorship_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use crate::schedule::{SlotToken, TimeOfDay, TimeRange, Weekday};
use chrono::{DateTime, Utc};
use uuid::Uuid;

//=========================================================================================
// Users and Actors
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Mentor,
    Mentee,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Mentor => "mentor",
            Role::Mentee => "mentee",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "mentor" => Some(Role::Mentor),
            "mentee" => Some(Role::Mentee),
            _ => None,
        }
    }
}

/// Represents a user - used for display lookups and role checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
}

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

//=========================================================================================
// Availability
//=========================================================================================

/// All recurring windows a mentor offers on one weekday.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySlots {
    pub day: Weekday,
    pub times: Vec<TimeRange>,
}

/// A mentor's recurring weekly availability. At most one per mentor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub slots: Vec<DaySlots>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Availability {
    /// Every (weekday, window) pair as a slot token, in stored order.
    pub fn tokens(&self) -> impl Iterator<Item = SlotToken> + '_ {
        self.slots
            .iter()
            .flat_map(|day| day.times.iter().map(move |range| SlotToken::new(day.day, *range)))
    }
}

/// A recurring slot rendered as a bookable option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotOption {
    pub slot: SlotToken,
    pub next_occurrence: DateTime<Utc>,
}

//=========================================================================================
// Mentorship Requests
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(RequestStatus::Pending),
            "accepted" => Some(RequestStatus::Accepted),
            "rejected" => Some(RequestStatus::Rejected),
            "cancelled" => Some(RequestStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether the mentee may still withdraw a request in this state.
    pub fn is_cancellable(self) -> bool {
        matches!(self, RequestStatus::Pending | RequestStatus::Accepted)
    }
}

/// Who opened a mentorship request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Initiator {
    Mentor,
    Mentee,
    Admin,
}

impl Initiator {
    pub fn as_str(self) -> &'static str {
        match self {
            Initiator::Mentor => "mentor",
            Initiator::Mentee => "mentee",
            Initiator::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mentor" => Some(Initiator::Mentor),
            "mentee" => Some(Initiator::Mentee),
            "admin" => Some(Initiator::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentorshipRequest {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub mentee_id: Uuid,
    pub message: String,
    pub slot: Option<SlotToken>,
    pub created_by: Initiator,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

/// The fields needed to open a new request. Status always starts as pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequest {
    pub mentor_id: Uuid,
    pub mentee_id: Uuid,
    pub message: String,
    pub slot: Option<SlotToken>,
    pub created_by: Initiator,
}

//=========================================================================================
// Sessions
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Scheduled,
    Accepted,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::Accepted => "accepted",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    /// Case-insensitive, so `"Accepted"` and `"accepted"` are the same status.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scheduled" => Some(SessionStatus::Scheduled),
            "accepted" => Some(SessionStatus::Accepted),
            "completed" => Some(SessionStatus::Completed),
            "cancelled" => Some(SessionStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }

    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (self, next),
            (Scheduled, Accepted)
                | (Scheduled, Completed)
                | (Scheduled, Cancelled)
                | (Accepted, Completed)
                | (Accepted, Cancelled)
        )
    }
}

/// How a session came into existence. Decides its initial status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOrigin {
    MenteeBooked,
    AdminAssigned,
    RequestAccepted,
}

impl SessionOrigin {
    pub fn initial_status(self) -> SessionStatus {
        match self {
            SessionOrigin::MenteeBooked => SessionStatus::Scheduled,
            SessionOrigin::AdminAssigned => SessionStatus::Accepted,
            SessionOrigin::RequestAccepted => SessionStatus::Scheduled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub rating: u8,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub mentee_id: Uuid,
    /// The request this session was materialized from, if any.
    pub request_id: Option<Uuid>,
    pub date: DateTime<Utc>,
    pub time: TimeOfDay,
    pub status: SessionStatus,
    pub feedback: Option<Feedback>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub mentor_id: Uuid,
    pub mentee_id: Uuid,
    pub request_id: Option<Uuid>,
    pub date: DateTime<Utc>,
    pub time: TimeOfDay,
    pub status: SessionStatus,
}

impl NewSession {
    /// Builds the session record for a concrete occurrence. The display time is
    /// always taken from the occurrence itself so the two can never disagree.
    pub fn materialize(
        mentor_id: Uuid,
        mentee_id: Uuid,
        occurrence: DateTime<Utc>,
        origin: SessionOrigin,
    ) -> Self {
        Self {
            mentor_id,
            mentee_id,
            request_id: None,
            date: occurrence,
            time: TimeOfDay::of(&occurrence),
            status: origin.initial_status(),
        }
    }

    pub fn for_request(mut self, request_id: Uuid) -> Self {
        self.request_id = Some(request_id);
        self
    }
}

//=========================================================================================
// Notifications
//=========================================================================================

/// A message for one user. Delivery is up to the `NotificationService` adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: Uuid,
    pub subject: String,
    pub body: String,
}
