//! crates/mentorship_core/src/services/requests.rs
//!
//! The mentorship request lifecycle:
//!
//! ```text
//! pending ──accept──▶ accepted ──cancel──▶ cancelled
//!    │                                        ▲
//!    ├──reject──▶ rejected                    │
//!    └──────────────cancel────────────────────┘
//! ```
//!
//! Accepting materializes a session from the request's slot; cancelling an
//! accepted request cancels that session. Both happen inside one store call.

use crate::domain::{
    Actor, Initiator, MentorshipRequest, NewRequest, NewSession, RequestStatus, Role, Session,
    SessionOrigin,
};
use crate::ports::{Clock, DatabaseService, PortError, PortResult, RequestFilter};
use crate::schedule::{resolve_next_occurrence, SameDayPolicy, SlotToken};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub const DUPLICATE_PENDING: &str = "A pending request already exists between you two";
pub const NOT_FOUND_OR_UNAUTHORIZED: &str = "Request not found or unauthorized";

/// A request as submitted by a client, before validation.
#[derive(Debug, Clone, Default)]
pub struct CreateRequestInput {
    /// The other party: the mentor for a mentee-initiated request, the mentee otherwise.
    pub target_user_id: Option<Uuid>,
    pub message: Option<String>,
    pub slot: Option<String>,
    pub created_by: Option<String>,
}

/// The result of a mentor accepting or rejecting a request.
#[derive(Debug, Clone)]
pub struct StatusOutcome {
    pub request: MentorshipRequest,
    /// Present only when the request was accepted.
    pub session: Option<Session>,
}

#[derive(Debug, Clone)]
pub struct CancelOutcome {
    pub request: MentorshipRequest,
    pub cancelled_sessions: Vec<Session>,
}

#[derive(Clone)]
pub struct RequestService {
    db: Arc<dyn DatabaseService>,
    clock: Arc<dyn Clock>,
    policy: SameDayPolicy,
}

impl RequestService {
    pub fn new(db: Arc<dyn DatabaseService>, clock: Arc<dyn Clock>, policy: SameDayPolicy) -> Self {
        Self { db, clock, policy }
    }

    /// Opens a pending request between the caller and the target user.
    pub async fn create(
        &self,
        actor: Actor,
        input: CreateRequestInput,
    ) -> PortResult<MentorshipRequest> {
        let message = input
            .message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        let (Some(target), Some(message)) = (input.target_user_id, message) else {
            return Err(PortError::Validation("Missing required fields".to_string()));
        };

        let created_by = resolve_initiator(actor, input.created_by.as_deref())?;
        if target == actor.user_id {
            return Err(PortError::Validation(
                "You cannot send a request to yourself".to_string(),
            ));
        }

        let (mentor_id, mentee_id, target_role) = match created_by {
            Initiator::Mentor => (actor.user_id, target, Role::Mentee),
            _ => (target, actor.user_id, Role::Mentor),
        };
        let target_user = self.db.get_user(target).await?;
        if target_user.role != target_role {
            return Err(PortError::Validation(format!(
                "Target user is not a {}",
                target_role.as_str()
            )));
        }

        let slot = match input.slot.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(raw.parse::<SlotToken>()?),
            _ => None,
        };

        let request = self
            .db
            .create_request(NewRequest {
                mentor_id,
                mentee_id,
                message,
                slot,
                created_by,
            })
            .await?;
        info!(
            "Request {} opened by {} (mentor {}, mentee {})",
            request.id,
            created_by.as_str(),
            mentor_id,
            mentee_id
        );
        Ok(request)
    }

    pub async fn list_for_mentor(&self, actor: Actor) -> PortResult<Vec<MentorshipRequest>> {
        self.db.list_requests(RequestFilter::ForMentor(actor.user_id)).await
    }

    pub async fn list_for_mentee(&self, actor: Actor) -> PortResult<Vec<MentorshipRequest>> {
        self.db.list_requests(RequestFilter::ForMentee(actor.user_id)).await
    }

    pub async fn list_sent_by_mentor(&self, actor: Actor) -> PortResult<Vec<MentorshipRequest>> {
        self.db
            .list_requests(RequestFilter::InitiatedByMentor(actor.user_id))
            .await
    }

    /// The mentor accepts or rejects a pending request. Accepting resolves the
    /// slot against the clock and creates the session in the same store call.
    pub async fn update_status(
        &self,
        actor: Actor,
        request_id: Uuid,
        status: &str,
    ) -> PortResult<StatusOutcome> {
        let request = self.owned_request(request_id, |r| r.mentor_id == actor.user_id).await?;

        let next = match RequestStatus::parse(status) {
            Some(s @ (RequestStatus::Accepted | RequestStatus::Rejected)) => s,
            _ => return Err(PortError::Validation("Invalid status value".to_string())),
        };
        if request.status != RequestStatus::Pending {
            return Err(PortError::Conflict(format!(
                "Request is already {}",
                request.status.as_str()
            )));
        }

        if next == RequestStatus::Rejected {
            let request = self
                .db
                .transition_request(request_id, RequestStatus::Pending, RequestStatus::Rejected)
                .await?;
            info!("Request {} rejected", request_id);
            return Ok(StatusOutcome {
                request,
                session: None,
            });
        }

        let slot = request.slot.ok_or_else(|| {
            PortError::Validation("No time slot provided on the request".to_string())
        })?;
        let occurrence =
            resolve_next_occurrence(slot.weekday, slot.start(), self.clock.now(), self.policy);
        let new_session = NewSession::materialize(
            request.mentor_id,
            request.mentee_id,
            occurrence,
            SessionOrigin::RequestAccepted,
        )
        .for_request(request_id);

        let (request, session) = self.db.accept_request(request_id, new_session).await?;
        info!(
            "Request {} accepted; session {} scheduled for {}",
            request_id, session.id, session.date
        );
        Ok(StatusOutcome {
            request,
            session: Some(session),
        })
    }

    /// The mentee withdraws a pending or accepted request. Sessions that were
    /// materialized from it are cancelled, never deleted.
    pub async fn cancel(&self, actor: Actor, request_id: Uuid) -> PortResult<CancelOutcome> {
        let request = self.owned_request(request_id, |r| r.mentee_id == actor.user_id).await?;
        if !request.status.is_cancellable() {
            return Err(PortError::Conflict(format!(
                "Request is already {}",
                request.status.as_str()
            )));
        }

        let (request, cancelled_sessions) =
            self.db.cancel_request(request_id, request.status).await?;
        info!(
            "Request {} cancelled ({} session(s) cancelled)",
            request_id,
            cancelled_sessions.len()
        );
        Ok(CancelOutcome {
            request,
            cancelled_sessions,
        })
    }

    /// Loads a request, reporting a missing one and someone else's the same way.
    async fn owned_request(
        &self,
        request_id: Uuid,
        is_owner: impl Fn(&MentorshipRequest) -> bool,
    ) -> PortResult<MentorshipRequest> {
        match self.db.get_request(request_id).await {
            Ok(request) if is_owner(&request) => Ok(request),
            Ok(_) | Err(PortError::NotFound(_)) => {
                Err(PortError::NotFound(NOT_FOUND_OR_UNAUTHORIZED.to_string()))
            }
            Err(e) => Err(e),
        }
    }
}

fn resolve_initiator(actor: Actor, requested: Option<&str>) -> PortResult<Initiator> {
    let invalid = || PortError::Validation("Invalid initiator role".to_string());
    let from_role = match actor.role {
        Role::Mentor => Initiator::Mentor,
        Role::Mentee => Initiator::Mentee,
        Role::Admin => return Err(invalid()),
    };
    match requested {
        None => Ok(from_role),
        Some(raw) => match Initiator::parse(raw) {
            Some(initiator) if initiator == from_role => Ok(initiator),
            _ => Err(invalid()),
        },
    }
}
