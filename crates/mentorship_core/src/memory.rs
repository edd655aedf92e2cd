//! crates/mentorship_core/src/memory.rs
//!
//! An in-process implementation of the `DatabaseService` port. Every operation
//! runs under one lock, so the multi-record operations are trivially atomic.
//! Used for tests and for running the API without PostgreSQL.

use crate::domain::{
    Availability, DaySlots, Feedback, Initiator, MentorshipRequest, NewRequest, NewSession,
    RequestStatus, Session, SessionStatus, User,
};
use crate::ports::{
    Clock, DatabaseService, PortError, PortResult, RequestFilter, SessionFilter, SystemClock,
};
use crate::services::requests::DUPLICATE_PENDING;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    auth_tokens: HashMap<String, Uuid>,
    availability: HashMap<Uuid, Availability>,
    requests: Vec<MentorshipRequest>,
    sessions: Vec<Session>,
}

pub struct InMemoryStore {
    tables: Mutex<Tables>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            clock,
        }
    }

    pub fn insert_user(&self, user: User) -> PortResult<()> {
        self.lock()?.users.insert(user.user_id, user);
        Ok(())
    }

    pub fn insert_auth_token(&self, token: &str, user_id: Uuid) -> PortResult<()> {
        self.lock()?.auth_tokens.insert(token.to_string(), user_id);
        Ok(())
    }

    fn lock(&self) -> PortResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| PortError::Unexpected("in-memory store lock poisoned".to_string()))
    }
}

impl Tables {
    fn request_mut(&mut self, request_id: Uuid) -> PortResult<&mut MentorshipRequest> {
        self.requests
            .iter_mut()
            .find(|r| r.id == request_id)
            .ok_or_else(|| PortError::NotFound(format!("Request {} not found", request_id)))
    }

    fn session_mut(&mut self, session_id: Uuid) -> PortResult<&mut Session> {
        self.sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))
    }

    fn insert_session(&mut self, new: NewSession, now: chrono::DateTime<chrono::Utc>) -> Session {
        let session = Session {
            id: Uuid::new_v4(),
            mentor_id: new.mentor_id,
            mentee_id: new.mentee_id,
            request_id: new.request_id,
            date: new.date,
            time: new.time,
            status: new.status,
            feedback: None,
            created_at: now,
        };
        self.sessions.push(session.clone());
        session
    }
}

fn stale(kind: &str, id: Uuid, actual: &str) -> PortError {
    PortError::Conflict(format!("{} {} is already {}", kind, id, actual))
}

#[async_trait]
impl DatabaseService for InMemoryStore {
    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        self.lock()?
            .users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn get_users(&self, user_ids: &[Uuid]) -> PortResult<Vec<User>> {
        let tables = self.lock()?;
        Ok(user_ids
            .iter()
            .filter_map(|id| tables.users.get(id).cloned())
            .collect())
    }

    async fn validate_auth_session(&self, token: &str) -> PortResult<Uuid> {
        self.lock()?
            .auth_tokens
            .get(token)
            .copied()
            .ok_or_else(|| PortError::Unauthorized("Invalid or expired session".to_string()))
    }

    async fn get_availability(&self, mentor_id: Uuid) -> PortResult<Option<Availability>> {
        Ok(self.lock()?.availability.get(&mentor_id).cloned())
    }

    async fn upsert_availability(
        &self,
        mentor_id: Uuid,
        slots: Vec<DaySlots>,
    ) -> PortResult<(Availability, bool)> {
        let now = self.clock.now();
        let mut tables = self.lock()?;
        match tables.availability.get_mut(&mentor_id) {
            Some(existing) => {
                existing.slots = slots;
                existing.updated_at = now;
                Ok((existing.clone(), false))
            }
            None => {
                let created = Availability {
                    id: Uuid::new_v4(),
                    mentor_id,
                    slots,
                    created_at: now,
                    updated_at: now,
                };
                tables.availability.insert(mentor_id, created.clone());
                Ok((created, true))
            }
        }
    }

    async fn delete_availability(&self, mentor_id: Uuid) -> PortResult<bool> {
        Ok(self.lock()?.availability.remove(&mentor_id).is_some())
    }

    async fn create_request(&self, request: NewRequest) -> PortResult<MentorshipRequest> {
        let now = self.clock.now();
        let mut tables = self.lock()?;
        let duplicate = tables.requests.iter().any(|r| {
            r.mentor_id == request.mentor_id
                && r.mentee_id == request.mentee_id
                && r.status == RequestStatus::Pending
        });
        if duplicate {
            return Err(PortError::Conflict(DUPLICATE_PENDING.to_string()));
        }
        let created = MentorshipRequest {
            id: Uuid::new_v4(),
            mentor_id: request.mentor_id,
            mentee_id: request.mentee_id,
            message: request.message,
            slot: request.slot,
            created_by: request.created_by,
            status: RequestStatus::Pending,
            created_at: now,
        };
        tables.requests.push(created.clone());
        Ok(created)
    }

    async fn get_request(&self, request_id: Uuid) -> PortResult<MentorshipRequest> {
        self.lock()?.request_mut(request_id).map(|r| r.clone())
    }

    async fn list_requests(&self, filter: RequestFilter) -> PortResult<Vec<MentorshipRequest>> {
        let tables = self.lock()?;
        Ok(tables
            .requests
            .iter()
            .filter(|r| match filter {
                RequestFilter::ForMentor(id) => r.mentor_id == id,
                RequestFilter::ForMentee(id) => r.mentee_id == id,
                RequestFilter::InitiatedByMentor(id) => {
                    r.mentor_id == id && r.created_by == Initiator::Mentor
                }
            })
            .cloned()
            .collect())
    }

    async fn transition_request(
        &self,
        request_id: Uuid,
        from: RequestStatus,
        to: RequestStatus,
    ) -> PortResult<MentorshipRequest> {
        let mut tables = self.lock()?;
        let request = tables.request_mut(request_id)?;
        if request.status != from {
            return Err(stale("Request", request_id, request.status.as_str()));
        }
        request.status = to;
        Ok(request.clone())
    }

    async fn accept_request(
        &self,
        request_id: Uuid,
        session: NewSession,
    ) -> PortResult<(MentorshipRequest, Session)> {
        let now = self.clock.now();
        let mut tables = self.lock()?;
        let request = tables.request_mut(request_id)?;
        if request.status != RequestStatus::Pending {
            return Err(stale("Request", request_id, request.status.as_str()));
        }
        request.status = RequestStatus::Accepted;
        let request = request.clone();
        let session = tables.insert_session(session, now);
        Ok((request, session))
    }

    async fn cancel_request(
        &self,
        request_id: Uuid,
        from: RequestStatus,
    ) -> PortResult<(MentorshipRequest, Vec<Session>)> {
        let mut tables = self.lock()?;
        let request = tables.request_mut(request_id)?;
        if request.status != from {
            return Err(stale("Request", request_id, request.status.as_str()));
        }
        request.status = RequestStatus::Cancelled;
        let request = request.clone();

        // A pending request never produced a session.
        let mut cancelled = Vec::new();
        if from == RequestStatus::Accepted {
            for session in tables.sessions.iter_mut() {
                if session.request_id == Some(request_id) && !session.status.is_terminal() {
                    session.status = SessionStatus::Cancelled;
                    cancelled.push(session.clone());
                }
            }
        }
        Ok((request, cancelled))
    }

    async fn create_session(&self, session: NewSession) -> PortResult<Session> {
        let now = self.clock.now();
        Ok(self.lock()?.insert_session(session, now))
    }

    async fn get_session(&self, session_id: Uuid) -> PortResult<Session> {
        self.lock()?.session_mut(session_id).map(|s| s.clone())
    }

    async fn list_sessions(&self, filter: SessionFilter) -> PortResult<Vec<Session>> {
        let tables = self.lock()?;
        Ok(tables
            .sessions
            .iter()
            .filter(|s| filter.mentor_id.map_or(true, |id| s.mentor_id == id))
            .filter(|s| filter.mentee_id.map_or(true, |id| s.mentee_id == id))
            .filter(|s| filter.include_cancelled || s.status != SessionStatus::Cancelled)
            .cloned()
            .collect())
    }

    async fn transition_session(
        &self,
        session_id: Uuid,
        from: SessionStatus,
        to: SessionStatus,
    ) -> PortResult<Session> {
        let mut tables = self.lock()?;
        let session = tables.session_mut(session_id)?;
        if session.status != from {
            return Err(stale("Session", session_id, session.status.as_str()));
        }
        session.status = to;
        Ok(session.clone())
    }

    async fn attach_feedback(&self, session_id: Uuid, feedback: Feedback) -> PortResult<Session> {
        let mut tables = self.lock()?;
        let session = tables.session_mut(session_id)?;
        if session.feedback.is_some() {
            return Err(PortError::Conflict("Feedback already submitted".to_string()));
        }
        session.feedback = Some(feedback);
        Ok(session.clone())
    }
}
