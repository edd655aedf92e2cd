//! crates/mentorship_core/src/services/sessions.rs
//!
//! Session booking and the session status machine.

use crate::domain::{
    Actor, Feedback, NewSession, Notification, Role, Session, SessionOrigin, SessionStatus,
};
use crate::ports::{DatabaseService, NotificationService, PortError, PortResult, SessionFilter};
use crate::schedule::TimeOfDay;
use crate::services::notify_best_effort;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

const SESSION_NOT_FOUND: &str = "Session not found";

/// A direct booking, either by a mentee or by an admin on behalf of both sides.
#[derive(Debug, Clone, Default)]
pub struct BookSessionInput {
    pub mentor_id: Option<Uuid>,
    /// Only read on the admin path; a mentee always books for themselves.
    pub mentee_id: Option<Uuid>,
    /// RFC 3339 timestamp or a plain `YYYY-MM-DD` date. Only the calendar day is used.
    pub date: Option<String>,
    pub time: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FeedbackInput {
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

#[derive(Clone)]
pub struct SessionService {
    db: Arc<dyn DatabaseService>,
    notifier: Arc<dyn NotificationService>,
}

impl SessionService {
    pub fn new(db: Arc<dyn DatabaseService>, notifier: Arc<dyn NotificationService>) -> Self {
        Self { db, notifier }
    }

    /// A mentee books a session directly. It starts `scheduled` and the mentor
    /// is asked to confirm it.
    pub async fn book(&self, actor: Actor, input: BookSessionInput) -> PortResult<Session> {
        if actor.role != Role::Mentee {
            return Err(PortError::Unauthorized(
                "Only mentees can book sessions".to_string(),
            ));
        }
        let (Some(mentor_id), Some(date), Some(time)) = (input.mentor_id, input.date, input.time)
        else {
            return Err(PortError::Validation(
                "Mentor, date, and time are required".to_string(),
            ));
        };
        let occurrence = parse_occurrence(&date, &time)?;
        self.expect_role(mentor_id, Role::Mentor).await?;

        let session = self
            .db
            .create_session(NewSession::materialize(
                mentor_id,
                actor.user_id,
                occurrence,
                SessionOrigin::MenteeBooked,
            ))
            .await?;
        info!("Session {} booked by mentee {}", session.id, actor.user_id);

        notify_best_effort(
            self.notifier.as_ref(),
            Notification {
                recipient: mentor_id,
                subject: "New Session Booking Request".to_string(),
                body: format!(
                    "You have a new session request for {} at {}. Please log in to accept or decline it.",
                    display_date(&session.date),
                    session.time
                ),
            },
        )
        .await;
        Ok(session)
    }

    /// An admin pairs a mentor and mentee directly; the session starts `accepted`.
    pub async fn admin_create(&self, actor: Actor, input: BookSessionInput) -> PortResult<Session> {
        if !actor.is_admin() {
            return Err(PortError::Unauthorized("Not authorized".to_string()));
        }
        let (Some(mentor_id), Some(mentee_id), Some(date), Some(time)) =
            (input.mentor_id, input.mentee_id, input.date, input.time)
        else {
            return Err(PortError::Validation("All fields are required".to_string()));
        };
        let occurrence = parse_occurrence(&date, &time)?;
        self.expect_role(mentor_id, Role::Mentor).await?;
        self.expect_role(mentee_id, Role::Mentee).await?;

        let session = self
            .db
            .create_session(NewSession::materialize(
                mentor_id,
                mentee_id,
                occurrence,
                SessionOrigin::AdminAssigned,
            ))
            .await?;
        info!("Session {} assigned by admin {}", session.id, actor.user_id);

        for (recipient, subject) in [
            (mentor_id, "New Session Created"),
            (mentee_id, "Your Session Has Been Scheduled"),
        ] {
            notify_best_effort(
                self.notifier.as_ref(),
                Notification {
                    recipient,
                    subject: subject.to_string(),
                    body: format!(
                        "A session has been scheduled for you on {} at {}.",
                        display_date(&session.date),
                        session.time
                    ),
                },
            )
            .await;
        }
        Ok(session)
    }

    /// The caller's own sessions (all sessions for an admin), cancelled ones excluded.
    pub async fn list(&self, actor: Actor) -> PortResult<Vec<Session>> {
        let filter = match actor.role {
            Role::Mentor => SessionFilter {
                mentor_id: Some(actor.user_id),
                ..SessionFilter::default()
            },
            Role::Mentee => SessionFilter {
                mentee_id: Some(actor.user_id),
                ..SessionFilter::default()
            },
            Role::Admin => SessionFilter::default(),
        };
        self.db.list_sessions(filter).await
    }

    pub async fn get(&self, actor: Actor, session_id: Uuid) -> PortResult<Session> {
        let session = self.load(session_id).await?;
        let involved = session.mentor_id == actor.user_id || session.mentee_id == actor.user_id;
        if !involved && !actor.is_admin() {
            return Err(PortError::Unauthorized(
                "Not authorized to view this session".to_string(),
            ));
        }
        Ok(session)
    }

    /// The session's mentor moves it along its lifecycle.
    pub async fn update_status(
        &self,
        actor: Actor,
        session_id: Uuid,
        status: &str,
    ) -> PortResult<Session> {
        let session = self.load(session_id).await?;
        if session.mentor_id != actor.user_id {
            return Err(PortError::Unauthorized("Not authorized".to_string()));
        }
        let next = SessionStatus::parse(status)
            .ok_or_else(|| PortError::Validation("Invalid status value".to_string()))?;

        let session = self.transition(&session, next).await?;
        if next == SessionStatus::Accepted {
            notify_best_effort(
                self.notifier.as_ref(),
                Notification {
                    recipient: session.mentee_id,
                    subject: "Your Session Has Been Accepted".to_string(),
                    body: format!(
                        "Your session on {} at {} has been accepted.",
                        display_date(&session.date),
                        session.time
                    ),
                },
            )
            .await;
        }
        Ok(session)
    }

    /// Marks a session completed. Restricted to its mentor or an admin.
    pub async fn mark_complete(&self, actor: Actor, session_id: Uuid) -> PortResult<Session> {
        let session = self.load(session_id).await?;
        if session.mentor_id != actor.user_id && !actor.is_admin() {
            return Err(PortError::Unauthorized("Not authorized".to_string()));
        }
        self.transition(&session, SessionStatus::Completed).await
    }

    /// The session's mentee leaves a rating and comment, once.
    pub async fn attach_feedback(
        &self,
        actor: Actor,
        session_id: Uuid,
        input: FeedbackInput,
    ) -> PortResult<Session> {
        let feedback = validate_feedback(input)?;
        let session = self.load(session_id).await?;
        if session.mentee_id != actor.user_id {
            return Err(PortError::Unauthorized(
                "You are not allowed to give feedback for this session".to_string(),
            ));
        }
        let session = self.db.attach_feedback(session_id, feedback).await?;
        info!("Feedback recorded for session {}", session_id);
        Ok(session)
    }

    async fn transition(&self, session: &Session, next: SessionStatus) -> PortResult<Session> {
        if !session.status.can_transition_to(next) {
            return Err(PortError::Conflict(format!(
                "Cannot move session from {} to {}",
                session.status.as_str(),
                next.as_str()
            )));
        }
        let updated = self
            .db
            .transition_session(session.id, session.status, next)
            .await?;
        info!(
            "Session {} moved from {} to {}",
            session.id,
            session.status.as_str(),
            next.as_str()
        );
        Ok(updated)
    }

    async fn load(&self, session_id: Uuid) -> PortResult<Session> {
        self.db.get_session(session_id).await.map_err(|e| match e {
            PortError::NotFound(_) => PortError::NotFound(SESSION_NOT_FOUND.to_string()),
            other => other,
        })
    }

    async fn expect_role(&self, user_id: Uuid, role: Role) -> PortResult<()> {
        let user = self.db.get_user(user_id).await?;
        if user.role != role {
            return Err(PortError::Validation(format!(
                "User {} is not a {}",
                user_id,
                role.as_str()
            )));
        }
        Ok(())
    }
}

fn validate_feedback(input: FeedbackInput) -> PortResult<Feedback> {
    let comment = input.comment.map(|c| c.trim().to_string()).unwrap_or_default();
    let Some(rating) = input.rating else {
        return Err(PortError::Validation(
            "Rating and comment are required".to_string(),
        ));
    };
    if comment.chars().count() < 3 {
        return Err(PortError::Validation(
            "Rating and comment are required".to_string(),
        ));
    }
    if !(1..=5).contains(&rating) {
        return Err(PortError::Validation(
            "Rating must be between 1 and 5".to_string(),
        ));
    }
    Ok(Feedback {
        rating: rating as u8,
        comment,
    })
}

/// Combines a calendar date and an `HH:MM` time into one UTC timestamp.
fn parse_occurrence(date: &str, time: &str) -> PortResult<DateTime<Utc>> {
    let time: TimeOfDay = time.parse()?;
    let day = DateTime::parse_from_rfc3339(date.trim())
        .map(|d| d.with_timezone(&Utc).date_naive())
        .or_else(|_| NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d"))
        .map_err(|_| PortError::Validation(format!("'{}' is not a valid date", date)))?;
    Ok(Utc.from_utc_datetime(&day.and_time(time.as_naive_time())))
}

fn display_date(date: &DateTime<Utc>) -> String {
    date.format("%a %b %d %Y").to_string()
}
