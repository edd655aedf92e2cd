//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Multi-record operations run inside a single transaction, and the
//! one-pending-request rule is backed by a partial unique index.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mentorship_core::domain::{
    Availability, DaySlots, Feedback, Initiator, MentorshipRequest, NewRequest, NewSession,
    RequestStatus, Role, Session, SessionStatus, User,
};
use mentorship_core::ports::{
    DatabaseService, PortError, PortResult, RequestFilter, SessionFilter,
};
use mentorship_core::schedule::{SlotToken, TimeRange, Weekday};
use mentorship_core::services::requests::DUPLICATE_PENDING;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::warn;
use uuid::Uuid;

const REQUEST_COLUMNS: &str =
    "id, mentor_id, mentee_id, message, slot, created_by, status, created_at";
const SESSION_COLUMNS: &str = "id, mentor_id, mentee_id, request_id, date, time, status, \
     feedback_rating, feedback_comment, created_at";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn corrupt(what: &str, value: &str) -> PortError {
    PortError::Unexpected(format!("stored {} '{}' is invalid", what, value))
}

/// Explains why a conditional update matched no row.
async fn stale_or_missing<'c>(
    executor: impl PgExecutor<'c>,
    table: &str,
    kind: &str,
    id: Uuid,
) -> PortError {
    let sql = format!("SELECT status FROM {} WHERE id = $1", table);
    match sqlx::query_scalar::<_, String>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
    {
        Ok(Some(status)) => PortError::Conflict(format!("{} {} is already {}", kind, id, status)),
        Ok(None) => PortError::NotFound(format!("{} {} not found", kind, id)),
        Err(e) => unexpected(e),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    name: String,
    email: Option<String>,
    role: String,
}
impl UserRecord {
    fn to_domain(self) -> PortResult<User> {
        let role = Role::parse(&self.role).ok_or_else(|| corrupt("role", &self.role))?;
        Ok(User {
            user_id: self.user_id,
            name: self.name,
            email: self.email,
            role,
        })
    }
}

/// JSONB shape of one weekday entry, identical to the REST payload.
#[derive(Serialize, Deserialize)]
struct SlotDayJson {
    day: String,
    times: Vec<SlotTimeJson>,
}

#[derive(Serialize, Deserialize)]
struct SlotTimeJson {
    start: String,
    end: String,
}

fn slots_to_json(slots: &[DaySlots]) -> Vec<SlotDayJson> {
    slots
        .iter()
        .map(|d| SlotDayJson {
            day: d.day.to_string(),
            times: d
                .times
                .iter()
                .map(|t| SlotTimeJson {
                    start: t.start().to_string(),
                    end: t.end().to_string(),
                })
                .collect(),
        })
        .collect()
}

#[derive(FromRow)]
struct AvailabilityRecord {
    id: Uuid,
    mentor_id: Uuid,
    slots: Json<Vec<SlotDayJson>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl AvailabilityRecord {
    fn to_domain(self) -> PortResult<Availability> {
        let mut slots = Vec::with_capacity(self.slots.0.len());
        for day in self.slots.0 {
            let weekday: Weekday = day.day.parse().map_err(|_| corrupt("weekday", &day.day))?;
            let times = day
                .times
                .iter()
                .map(|t| TimeRange::parse(&t.start, &t.end).map_err(|_| corrupt("time range", &t.start)))
                .collect::<PortResult<Vec<_>>>()?;
            slots.push(DaySlots {
                day: weekday,
                times,
            });
        }
        Ok(Availability {
            id: self.id,
            mentor_id: self.mentor_id,
            slots,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct UpsertedAvailabilityRecord {
    #[sqlx(flatten)]
    availability: AvailabilityRecord,
    inserted: bool,
}

#[derive(FromRow)]
struct RequestRecord {
    id: Uuid,
    mentor_id: Uuid,
    mentee_id: Uuid,
    message: String,
    slot: Option<String>,
    created_by: String,
    status: String,
    created_at: DateTime<Utc>,
}
impl RequestRecord {
    fn to_domain(self) -> PortResult<MentorshipRequest> {
        let slot = match self.slot.as_deref() {
            Some(raw) => Some(raw.parse::<SlotToken>().map_err(|_| corrupt("slot", raw))?),
            None => None,
        };
        Ok(MentorshipRequest {
            id: self.id,
            mentor_id: self.mentor_id,
            mentee_id: self.mentee_id,
            message: self.message,
            slot,
            created_by: Initiator::parse(&self.created_by)
                .ok_or_else(|| corrupt("initiator", &self.created_by))?,
            status: RequestStatus::parse(&self.status)
                .ok_or_else(|| corrupt("request status", &self.status))?,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct SessionRecord {
    id: Uuid,
    mentor_id: Uuid,
    mentee_id: Uuid,
    request_id: Option<Uuid>,
    date: DateTime<Utc>,
    time: String,
    status: String,
    feedback_rating: Option<i16>,
    feedback_comment: Option<String>,
    created_at: DateTime<Utc>,
}
impl SessionRecord {
    fn to_domain(self) -> PortResult<Session> {
        let feedback = match (self.feedback_rating, self.feedback_comment) {
            (Some(rating), Some(comment)) => Some(Feedback {
                rating: u8::try_from(rating).map_err(|_| corrupt("rating", &rating.to_string()))?,
                comment,
            }),
            _ => None,
        };
        Ok(Session {
            id: self.id,
            mentor_id: self.mentor_id,
            mentee_id: self.mentee_id,
            request_id: self.request_id,
            date: self.date,
            time: self.time.parse().map_err(|_| corrupt("time", &self.time))?,
            status: SessionStatus::parse(&self.status)
                .ok_or_else(|| corrupt("session status", &self.status))?,
            feedback,
            created_at: self.created_at,
        })
    }
}

fn sessions_to_domain(records: Vec<SessionRecord>) -> PortResult<Vec<Session>> {
    records.into_iter().map(SessionRecord::to_domain).collect()
}

async fn insert_session<'c>(
    executor: impl PgExecutor<'c>,
    session: &NewSession,
) -> PortResult<Session> {
    let sql = format!(
        "INSERT INTO sessions (id, mentor_id, mentee_id, request_id, date, time, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
        SESSION_COLUMNS
    );
    sqlx::query_as::<_, SessionRecord>(&sql)
        .bind(Uuid::new_v4())
        .bind(session.mentor_id)
        .bind(session.mentee_id)
        .bind(session.request_id)
        .bind(session.date)
        .bind(session.time.to_string())
        .bind(session.status.as_str())
        .fetch_one(executor)
        .await
        .map_err(unexpected)?
        .to_domain()
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, name, email, role FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?
        .to_domain()
    }

    async fn get_users(&self, user_ids: &[Uuid]) -> PortResult<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, name, email, role FROM users WHERE user_id = ANY($1)",
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(UserRecord::to_domain).collect()
    }

    async fn validate_auth_session(&self, token: &str) -> PortResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::Unauthorized("Invalid or expired session".to_string()))
    }

    async fn get_availability(&self, mentor_id: Uuid) -> PortResult<Option<Availability>> {
        sqlx::query_as::<_, AvailabilityRecord>(
            "SELECT id, mentor_id, slots, created_at, updated_at FROM availabilities WHERE mentor_id = $1",
        )
        .bind(mentor_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .map(AvailabilityRecord::to_domain)
        .transpose()
    }

    async fn upsert_availability(
        &self,
        mentor_id: Uuid,
        slots: Vec<DaySlots>,
    ) -> PortResult<(Availability, bool)> {
        // `xmax = 0` only holds for a row created by this statement.
        let record = sqlx::query_as::<_, UpsertedAvailabilityRecord>(
            "INSERT INTO availabilities (id, mentor_id, slots) VALUES ($1, $2, $3) \
             ON CONFLICT (mentor_id) DO UPDATE SET slots = EXCLUDED.slots, updated_at = now() \
             RETURNING id, mentor_id, slots, created_at, updated_at, (xmax = 0) AS inserted",
        )
        .bind(Uuid::new_v4())
        .bind(mentor_id)
        .bind(Json(slots_to_json(&slots)))
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok((record.availability.to_domain()?, record.inserted))
    }

    async fn delete_availability(&self, mentor_id: Uuid) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM availabilities WHERE mentor_id = $1")
            .bind(mentor_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_request(&self, request: NewRequest) -> PortResult<MentorshipRequest> {
        let sql = format!(
            "INSERT INTO mentorship_requests (id, mentor_id, mentee_id, message, slot, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            REQUEST_COLUMNS
        );
        let result = sqlx::query_as::<_, RequestRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(request.mentor_id)
            .bind(request.mentee_id)
            .bind(&request.message)
            .bind(request.slot.map(|s| s.to_string()))
            .bind(request.created_by.as_str())
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(record) => record.to_domain(),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(PortError::Conflict(DUPLICATE_PENDING.to_string()))
            }
            Err(e) => Err(unexpected(e)),
        }
    }

    async fn get_request(&self, request_id: Uuid) -> PortResult<MentorshipRequest> {
        let sql = format!("SELECT {} FROM mentorship_requests WHERE id = $1", REQUEST_COLUMNS);
        sqlx::query_as::<_, RequestRecord>(&sql)
            .bind(request_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("Request {} not found", request_id)))?
            .to_domain()
    }

    async fn list_requests(&self, filter: RequestFilter) -> PortResult<Vec<MentorshipRequest>> {
        let (condition, user_id) = match filter {
            RequestFilter::ForMentor(id) => ("mentor_id = $1", id),
            RequestFilter::ForMentee(id) => ("mentee_id = $1", id),
            RequestFilter::InitiatedByMentor(id) => ("mentor_id = $1 AND created_by = 'mentor'", id),
        };
        let sql = format!(
            "SELECT {} FROM mentorship_requests WHERE {} ORDER BY created_at ASC",
            REQUEST_COLUMNS, condition
        );
        let records = sqlx::query_as::<_, RequestRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        records.into_iter().map(RequestRecord::to_domain).collect()
    }

    async fn transition_request(
        &self,
        request_id: Uuid,
        from: RequestStatus,
        to: RequestStatus,
    ) -> PortResult<MentorshipRequest> {
        let sql = format!(
            "UPDATE mentorship_requests SET status = $3 WHERE id = $1 AND status = $2 RETURNING {}",
            REQUEST_COLUMNS
        );
        let updated = sqlx::query_as::<_, RequestRecord>(&sql)
            .bind(request_id)
            .bind(from.as_str())
            .bind(to.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;
        match updated {
            Some(record) => record.to_domain(),
            None => Err(stale_or_missing(&self.pool, "mentorship_requests", "Request", request_id).await),
        }
    }

    async fn accept_request(
        &self,
        request_id: Uuid,
        session: NewSession,
    ) -> PortResult<(MentorshipRequest, Session)> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let sql = format!(
            "UPDATE mentorship_requests SET status = 'accepted' \
             WHERE id = $1 AND status = 'pending' RETURNING {}",
            REQUEST_COLUMNS
        );
        let updated = sqlx::query_as::<_, RequestRecord>(&sql)
            .bind(request_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(unexpected)?;
        let Some(record) = updated else {
            return Err(stale_or_missing(&mut *tx, "mentorship_requests", "Request", request_id).await);
        };
        let request = record.to_domain()?;

        let session = insert_session(&mut *tx, &session).await?;
        tx.commit().await.map_err(unexpected)?;
        Ok((request, session))
    }

    async fn cancel_request(
        &self,
        request_id: Uuid,
        from: RequestStatus,
    ) -> PortResult<(MentorshipRequest, Vec<Session>)> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let sql = format!(
            "UPDATE mentorship_requests SET status = 'cancelled' \
             WHERE id = $1 AND status = $2 RETURNING {}",
            REQUEST_COLUMNS
        );
        let updated = sqlx::query_as::<_, RequestRecord>(&sql)
            .bind(request_id)
            .bind(from.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(unexpected)?;
        let Some(record) = updated else {
            return Err(stale_or_missing(&mut *tx, "mentorship_requests", "Request", request_id).await);
        };
        let request = record.to_domain()?;

        // A pending request never produced a session.
        let mut cancelled = Vec::new();
        if from == RequestStatus::Accepted {
            let sql = format!(
                "UPDATE sessions SET status = 'cancelled' \
                 WHERE request_id = $1 AND status NOT IN ('completed', 'cancelled') RETURNING {}",
                SESSION_COLUMNS
            );
            let records = sqlx::query_as::<_, SessionRecord>(&sql)
                .bind(request_id)
                .fetch_all(&mut *tx)
                .await
                .map_err(unexpected)?;
            cancelled = sessions_to_domain(records)?;
            if cancelled.is_empty() {
                warn!("Accepted request {} had no open session to cancel", request_id);
            }
        }

        tx.commit().await.map_err(unexpected)?;
        Ok((request, cancelled))
    }

    async fn create_session(&self, session: NewSession) -> PortResult<Session> {
        insert_session(&self.pool, &session).await
    }

    async fn get_session(&self, session_id: Uuid) -> PortResult<Session> {
        let sql = format!("SELECT {} FROM sessions WHERE id = $1", SESSION_COLUMNS);
        sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))?
            .to_domain()
    }

    async fn list_sessions(&self, filter: SessionFilter) -> PortResult<Vec<Session>> {
        let sql = format!(
            "SELECT {} FROM sessions \
             WHERE ($1::uuid IS NULL OR mentor_id = $1) \
               AND ($2::uuid IS NULL OR mentee_id = $2) \
               AND ($3 OR status <> 'cancelled') \
             ORDER BY date ASC",
            SESSION_COLUMNS
        );
        let records = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(filter.mentor_id)
            .bind(filter.mentee_id)
            .bind(filter.include_cancelled)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        sessions_to_domain(records)
    }

    async fn transition_session(
        &self,
        session_id: Uuid,
        from: SessionStatus,
        to: SessionStatus,
    ) -> PortResult<Session> {
        let sql = format!(
            "UPDATE sessions SET status = $3 WHERE id = $1 AND status = $2 RETURNING {}",
            SESSION_COLUMNS
        );
        let updated = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(session_id)
            .bind(from.as_str())
            .bind(to.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;
        match updated {
            Some(record) => record.to_domain(),
            None => Err(stale_or_missing(&self.pool, "sessions", "Session", session_id).await),
        }
    }

    async fn attach_feedback(&self, session_id: Uuid, feedback: Feedback) -> PortResult<Session> {
        let sql = format!(
            "UPDATE sessions SET feedback_rating = $2, feedback_comment = $3 \
             WHERE id = $1 AND feedback_rating IS NULL RETURNING {}",
            SESSION_COLUMNS
        );
        let updated = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(session_id)
            .bind(i16::from(feedback.rating))
            .bind(&feedback.comment)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;
        match updated {
            Some(record) => record.to_domain(),
            None => {
                let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM sessions WHERE id = $1")
                    .bind(session_id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(unexpected)?;
                Err(match exists {
                    Some(_) => PortError::Conflict("Feedback already submitted".to_string()),
                    None => PortError::NotFound(format!("Session {} not found", session_id)),
                })
            }
        }
    }
}
