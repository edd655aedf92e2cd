//! services/api/src/web/dto.rs
//!
//! Request payloads and response bodies for the REST API. Payload fields are
//! optional so that missing values surface as the service's own validation
//! messages rather than as extractor rejections.

use chrono::{DateTime, Utc};
use mentorship_core::domain::{
    Actor, Availability, DaySlots, Feedback, MentorshipRequest, Role, Session, SlotOption, User,
};
use mentorship_core::services::{
    BookSessionInput, CreateRequestInput, DaySlotsInput, FeedbackInput, TimeRangeInput,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Payloads
//=========================================================================================

/// Body of `POST /availability` and `PUT /availability`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SlotsPayload {
    /// A list of `{ day, times: [{ start, end }] }` entries.
    #[schema(value_type = Vec<DaySlotsBody>)]
    pub slots: Option<Value>,
}

impl SlotsPayload {
    /// An absent or unreadable body reads as having no slots.
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    /// Loosely reads the slots so the service can report shape errors itself.
    pub fn into_input(self) -> Option<Vec<DaySlotsInput>> {
        let Some(Value::Array(entries)) = self.slots else {
            return None;
        };
        let text = |v: &Value, key: &str| v.get(key).and_then(Value::as_str).map(str::to_string);
        Some(
            entries
                .iter()
                .map(|entry| DaySlotsInput {
                    day: text(entry, "day"),
                    times: entry.get("times").and_then(Value::as_array).map(|times| {
                        times
                            .iter()
                            .map(|t| TimeRangeInput {
                                start: text(t, "start"),
                                end: text(t, "end"),
                            })
                            .collect()
                    }),
                })
                .collect(),
        )
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestPayload {
    pub mentor_id: Option<Uuid>,
    pub target_user_id: Option<Uuid>,
    pub message: Option<String>,
    /// A slot token such as `Monday @ 09:00 - 10:00`.
    pub slot: Option<String>,
    /// `mentor` or `mentee`; defaults to the caller's role.
    pub created_by: Option<String>,
}

impl CreateRequestPayload {
    /// A mentee addresses a mentor (`mentorId` or `targetUserId`); a mentor
    /// addresses a mentee through `targetUserId`.
    pub fn into_input(self, actor: Actor) -> CreateRequestInput {
        let target_user_id = match actor.role {
            Role::Mentee => self.mentor_id.or(self.target_user_id),
            _ => self.target_user_id,
        };
        CreateRequestInput {
            target_user_id,
            message: self.message,
            slot: self.slot,
            created_by: self.created_by,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StatusPayload {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookSessionPayload {
    #[serde(alias = "mentor")]
    pub mentor_id: Option<Uuid>,
    /// Only read by `POST /admin/sessions`.
    #[serde(alias = "mentee")]
    pub mentee_id: Option<Uuid>,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp.
    pub date: Option<String>,
    /// `HH:MM`.
    pub time: Option<String>,
}

impl From<BookSessionPayload> for BookSessionInput {
    fn from(p: BookSessionPayload) -> Self {
        Self {
            mentor_id: p.mentor_id,
            mentee_id: p.mentee_id,
            date: p.date,
            time: p.time,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct FeedbackPayload {
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

impl From<FeedbackPayload> for FeedbackInput {
    fn from(p: FeedbackPayload) -> Self {
        Self {
            rating: p.rating,
            comment: p.comment,
        }
    }
}

//=========================================================================================
// Responses
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The counterpart embedded in request listings.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.user_id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TimeRangeBody {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DaySlotsBody {
    pub day: String,
    pub times: Vec<TimeRangeBody>,
}

impl From<&DaySlots> for DaySlotsBody {
    fn from(d: &DaySlots) -> Self {
        Self {
            day: d.day.to_string(),
            times: d
                .times
                .iter()
                .map(|t| TimeRangeBody {
                    start: t.start().to_string(),
                    end: t.end().to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub slots: Vec<DaySlotsBody>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Availability> for AvailabilityResponse {
    fn from(a: &Availability) -> Self {
        Self {
            id: a.id,
            mentor_id: a.mentor_id,
            slots: a.slots.iter().map(DaySlotsBody::from).collect(),
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MentorSlotsResponse {
    pub mentor_id: Uuid,
    pub slots: Vec<DaySlotsBody>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotOptionResponse {
    /// The slot token to send back when opening a request.
    pub slot: String,
    pub day: String,
    pub start: String,
    pub end: String,
    pub next_occurrence: DateTime<Utc>,
}

impl From<&SlotOption> for SlotOptionResponse {
    fn from(o: &SlotOption) -> Self {
        Self {
            slot: o.slot.to_string(),
            day: o.slot.weekday.to_string(),
            start: o.slot.start().to_string(),
            end: o.slot.end().to_string(),
            next_occurrence: o.next_occurrence,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponse {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub mentee_id: Uuid,
    pub message: String,
    pub slot: Option<String>,
    pub created_by: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentor: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentee: Option<UserSummary>,
}

impl From<&MentorshipRequest> for RequestResponse {
    fn from(r: &MentorshipRequest) -> Self {
        Self {
            id: r.id,
            mentor_id: r.mentor_id,
            mentee_id: r.mentee_id,
            message: r.message.clone(),
            slot: r.slot.map(|s| s.to_string()),
            created_by: r.created_by.as_str().to_string(),
            status: r.status.as_str().to_string(),
            created_at: r.created_at,
            mentor: None,
            mentee: None,
        }
    }
}

impl RequestResponse {
    /// Attaches whichever parties are present in `users`.
    pub fn with_parties(mut self, users: &HashMap<Uuid, UserSummary>) -> Self {
        self.mentor = users.get(&self.mentor_id).cloned();
        self.mentee = users.get(&self.mentee_id).cloned();
        self
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FeedbackBody {
    pub rating: u8,
    pub comment: String,
}

impl From<&Feedback> for FeedbackBody {
    fn from(f: &Feedback) -> Self {
        Self {
            rating: f.rating,
            comment: f.comment.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub mentee_id: Uuid,
    pub request_id: Option<Uuid>,
    pub date: DateTime<Utc>,
    pub time: String,
    pub status: String,
    pub feedback: Option<FeedbackBody>,
    pub created_at: DateTime<Utc>,
}

impl From<&Session> for SessionResponse {
    fn from(s: &Session) -> Self {
        Self {
            id: s.id,
            mentor_id: s.mentor_id,
            mentee_id: s.mentee_id,
            request_id: s.request_id,
            date: s.date,
            time: s.time.to_string(),
            status: s.status.as_str().to_string(),
            feedback: s.feedback.as_ref().map(FeedbackBody::from),
            created_at: s.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RequestStatusResponse {
    pub message: String,
    pub request: RequestResponse,
    /// Present when the request was accepted.
    pub session: Option<SessionResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequestResponse {
    pub message: String,
    pub request: RequestResponse,
    pub cancelled_sessions: Vec<SessionResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn slots_that_are_not_a_list_read_as_missing() {
        let payload: SlotsPayload = serde_json::from_value(json!({ "slots": "Monday" })).unwrap();
        assert!(payload.into_input().is_none());

        let payload: SlotsPayload = serde_json::from_value(json!({})).unwrap();
        assert!(payload.into_input().is_none());
    }

    #[test]
    fn empty_or_invalid_body_reads_as_no_slots() {
        assert!(SlotsPayload::from_body(b"").into_input().is_none());
        assert!(SlotsPayload::from_body(b"not json").into_input().is_none());
        assert!(SlotsPayload::from_body(br#"{"slots": []}"#).into_input().is_some());
    }

    #[test]
    fn booking_accepts_bare_party_names() {
        let mentor = Uuid::new_v4();
        let mentee = Uuid::new_v4();
        let payload: BookSessionPayload = serde_json::from_value(json!({
            "mentor": mentor,
            "mentee": mentee,
            "date": "2024-01-08",
            "time": "09:00"
        }))
        .unwrap();
        assert_eq!(payload.mentor_id, Some(mentor));
        assert_eq!(payload.mentee_id, Some(mentee));
    }

    #[test]
    fn malformed_entries_keep_their_gaps() {
        let payload: SlotsPayload = serde_json::from_value(json!({
            "slots": [
                { "day": "Monday", "times": [{ "start": "09:00" }] },
                { "day": "Tuesday", "times": "all day" }
            ]
        }))
        .unwrap();
        let input = payload.into_input().unwrap();
        let monday_times = input[0].times.as_ref().unwrap();
        assert_eq!(monday_times[0].start.as_deref(), Some("09:00"));
        assert!(monday_times[0].end.is_none());
        assert!(input[1].times.is_none());
    }

    #[test]
    fn mentee_may_address_the_mentor_by_either_field() {
        let mentor = Uuid::new_v4();
        let mentee = Actor::new(Uuid::new_v4(), Role::Mentee);
        let payload: CreateRequestPayload = serde_json::from_value(json!({
            "mentorId": mentor,
            "message": "Hi"
        }))
        .unwrap();
        assert_eq!(payload.into_input(mentee).target_user_id, Some(mentor));

        let payload: CreateRequestPayload = serde_json::from_value(json!({
            "targetUserId": mentor,
            "message": "Hi"
        }))
        .unwrap();
        assert_eq!(payload.into_input(mentee).target_user_id, Some(mentor));
    }
}
