mod common;

use chrono::Datelike;
use common::{at, Harness};
use mentorship_core::services::CreateRequestInput;
use mentorship_core::{
    DatabaseService, PortError, RequestStatus, Role, SessionFilter, SessionStatus, Weekday,
};
use std::sync::Arc;
use uuid::Uuid;

fn request_to(target: Uuid, slot: Option<&str>) -> CreateRequestInput {
    CreateRequestInput {
        target_user_id: Some(target),
        message: Some("I'd like help with Rust".to_string()),
        slot: slot.map(str::to_string),
        created_by: None,
    }
}

#[tokio::test]
async fn second_pending_request_for_same_pair_conflicts() {
    let h = Harness::new();
    let mentor = h.user("Ada", Role::Mentor);
    let mentee = h.user("Bob", Role::Mentee);
    let other_mentee = h.user("Cy", Role::Mentee);

    h.services
        .requests
        .create(mentee, request_to(mentor.user_id, None))
        .await
        .unwrap();

    let err = h
        .services
        .requests
        .create(mentee, request_to(mentor.user_id, None))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        PortError::Conflict("A pending request already exists between you two".to_string())
    );

    // A different mentee is unaffected.
    h.services
        .requests
        .create(other_mentee, request_to(mentor.user_id, None))
        .await
        .unwrap();
}

#[tokio::test]
async fn new_request_allowed_once_previous_is_resolved() {
    let h = Harness::new();
    let mentor = h.user("Ada", Role::Mentor);
    let mentee = h.user("Bob", Role::Mentee);

    let first = h
        .services
        .requests
        .create(mentee, request_to(mentor.user_id, None))
        .await
        .unwrap();
    h.services
        .requests
        .update_status(mentor, first.id, "rejected")
        .await
        .unwrap();

    let second = h
        .services
        .requests
        .create(mentee, request_to(mentor.user_id, None))
        .await
        .unwrap();
    assert_eq!(second.status, RequestStatus::Pending);
}

#[tokio::test]
async fn missing_message_or_target_is_a_validation_error() {
    let h = Harness::new();
    let mentor = h.user("Ada", Role::Mentor);
    let mentee = h.user("Bob", Role::Mentee);

    let mut input = request_to(mentor.user_id, None);
    input.message = Some("   ".to_string());
    assert_eq!(
        h.services.requests.create(mentee, input).await.unwrap_err(),
        PortError::Validation("Missing required fields".to_string())
    );

    let mut input = request_to(mentor.user_id, None);
    input.target_user_id = None;
    assert!(matches!(
        h.services.requests.create(mentee, input).await,
        Err(PortError::Validation(_))
    ));
}

#[tokio::test]
async fn initiator_must_match_caller_role() {
    let h = Harness::new();
    let mentor = h.user("Ada", Role::Mentor);
    let mentee = h.user("Bob", Role::Mentee);

    let mut input = request_to(mentor.user_id, None);
    input.created_by = Some("mentor".to_string());
    assert_eq!(
        h.services.requests.create(mentee, input).await.unwrap_err(),
        PortError::Validation("Invalid initiator role".to_string())
    );
}

#[tokio::test]
async fn mentor_can_initiate_towards_a_mentee() {
    let h = Harness::new();
    let mentor = h.user("Ada", Role::Mentor);
    let mentee = h.user("Bob", Role::Mentee);

    let mut input = request_to(mentee.user_id, Some("Friday @ 10:00 - 11:00"));
    input.created_by = Some("mentor".to_string());
    let request = h.services.requests.create(mentor, input).await.unwrap();
    assert_eq!(request.mentor_id, mentor.user_id);
    assert_eq!(request.mentee_id, mentee.user_id);

    let sent = h.services.requests.list_sent_by_mentor(mentor).await.unwrap();
    assert_eq!(sent.len(), 1);
    let incoming = h.services.requests.list_for_mentee(mentee).await.unwrap();
    assert_eq!(incoming.len(), 1);
}

#[tokio::test]
async fn malformed_slot_is_rejected_at_creation() {
    let h = Harness::new();
    let mentor = h.user("Ada", Role::Mentor);
    let mentee = h.user("Bob", Role::Mentee);

    let err = h
        .services
        .requests
        .create(mentee, request_to(mentor.user_id, Some("Monday at nine")))
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::Validation(_)));
}

#[tokio::test]
async fn accepting_materializes_exactly_one_session_at_resolved_slot() {
    let h = Harness::new();
    let mentor = h.user("Ada", Role::Mentor);
    let mentee = h.user("Bob", Role::Mentee);

    let request = h
        .services
        .requests
        .create(mentee, request_to(mentor.user_id, Some("Monday @ 09:00 - 10:00")))
        .await
        .unwrap();

    let outcome = h
        .services
        .requests
        .update_status(mentor, request.id, "accepted")
        .await
        .unwrap();
    assert_eq!(outcome.request.status, RequestStatus::Accepted);

    let session = outcome.session.expect("session created on accept");
    assert_eq!(session.time.to_string(), "09:00");
    assert_eq!(Weekday::from_chrono(session.date.weekday()), Weekday::Monday);
    assert_eq!(session.date, at("2024-01-08T09:00:00Z"));
    assert_eq!(session.status, SessionStatus::Scheduled);
    assert_eq!(session.request_id, Some(request.id));

    let all = h.store.list_sessions(SessionFilter::default()).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn accepting_without_slot_fails_and_changes_nothing() {
    let h = Harness::new();
    let mentor = h.user("Ada", Role::Mentor);
    let mentee = h.user("Bob", Role::Mentee);

    let request = h
        .services
        .requests
        .create(mentee, request_to(mentor.user_id, None))
        .await
        .unwrap();

    let err = h
        .services
        .requests
        .update_status(mentor, request.id, "accepted")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        PortError::Validation("No time slot provided on the request".to_string())
    );

    let stored = h.store.get_request(request.id).await.unwrap();
    assert_eq!(stored.status, RequestStatus::Pending);
    let all = h.store.list_sessions(SessionFilter::default()).await.unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn only_the_addressed_mentor_may_change_status() {
    let h = Harness::new();
    let mentor = h.user("Ada", Role::Mentor);
    let stranger = h.user("Eve", Role::Mentor);
    let mentee = h.user("Bob", Role::Mentee);

    let request = h
        .services
        .requests
        .create(mentee, request_to(mentor.user_id, Some("Monday @ 09:00 - 10:00")))
        .await
        .unwrap();

    let not_owner = h
        .services
        .requests
        .update_status(stranger, request.id, "accepted")
        .await
        .unwrap_err();
    let missing = h
        .services
        .requests
        .update_status(mentor, Uuid::new_v4(), "accepted")
        .await
        .unwrap_err();
    // Someone else's request is indistinguishable from a missing one.
    assert_eq!(not_owner, missing);
    assert_eq!(
        missing,
        PortError::NotFound("Request not found or unauthorized".to_string())
    );
}

#[tokio::test]
async fn unknown_status_is_rejected() {
    let h = Harness::new();
    let mentor = h.user("Ada", Role::Mentor);
    let mentee = h.user("Bob", Role::Mentee);
    let request = h
        .services
        .requests
        .create(mentee, request_to(mentor.user_id, None))
        .await
        .unwrap();

    for status in ["cancelled", "pending", "maybe"] {
        assert_eq!(
            h.services
                .requests
                .update_status(mentor, request.id, status)
                .await
                .unwrap_err(),
            PortError::Validation("Invalid status value".to_string())
        );
    }
}

#[tokio::test]
async fn accepted_request_cannot_be_accepted_twice() {
    let h = Harness::new();
    let mentor = h.user("Ada", Role::Mentor);
    let mentee = h.user("Bob", Role::Mentee);
    let request = h
        .services
        .requests
        .create(mentee, request_to(mentor.user_id, Some("Monday @ 09:00 - 10:00")))
        .await
        .unwrap();

    h.services
        .requests
        .update_status(mentor, request.id, "accepted")
        .await
        .unwrap();
    let err = h
        .services
        .requests
        .update_status(mentor, request.id, "accepted")
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::Conflict(_)));

    let all = h.store.list_sessions(SessionFilter::default()).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn cancelling_pending_request_touches_no_sessions() {
    let h = Harness::new();
    let mentor = h.user("Ada", Role::Mentor);
    let mentee = h.user("Bob", Role::Mentee);
    let request = h
        .services
        .requests
        .create(mentee, request_to(mentor.user_id, Some("Monday @ 09:00 - 10:00")))
        .await
        .unwrap();

    let outcome = h.services.requests.cancel(mentee, request.id).await.unwrap();
    assert_eq!(outcome.request.status, RequestStatus::Cancelled);
    assert!(outcome.cancelled_sessions.is_empty());
}

#[tokio::test]
async fn cancelling_accepted_request_cancels_its_session_without_deleting_it() {
    let h = Harness::new();
    let mentor = h.user("Ada", Role::Mentor);
    let mentee = h.user("Bob", Role::Mentee);

    // An earlier, unrelated session at the same time of day must survive.
    let earlier = h
        .services
        .requests
        .create(mentee, request_to(mentor.user_id, Some("Thursday @ 09:00 - 10:00")))
        .await
        .unwrap();
    let earlier_session = h
        .services
        .requests
        .update_status(mentor, earlier.id, "accepted")
        .await
        .unwrap()
        .session
        .unwrap();

    let request = h
        .services
        .requests
        .create(mentee, request_to(mentor.user_id, Some("Monday @ 09:00 - 10:00")))
        .await
        .unwrap();
    let session = h
        .services
        .requests
        .update_status(mentor, request.id, "accepted")
        .await
        .unwrap()
        .session
        .unwrap();

    let outcome = h.services.requests.cancel(mentee, request.id).await.unwrap();
    assert_eq!(outcome.request.status, RequestStatus::Cancelled);
    assert_eq!(outcome.cancelled_sessions.len(), 1);
    assert_eq!(outcome.cancelled_sessions[0].id, session.id);

    let stored = h.store.get_session(session.id).await.unwrap();
    assert_eq!(stored.status, SessionStatus::Cancelled);
    let untouched = h.store.get_session(earlier_session.id).await.unwrap();
    assert_eq!(untouched.status, SessionStatus::Scheduled);
}

#[tokio::test]
async fn only_the_requesting_mentee_may_cancel() {
    let h = Harness::new();
    let mentor = h.user("Ada", Role::Mentor);
    let mentee = h.user("Bob", Role::Mentee);
    let request = h
        .services
        .requests
        .create(mentee, request_to(mentor.user_id, None))
        .await
        .unwrap();

    let err = h.services.requests.cancel(mentor, request.id).await.unwrap_err();
    assert_eq!(
        err,
        PortError::NotFound("Request not found or unauthorized".to_string())
    );
}

#[tokio::test]
async fn rejected_request_cannot_be_cancelled() {
    let h = Harness::new();
    let mentor = h.user("Ada", Role::Mentor);
    let mentee = h.user("Bob", Role::Mentee);
    let request = h
        .services
        .requests
        .create(mentee, request_to(mentor.user_id, None))
        .await
        .unwrap();
    h.services
        .requests
        .update_status(mentor, request.id, "rejected")
        .await
        .unwrap();

    assert!(matches!(
        h.services.requests.cancel(mentee, request.id).await,
        Err(PortError::Conflict(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_for_same_pair_admit_exactly_one() {
    let h = Arc::new(Harness::new());
    let mentor = h.user("Ada", Role::Mentor);
    let mentee = h.user("Bob", Role::Mentee);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let h = h.clone();
        handles.push(tokio::spawn(async move {
            h.services
                .requests
                .create(mentee, request_to(mentor.user_id, None))
                .await
        }));
    }

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(PortError::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(conflicts, 15);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_accepts_create_a_single_session() {
    let h = Arc::new(Harness::new());
    let mentor = h.user("Ada", Role::Mentor);
    let mentee = h.user("Bob", Role::Mentee);
    let request = h
        .services
        .requests
        .create(mentee, request_to(mentor.user_id, Some("Monday @ 09:00 - 10:00")))
        .await
        .unwrap();

    let request_id = request.id;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let h = h.clone();
        handles.push(tokio::spawn(async move {
            h.services
                .requests
                .update_status(mentor, request_id, "accepted")
                .await
        }));
    }
    let successes = futures_count(handles).await;
    assert_eq!(successes, 1);

    let all = h.store.list_sessions(SessionFilter::default()).await.unwrap();
    assert_eq!(all.len(), 1);
}

async fn futures_count<T, E>(handles: Vec<tokio::task::JoinHandle<Result<T, E>>>) -> usize {
    let mut ok = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            ok += 1;
        }
    }
    ok
}
