//! Shared fixtures for the core integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mentorship_core::{
    Actor, Clock, InMemoryStore, MentorshipServices, Notification, NotificationService,
    PortResult, Role, SameDayPolicy, User,
};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationService for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> PortResult<()> {
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub services: MentorshipServices,
    pub now: DateTime<Utc>,
}

/// Wednesday 2024-01-03, noon UTC.
pub fn wednesday_noon() -> DateTime<Utc> {
    at("2024-01-03T12:00:00Z")
}

pub fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

impl Harness {
    pub fn new() -> Self {
        Self::at(wednesday_noon())
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        let clock = Arc::new(FixedClock(now));
        let store = Arc::new(InMemoryStore::with_clock(clock.clone()));
        let notifier = Arc::new(RecordingNotifier::default());
        let services = MentorshipServices::new(
            store.clone(),
            notifier.clone(),
            clock,
            SameDayPolicy::RollIfPassed,
        );
        Self {
            store,
            notifier,
            services,
            now,
        }
    }

    pub fn user(&self, name: &str, role: Role) -> Actor {
        let user_id = Uuid::new_v4();
        self.store
            .insert_user(User {
                user_id,
                name: name.to_string(),
                email: Some(format!("{}@example.com", name.to_lowercase())),
                role,
            })
            .unwrap();
        Actor::new(user_id, role)
    }
}
