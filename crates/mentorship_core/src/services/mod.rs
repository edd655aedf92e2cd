//! crates/mentorship_core/src/services/mod.rs
//!
//! Application services. Each one owns a slice of the mentorship workflow and
//! talks to the outside world only through the traits in `ports`.

pub mod availability;
pub mod requests;
pub mod sessions;

pub use availability::{AvailabilityService, DaySlotsInput, TimeRangeInput};
pub use requests::{CancelOutcome, CreateRequestInput, RequestService, StatusOutcome};
pub use sessions::{BookSessionInput, FeedbackInput, SessionService};

use crate::domain::Notification;
use crate::ports::{Clock, DatabaseService, NotificationService};
use crate::schedule::SameDayPolicy;
use std::sync::Arc;
use tracing::warn;

/// Every core service, wired to the same set of adapters.
#[derive(Clone)]
pub struct MentorshipServices {
    pub availability: AvailabilityService,
    pub requests: RequestService,
    pub sessions: SessionService,
}

impl MentorshipServices {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        notifier: Arc<dyn NotificationService>,
        clock: Arc<dyn Clock>,
        policy: SameDayPolicy,
    ) -> Self {
        Self {
            availability: AvailabilityService::new(db.clone(), clock.clone(), policy),
            requests: RequestService::new(db.clone(), clock, policy),
            sessions: SessionService::new(db, notifier),
        }
    }
}

/// Notifications are best effort: a failed delivery never fails the operation.
pub(crate) async fn notify_best_effort(
    notifier: &dyn NotificationService,
    notification: Notification,
) {
    let recipient = notification.recipient;
    if let Err(e) = notifier.notify(notification).await {
        warn!("Failed to notify user {}: {}", recipient, e);
    }
}
