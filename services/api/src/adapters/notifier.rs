//! services/api/src/adapters/notifier.rs
//!
//! This module contains the notification adapter. It implements the
//! `NotificationService` port by resolving the recipient and writing the
//! message to the structured log; mail delivery lives outside this service.

use async_trait::async_trait;
use mentorship_core::{
    domain::Notification,
    ports::{DatabaseService, NotificationService, PortResult},
};
use std::sync::Arc;
use tracing::info;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `NotificationService` on top of `tracing`.
#[derive(Clone)]
pub struct TracingNotifier {
    db: Arc<dyn DatabaseService>,
}

impl TracingNotifier {
    /// Creates a new `TracingNotifier`.
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }
}

//=========================================================================================
// `NotificationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl NotificationService for TracingNotifier {
    async fn notify(&self, notification: Notification) -> PortResult<()> {
        let user = self.db.get_user(notification.recipient).await?;
        info!(
            recipient = %user.user_id,
            email = user.email.as_deref().unwrap_or("-"),
            subject = %notification.subject,
            "Notification for {}: {}",
            user.name,
            notification.body
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentorship_core::domain::{Role, User};
    use mentorship_core::ports::PortError;
    use mentorship_core::InMemoryStore;
    use uuid::Uuid;

    #[tokio::test]
    async fn known_recipient_is_notified() {
        let store = Arc::new(InMemoryStore::new());
        let user_id = Uuid::new_v4();
        store
            .insert_user(User {
                user_id,
                name: "Grace".to_string(),
                email: Some("grace@example.com".to_string()),
                role: Role::Mentor,
            })
            .unwrap();
        let notifier = TracingNotifier::new(store);

        let result = notifier
            .notify(Notification {
                recipient: user_id,
                subject: "Hello".to_string(),
                body: "A session was booked.".to_string(),
            })
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn unknown_recipient_fails() {
        let notifier = TracingNotifier::new(Arc::new(InMemoryStore::new()));
        let result = notifier
            .notify(Notification {
                recipient: Uuid::new_v4(),
                subject: "Hello".to_string(),
                body: "Nobody home.".to_string(),
            })
            .await;
        assert!(matches!(result, Err(PortError::NotFound(_))));
    }
}
