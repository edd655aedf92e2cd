//! services/api/src/adapters/seed.rs
//!
//! Loads users and their bearer tokens into the in-memory store at startup, so
//! a service running without a database still has someone to authenticate.
//!
//! The seed file is a JSON array:
//!
//! ```json
//! [{ "userId": "…", "name": "Grace", "email": "grace@example.com", "role": "mentor", "token": "…" }]
//! ```

use crate::error::ApiError;
use mentorship_core::{InMemoryStore, Role, User};
use serde::Deserialize;
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedUser {
    pub user_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: String,
    pub token: String,
}

pub fn parse_seed_users(raw: &str) -> Result<Vec<SeedUser>, ApiError> {
    serde_json::from_str(raw).map_err(|e| ApiError::Seed(e.to_string()))
}

pub async fn load_seed_users(path: &Path) -> Result<Vec<SeedUser>, ApiError> {
    let raw = tokio::fs::read_to_string(path).await?;
    parse_seed_users(&raw)
}

/// Inserts every seed user and its token. Returns how many were seeded.
pub fn seed_in_memory(store: &InMemoryStore, users: Vec<SeedUser>) -> Result<usize, ApiError> {
    let count = users.len();
    for seed in users {
        let role = Role::parse(&seed.role).ok_or_else(|| {
            ApiError::Seed(format!("unknown role '{}' for user {}", seed.role, seed.user_id))
        })?;
        if seed.token.trim().is_empty() {
            return Err(ApiError::Seed(format!("empty token for user {}", seed.user_id)));
        }
        store.insert_user(User {
            user_id: seed.user_id,
            name: seed.name,
            email: seed.email,
            role,
        })?;
        store.insert_auth_token(&seed.token, seed.user_id)?;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentorship_core::ports::DatabaseService;

    const SEED: &str = r#"[
        { "userId": "7d1c0f36-3f4e-4a59-9a52-2f4c9b1d6a10", "name": "Grace", "role": "mentor", "token": "grace-token" },
        { "userId": "0b8e4a57-6c1d-4f0e-8d3b-5a2e7c9f1b22", "name": "Mia", "email": "mia@example.com", "role": "Mentee", "token": "mia-token" }
    ]"#;

    #[tokio::test]
    async fn seeded_tokens_authenticate() {
        let store = InMemoryStore::new();
        let seeded = seed_in_memory(&store, parse_seed_users(SEED).unwrap()).unwrap();
        assert_eq!(seeded, 2);

        let user_id = store.validate_auth_session("mia-token").await.unwrap();
        assert_eq!(
            user_id,
            Uuid::parse_str("0b8e4a57-6c1d-4f0e-8d3b-5a2e7c9f1b22").unwrap()
        );
        let user = store.get_user(user_id).await.unwrap();
        assert_eq!(user.role, Role::Mentee);
        assert_eq!(user.email.as_deref(), Some("mia@example.com"));
        assert!(store.validate_auth_session("nobody").await.is_err());
    }

    #[test]
    fn unknown_roles_and_bad_json_are_rejected() {
        let store = InMemoryStore::new();
        let users = parse_seed_users(
            r#"[{ "userId": "7d1c0f36-3f4e-4a59-9a52-2f4c9b1d6a10", "name": "X", "role": "owner", "token": "t" }]"#,
        )
        .unwrap();
        assert!(matches!(seed_in_memory(&store, users), Err(ApiError::Seed(_))));
        assert!(matches!(parse_seed_users("{}"), Err(ApiError::Seed(_))));
    }

    #[tokio::test]
    async fn seed_file_is_read_from_disk() {
        let path = std::env::temp_dir().join(format!("seed-users-{}.json", Uuid::new_v4()));
        tokio::fs::write(&path, SEED).await.unwrap();
        let users = load_seed_users(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].name, "Grace");
        assert!(users[0].email.is_none());
    }
}
