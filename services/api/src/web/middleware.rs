//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use mentorship_core::domain::Actor;
use std::sync::Arc;
use tracing::{error, warn};

use crate::web::state::AppState;

/// Middleware that resolves the caller from a bearer token or a `session` cookie.
///
/// If valid, inserts the caller's `Actor` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract the token
    let token = auth_token(req.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Validate auth session in database, get user_id
    let user_id = state
        .db
        .validate_auth_session(&token)
        .await
        .map_err(|e| {
            warn!("Rejected auth session: {}", e);
            StatusCode::UNAUTHORIZED
        })?;

    // 3. Load the user to learn their role
    let user = state.db.get_user(user_id).await.map_err(|e| {
        error!("Auth session {} points at an unusable user: {}", user_id, e);
        StatusCode::UNAUTHORIZED
    })?;

    // 4. Insert the actor into request extensions
    req.extensions_mut().insert(Actor::new(user.user_id, user.role));

    // 5. Continue to the handler
    Ok(next.run(req).await)
}

/// The bearer token wins over the cookie when both are present.
fn auth_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| c.trim().strip_prefix("session="))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_is_preferred() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("session=xyz"));
        assert_eq!(auth_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn session_cookie_is_read_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=xyz; lang=en"),
        );
        assert_eq!(auth_token(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn missing_or_blank_credentials_yield_nothing() {
        assert_eq!(auth_token(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(auth_token(&headers), None);
    }
}
