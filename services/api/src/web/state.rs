//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use mentorship_core::ports::DatabaseService;
use mentorship_core::services::MentorshipServices;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Used directly only by the auth middleware and for user summaries.
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub services: MentorshipServices,
}
