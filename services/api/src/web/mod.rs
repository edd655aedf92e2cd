pub mod availability;
pub mod dto;
pub mod extract;
pub mod middleware;
pub mod requests;
pub mod rest;
pub mod sessions;
pub mod state;

// Re-export the pieces the binaries need to build the server.
pub use middleware::require_auth;
pub use rest::{router, ApiDoc};
