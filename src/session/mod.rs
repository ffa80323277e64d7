// Public API - what other modules can use
pub use handlers::{create_session, end_session};
pub use middleware::jwt_auth;
pub use types::{SessionClaims, SessionResponse};

// Internal modules
mod generators;
mod handlers;
mod middleware;
pub mod models;
pub mod repository;
pub mod service;
pub mod token;
mod types;
