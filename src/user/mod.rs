// Public API - what other modules can use
pub use handlers::{login, profile, register};
pub use types::{LoginRequest, ProfileResponse, RegisterRequest};

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
mod types;
