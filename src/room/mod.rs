// Public API - what other modules can use
pub use cleanup_task::{start_cleanup_task, CleanupConfig};
pub use directory::{RoomDirectory, RoomStatus};
pub use handlers::{create_room, end_room, join_room};

// Internal modules
pub mod cleanup_task;
pub mod directory;
mod handlers;
mod join_code;
pub mod models;
pub mod repository;
mod service;
pub mod types;
