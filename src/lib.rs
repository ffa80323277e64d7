// Library crate for the room broadcast hub
// This file exposes the public API for integration tests

pub mod config;
pub mod room;
pub mod session;
pub mod shared;
pub mod user;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use room::{
    models::RoomModel, repository::RoomRepository, CleanupConfig, RoomDirectory, RoomStatus,
};
pub use shared::{AppError, AppState};
pub use websockets::{
    BroadcastReport, Connection, Frame, FrameReader, FrameWriter, HubConfig, RoomHub, SocketError,
};
