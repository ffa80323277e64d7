// Public API
pub use config::HubConfig;
pub use connection::Connection;
pub use handler::websocket_handler;
pub use hub::{BroadcastReport, RoomHub};
pub use read_loop::HEARTBEAT;
pub use socket::{Frame, FrameReader, FrameWriter, SocketError};

// Internal modules
mod config;
mod connection;
mod handler;
mod hub;
mod read_loop;
mod socket;
mod write_loop;
