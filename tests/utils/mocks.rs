use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

use roomcast::{AppError, Frame, FrameReader, FrameWriter, RoomDirectory, RoomStatus, SocketError};

// ============================================================================
// Mock Transport
// ============================================================================

/// Server-side inbound half, fed by a `MockPeer`
pub struct MockReader {
    inbound: mpsc::UnboundedReceiver<Result<Frame, SocketError>>,
}

#[async_trait]
impl FrameReader for MockReader {
    async fn recv_frame(&mut self) -> Result<Option<Frame>, SocketError> {
        match self.inbound.recv().await {
            Some(Ok(frame)) => Ok(Some(frame)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }
}

/// Server-side outbound half; every written frame shows up at the `MockPeer`
pub struct MockWriter {
    outbound: mpsc::UnboundedSender<Frame>,
}

#[async_trait]
impl FrameWriter for MockWriter {
    async fn send_frame(&mut self, frame: Frame) -> Result<(), SocketError> {
        self.outbound
            .send(frame)
            .map_err(|_| SocketError::ConnectionClosed)
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        let _ = self.outbound.send(Frame::Close);
        Ok(())
    }
}

/// Writer that never finishes a send, standing in for a client that stopped reading
pub struct StalledWriter;

#[async_trait]
impl FrameWriter for StalledWriter {
    async fn send_frame(&mut self, _frame: Frame) -> Result<(), SocketError> {
        std::future::pending().await
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        Ok(())
    }
}

/// The client's end of a mock transport
pub struct MockPeer {
    pub name: String,
    to_server: mpsc::UnboundedSender<Result<Frame, SocketError>>,
    from_server: mpsc::UnboundedReceiver<Frame>,
}

impl MockPeer {
    pub fn send_binary(&self, payload: &[u8]) {
        let _ = self.to_server.send(Ok(Frame::Binary(payload.to_vec())));
    }

    pub fn send_text(&self, text: &str) {
        let _ = self.to_server.send(Ok(Frame::Text(text.to_string())));
    }

    /// Simulates a broken transport on the read side
    pub fn fail(&self) {
        let _ = self
            .to_server
            .send(Err(SocketError::ReceiveFailed("connection reset".to_string())));
    }

    /// Next data payload delivered to this peer, skipping keep-alive pings
    pub async fn next_payload(&mut self, within: Duration) -> Option<Vec<u8>> {
        tokio::time::timeout(within, async {
            loop {
                match self.from_server.recv().await {
                    Some(Frame::Ping(_)) | Some(Frame::Pong(_)) => continue,
                    Some(frame) => return frame.into_payload(),
                    None => return None,
                }
            }
        })
        .await
        .ok()
        .flatten()
    }

    /// Waits until the server sends a close frame or drops the writer
    pub async fn wait_for_close(&mut self, within: Duration) -> bool {
        tokio::time::timeout(within, async {
            loop {
                match self.from_server.recv().await {
                    Some(Frame::Close) | None => return,
                    Some(_) => continue,
                }
            }
        })
        .await
        .is_ok()
    }
}

pub fn mock_transport(name: &str) -> (MockReader, MockWriter, MockPeer) {
    let (to_server, inbound) = mpsc::unbounded_channel();
    let (outbound, from_server) = mpsc::unbounded_channel();

    (
        MockReader { inbound },
        MockWriter { outbound },
        MockPeer {
            name: name.to_string(),
            to_server,
            from_server,
        },
    )
}

// ============================================================================
// Stub Room Directory
// ============================================================================

pub struct StubDirectory {
    rooms: Mutex<HashMap<String, RoomStatus>>,
    failing: AtomicBool,
}

impl StubDirectory {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Registers a room that stays live for another hour
    pub fn add_live_room(&self, join_code: &str) {
        self.rooms.lock().unwrap().insert(
            join_code.to_string(),
            RoomStatus {
                expires_at: Utc::now() + ChronoDuration::hours(1),
                ended: false,
            },
        );
    }

    pub fn end_room(&self, join_code: &str) {
        if let Some(status) = self.rooms.lock().unwrap().get_mut(join_code) {
            status.ended = true;
        }
    }

    pub fn expire_room(&self, join_code: &str) {
        if let Some(status) = self.rooms.lock().unwrap().get_mut(join_code) {
            status.expires_at = Utc::now() - ChronoDuration::minutes(1);
        }
    }

    pub fn fail_lookups(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl RoomDirectory for StubDirectory {
    async fn room_status(&self, join_code: &str) -> Result<Option<RoomStatus>, AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError("directory offline".to_string()));
        }
        Ok(self.rooms.lock().unwrap().get(join_code).copied())
    }
}
