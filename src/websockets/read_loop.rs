use std::sync::Arc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use super::connection::{transport_closed, Connection};
use super::hub::RoomHub;
use super::socket::{Frame, FrameReader, SocketError};

/// Application-level heartbeat some clients send; it is never relayed
pub const HEARTBEAT: &[u8] = b"ping";

/// Pulls frames off the transport and broadcasts application payloads until
/// the transport fails, the peer closes, or the connection is shut down.
/// Always ends with a teardown.
pub(crate) async fn run_read_loop(
    hub: RoomHub,
    connection: Arc<Connection>,
    mut reader: Box<dyn FrameReader>,
) {
    let result = read_frames(&hub, &connection, reader.as_mut()).await;

    match result {
        Ok(()) => info!(
            room_id = %connection.room_id(),
            client_id = %connection.client_id(),
            "Read loop finished"
        ),
        Err(e) => warn!(
            room_id = %connection.room_id(),
            client_id = %connection.client_id(),
            error = %e,
            "Read loop failed"
        ),
    }

    hub.teardown(&connection).await;
}

async fn read_frames(
    hub: &RoomHub,
    connection: &Connection,
    reader: &mut dyn FrameReader,
) -> Result<(), SocketError> {
    let read_timeout = hub.config().read_timeout;
    let mut deadline = Instant::now() + read_timeout;
    let mut shutdown = connection.shutdown_signal();

    loop {
        let frame = tokio::select! {
            _ = transport_closed(&mut shutdown) => return Ok(()),
            received = timeout_at(deadline, reader.recv_frame()) => match received {
                Ok(frame) => frame?,
                Err(_) => return Err(SocketError::ReadTimeout(read_timeout)),
            },
        };

        match frame {
            None | Some(Frame::Close) => return Ok(()),
            Some(Frame::Pong(_)) => deadline = Instant::now() + read_timeout,
            // Protocol pings are answered by the transport itself
            Some(Frame::Ping(_)) => {}
            Some(data) => {
                let Some(payload) = data.into_payload() else {
                    continue;
                };
                if payload == HEARTBEAT {
                    debug!(client_id = %connection.client_id(), "Heartbeat ignored");
                    continue;
                }
                hub.broadcast(connection, payload).await;
            }
        }
    }
}
