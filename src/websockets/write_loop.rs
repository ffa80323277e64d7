use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tracing::{info, warn};

use super::connection::{transport_closed, Connection};
use super::hub::RoomHub;
use super::socket::{Frame, FrameWriter, SocketError};

/// Drains the outbound queue to the transport and sends keep-alive pings.
/// Always ends with a teardown.
pub(crate) async fn run_write_loop(
    hub: RoomHub,
    connection: Arc<Connection>,
    mut writer: Box<dyn FrameWriter>,
    outbound: mpsc::Receiver<Vec<u8>>,
) {
    let result = write_frames(&hub, &connection, writer.as_mut(), outbound).await;

    match result {
        Ok(()) => info!(
            room_id = %connection.room_id(),
            client_id = %connection.client_id(),
            "Write loop finished"
        ),
        Err(e) => warn!(
            room_id = %connection.room_id(),
            client_id = %connection.client_id(),
            error = %e,
            "Write loop failed"
        ),
    }

    hub.teardown(&connection).await;
}

async fn write_frames(
    hub: &RoomHub,
    connection: &Connection,
    writer: &mut dyn FrameWriter,
    mut outbound: mpsc::Receiver<Vec<u8>>,
) -> Result<(), SocketError> {
    let write_timeout = hub.config().write_timeout;
    let ping_interval = hub.config().ping_interval;
    let mut ticker = interval_at(Instant::now() + ping_interval, ping_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut shutdown = connection.shutdown_signal();

    loop {
        tokio::select! {
            _ = transport_closed(&mut shutdown) => {
                // Best effort, the peer may already be gone
                let _ = with_deadline(write_timeout, writer.close()).await;
                return Ok(());
            }
            message = outbound.recv() => match message {
                Some(payload) => {
                    with_deadline(write_timeout, writer.send_frame(Frame::Binary(payload))).await?;
                }
                None => {
                    return with_deadline(write_timeout, writer.close()).await;
                }
            },
            _ = ticker.tick() => {
                with_deadline(write_timeout, writer.send_frame(Frame::Ping(Vec::new()))).await?;
            }
        }
    }
}

async fn with_deadline<F>(limit: Duration, write: F) -> Result<(), SocketError>
where
    F: Future<Output = Result<(), SocketError>>,
{
    timeout(limit, write)
        .await
        .map_err(|_| SocketError::WriteTimeout(limit))?
}
