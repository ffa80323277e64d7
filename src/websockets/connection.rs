use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

/// Outcome of offering a message to a connection's outbound queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued,
    /// The queue is at capacity; the peer is not draining fast enough
    Full,
    /// The connection has already been torn down
    Closed,
}

/// One client's membership in a room.
///
/// The registry and the connection's own loops share it through an `Arc`.
/// The outbound queue receiver lives in the write loop; the transport halves
/// live in the read and write loops, which both watch the shutdown signal
/// raised by [`Connection::close_transport`].
#[derive(Debug)]
pub struct Connection {
    id: Uuid,
    room_id: String,
    client_id: String,
    outbound: Mutex<Option<mpsc::Sender<Vec<u8>>>>,
    shutdown: watch::Sender<bool>,
    closed: AtomicBool,
}

impl Connection {
    pub(crate) fn new(
        room_id: String,
        client_id: String,
        capacity: usize,
    ) -> (Arc<Self>, mpsc::Receiver<Vec<u8>>) {
        let (sender, receiver) = mpsc::channel(capacity);
        let (shutdown, _) = watch::channel(false);

        let connection = Arc::new(Self {
            id: Uuid::new_v4(),
            room_id,
            client_id,
            outbound: Mutex::new(Some(sender)),
            shutdown,
            closed: AtomicBool::new(false),
        });

        (connection, receiver)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Non-blocking enqueue onto the outbound queue
    pub(crate) fn try_enqueue(&self, payload: Vec<u8>) -> EnqueueOutcome {
        let outbound = self.outbound.lock().unwrap_or_else(|e| e.into_inner());
        match outbound.as_ref() {
            Some(sender) => match sender.try_send(payload) {
                Ok(()) => EnqueueOutcome::Queued,
                Err(mpsc::error::TrySendError::Full(_)) => EnqueueOutcome::Full,
                Err(mpsc::error::TrySendError::Closed(_)) => EnqueueOutcome::Closed,
            },
            None => EnqueueOutcome::Closed,
        }
    }

    /// Drops the queue's sender so the write loop drains what is left and stops
    pub(crate) fn close_outbound(&self) {
        self.outbound
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
    }

    /// Signals both loops that the transport is gone.
    /// Returns true only for the call that actually closed it.
    pub fn close_transport(&self) -> bool {
        !self.shutdown.send_replace(true)
    }

    pub fn is_transport_closed(&self) -> bool {
        *self.shutdown.borrow()
    }

    pub(crate) fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Fires the one-shot teardown latch. Only the first caller gets true.
    pub(crate) fn begin_teardown(&self) -> bool {
        self.closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Resolves once the transport-closed signal has been raised
pub(crate) async fn transport_closed(signal: &mut watch::Receiver<bool>) {
    // An error means the connection itself is gone, which counts as closed
    let _ = signal.wait_for(|closed| *closed).await;
}
