use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, instrument, warn};

use super::config::HubConfig;
use super::connection::{Connection, EnqueueOutcome};
use super::read_loop::run_read_loop;
use super::socket::{FrameReader, FrameWriter};
use super::write_loop::run_write_loop;
use crate::room::directory::RoomDirectory;

/// room_id -> client_id -> connection
type Rooms = HashMap<String, HashMap<String, Arc<Connection>>>;

/// What a single broadcast did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub evicted: usize,
}

/// In-memory registry of live connections grouped by room.
///
/// Every membership change, broadcast and sweep runs under one lock, so they
/// are totally ordered across all rooms. Cloning is cheap and shares the
/// same registry.
#[derive(Clone)]
pub struct RoomHub {
    inner: Arc<HubInner>,
}

struct HubInner {
    rooms: Mutex<Rooms>,
    config: HubConfig,
}

impl RoomHub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            inner: Arc::new(HubInner {
                rooms: Mutex::new(HashMap::new()),
                config,
            }),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    /// Registers a new connection and starts its read and write loops.
    ///
    /// The room must already have been checked against the directory. A
    /// connection registered earlier under the same room and client is
    /// replaced and torn down.
    #[instrument(skip(self, reader, writer))]
    pub async fn admit(
        &self,
        room_id: String,
        client_id: String,
        reader: Box<dyn FrameReader>,
        writer: Box<dyn FrameWriter>,
    ) -> Arc<Connection> {
        let (connection, outbound) = self.register(room_id, client_id).await;

        tokio::spawn(run_read_loop(self.clone(), Arc::clone(&connection), reader));
        tokio::spawn(run_write_loop(
            self.clone(),
            Arc::clone(&connection),
            writer,
            outbound,
        ));

        connection
    }

    /// Inserts a fresh connection into the registry without starting its loops
    pub(crate) async fn register(
        &self,
        room_id: String,
        client_id: String,
    ) -> (Arc<Connection>, mpsc::Receiver<Vec<u8>>) {
        let (connection, outbound) =
            Connection::new(room_id, client_id, self.inner.config.outbound_capacity);

        let replaced = {
            let mut rooms = self.inner.rooms.lock().await;
            rooms
                .entry(connection.room_id().to_string())
                .or_default()
                .insert(connection.client_id().to_string(), Arc::clone(&connection))
        };

        info!(
            room_id = %connection.room_id(),
            client_id = %connection.client_id(),
            connection_id = %connection.id(),
            "Connection joined room"
        );

        if let Some(previous) = replaced {
            info!(
                room_id = %previous.room_id(),
                client_id = %previous.client_id(),
                connection_id = %previous.id(),
                "Client re-admitted, closing previous connection"
            );
            self.teardown(&previous).await;
        }

        (connection, outbound)
    }

    /// Fans `payload` out to every other member of the sender's room.
    ///
    /// Peers whose queue is full are evicted in the background; the sender
    /// and the remaining peers are unaffected.
    pub async fn broadcast(&self, from: &Connection, payload: Vec<u8>) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        if from.is_closed() {
            return report;
        }

        let rooms = self.inner.rooms.lock().await;
        let Some(members) = rooms.get(from.room_id()) else {
            return report;
        };

        for peer in members.values() {
            if peer.client_id() == from.client_id() {
                continue;
            }

            match peer.try_enqueue(payload.clone()) {
                EnqueueOutcome::Queued => report.delivered += 1,
                EnqueueOutcome::Full => {
                    warn!(
                        room_id = %peer.room_id(),
                        client_id = %peer.client_id(),
                        connection_id = %peer.id(),
                        "Outbound queue full, evicting slow consumer"
                    );
                    report.evicted += 1;

                    let hub = self.clone();
                    let peer = Arc::clone(peer);
                    tokio::spawn(async move {
                        hub.teardown(&peer).await;
                    });
                }
                EnqueueOutcome::Closed => {}
            }
        }

        debug!(
            room_id = %from.room_id(),
            client_id = %from.client_id(),
            bytes = payload.len(),
            delivered = report.delivered,
            evicted = report.evicted,
            "Broadcast complete"
        );

        report
    }

    /// Releases a connection: closes its transport, removes it from the
    /// registry and closes its outbound queue.
    ///
    /// Safe to call any number of times from any task; only the first call
    /// does the work and returns true.
    pub async fn teardown(&self, connection: &Connection) -> bool {
        if !connection.begin_teardown() {
            return false;
        }

        connection.close_transport();

        {
            let mut rooms = self.inner.rooms.lock().await;
            if let Some(members) = rooms.get_mut(connection.room_id()) {
                let registered = members
                    .get(connection.client_id())
                    .is_some_and(|member| member.id() == connection.id());
                if registered {
                    members.remove(connection.client_id());
                }
                if members.is_empty() {
                    rooms.remove(connection.room_id());
                    debug!(room_id = %connection.room_id(), "Last member left, room removed");
                }
            }
        }

        connection.close_outbound();

        info!(
            room_id = %connection.room_id(),
            client_id = %connection.client_id(),
            connection_id = %connection.id(),
            "Connection torn down"
        );

        true
    }

    /// One sweeper pass: evicts every room the directory no longer reports
    /// as live. Returns the evicted room ids.
    ///
    /// The registry lock is held for the whole pass; each lookup is bounded
    /// by `lookup_timeout`. A failed or timed out lookup counts as gone.
    pub async fn sweep(
        &self,
        directory: &dyn RoomDirectory,
        lookup_timeout: Duration,
    ) -> Vec<String> {
        let mut rooms = self.inner.rooms.lock().await;
        let room_ids: Vec<String> = rooms.keys().cloned().collect();
        let mut evicted = Vec::new();

        for room_id in room_ids {
            let live = match tokio::time::timeout(lookup_timeout, directory.room_status(&room_id))
                .await
            {
                Ok(Ok(Some(status))) => status.is_live_at(Utc::now()),
                Ok(Ok(None)) => {
                    debug!(room_id = %room_id, "Room no longer exists in directory");
                    false
                }
                Ok(Err(e)) => {
                    warn!(room_id = %room_id, error = %e, "Room lookup failed");
                    false
                }
                Err(_) => {
                    warn!(
                        room_id = %room_id,
                        timeout_ms = lookup_timeout.as_millis() as u64,
                        "Room lookup timed out"
                    );
                    false
                }
            };

            if live {
                continue;
            }

            if let Some(members) = rooms.remove(&room_id) {
                for member in members.values() {
                    member.close_transport();
                }
                info!(
                    room_id = %room_id,
                    members = members.len(),
                    "Evicted room and disconnected its members"
                );
            }
            evicted.push(room_id);
        }

        evicted
    }

    /// Client ids currently registered in `room_id`, sorted
    pub async fn members(&self, room_id: &str) -> Option<Vec<String>> {
        let rooms = self.inner.rooms.lock().await;
        rooms.get(room_id).map(|members| {
            let mut ids: Vec<String> = members.keys().cloned().collect();
            ids.sort();
            ids
        })
    }

    pub async fn room_count(&self) -> usize {
        self.inner.rooms.lock().await.len()
    }
}
