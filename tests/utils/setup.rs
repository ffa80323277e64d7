use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use roomcast::{Connection, HubConfig, RoomHub};

use super::mocks::{mock_transport, MockPeer, StalledWriter, StubDirectory};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub const ROOM: &str = "ABCDE";

pub struct TestSetup {
    pub hub: RoomHub,
    pub directory: Arc<StubDirectory>,
    pub peers: HashMap<String, MockPeer>,
    pub connections: HashMap<String, Arc<Connection>>,
}

impl TestSetup {
    pub fn peer(&mut self, name: &str) -> &mut MockPeer {
        self.peers
            .get_mut(name)
            .unwrap_or_else(|| panic!("no peer named {name}"))
    }

    /// Admits another client into `ROOM` over a fresh mock transport
    pub async fn connect(&mut self, name: &str) -> Arc<Connection> {
        let (reader, writer, peer) = mock_transport(name);
        let connection = self
            .hub
            .admit(
                ROOM.to_string(),
                name.to_string(),
                Box::new(reader),
                Box::new(writer),
            )
            .await;

        self.peers.insert(name.to_string(), peer);
        self.connections
            .insert(name.to_string(), Arc::clone(&connection));
        connection
    }

    /// Admits a client whose writes never complete; returns its inbound side
    pub async fn connect_stalled(&mut self, name: &str) -> MockPeer {
        let (reader, _writer, peer) = mock_transport(name);
        let connection = self
            .hub
            .admit(
                ROOM.to_string(),
                name.to_string(),
                Box::new(reader),
                Box::new(StalledWriter),
            )
            .await;

        self.connections.insert(name.to_string(), connection);
        peer
    }

    pub async fn sweep(&self) -> Vec<String> {
        self.hub
            .sweep(self.directory.as_ref(), Duration::from_millis(500))
            .await
    }
}

pub struct TestSetupBuilder {
    clients: Vec<String>,
    config: HubConfig,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            clients: vec![],
            config: HubConfig {
                outbound_capacity: 256,
                read_timeout: Duration::from_secs(30),
                write_timeout: Duration::from_secs(30),
                ping_interval: Duration::from_secs(60),
            },
        }
    }

    pub fn with_clients(mut self, clients: Vec<&str>) -> Self {
        self.clients = clients.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_two_clients(self) -> Self {
        self.with_clients(vec!["a", "b"])
    }

    pub fn with_outbound_capacity(mut self, capacity: usize) -> Self {
        self.config.outbound_capacity = capacity;
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.config.read_timeout = read_timeout;
        self
    }

    pub async fn build(self) -> TestSetup {
        let directory = Arc::new(StubDirectory::new());
        directory.add_live_room(ROOM);

        let mut setup = TestSetup {
            hub: RoomHub::new(self.config),
            directory,
            peers: HashMap::new(),
            connections: HashMap::new(),
        };

        for client in &self.clients {
            setup.connect(client).await;
        }

        setup
    }
}
