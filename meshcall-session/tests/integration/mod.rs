pub mod signaling_tests;

use std::sync::Arc;
use std::time::Duration;

use meshcall_core::PeerId;
use meshcall_session::{
    MediaConfig, NegotiationState, SampleDevices, SessionBuilder, SessionConfig, SessionEvents,
    SessionHandle,
};
use tracing::Level;

use crate::utils::{HubConnector, MockTransportFactory, ScriptedConnector, wait_for_snapshot};

pub const ROOM: &str = "r1";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn test_config() -> SessionConfig {
    SessionConfig {
        ice_servers: Vec::new(),
        handshake_timeout: Duration::from_secs(2),
        ..Default::default()
    }
}

/// One joined participant with its own mock transports.
pub struct TestPeer {
    pub name: String,
    pub handle: SessionHandle,
    pub events: SessionEvents,
    pub transports: MockTransportFactory,
}

impl TestPeer {
    pub fn peer_id(&self) -> PeerId {
        self.handle.local_peer_id().clone()
    }

    /// Waits until this peer holds exactly `count` connected links.
    pub async fn wait_connected(&self, count: usize) -> anyhow::Result<()> {
        wait_for_snapshot(&self.handle, |snapshot| {
            snapshot.links.len() == count
                && snapshot
                    .links
                    .iter()
                    .all(|link| link.state == NegotiationState::Connected)
        })
        .await?;
        Ok(())
    }
}

pub async fn join_with(
    connector: &HubConnector,
    name: &str,
    media: MediaConfig,
    transports: MockTransportFactory,
) -> anyhow::Result<TestPeer> {
    let (handle, events) = SessionBuilder::new(Arc::new(connector.clone()))
        .config(test_config())
        .devices(Arc::new(SampleDevices::new(media)))
        .transports(Arc::new(transports.clone()))
        .join(ROOM, &format!("user-{name}"), name)
        .await?;

    Ok(TestPeer {
        name: name.to_owned(),
        handle,
        events,
        transports,
    })
}

pub async fn join(connector: &HubConnector, name: &str) -> TestPeer {
    join_with(
        connector,
        name,
        MediaConfig::default(),
        MockTransportFactory::new(),
    )
    .await
    .unwrap_or_else(|e| panic!("{name} failed to join: {e:#}"))
}

/// Joins `names` one after another, each only once the mesh so far is connected.
pub async fn join_mesh(connector: &HubConnector, names: &[&str]) -> Vec<TestPeer> {
    let mut peers: Vec<TestPeer> = Vec::new();

    for name in names {
        peers.push(join(connector, name).await);
        let expected = peers.len() - 1;
        for peer in &peers {
            peer.wait_connected(expected)
                .await
                .unwrap_or_else(|e| panic!("{} not connected: {e:#}", peer.name));
        }
    }

    peers
}

/// Joins through a hand-driven relay.
pub async fn join_scripted(
    connector: ScriptedConnector,
    transports: &MockTransportFactory,
) -> (SessionHandle, SessionEvents) {
    SessionBuilder::new(Arc::new(connector))
        .config(test_config())
        .transports(Arc::new(transports.clone()))
        .join(ROOM, "user-local", "Local")
        .await
        .unwrap_or_else(|e| panic!("scripted join failed: {e:#}"))
}
