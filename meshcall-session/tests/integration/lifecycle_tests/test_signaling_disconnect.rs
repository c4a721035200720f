use std::time::Duration;

use meshcall_session::{NegotiationState, SessionEvent};

use crate::integration::{init_tracing, join_mesh};
use crate::utils::{HubConnector, wait_for_event};

#[tokio::test]
async fn test_relay_loss_is_reported_and_links_survive() {
    init_tracing();

    let connector = HubConnector::default();
    let mut peers = join_mesh(&connector, &["Ann", "Bob"]).await;
    let ann_id = peers[0].peer_id();
    let ann = &mut peers[0];

    // The relay drops Ann's connection
    connector.hub().detach(&ann_id);

    wait_for_event(&mut ann.events, |e| {
        matches!(e, SessionEvent::SignalingDisconnected)
    })
    .await
    .unwrap();

    let snapshot = ann.handle.snapshot().await.unwrap();
    assert!(!snapshot.signaling_connected);
    assert_eq!(snapshot.links.len(), 1);
    assert_eq!(snapshot.links[0].state, NegotiationState::Connected);

    // No reconnect is attempted
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!ann.handle.snapshot().await.unwrap().signaling_connected);
    assert_eq!(connector.hub().peer_count(), 1);
}
