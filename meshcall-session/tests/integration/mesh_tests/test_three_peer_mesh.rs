use meshcall_session::NegotiationRole;

use crate::integration::{init_tracing, join_mesh};
use crate::utils::HubConnector;

#[tokio::test]
async fn test_three_sequential_joins_form_complete_graph() {
    init_tracing();

    let connector = HubConnector::default();
    let peers = join_mesh(&connector, &["Ann", "Bob", "Cid"]).await;
    let ids: Vec<_> = peers.iter().map(|p| p.peer_id()).collect();

    for (i, peer) in peers.iter().enumerate() {
        let snapshot = peer.handle.snapshot().await.unwrap();
        assert_eq!(snapshot.links.len(), 2, "{} should hold 2 links", peer.name);
        assert_eq!(snapshot.participants.len(), 2);

        for (j, other) in ids.iter().enumerate() {
            if i == j {
                continue;
            }
            let link = snapshot
                .link(other)
                .unwrap_or_else(|| panic!("{} has no link to peer #{j}", peer.name));

            // Whoever joined later initiated.
            let expected = if i > j {
                NegotiationRole::Offerer
            } else {
                NegotiationRole::Answerer
            };
            assert_eq!(link.role, expected, "{} -> peer #{j}", peer.name);
            assert_eq!(link.remote_tracks.len(), 2);
        }
    }

    // Exactly one offer per pair, always from the later joiner.
    for i in 0..ids.len() {
        for j in 0..ids.len() {
            if i == j {
                continue;
            }
            let expected = usize::from(i > j);
            assert_eq!(connector.offers(&ids[i], &ids[j]).await, expected);
        }
    }

    // Every transport that was ever opened is still in use.
    for peer in &peers {
        let records = peer.transports.records().await;
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| !r.closed));
    }
}
