use meshcall_core::RoomId;
use meshcall_session::SessionEvent;

use crate::integration::{ROOM, init_tracing, join_mesh};
use crate::utils::{HubConnector, wait_for_event, wait_for_snapshot, wait_until};

#[tokio::test]
async fn test_peer_left_removes_link_and_stream() {
    init_tracing();

    let connector = HubConnector::default();
    let mut peers = join_mesh(&connector, &["Ann", "Bob", "Cid"]).await;
    let cid = peers.pop().unwrap();
    let cid_id = cid.peer_id();
    let ann = &mut peers[0];

    cid.handle.leave().await.unwrap();

    let left = wait_for_event(&mut ann.events, |e| {
        matches!(e, SessionEvent::ParticipantLeft(_))
    })
    .await
    .unwrap();
    assert!(matches!(left, SessionEvent::ParticipantLeft(id) if id == cid_id));

    let snapshot = wait_for_snapshot(&ann.handle, |s| s.links.len() == 1)
        .await
        .unwrap();
    assert!(snapshot.link(&cid_id).is_none());
    assert!(snapshot.participants.iter().all(|p| p.peer_id != cid_id));
    assert_eq!(connector.hub().room_members(&RoomId::from(ROOM)).len(), 2);

    // Ann's transport toward Cid was released, the one toward Bob was not.
    let transports = ann.transports.clone();
    let cid_for_check = cid_id.clone();
    wait_until(move || {
        let transports = transports.clone();
        let cid_id = cid_for_check.clone();
        async move {
            transports
                .records()
                .await
                .iter()
                .all(|r| r.closed == (r.peer_id == cid_id))
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_remote_stream_removed_on_peer_left() {
    init_tracing();

    let connector = HubConnector::default();
    let mut peers = join_mesh(&connector, &["Ann", "Bob"]).await;
    let bob = peers.pop().unwrap();
    let bob_id = bob.peer_id();
    let ann = &mut peers[0];

    let snapshot = ann.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.link(&bob_id).unwrap().remote_tracks.len(), 2);

    bob.handle.leave().await.unwrap();

    let removed = wait_for_event(&mut ann.events, |e| {
        matches!(e, SessionEvent::RemoteStreamRemoved(_))
    })
    .await
    .unwrap();
    assert!(matches!(removed, SessionEvent::RemoteStreamRemoved(id) if id == bob_id));
    assert!(ann.handle.snapshot().await.unwrap().links.is_empty());
}
