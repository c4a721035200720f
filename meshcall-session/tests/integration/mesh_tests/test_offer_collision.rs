use meshcall_core::{NegotiationPayload, PeerId, SignalMessage};
use meshcall_session::{NegotiationRole, NegotiationState, SessionHandle};

use crate::integration::{init_tracing, join_scripted};
use crate::utils::{
    MockTransportFactory, ScriptedRelay, participant, scripted_relay, wait_for_snapshot,
    wait_until,
};

/// Joins as `local` into a room holding `remote`, waits for our offer, then
/// delivers a crossing offer from `remote`.
async fn crossing_offers(
    local: &str,
    remote: &str,
) -> (SessionHandle, ScriptedRelay, MockTransportFactory) {
    let transports = MockTransportFactory::new();
    let (connector, mut relay) = scripted_relay(local, vec![participant(remote)]);
    let (handle, _events) = join_scripted(connector, &transports).await;

    relay
        .expect(|m| matches!(m, SignalMessage::Offer { .. }))
        .await
        .unwrap();
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(
        snapshot.link(&PeerId::from(remote)).unwrap().state,
        NegotiationState::Negotiating
    );

    relay.send(SignalMessage::negotiation(
        PeerId::from(remote),
        relay.local_peer_id.clone(),
        NegotiationPayload::Offer("v=0 crossing".into()),
    ));

    (handle, relay, transports)
}

#[tokio::test]
async fn test_larger_peer_id_keeps_its_offer() {
    init_tracing();

    let remote = PeerId::from("peer-a");
    let (handle, mut relay, transports) = crossing_offers("peer-b", "peer-a").await;

    // The marker is handled after the crossing offer
    relay.send(SignalMessage::peer_joined(participant("marker")));
    let snapshot = wait_for_snapshot(&handle, |s| {
        s.participants.iter().any(|p| p.peer_id == PeerId::from("marker"))
    })
    .await
    .unwrap();

    let link = snapshot.link(&remote).unwrap();
    assert_eq!(link.role, NegotiationRole::Offerer);
    assert_eq!(link.state, NegotiationState::Negotiating);
    assert!(
        relay
            .drain()
            .iter()
            .all(|m| !matches!(m, SignalMessage::Answer { .. }))
    );

    let records = transports.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].answers, 0);
    assert!(!records[0].closed);

    // Our offer still completes
    relay.send(SignalMessage::negotiation(
        remote.clone(),
        relay.local_peer_id.clone(),
        NegotiationPayload::Answer("v=0 answer".into()),
    ));
    wait_for_snapshot(&handle, |s| {
        s.link(&remote)
            .is_some_and(|l| l.state == NegotiationState::Connected)
    })
    .await
    .unwrap();

    handle.leave().await.unwrap();
}

#[tokio::test]
async fn test_smaller_peer_id_yields_and_answers() {
    init_tracing();

    let remote = PeerId::from("peer-b");
    let (handle, mut relay, transports) = crossing_offers("peer-a", "peer-b").await;

    let answer = relay
        .expect(|m| matches!(m, SignalMessage::Answer { .. }))
        .await
        .unwrap();
    assert!(matches!(answer, SignalMessage::Answer { to, .. } if to == remote));

    let snapshot = wait_for_snapshot(&handle, |s| {
        s.link(&remote)
            .is_some_and(|l| l.state == NegotiationState::Connected)
    })
    .await
    .unwrap();
    assert_eq!(snapshot.links.len(), 1);
    assert_eq!(snapshot.link(&remote).unwrap().role, NegotiationRole::Answerer);

    // The abandoned offerer transport is released
    let records = transports.clone();
    wait_until(move || {
        let records = records.clone();
        async move {
            let records = records.records().await;
            records.len() == 2
                && records[0].closed
                && records[0].offers == 1
                && !records[1].closed
                && records[1].answers == 1
        }
    })
    .await
    .unwrap();

    handle.leave().await.unwrap();
}
