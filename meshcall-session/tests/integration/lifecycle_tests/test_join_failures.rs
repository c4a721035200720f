use std::sync::Arc;

use meshcall_session::{
    DeviceAccess, MediaConfig, MediaError, NegotiationState, SampleDevices, SessionBuilder,
    SessionConfig, SessionError, SignalingError,
};

use crate::integration::{ROOM, init_tracing, join, test_config};
use crate::utils::{HubConnector, MockTransportFactory, UnreachableConnector, wait_for_snapshot};

#[tokio::test]
async fn test_denied_camera_aborts_join_before_signaling() {
    init_tracing();

    let connector = HubConnector::default();
    let result = SessionBuilder::new(Arc::new(connector.clone()))
        .config(test_config())
        .devices(Arc::new(SampleDevices::new(MediaConfig {
            camera: DeviceAccess::Denied,
            ..Default::default()
        })))
        .transports(Arc::new(MockTransportFactory::new()))
        .join(ROOM, "user-ann", "Ann")
        .await;

    assert!(matches!(
        result,
        Err(SessionError::MediaAccessDenied(MediaError::PermissionDenied("camera")))
    ));
    assert_eq!(connector.hub().peer_count(), 0, "relay must never be contacted");
}

#[tokio::test]
async fn test_missing_microphone_aborts_join() {
    init_tracing();

    let result = SessionBuilder::new(Arc::new(HubConnector::default()))
        .config(test_config())
        .devices(Arc::new(SampleDevices::new(MediaConfig {
            microphone: DeviceAccess::Missing,
            ..Default::default()
        })))
        .join(ROOM, "user-ann", "Ann")
        .await;

    assert!(matches!(
        result,
        Err(SessionError::MediaAccessDenied(MediaError::DeviceNotFound("microphone")))
    ));
}

#[tokio::test]
async fn test_unreachable_relay_aborts_join() {
    init_tracing();

    let result = SessionBuilder::new(Arc::new(UnreachableConnector))
        .config(test_config())
        .transports(Arc::new(MockTransportFactory::new()))
        .join(ROOM, "user-ann", "Ann")
        .await;

    assert!(matches!(
        result,
        Err(SessionError::SignalingDisconnected(SignalingError::Connect(_)))
    ));
}

#[tokio::test]
async fn test_zero_transport_buffer_still_joins_and_connects() {
    init_tracing();

    let connector = HubConnector::default();
    let ann = join(&connector, "Ann").await;

    let (bob, _events) = SessionBuilder::new(Arc::new(connector.clone()))
        .config(SessionConfig {
            transport_event_buffer: 0,
            ..test_config()
        })
        .transports(Arc::new(MockTransportFactory::new()))
        .join(ROOM, "user-bob", "Bob")
        .await
        .unwrap();

    let snapshot = wait_for_snapshot(&bob, |s| {
        s.link(&ann.peer_id())
            .is_some_and(|l| l.state == NegotiationState::Connected)
    })
    .await
    .unwrap();
    assert_eq!(snapshot.links.len(), 1);

    bob.leave().await.unwrap();
    ann.handle.leave().await.unwrap();
}
