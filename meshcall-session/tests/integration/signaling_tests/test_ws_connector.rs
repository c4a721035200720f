use std::sync::Arc;

use meshcall_core::IceServerConfig;
use meshcall_relay::{RelayHub, WS_PATH, serve_on};
use meshcall_session::{NegotiationState, SessionBuilder, SessionError, SignalingError, WsConnector};
use tokio::net::TcpListener;

use crate::integration::{ROOM, init_tracing, test_config};
use crate::utils::{MockTransportFactory, wait_for_snapshot};

#[tokio::test]
async fn test_sessions_connect_through_websocket_relay() {
    init_tracing();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve_on(
        listener,
        RelayHub::new(vec![IceServerConfig::stun("stun:stun.example.org:3478")]),
    ));
    let url = format!("ws://{addr}{WS_PATH}");

    let mut handles = Vec::new();
    for name in ["Ann", "Bob"] {
        let (handle, _events) = SessionBuilder::new(Arc::new(WsConnector::new(url.clone())))
            .config(test_config())
            .transports(Arc::new(MockTransportFactory::new()))
            .join(ROOM, &format!("user-{name}"), name)
            .await
            .unwrap_or_else(|e| panic!("{name} failed to join: {e:#}"));
        handles.push(handle);
    }

    for handle in &handles {
        let snapshot = wait_for_snapshot(handle, |s| {
            s.links.len() == 1 && s.links[0].state == NegotiationState::Connected
        })
        .await
        .unwrap();
        assert!(snapshot.signaling_connected);
    }

    for handle in handles {
        handle.leave().await.unwrap();
    }
}

#[tokio::test]
async fn test_refused_connection_is_a_signaling_error() {
    init_tracing();

    // Bind then drop to get a port nobody listens on
    let addr = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap()
        .local_addr()
        .unwrap();

    let result = SessionBuilder::new(Arc::new(WsConnector::new(format!("ws://{addr}/ws"))))
        .config(test_config())
        .transports(Arc::new(MockTransportFactory::new()))
        .join(ROOM, "user-ann", "Ann")
        .await;

    assert!(matches!(
        result,
        Err(SessionError::SignalingDisconnected(SignalingError::Connect(_)))
    ));
}
