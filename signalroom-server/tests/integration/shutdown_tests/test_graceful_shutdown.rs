use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

use signalroom_server::lifecycle::SessionStatus;

use crate::integration::{TestServer, init_tracing};
use crate::utils::{TestClient, wait_for_room};

#[tokio::test]
async fn test_shutdown_closes_sockets_and_flushes_sinks() {
    init_tracing();

    let server = TestServer::start().await;
    let hub = server.hub.clone();
    let journal = server.journal.clone();

    let mut sender = TestClient::connect(server.addr).await.unwrap();
    let mut viewer = TestClient::connect(server.addr).await.unwrap();
    sender.join("r", "sender").await.unwrap();
    wait_for_room(&hub, "r", 1, 0).await.unwrap();
    viewer.join("r", "viewer").await.unwrap();
    viewer.recv_json().await.unwrap();
    sender.recv_json().await.unwrap();

    let sender_closed = tokio::spawn(async move { sender.recv_close().await });
    let viewer_closed = tokio::spawn(async move { viewer.recv_close().await });

    timeout(Duration::from_secs(5), server.stop())
        .await
        .expect("shutdown took too long")
        .unwrap();

    for closed in [sender_closed, viewer_closed] {
        let frame = closed.await.unwrap().unwrap().expect("expected a close frame");
        assert_eq!(frame.code, CloseCode::Away);
    }

    // Sinks have seen every disconnect by the time the server returns.
    let stats = journal.overall_stats();
    assert_eq!(stats.total_sessions, 2);
    assert_eq!(stats.active_sessions, 0);
    assert!(
        journal
            .recent_sessions(10)
            .iter()
            .all(|s| s.status == SessionStatus::Disconnected)
    );

    assert!(hub.snapshot().await.is_err());
}

#[tokio::test]
async fn test_idle_server_stops_promptly() {
    init_tracing();

    let server = TestServer::start().await;
    let addr = server.addr;

    timeout(Duration::from_secs(5), server.stop())
        .await
        .expect("shutdown took too long")
        .unwrap();

    assert!(TestClient::connect(addr).await.is_err());
}
