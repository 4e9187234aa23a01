use serde_json::json;
use std::time::Duration;

use crate::integration::{TestServer, init_tracing};
use crate::utils::{TestClient, wait_for_room};

#[tokio::test]
async fn test_socket_that_never_reads_is_dropped() {
    init_tracing();

    let server = TestServer::start_with_heartbeat(Duration::from_millis(200)).await;
    let mut sender = TestClient::connect(server.addr).await.unwrap();
    let mut viewer = TestClient::connect(server.addr).await.unwrap();

    sender.join("r", "sender").await.unwrap();
    wait_for_room(&server.hub, "r", 1, 0).await.unwrap();
    viewer.join("r", "viewer").await.unwrap();
    assert_eq!(viewer.recv_json().await.unwrap()["type"], "sender-available");

    // The viewer keeps reading, so its pongs go out; the sender never reads
    // and so never answers a ping.
    assert_eq!(
        viewer.recv_json().await.unwrap(),
        json!({"type": "sender-gone"})
    );
    wait_for_room(&server.hub, "r", 0, 1).await.unwrap();

    // Dropped without a close handshake.
    assert!(sender.recv_close().await.unwrap().is_none());

    server.stop().await.unwrap();
}
