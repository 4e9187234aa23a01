use serde_json::json;

use crate::integration::{TestServer, create_test_hub, init_tracing};
use crate::utils::{FakePeer, TestClient, wait_for_room};

#[tokio::test]
async fn test_viewers_hear_sender_gone_even_with_another_sender_left() {
    init_tracing();

    let (hub, _task, _events) = create_test_hub();
    let mut s1 = FakePeer::connect(&hub).await.unwrap();
    let mut s2 = FakePeer::connect(&hub).await.unwrap();
    let mut v1 = FakePeer::connect(&hub).await.unwrap();
    let mut v2 = FakePeer::connect(&hub).await.unwrap();
    for (peer, role) in [(&s1, "sender"), (&s2, "sender"), (&v1, "viewer"), (&v2, "viewer")] {
        peer.join("r", role).await.unwrap();
    }
    for peer in [&mut s1, &mut s2, &mut v1, &mut v2] {
        peer.drain().await.unwrap();
    }

    s1.disconnect().await.unwrap();

    assert_eq!(v1.recv_json().await.unwrap(), json!({"type": "sender-gone"}));
    assert_eq!(v2.recv_json().await.unwrap(), json!({"type": "sender-gone"}));
    s2.expect_nothing().await.unwrap();

    let snapshot = hub.snapshot().await.unwrap();
    assert_eq!(snapshot.room("r").unwrap().senders, vec![s2.id]);
}

#[tokio::test]
async fn test_departing_viewer_is_silent() {
    init_tracing();

    let (hub, _task, _events) = create_test_hub();
    let mut sender = FakePeer::connect(&hub).await.unwrap();
    let mut v1 = FakePeer::connect(&hub).await.unwrap();
    let v2 = FakePeer::connect(&hub).await.unwrap();
    sender.join("r", "sender").await.unwrap();
    v1.join("r", "viewer").await.unwrap();
    v2.join("r", "viewer").await.unwrap();
    sender.drain().await.unwrap();
    v1.drain().await.unwrap();

    v2.disconnect().await.unwrap();

    sender.expect_nothing().await.unwrap();
    v1.expect_nothing().await.unwrap();
}

#[tokio::test]
async fn test_sender_socket_closing_notifies_viewer_and_room_can_be_reused() {
    init_tracing();

    let server = TestServer::start().await;
    let mut sender = TestClient::connect(server.addr).await.unwrap();
    let mut viewer = TestClient::connect(server.addr).await.unwrap();

    sender.join("show", "sender").await.unwrap();
    wait_for_room(&server.hub, "show", 1, 0).await.unwrap();
    viewer.join("show", "viewer").await.unwrap();
    assert_eq!(viewer.recv_json().await.unwrap()["type"], "sender-available");

    sender.close().await.unwrap();
    assert_eq!(
        viewer.recv_json().await.unwrap(),
        json!({"type": "sender-gone"})
    );
    viewer.close().await.unwrap();
    wait_for_room(&server.hub, "show", 0, 0).await.unwrap();

    // Same room id again behaves like a brand-new room.
    let mut fresh = TestClient::connect(server.addr).await.unwrap();
    fresh.join("show", "viewer").await.unwrap();
    fresh.expect_silence().await.unwrap();
    wait_for_room(&server.hub, "show", 0, 1).await.unwrap();

    server.stop().await.unwrap();
}
