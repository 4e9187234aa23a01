use serde_json::json;

use crate::integration::{create_test_hub, init_tracing};
use crate::utils::FakePeer;

#[tokio::test]
async fn test_sender_messages_fan_out_to_viewers_only() {
    init_tracing();

    let (hub, _task, _events) = create_test_hub();
    let mut sender = FakePeer::connect(&hub).await.unwrap();
    let mut other_sender = FakePeer::connect(&hub).await.unwrap();
    let mut v1 = FakePeer::connect(&hub).await.unwrap();
    let mut v2 = FakePeer::connect(&hub).await.unwrap();

    sender.join("r", "sender").await.unwrap();
    other_sender.join("r", "sender").await.unwrap();
    v1.join("r", "viewer").await.unwrap();
    v2.join("r", "viewer").await.unwrap();
    for peer in [&mut sender, &mut other_sender, &mut v1, &mut v2] {
        peer.drain().await.unwrap();
    }

    let candidate = json!({
        "type": "candidate",
        "candidate": {"candidate": "candidate:1 1 udp 2122260223 10.0.0.1 5000 typ host", "sdpMLineIndex": 0},
    });
    sender.send(candidate).await.unwrap();

    let expected = json!({
        "type": "candidate",
        "candidate": {"candidate": "candidate:1 1 udp 2122260223 10.0.0.1 5000 typ host", "sdpMLineIndex": 0},
        "from": sender.id.to_string(),
    });
    assert_eq!(v1.recv_json().await.unwrap(), expected);
    assert_eq!(v2.recv_json().await.unwrap(), expected);
    other_sender.expect_nothing().await.unwrap();
    sender.expect_nothing().await.unwrap();
}

#[tokio::test]
async fn test_viewer_messages_reach_every_sender_and_ignore_to() {
    init_tracing();

    let (hub, _task, _events) = create_test_hub();
    let mut s1 = FakePeer::connect(&hub).await.unwrap();
    let mut s2 = FakePeer::connect(&hub).await.unwrap();
    let mut viewer = FakePeer::connect(&hub).await.unwrap();
    let mut bystander = FakePeer::connect(&hub).await.unwrap();

    s1.join("r", "sender").await.unwrap();
    s2.join("r", "sender").await.unwrap();
    viewer.join("r", "viewer").await.unwrap();
    bystander.join("r", "viewer").await.unwrap();
    for peer in [&mut s1, &mut s2, &mut viewer, &mut bystander] {
        peer.drain().await.unwrap();
    }

    viewer
        .send(json!({"type": "need-offer", "to": s1.id.to_string()}))
        .await
        .unwrap();

    let expected = json!({"type": "need-offer", "to": s1.id.to_string(), "from": viewer.id.to_string()});
    assert_eq!(s1.recv_json().await.unwrap(), expected);
    assert_eq!(s2.recv_json().await.unwrap(), expected);
    bystander.expect_nothing().await.unwrap();
}

#[tokio::test]
async fn test_rooms_are_isolated() {
    init_tracing();

    let (hub, _task, _events) = create_test_hub();
    let mut red_sender = FakePeer::connect(&hub).await.unwrap();
    let mut blue_viewer = FakePeer::connect(&hub).await.unwrap();

    red_sender.join("red", "sender").await.unwrap();
    blue_viewer.join("blue", "viewer").await.unwrap();

    red_sender
        .send(json!({"type": "offer", "sdp": "X"}))
        .await
        .unwrap();

    blue_viewer.expect_nothing().await.unwrap();
    red_sender.expect_nothing().await.unwrap();
}

#[tokio::test]
async fn test_messages_from_one_peer_arrive_in_order() {
    init_tracing();

    let (hub, _task, _events) = create_test_hub();
    let mut sender = FakePeer::connect(&hub).await.unwrap();
    let mut viewer = FakePeer::connect(&hub).await.unwrap();
    sender.join("r", "sender").await.unwrap();
    viewer.join("r", "viewer").await.unwrap();
    sender.drain().await.unwrap();
    viewer.drain().await.unwrap();

    for seq in 0..50 {
        sender
            .send(json!({"type": "candidate", "seq": seq}))
            .await
            .unwrap();
    }

    for seq in 0..50 {
        assert_eq!(viewer.recv_json().await.unwrap()["seq"], seq);
    }
}
