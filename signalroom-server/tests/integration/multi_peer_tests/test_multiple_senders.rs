use serde_json::json;
use signalroom_server::transport::Outbound;

use crate::integration::{create_test_hub, init_tracing};
use crate::utils::FakePeer;

#[tokio::test]
async fn test_viewer_joining_two_senders_gets_one_announcement() {
    init_tracing();

    let (hub, _task, _events) = create_test_hub();
    let mut s1 = FakePeer::connect(&hub).await.unwrap();
    let mut s2 = FakePeer::connect(&hub).await.unwrap();
    let mut viewer = FakePeer::connect(&hub).await.unwrap();

    s1.join("r", "sender").await.unwrap();
    s2.join("r", "sender").await.unwrap();
    viewer.join("r", "viewer").await.unwrap();

    assert_eq!(
        viewer.drain().await.unwrap(),
        vec![Outbound::Text(r#"{"type":"sender-available"}"#.into())]
    );
    let need_offer = json!({"type": "need-offer", "from": viewer.id.to_string()});
    assert_eq!(s1.recv_json().await.unwrap(), need_offer);
    assert_eq!(s2.recv_json().await.unwrap(), need_offer);
}

#[tokio::test]
async fn test_late_sender_announces_to_every_waiting_viewer() {
    init_tracing();

    let (hub, _task, _events) = create_test_hub();
    let mut viewers = Vec::new();
    for _ in 0..5 {
        let viewer = FakePeer::connect(&hub).await.unwrap();
        viewer.join("late", "viewer").await.unwrap();
        viewers.push(viewer);
    }
    for viewer in &mut viewers {
        viewer.expect_nothing().await.unwrap();
    }

    let mut sender = FakePeer::connect(&hub).await.unwrap();
    sender.join("late", "sender").await.unwrap();

    for viewer in &mut viewers {
        assert_eq!(
            viewer.recv_json().await.unwrap(),
            json!({"type": "sender-available"})
        );
    }
    // Viewers must ask; the sender is not told about them up front.
    sender.expect_nothing().await.unwrap();

    let snapshot = hub.snapshot().await.unwrap();
    let room = snapshot.room("late").unwrap();
    assert_eq!(room.senders, vec![sender.id]);
    assert_eq!(room.viewers.len(), 5);
}
