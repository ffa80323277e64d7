use std::time::Duration;

mod utils;

use utils::*;

const WAIT: Duration = Duration::from_secs(1);
const QUIET: Duration = Duration::from_millis(150);

#[tokio::test]
async fn test_relay_survives_peer_failure_and_live_sweep() {
    let mut setup = TestSetupBuilder::new().with_two_clients().build().await;

    setup.peer("a").send_binary(&[0x01, 0x02]);
    assert_eq!(setup.peer("b").next_payload(WAIT).await, Some(vec![0x01, 0x02]));
    assert_eq!(setup.peer("a").next_payload(QUIET).await, None); // no echo

    setup.peer("a").fail();
    wait_for_members(&setup.hub, ROOM, Some(vec!["b"])).await;

    // The room is still live, so the sweep leaves b connected
    assert!(setup.sweep().await.is_empty());
    assert_eq!(setup.hub.members(ROOM).await, Some(vec!["b".to_string()]));

    // b is alone; its message reaches nobody and it stays connected
    setup.peer("b").send_binary(&[0x03]);
    assert_eq!(setup.peer("b").next_payload(QUIET).await, None);
    assert_eq!(setup.hub.members(ROOM).await, Some(vec!["b".to_string()]));
    assert!(!setup.connections["b"].is_closed());
}

#[tokio::test]
async fn test_messages_arrive_in_sender_order() {
    let mut setup = TestSetupBuilder::new()
        .with_clients(vec!["a", "b", "c"])
        .build()
        .await;

    for i in 0..20u8 {
        setup.peer("a").send_binary(&[i]);
    }

    for receiver in ["b", "c"] {
        for i in 0..20u8 {
            assert_eq!(
                setup.peer(receiver).next_payload(WAIT).await,
                Some(vec![i]),
                "{receiver} got messages out of order"
            );
        }
    }
}

#[tokio::test]
async fn test_heartbeat_text_is_not_relayed() {
    let mut setup = TestSetupBuilder::new().with_two_clients().build().await;

    setup.peer("a").send_text("ping");
    setup.peer("a").send_text("hello");

    assert_eq!(setup.peer("b").next_payload(WAIT).await, Some(b"hello".to_vec()));
    assert_eq!(setup.peer("b").next_payload(QUIET).await, None);
}

#[tokio::test]
async fn test_slow_consumer_is_evicted_without_affecting_siblings() {
    let mut setup = TestSetupBuilder::new()
        .with_outbound_capacity(4)
        .with_two_clients()
        .build()
        .await;
    let _stalled = setup.connect_stalled("c").await;

    for i in 0..8u8 {
        setup.peer("a").send_binary(&[i]);
        assert_eq!(setup.peer("b").next_payload(WAIT).await, Some(vec![i]));
    }

    wait_for_members(&setup.hub, ROOM, Some(vec!["a", "b"])).await;
    assert!(setup.connections["c"].is_transport_closed());
}

#[tokio::test]
async fn test_sweep_disconnects_ended_room() {
    let mut setup = TestSetupBuilder::new().with_two_clients().build().await;

    setup.directory.end_room(ROOM);
    assert_eq!(setup.sweep().await, vec![ROOM.to_string()]);

    assert!(setup.peer("a").wait_for_close(WAIT).await);
    assert!(setup.peer("b").wait_for_close(WAIT).await);
    assert!(setup.connections["a"].is_transport_closed());

    // Late teardowns from the loops must not bring the room back
    tokio::time::sleep(QUIET).await;
    assert_eq!(setup.hub.members(ROOM).await, None);
    assert_eq!(setup.hub.room_count().await, 0);
}

#[tokio::test]
async fn test_sweep_disconnects_expired_room() {
    let mut setup = TestSetupBuilder::new().with_two_clients().build().await;

    setup.directory.expire_room(ROOM);

    assert_eq!(setup.sweep().await, vec![ROOM.to_string()]);
    assert!(setup.peer("a").wait_for_close(WAIT).await);
}

#[tokio::test]
async fn test_sweep_treats_directory_failure_as_gone() {
    let mut setup = TestSetupBuilder::new().with_two_clients().build().await;

    setup.directory.fail_lookups();

    assert_eq!(setup.sweep().await, vec![ROOM.to_string()]);
    assert!(setup.peer("b").wait_for_close(WAIT).await);
}

#[tokio::test]
async fn test_reconnect_replaces_previous_connection() {
    let mut setup = TestSetupBuilder::new().with_two_clients().build().await;
    let mut old_b = setup.peers.remove("b").expect("b is connected");
    let old_connection = setup.connections["b"].clone();

    let new_connection = setup.connect("b").await;
    assert_ne!(old_connection.id(), new_connection.id());

    assert!(old_b.wait_for_close(WAIT).await);
    assert!(old_connection.is_closed());

    setup.peer("a").send_binary(&[0x07]);
    assert_eq!(setup.peer("b").next_payload(WAIT).await, Some(vec![0x07]));
    assert_eq!(
        setup.hub.members(ROOM).await,
        Some(vec!["a".to_string(), "b".to_string()])
    );
}

#[tokio::test]
async fn test_silent_client_is_dropped_after_read_timeout() {
    let setup = TestSetupBuilder::new()
        .with_read_timeout(Duration::from_millis(200))
        .with_clients(vec!["a"])
        .build()
        .await;

    wait_for_members(&setup.hub, ROOM, None).await;
    assert!(setup.connections["a"].is_closed());
}
