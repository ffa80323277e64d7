use std::time::Duration;

use roomcast::RoomHub;

// ============================================================================
// Membership Assertions
// ============================================================================

/// Polls the hub until `room` has exactly `expected` members (None = room gone)
pub async fn wait_for_members(hub: &RoomHub, room: &str, expected: Option<Vec<&str>>) {
    let expected: Option<Vec<String>> =
        expected.map(|names| names.into_iter().map(str::to_string).collect());

    let reached = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if hub.members(room).await == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    assert!(
        reached.is_ok(),
        "room {room} never reached members {expected:?}, last seen {:?}",
        hub.members(room).await
    );
}
