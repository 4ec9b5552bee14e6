use crate::integration::{init_tracing, start_test_server};
use crate::utils::TestClient;
use clipshare_core::{
    ClientMessage, ErrorReason, JoinStatus, Reply, RoomId, ServerMessage, SignalEnvelope,
};

#[tokio::test]
async fn test_full_session_over_websocket() {
    init_tracing();
    let addr = start_test_server().await;

    let mut host = TestClient::connect(addr).await.unwrap();
    let mut guest = TestClient::connect(addr).await.unwrap();
    assert_ne!(host.peer_id, guest.peer_id);
    assert!(!host.ice_servers.is_empty());

    assert_eq!(host.create_room("AB12CD").await.unwrap(), Reply::Created);
    assert_eq!(
        guest.join_room("AB12CD").await.unwrap(),
        Reply::Join {
            status: JoinStatus::Pending
        }
    );

    assert_eq!(
        host.recv().await.unwrap(),
        ServerMessage::UserRequestingJoin {
            room_id: RoomId::from("AB12CD"),
            requester_id: guest.peer_id,
        }
    );
    host.send(&ClientMessage::HostResponse {
        room_id: RoomId::from("AB12CD"),
        requester_id: guest.peer_id,
        approved: true,
    })
    .await
    .unwrap();
    assert_eq!(
        guest.recv().await.unwrap(),
        ServerMessage::JoinApproved {
            room_id: RoomId::from("AB12CD"),
            host_id: host.peer_id,
        }
    );

    guest
        .send(&ClientMessage::Signal {
            target_id: host.peer_id,
            envelope: SignalEnvelope::offer("v=0 offer"),
            room_id: Some(RoomId::from("AB12CD")),
        })
        .await
        .unwrap();
    assert_eq!(
        host.recv().await.unwrap(),
        ServerMessage::Signal {
            sender_id: guest.peer_id,
            envelope: SignalEnvelope::offer("v=0 offer"),
        }
    );

    host.close().await.unwrap();
    assert_eq!(
        guest.recv().await.unwrap(),
        ServerMessage::RoomClosed {
            room_id: RoomId::from("AB12CD")
        }
    );
    assert!(guest.try_recv().await.is_none());
}

#[tokio::test]
async fn test_malformed_frame_gets_error_reply() {
    init_tracing();
    let addr = start_test_server().await;
    let mut client = TestClient::connect(addr).await.unwrap();

    client.send_raw("{\"op\":\"no-such-op\"}").await.unwrap();
    assert_eq!(
        client.recv().await.unwrap(),
        ServerMessage::Error {
            reason: ErrorReason::Malformed
        }
    );

    // The connection survives a bad frame.
    assert_eq!(client.create_room("STILL").await.unwrap(), Reply::Created);
}
