use crate::integration::{init_tracing, start_test_hub};
use crate::utils::drain;
use clipshare_core::{ClipboardKind, PeerId, RoomId, ServerMessage};
use clipshare_server::HubCommand;

#[tokio::test]
async fn test_clipboard_reaches_other_members_only() {
    init_tracing();
    let mut t = start_test_hub();
    let host = PeerId::new();
    let guest = PeerId::new();
    let waiting = PeerId::new();

    t.create(host, "CLIP").await;
    t.join(guest, "CLIP").await;
    t.decide(host, "CLIP", guest, true).await;
    t.join(waiting, "CLIP").await;
    drain(&mut t.rx).await;

    t.hub
        .send(HubCommand::ClipboardUpdate {
            peer_id: guest,
            room_id: RoomId::from("CLIP"),
            content: "hello".to_string(),
            kind: ClipboardKind::Text,
        })
        .await
        .unwrap();

    let delivered = drain(&mut t.rx).await;
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].to, host);
    assert_eq!(
        delivered[0].message,
        ServerMessage::ClipboardUpdated {
            content: "hello".to_string(),
            kind: ClipboardKind::Text,
            sender_id: guest,
        }
    );
}
