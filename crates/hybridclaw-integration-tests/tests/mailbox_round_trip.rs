//! Drives `HostMailbox` and `ContainerMailbox` against the same
//! `mailboxes/<safeSessionId>/` directory, the way the host process and its
//! sandboxed container actually communicate: a subsequent-turn request
//! written to `input.json`, picked up by the container side, and a reply
//! written back to `output.json`, picked up by the host side.

use std::time::Duration;

use hybridclaw_core::{HybridclawHome, Role, SessionId, safe_id};
use hybridclaw_mailbox::{ContainerMailbox, HostMailbox, SideEffects, TurnRequest, TurnResponse, TurnStatus, WireMessage};

fn sample_request(session_id: &SessionId) -> TurnRequest {
    TurnRequest {
        session_id: session_id.clone(),
        messages: vec![WireMessage {
            role: Role::User,
            content: "what's on my schedule today?".to_owned(),
        }],
        bot_id: "default".to_owned(),
        enable_rag: false,
        base_url: "https://api.example/v1".to_owned(),
        model: "gpt-4o-mini".to_owned(),
        api_key: "sk-should-not-survive".to_owned(),
        channel_id: "chan".to_owned(),
        scheduled_tasks: Vec::new(),
        allowed_tools: None,
    }
}

#[tokio::test]
async fn a_subsequent_turn_request_and_its_reply_round_trip_through_the_same_directory() {
    let dir = tempfile::tempdir().unwrap();
    let home = HybridclawHome::from_path(dir.path());
    let session_id = SessionId::from("s1");

    let host = HostMailbox::open(&home, &session_id).await.unwrap();
    let mailbox_dir = home.mailboxes_dir().join(safe_id(session_id.as_str()));
    let container = ContainerMailbox::new(mailbox_dir);

    host.send_subsequent_turn(&sample_request(&session_id)).await.unwrap();

    let received = container.poll_next_turn().await.unwrap();
    assert_eq!(received.channel_id, "chan");
    // The host never puts a live API key on disk for a subsequent turn.
    assert_eq!(received.api_key, "");

    container
        .send_reply(&TurnResponse::success("you have a 2pm standup"))
        .await
        .unwrap();

    let reply = host.await_reply(Duration::from_secs(1)).await.unwrap();
    assert_eq!(reply.status, TurnStatus::Success);
    assert_eq!(reply.result.as_deref(), Some("you have a 2pm standup"));
}

#[tokio::test]
async fn an_error_reply_carries_its_message_back_to_the_host() {
    let dir = tempfile::tempdir().unwrap();
    let home = HybridclawHome::from_path(dir.path());
    let session_id = SessionId::from("s2");

    let host = HostMailbox::open(&home, &session_id).await.unwrap();
    let mailbox_dir = home.mailboxes_dir().join(safe_id(session_id.as_str()));
    let container = ContainerMailbox::new(mailbox_dir);

    host.send_subsequent_turn(&sample_request(&session_id)).await.unwrap();
    container.poll_next_turn().await.unwrap();

    container
        .send_reply(&TurnResponse::error("tool execution timed out"))
        .await
        .unwrap();

    let reply = host.await_reply(Duration::from_secs(1)).await.unwrap();
    assert_eq!(reply.status, TurnStatus::Error);
    assert_eq!(reply.error.as_deref(), Some("tool execution timed out"));
    let _: Option<SideEffects> = reply.side_effects;
}
