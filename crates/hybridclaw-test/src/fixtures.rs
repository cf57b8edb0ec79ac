//! Fixture builders for storage- and filesystem-backed tests.

use hybridclaw_core::HybridclawHome;
use hybridclaw_storage::{NewMessage, NewSession, Store};
use tempfile::TempDir;

/// A freshly created `HybridclawHome` rooted at a temp directory, with its
/// subdirectories already created. Keep the `TempDir` alive for as long as
/// `HybridclawHome` is in use; dropping it removes the directory.
#[must_use]
pub fn temp_home() -> (TempDir, HybridclawHome) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let home = HybridclawHome::from_path(dir.path());
    (dir, home)
}

/// An in-memory [`Store`] with one session and `message_count` alternating
/// user/assistant messages already inserted.
///
/// # Panics
///
/// Panics if the store cannot be opened or seeded; fixtures are expected to
/// always succeed.
pub async fn seeded_store(session_id: &str, message_count: usize) -> Store {
    let store = Store::open_in_memory().expect("open in-memory store");
    store
        .create_session(NewSession {
            id: session_id.to_owned(),
            guild_id: None,
            channel_id: "c1".to_owned(),
            bot_id: "bot".to_owned(),
        })
        .await
        .expect("create session");

    for i in 0..message_count {
        let role = if i % 2 == 0 { "user" } else { "assistant" };
        store
            .insert_message(NewMessage {
                session_id: session_id.to_owned(),
                user_id: "u1".to_owned(),
                username: None,
                role: role.to_owned(),
                content: format!("message {i}"),
            })
            .await
            .expect("insert message");
    }

    store
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_home_creates_a_home_rooted_at_the_temp_dir() {
        let (dir, home) = temp_home();
        assert_eq!(home.db_path().parent().unwrap(), dir.path());
    }

    #[tokio::test]
    async fn seeded_store_alternates_roles() {
        let store = seeded_store("s1", 4).await;
        let messages = store.list_messages("s1").await.unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[1].role, "assistant");
    }
}
