//! Session read/write seam compaction operates through, decoupled from
//! the concrete database so this crate never depends on it directly.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::CompactionResult;
use crate::types::Message;

/// Read and commit operations compaction needs from session storage.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Total messages currently stored for `session_id`.
    async fn message_count(&self, session_id: &str) -> CompactionResult<usize>;

    /// Messages older than the most recent `keep_recent`, oldest first,
    /// plus the id compaction would cut off at (the highest id among
    /// them). Empty when there's nothing older than `keep_recent`.
    async fn fetch_older_messages(
        &self,
        session_id: &str,
        keep_recent: usize,
    ) -> CompactionResult<(i64, Vec<Message>)>;

    /// The session's current stored summary, if any.
    async fn existing_summary(&self, session_id: &str) -> CompactionResult<Option<String>>;

    /// Delete messages with id `<= cutoff_id` and replace the stored
    /// summary with `summary`.
    async fn commit_summary(&self, session_id: &str, cutoff_id: i64, summary: &str) -> CompactionResult<()>;
}

#[derive(Default)]
struct SessionState {
    messages: Vec<Message>,
    summary: Option<String>,
}

/// In-memory [`SessionStore`] backing unit tests.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, SessionState>>,
}

impl InMemorySessionStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a session's message list for a test.
    pub fn seed(&self, session_id: &str, messages: Vec<Message>) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.entry(session_id.to_owned()).or_default().messages = messages;
    }

    /// Read back a session's current summary, for test assertions.
    #[must_use]
    pub fn summary(&self, session_id: &str) -> Option<String> {
        self.sessions.lock().unwrap().get(session_id).and_then(|s| s.summary.clone())
    }

    /// Read back a session's remaining messages, for test assertions.
    #[must_use]
    pub fn remaining_messages(&self, session_id: &str) -> Vec<Message> {
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .map(|s| s.messages.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn message_count(&self, session_id: &str) -> CompactionResult<usize> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .get(session_id)
            .map_or(0, |s| s.messages.len()))
    }

    async fn fetch_older_messages(
        &self,
        session_id: &str,
        keep_recent: usize,
    ) -> CompactionResult<(i64, Vec<Message>)> {
        let sessions = self.sessions.lock().unwrap();
        let Some(state) = sessions.get(session_id) else {
            return Ok((0, Vec::new()));
        };
        let older_count = state.messages.len().saturating_sub(keep_recent);
        let older = state.messages[..older_count].to_vec();
        let cutoff_id = older.last().map_or(0, |m| m.id);
        Ok((cutoff_id, older))
    }

    async fn existing_summary(&self, session_id: &str) -> CompactionResult<Option<String>> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .get(session_id)
            .and_then(|s| s.summary.clone()))
    }

    async fn commit_summary(&self, session_id: &str, cutoff_id: i64, summary: &str) -> CompactionResult<()> {
        let mut sessions = self.sessions.lock().unwrap();
        let state = sessions.entry(session_id.to_owned()).or_default();
        state.messages.retain(|m| m.id > cutoff_id);
        state.summary = Some(summary.to_owned());
        Ok(())
    }
}
