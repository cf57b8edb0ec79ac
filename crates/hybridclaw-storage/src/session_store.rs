//! [`SessionStore`] backed by the `messages`/`sessions` tables.

use async_trait::async_trait;
use hybridclaw_compaction::{CompactionError, CompactionResult, Message, SessionStore};

use crate::store::Store;

fn to_read_error(e: crate::error::StorageError) -> CompactionError {
    CompactionError::Read(e.to_string())
}

fn to_commit_error(e: crate::error::StorageError) -> CompactionError {
    CompactionError::Commit(e.to_string())
}

#[async_trait]
impl SessionStore for Store {
    async fn message_count(&self, session_id: &str) -> CompactionResult<usize> {
        let session = self.get_session(session_id).await.map_err(to_read_error)?;
        Ok(session.message_count as usize)
    }

    async fn fetch_older_messages(
        &self,
        session_id: &str,
        keep_recent: usize,
    ) -> CompactionResult<(i64, Vec<Message>)> {
        let (cutoff_id, older) = self
            .compaction_candidate_messages(session_id, keep_recent)
            .await
            .map_err(to_read_error)?;
        let messages = older
            .into_iter()
            .map(|m| Message { id: m.id, role: m.role, content: m.content })
            .collect();
        Ok((cutoff_id, messages))
    }

    async fn existing_summary(&self, session_id: &str) -> CompactionResult<Option<String>> {
        let session = self.get_session(session_id).await.map_err(to_read_error)?;
        Ok(session.session_summary)
    }

    async fn commit_summary(&self, session_id: &str, cutoff_id: i64, summary: &str) -> CompactionResult<()> {
        self.delete_messages_before_id(session_id, cutoff_id).await.map_err(to_commit_error)?;
        self.commit_session_summary(session_id, summary).await.map_err(to_commit_error)?;
        Ok(())
    }
}
