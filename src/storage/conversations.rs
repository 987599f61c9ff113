//! Conversation store — one mutable row per session, keyed by the
//! caller-supplied conversation id.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::conversation::{Conversation, ConversationState};
use crate::time_utils;
use crate::{HindsightError, HindsightResult};

pub struct ConversationStore;

// ── Row mapping ──

fn conversation_from_row(row: &Row) -> rusqlite::Result<Conversation> {
    let state_str: String = row.get("state")?;
    let updated_str: String = row.get("updated_at")?;
    Ok(Conversation {
        conversation_id: row.get("conversation_id")?,
        last_query: row.get("last_query")?,
        last_response: row.get("last_response")?,
        state: state_str.parse().unwrap_or(ConversationState::Initial),
        updated_at: time_utils::from_sqlite(&updated_str)
            .unwrap_or_else(|_| chrono::Utc::now()),
    })
}

// ── Operations ──

impl ConversationStore {
    pub fn get(conn: &Connection, conversation_id: &str) -> HindsightResult<Option<Conversation>> {
        let mut stmt = conn
            .prepare(
                "SELECT conversation_id, last_query, last_response, state, updated_at
                 FROM conversations WHERE conversation_id = ?1",
            )
            .map_err(|e| HindsightError::Storage(e.to_string()))?;

        let result = stmt
            .query_row(params![conversation_id], conversation_from_row)
            .optional()
            .map_err(|e| HindsightError::Storage(e.to_string()))?;

        Ok(result)
    }

    /// Fetch the conversation, creating it in state `initial` with no
    /// query/response when absent. The insert-if-absent is a single
    /// statement: two concurrent callers on the same new id cannot produce
    /// two rows. The returned bool is true when this call created the row.
    pub fn get_or_init(
        conn: &Connection,
        conversation_id: &str,
    ) -> HindsightResult<(Conversation, bool)> {
        let created = conn
            .execute(
                "INSERT INTO conversations (conversation_id, state, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(conversation_id) DO NOTHING",
                params![
                    conversation_id,
                    ConversationState::Initial.as_str(),
                    time_utils::to_sqlite(&time_utils::now()),
                ],
            )
            .map_err(|e| HindsightError::Storage(format!("Init conversation failed: {}", e)))?
            > 0;

        let conversation = Self::get(conn, conversation_id)?.ok_or_else(|| {
            HindsightError::Storage(format!(
                "Conversation {} missing right after init",
                conversation_id
            ))
        })?;

        if created {
            tracing::debug!(conversation_id = %conversation_id, "Conversation initialized");
        }
        Ok((conversation, created))
    }

    /// Replace the full row (insert when absent), refreshing updated_at.
    pub fn upsert(
        conn: &Connection,
        conversation_id: &str,
        last_query: Option<&str>,
        last_response: Option<&str>,
        state: ConversationState,
    ) -> HindsightResult<()> {
        conn.execute(
            "INSERT OR REPLACE INTO conversations
             (conversation_id, last_query, last_response, state, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                conversation_id,
                last_query,
                last_response,
                state.as_str(),
                time_utils::to_sqlite(&time_utils::now()),
            ],
        )
        .map_err(|e| HindsightError::Storage(format!("Upsert conversation failed: {}", e)))?;

        tracing::debug!(conversation_id = %conversation_id, state = %state, "Conversation upserted");
        Ok(())
    }

    /// Overwrite last_response and state only; last_query stays untouched.
    /// A silent no-op when the conversation does not exist (this path never
    /// creates rows).
    pub fn set_state(
        conn: &Connection,
        conversation_id: &str,
        response: &str,
        state: ConversationState,
    ) -> HindsightResult<()> {
        let updated = conn
            .execute(
                "UPDATE conversations
                 SET last_response = ?2, state = ?3, updated_at = ?4
                 WHERE conversation_id = ?1",
                params![
                    conversation_id,
                    response,
                    state.as_str(),
                    time_utils::to_sqlite(&time_utils::now()),
                ],
            )
            .map_err(|e| HindsightError::Storage(format!("Set state failed: {}", e)))?;

        if updated == 0 {
            tracing::debug!(conversation_id = %conversation_id, "set_state on unknown conversation ignored");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::setup_db;

    #[test]
    fn test_get_or_init_creates_once() {
        let conn = setup_db();

        let (first, created) = ConversationStore::get_or_init(&conn, "conv-1").unwrap();
        assert!(created);
        assert_eq!(first.state, ConversationState::Initial);
        assert!(first.last_query.is_none());
        assert!(first.last_response.is_none());

        let (second, created) = ConversationStore::get_or_init(&conn, "conv-1").unwrap();
        assert!(!created);
        assert_eq!(second.conversation_id, "conv-1");

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM conversations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_get_or_init_leaves_existing_row_unchanged() {
        let conn = setup_db();
        ConversationStore::upsert(
            &conn,
            "conv-1",
            Some("a query"),
            Some("a response"),
            ConversationState::Active,
        )
        .unwrap();

        let (conversation, created) = ConversationStore::get_or_init(&conn, "conv-1").unwrap();
        assert!(!created);
        assert_eq!(conversation.last_query.as_deref(), Some("a query"));
        assert_eq!(conversation.state, ConversationState::Active);
    }

    #[test]
    fn test_upsert_replaces_full_row() {
        let conn = setup_db();
        ConversationStore::upsert(
            &conn,
            "conv-1",
            Some("first"),
            Some("one"),
            ConversationState::Active,
        )
        .unwrap();
        ConversationStore::upsert(
            &conn,
            "conv-1",
            Some("second"),
            None,
            ConversationState::Corrected,
        )
        .unwrap();

        let conversation = ConversationStore::get(&conn, "conv-1").unwrap().unwrap();
        assert_eq!(conversation.last_query.as_deref(), Some("second"));
        assert!(conversation.last_response.is_none());
        assert_eq!(conversation.state, ConversationState::Corrected);
    }

    #[test]
    fn test_set_state_keeps_last_query() {
        let conn = setup_db();
        ConversationStore::upsert(
            &conn,
            "conv-1",
            Some("the question"),
            Some("wrong answer"),
            ConversationState::Active,
        )
        .unwrap();

        ConversationStore::set_state(&conn, "conv-1", "fixed answer", ConversationState::Corrected)
            .unwrap();

        let conversation = ConversationStore::get(&conn, "conv-1").unwrap().unwrap();
        assert_eq!(conversation.last_query.as_deref(), Some("the question"));
        assert_eq!(conversation.last_response.as_deref(), Some("fixed answer"));
        assert_eq!(conversation.state, ConversationState::Corrected);
    }

    #[test]
    fn test_set_state_unknown_id_is_noop() {
        let conn = setup_db();
        ConversationStore::set_state(&conn, "ghost", "response", ConversationState::Corrected)
            .unwrap();
        assert!(ConversationStore::get(&conn, "ghost").unwrap().is_none());
    }
}
