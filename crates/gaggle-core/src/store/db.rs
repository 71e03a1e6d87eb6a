use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::constants::{CHAT_DB_FILE, CONVERSATION_NAME_PREFIX_LEN};
use crate::models::{Conversation, StoredMessage};
use crate::store::PageSource;

/// Sqlite-backed message history. One connection behind a mutex; callers
/// on the async side go through `spawn_blocking`.
pub struct ChatDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl ChatDatabase {
    pub fn open<P: AsRef<Path>>(db_dir: P) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir)?;
        let conn = Connection::open(db_dir.join(CHAT_DB_FILE))?;
        Self::with_conn(conn)
    }

    /// In-memory database, used in tests
    pub fn open_in_memory() -> Result<Self> {
        Self::with_conn(Connection::open_in_memory()?)
    }

    fn with_conn(conn: Connection) -> Result<Self> {
        // Cascade delete of messages relies on the foreign_keys pragma
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                name TEXT,
                last_message_at INTEGER
            );
            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL,
                content TEXT,
                created_at INTEGER NOT NULL,
                sender_id TEXT,
                nickname TEXT,
                FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_messages_conversation_created
                ON messages (conversation_id, created_at);
            "#,
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // A poisoned lock only means another caller panicked mid-call;
        // the connection itself is still usable.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create the conversation row on first entry into a room. Existing
    /// rows are left untouched (names are not rewritten).
    pub fn ensure_conversation(&self, id: &str, name: Option<&str>) -> Result<()> {
        anyhow::ensure!(!id.is_empty(), "conversation id cannot be empty");

        let default_name = format!("Chat {}", &id[..CONVERSATION_NAME_PREFIX_LEN.min(id.len())]);
        let name = name.unwrap_or(&default_name);

        let conn = self.lock();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO conversations (id, name) VALUES (?1, ?2)",
            params![id, name],
        )?;
        if inserted > 0 {
            tracing::info!(conversation = id, name, "created conversation");
        }
        Ok(())
    }

    pub fn conversations(&self) -> Result<Vec<Conversation>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, name, last_message_at FROM conversations
             ORDER BY last_message_at DESC NULLS LAST, id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Conversation {
                    id: row.get(0)?,
                    name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    last_message_at: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Delete a conversation; its messages go with it via the cascade.
    /// Returns false if no such conversation existed.
    pub fn delete_conversation(&self, id: &str) -> Result<bool> {
        let conn = self.lock();
        let affected = conn.execute("DELETE FROM conversations WHERE id = ?1", params![id])?;
        if affected == 0 {
            tracing::warn!(conversation = id, "delete requested for unknown conversation");
        }
        Ok(affected > 0)
    }

    fn fetch_page_inner(
        &self,
        conversation_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<StoredMessage>> {
        if conversation_id.is_empty() {
            return Ok(Vec::new());
        }
        let offset = (page.saturating_sub(1) as i64) * limit as i64;

        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, conversation_id, sender_id, nickname, content, created_at
             FROM messages WHERE conversation_id = ?1
             ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
        )?;
        let mut rows = stmt
            .query_map(params![conversation_id, limit as i64, offset], |row| {
                Ok(StoredMessage {
                    id: row.get(0)?,
                    conversation_id: row.get(1)?,
                    sender_id: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    nickname: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    content: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                    created_at: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // Fetched newest-first for pagination; exposed oldest-first
        rows.reverse();
        Ok(rows)
    }

    fn append_inner(&self, message: &StoredMessage) -> Result<()> {
        anyhow::ensure!(
            !message.conversation_id.is_empty(),
            "message must have a conversation_id"
        );

        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO messages (id, conversation_id, sender_id, nickname, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                message.id,
                message.conversation_id,
                message.sender_id,
                message.nickname,
                message.content,
                message.created_at,
            ],
        )?;
        tx.execute(
            "UPDATE conversations SET last_message_at = ?1 WHERE id = ?2",
            params![message.created_at, message.conversation_id],
        )?;
        tx.commit().context("committing message append")?;
        Ok(())
    }
}

impl PageSource for ChatDatabase {
    fn fetch_page(&self, conversation_id: &str, page: u32, limit: u32) -> Result<Vec<StoredMessage>> {
        self.fetch_page_inner(conversation_id, page, limit)
    }

    fn append(&self, message: &StoredMessage) -> Result<()> {
        self.append_inner(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn message(conversation: &str, n: i64) -> StoredMessage {
        StoredMessage {
            id: format!("msg-{n}"),
            conversation_id: conversation.to_string(),
            sender_id: "node-a".to_string(),
            nickname: "ada".to_string(),
            content: format!("message {n}"),
            created_at: 1_000 + n,
        }
    }

    fn seeded(count: i64) -> ChatDatabase {
        let db = ChatDatabase::open_in_memory().unwrap();
        db.ensure_conversation("room", Some("Room")).unwrap();
        for n in 0..count {
            db.append(&message("room", n)).unwrap();
        }
        db
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempdir().unwrap();
        let db = ChatDatabase::open(dir.path()).unwrap();
        db.ensure_conversation("room", None).unwrap();
        assert_eq!(db.conversations().unwrap().len(), 1);
    }

    #[test]
    fn test_ensure_conversation_defaults_name_and_is_idempotent() {
        let db = ChatDatabase::open_in_memory().unwrap();
        db.ensure_conversation("abcdef0123456789", None).unwrap();
        db.ensure_conversation("abcdef0123456789", Some("Renamed")).unwrap();

        let convs = db.conversations().unwrap();
        assert_eq!(convs.len(), 1);
        // First write wins; names are not rewritten on re-entry
        assert_eq!(convs[0].name, "Chat abcdef01");
        assert_eq!(convs[0].last_message_at, None);
    }

    #[test]
    fn test_append_stamps_last_activity() {
        let db = seeded(3);
        let convs = db.conversations().unwrap();
        assert_eq!(convs[0].last_message_at, Some(1_002));
    }

    #[test]
    fn test_pages_are_oldest_first_and_walk_backwards() {
        let db = seeded(45);

        let first = db.fetch_page("room", 1, 20).unwrap();
        assert_eq!(first.len(), 20);
        // Page 1 holds the newest 20, oldest-first within the page
        assert_eq!(first.first().unwrap().created_at, 1_025);
        assert_eq!(first.last().unwrap().created_at, 1_044);

        let second = db.fetch_page("room", 2, 20).unwrap();
        assert_eq!(second.first().unwrap().created_at, 1_005);
        assert_eq!(second.last().unwrap().created_at, 1_024);

        let third = db.fetch_page("room", 3, 20).unwrap();
        assert_eq!(third.len(), 5);
        assert_eq!(third.first().unwrap().created_at, 1_000);

        assert!(db.fetch_page("room", 4, 20).unwrap().is_empty());
    }

    #[test]
    fn test_fetch_page_unknown_conversation_is_empty() {
        let db = seeded(3);
        assert!(db.fetch_page("elsewhere", 1, 20).unwrap().is_empty());
        assert!(db.fetch_page("", 1, 20).unwrap().is_empty());
    }

    #[test]
    fn test_delete_conversation_cascades() {
        let db = seeded(5);
        assert!(db.delete_conversation("room").unwrap());
        assert!(!db.delete_conversation("room").unwrap());
        assert!(db.fetch_page("room", 1, 20).unwrap().is_empty());
        assert!(db.conversations().unwrap().is_empty());
    }

    #[test]
    fn test_append_requires_conversation_id() {
        let db = ChatDatabase::open_in_memory().unwrap();
        let mut msg = message("room", 0);
        msg.conversation_id.clear();
        assert!(db.append(&msg).is_err());
    }
}
