//! SQLite message repository implementation.
//!
//! Implements `MessageRepository` from `parley-core` using sqlx with split
//! read/write pools. The forwarded-history blob is stored as the JSON
//! array form produced by `parley_core::context::codec`.

use sqlx::Row;

use parley_core::context::codec::{deserialize_entries, serialize_entries};
use parley_core::repository::message::MessageRepository;
use parley_core::repository::Page;
use parley_types::error::RepositoryError;
use parley_types::id::{ConversationId, MessageId};
use parley_types::message::{Message, Sender};

use super::pool::DatabasePool;
use super::user::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `MessageRepository`.
pub struct SqliteMessageRepository {
    pool: DatabasePool,
}

impl SqliteMessageRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to the domain Message.
struct MessageRow {
    id: String,
    conversation_id: String,
    content: String,
    sender_user_id: Option<String>,
    sender_bot_id: Option<String>,
    forwarded_history: Option<String>,
    is_active: bool,
    created_at: String,
    updated_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            conversation_id: row.try_get("conversation_id")?,
            content: row.try_get("content")?,
            sender_user_id: row.try_get("sender_user_id")?,
            sender_bot_id: row.try_get("sender_bot_id")?,
            forwarded_history: row.try_get("forwarded_history")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_message(self) -> Result<Message, RepositoryError> {
        let sender_user_id = self
            .sender_user_id
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("invalid sender user id: {e}")))?;
        let sender_bot_id = self
            .sender_bot_id
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("invalid sender bot id: {e}")))?;

        // The DB CHECK enforces the exclusive-or; re-validate at the
        // boundary anyway so a hand-edited row cannot enter the domain.
        let sender = Sender::from_ids(sender_user_id, sender_bot_id)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let forwarded_history = self
            .forwarded_history
            .as_deref()
            .map(deserialize_entries)
            .transpose()
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .filter(|entries| !entries.is_empty());

        Ok(Message {
            id: self
                .id
                .parse()
                .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?,
            conversation_id: self
                .conversation_id
                .parse()
                .map_err(|e| RepositoryError::Query(format!("invalid conversation id: {e}")))?,
            content: self.content,
            sender,
            forwarded_history,
            is_active: self.is_active,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn rows_to_messages(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Message>, RepositoryError> {
    let mut messages = Vec::with_capacity(rows.len());
    for row in rows {
        let message_row =
            MessageRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
        messages.push(message_row.into_message()?);
    }
    Ok(messages)
}

impl MessageRepository for SqliteMessageRepository {
    async fn create(&self, message: &Message) -> Result<(), RepositoryError> {
        let history_blob = message
            .forwarded_history
            .as_deref()
            .map(serialize_entries)
            .transpose()
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query(
            "INSERT INTO messages (id, conversation_id, content, sender_user_id, sender_bot_id,
                                   forwarded_history, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(message.id.to_string())
        .bind(message.conversation_id.to_string())
        .bind(&message.content)
        .bind(message.sender.user_id().map(|id| id.to_string()))
        .bind(message.sender.bot_id().map(|id| id.to_string()))
        .bind(&history_blob)
        .bind(message.is_active)
        .bind(format_datetime(&message.created_at))
        .bind(format_datetime(&message.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get_by_id(&self, id: &MessageId) -> Result<Option<Message>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM messages WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let message_row = MessageRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(message_row.into_message()?))
            }
            None => Ok(None),
        }
    }

    async fn list_for_conversation(
        &self,
        conversation_id: &ConversationId,
        page: Page,
    ) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM messages
             WHERE conversation_id = ? AND is_active = 1
             ORDER BY id DESC LIMIT ? OFFSET ?",
        )
        .bind(conversation_id.to_string())
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows_to_messages(&rows)
    }

    async fn recent_context(
        &self,
        conversation_id: &ConversationId,
        before: &MessageId,
        limit: u32,
    ) -> Result<Vec<Message>, RepositoryError> {
        // v7 id text sorts in creation order, so `id < ?` is "strictly
        // older than the pivot". Fetch newest-first, then flip to
        // chronological for the context builder.
        let rows = sqlx::query(
            "SELECT * FROM messages
             WHERE conversation_id = ? AND is_active = 1 AND id < ?
             ORDER BY id DESC LIMIT ?",
        )
        .bind(conversation_id.to_string())
        .bind(before.to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut messages = rows_to_messages(&rows)?;
        messages.reverse();
        Ok(messages)
    }

    async fn update(&self, message: &Message) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE messages SET content = ?, is_active = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&message.content)
        .bind(message.is_active)
        .bind(format_datetime(&message.updated_at))
        .bind(message.id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn soft_delete(&self, id: &MessageId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE messages SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1",
        )
        .bind(format_datetime(&chrono::Utc::now()))
        .bind(id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_support::{seed_bot, seed_conversation, seed_user, temp_pool};
    use parley_types::agent::ContextEntry;

    #[tokio::test]
    async fn test_roundtrip_with_forwarded_history() {
        let pool = temp_pool().await;
        let user = seed_user(&pool, "alice").await;
        let bot = seed_bot(&pool, "assistant_bot", &user).await;
        let conversation = seed_conversation(&pool, &user).await;
        let repo = SqliteMessageRepository::new(pool);

        let history = vec![
            ContextEntry::user("what was decided?"),
            ContextEntry::assistant("we picked sqlite"),
        ];
        let message = Message::new(
            conversation.id,
            Sender::Bot(bot.id),
            "we picked sqlite".to_string(),
        )
        .unwrap()
        .with_forwarded_history(history.clone());

        repo.create(&message).await.unwrap();

        let stored = repo.get_by_id(&message.id).await.unwrap().unwrap();
        assert_eq!(stored.content, "we picked sqlite");
        assert_eq!(stored.sender, Sender::Bot(bot.id));
        assert_eq!(stored.forwarded_history.unwrap(), history);
    }

    #[tokio::test]
    async fn test_plain_message_has_no_history() {
        let pool = temp_pool().await;
        let user = seed_user(&pool, "alice").await;
        let conversation = seed_conversation(&pool, &user).await;
        let repo = SqliteMessageRepository::new(pool);

        let message = Message::new(
            conversation.id,
            Sender::User(user.id),
            "plain text".to_string(),
        )
        .unwrap();
        repo.create(&message).await.unwrap();

        let stored = repo.get_by_id(&message.id).await.unwrap().unwrap();
        assert!(stored.forwarded_history.is_none());
        assert_eq!(stored.sender.user_id(), Some(user.id));
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let pool = temp_pool().await;
        let user = seed_user(&pool, "alice").await;
        let conversation = seed_conversation(&pool, &user).await;
        let repo = SqliteMessageRepository::new(pool);

        for i in 0..3 {
            let message = Message::new(
                conversation.id,
                Sender::User(user.id),
                format!("message {i}"),
            )
            .unwrap();
            repo.create(&message).await.unwrap();
        }

        let listed = repo
            .list_for_conversation(&conversation.id, Page::default())
            .await
            .unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].content, "message 2");
        assert_eq!(listed[2].content, "message 0");
    }

    #[tokio::test]
    async fn test_recent_context_excludes_pivot_and_is_chronological() {
        let pool = temp_pool().await;
        let user = seed_user(&pool, "alice").await;
        let conversation = seed_conversation(&pool, &user).await;
        let repo = SqliteMessageRepository::new(pool);

        let mut all = Vec::new();
        for i in 0..5 {
            let message = Message::new(
                conversation.id,
                Sender::User(user.id),
                format!("message {i}"),
            )
            .unwrap();
            repo.create(&message).await.unwrap();
            all.push(message);
        }

        let pivot = &all[4];
        let context = repo
            .recent_context(&conversation.id, &pivot.id, 3)
            .await
            .unwrap();
        assert_eq!(context.len(), 3);
        assert_eq!(context[0].content, "message 1");
        assert_eq!(context[1].content, "message 2");
        assert_eq!(context[2].content, "message 3");
        assert!(context.iter().all(|m| m.id != pivot.id));
    }

    #[tokio::test]
    async fn test_recent_context_skips_inactive() {
        let pool = temp_pool().await;
        let user = seed_user(&pool, "alice").await;
        let conversation = seed_conversation(&pool, &user).await;
        let repo = SqliteMessageRepository::new(pool);

        let first = Message::new(conversation.id, Sender::User(user.id), "kept".to_string())
            .unwrap();
        repo.create(&first).await.unwrap();

        let deleted =
            Message::new(conversation.id, Sender::User(user.id), "deleted".to_string()).unwrap();
        repo.create(&deleted).await.unwrap();
        repo.soft_delete(&deleted.id).await.unwrap();

        let pivot = Message::new(conversation.id, Sender::User(user.id), "pivot".to_string())
            .unwrap();
        repo.create(&pivot).await.unwrap();

        let context = repo
            .recent_context(&conversation.id, &pivot.id, 10)
            .await
            .unwrap();
        assert_eq!(context.len(), 1);
        assert_eq!(context[0].content, "kept");
    }

    #[tokio::test]
    async fn test_sender_xor_enforced_by_schema() {
        let pool = temp_pool().await;
        let user = seed_user(&pool, "alice").await;
        let bot = seed_bot(&pool, "assistant_bot", &user).await;
        let conversation = seed_conversation(&pool, &user).await;

        let now = format_datetime(&chrono::Utc::now());

        // Both senders set: the CHECK constraint rejects the row.
        let both = sqlx::query(
            "INSERT INTO messages (id, conversation_id, content, sender_user_id, sender_bot_id,
                                   is_active, created_at, updated_at)
             VALUES (?, ?, 'x', ?, ?, 1, ?, ?)",
        )
        .bind(MessageId::new().to_string())
        .bind(conversation.id.to_string())
        .bind(user.id.to_string())
        .bind(bot.id.to_string())
        .bind(&now)
        .bind(&now)
        .execute(&pool.writer)
        .await;
        assert!(both.is_err());

        // Neither sender set: also rejected.
        let neither = sqlx::query(
            "INSERT INTO messages (id, conversation_id, content, is_active, created_at, updated_at)
             VALUES (?, ?, 'x', 1, ?, ?)",
        )
        .bind(MessageId::new().to_string())
        .bind(conversation.id.to_string())
        .bind(&now)
        .bind(&now)
        .execute(&pool.writer)
        .await;
        assert!(neither.is_err());
    }
}
