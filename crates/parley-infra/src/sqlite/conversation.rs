//! SQLite conversation repository implementation.
//!
//! Covers the conversations table and the conversation_participants
//! association rows. Soft-deleting a conversation cascades to its
//! messages inside one transaction.

use sqlx::Row;

use parley_core::repository::conversation::ConversationRepository;
use parley_core::repository::Page;
use parley_types::conversation::{Actor, Conversation, Participant, ParticipantRole};
use parley_types::error::RepositoryError;
use parley_types::id::{ConversationId, UserId};

use super::pool::DatabasePool;
use super::user::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `ConversationRepository`.
pub struct SqliteConversationRepository {
    pool: DatabasePool,
}

impl SqliteConversationRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn conversation_from_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<Conversation, RepositoryError> {
    let id: String = row
        .try_get("id")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let created_by: String = row
        .try_get("created_by")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let created_at: String = row
        .try_get("created_at")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let updated_at: String = row
        .try_get("updated_at")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

    Ok(Conversation {
        id: id
            .parse()
            .map_err(|e| RepositoryError::Query(format!("invalid conversation id: {e}")))?,
        title: row
            .try_get("title")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        description: row
            .try_get("description")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        created_by: created_by
            .parse()
            .map_err(|e| RepositoryError::Query(format!("invalid creator id: {e}")))?,
        is_active: row
            .try_get("is_active")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

fn participant_from_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<Participant, RepositoryError> {
    let conversation_id: String = row
        .try_get("conversation_id")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let user_id: Option<String> = row
        .try_get("user_id")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let bot_id: Option<String> = row
        .try_get("bot_id")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let role: String = row
        .try_get("role")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let joined_at: String = row
        .try_get("joined_at")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

    let actor = match (user_id, bot_id) {
        (Some(user), None) => Actor::User(
            user.parse()
                .map_err(|e| RepositoryError::Query(format!("invalid user id: {e}")))?,
        ),
        (None, Some(bot)) => Actor::Bot(
            bot.parse()
                .map_err(|e| RepositoryError::Query(format!("invalid bot id: {e}")))?,
        ),
        _ => {
            return Err(RepositoryError::Query(
                "participant row must reference exactly one of user/bot".to_string(),
            ));
        }
    };

    let role: ParticipantRole = role
        .parse()
        .map_err(|e: String| RepositoryError::Query(e))?;

    Ok(Participant {
        conversation_id: conversation_id
            .parse()
            .map_err(|e| RepositoryError::Query(format!("invalid conversation id: {e}")))?,
        actor,
        role,
        joined_at: parse_datetime(&joined_at)?,
    })
}

impl ConversationRepository for SqliteConversationRepository {
    async fn create(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO conversations (id, title, description, created_by, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(conversation.id.to_string())
        .bind(&conversation.title)
        .bind(&conversation.description)
        .bind(conversation.created_by.to_string())
        .bind(conversation.is_active)
        .bind(format_datetime(&conversation.created_at))
        .bind(format_datetime(&conversation.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get_by_id(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM conversations WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(conversation_from_row).transpose()
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        page: Page,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT c.* FROM conversations c
             JOIN conversation_participants p ON p.conversation_id = c.id
             WHERE p.user_id = ? AND c.is_active = 1
             ORDER BY c.id DESC LIMIT ? OFFSET ?",
        )
        .bind(user_id.to_string())
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter().map(conversation_from_row).collect()
    }

    async fn update(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE conversations SET title = ?, description = ?, is_active = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&conversation.title)
        .bind(&conversation.description)
        .bind(conversation.is_active)
        .bind(format_datetime(&conversation.updated_at))
        .bind(conversation.id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn soft_delete(&self, id: &ConversationId) -> Result<bool, RepositoryError> {
        let now = format_datetime(&chrono::Utc::now());
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let result = sqlx::query(
            "UPDATE conversations SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1",
        )
        .bind(&now)
        .bind(id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            return Ok(false);
        }

        // Message lifecycle cascades from the conversation.
        sqlx::query(
            "UPDATE messages SET is_active = 0, updated_at = ? WHERE conversation_id = ? AND is_active = 1",
        )
        .bind(&now)
        .bind(id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(true)
    }

    async fn add_participant(&self, participant: &Participant) -> Result<(), RepositoryError> {
        let (user_id, bot_id) = match participant.actor {
            Actor::User(id) => (Some(id.to_string()), None),
            Actor::Bot(id) => (None, Some(id.to_string())),
        };

        let result = sqlx::query(
            "INSERT INTO conversation_participants (conversation_id, user_id, bot_id, role, joined_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(participant.conversation_id.to_string())
        .bind(&user_id)
        .bind(&bot_id)
        .bind(participant.role.to_string())
        .bind(format_datetime(&participant.joined_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => Err(
                RepositoryError::Conflict("participant already present".to_string()),
            ),
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn remove_participant(
        &self,
        conversation_id: &ConversationId,
        actor: &Actor,
    ) -> Result<bool, RepositoryError> {
        let result = match actor {
            Actor::User(id) => {
                sqlx::query(
                    "DELETE FROM conversation_participants WHERE conversation_id = ? AND user_id = ?",
                )
                .bind(conversation_id.to_string())
                .bind(id.to_string())
                .execute(&self.pool.writer)
                .await
            }
            Actor::Bot(id) => {
                sqlx::query(
                    "DELETE FROM conversation_participants WHERE conversation_id = ? AND bot_id = ?",
                )
                .bind(conversation_id.to_string())
                .bind(id.to_string())
                .execute(&self.pool.writer)
                .await
            }
        }
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_participants(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Participant>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM conversation_participants WHERE conversation_id = ? ORDER BY joined_at ASC",
        )
        .bind(conversation_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter().map(participant_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::message::SqliteMessageRepository;
    use crate::sqlite::test_support::{seed_bot, seed_conversation, seed_user, temp_pool};
    use chrono::Utc;
    use parley_core::repository::message::MessageRepository;
    use parley_types::message::{Message, Sender};

    #[tokio::test]
    async fn test_create_and_get_roundtrip() {
        let pool = temp_pool().await;
        let creator = seed_user(&pool, "alice").await;
        let repo = SqliteConversationRepository::new(pool.clone());

        let conversation = seed_conversation(&pool, &creator).await;
        let stored = repo.get_by_id(&conversation.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Planning");
        assert_eq!(stored.created_by, creator.id);
        assert!(stored.is_active);
    }

    #[tokio::test]
    async fn test_participants_roundtrip() {
        let pool = temp_pool().await;
        let creator = seed_user(&pool, "alice").await;
        let bot = seed_bot(&pool, "assistant_bot", &creator).await;
        let conversation = seed_conversation(&pool, &creator).await;
        let repo = SqliteConversationRepository::new(pool.clone());

        repo.add_participant(&Participant {
            conversation_id: conversation.id,
            actor: Actor::User(creator.id),
            role: ParticipantRole::Owner,
            joined_at: Utc::now(),
        })
        .await
        .unwrap();

        repo.add_participant(&Participant {
            conversation_id: conversation.id,
            actor: Actor::Bot(bot.id),
            role: ParticipantRole::Bot,
            joined_at: Utc::now(),
        })
        .await
        .unwrap();

        let participants = repo.list_participants(&conversation.id).await.unwrap();
        assert_eq!(participants.len(), 2);
        assert_eq!(participants[0].actor, Actor::User(creator.id));
        assert_eq!(participants[0].role, ParticipantRole::Owner);
        assert_eq!(participants[1].actor, Actor::Bot(bot.id));

        assert!(
            repo.remove_participant(&conversation.id, &Actor::Bot(bot.id))
                .await
                .unwrap()
        );
        assert_eq!(repo.list_participants(&conversation.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_participant_conflicts() {
        let pool = temp_pool().await;
        let creator = seed_user(&pool, "alice").await;
        let conversation = seed_conversation(&pool, &creator).await;
        let repo = SqliteConversationRepository::new(pool.clone());

        let participant = Participant {
            conversation_id: conversation.id,
            actor: Actor::User(creator.id),
            role: ParticipantRole::Owner,
            joined_at: Utc::now(),
        };
        repo.add_participant(&participant).await.unwrap();
        let err = repo.add_participant(&participant).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_for_user_only_includes_memberships() {
        let pool = temp_pool().await;
        let alice = seed_user(&pool, "alice").await;
        let bob = seed_user(&pool, "bob").await;
        let conversation = seed_conversation(&pool, &alice).await;
        let repo = SqliteConversationRepository::new(pool.clone());

        repo.add_participant(&Participant {
            conversation_id: conversation.id,
            actor: Actor::User(alice.id),
            role: ParticipantRole::Owner,
            joined_at: Utc::now(),
        })
        .await
        .unwrap();

        let for_alice = repo.list_for_user(&alice.id, Page::default()).await.unwrap();
        assert_eq!(for_alice.len(), 1);

        let for_bob = repo.list_for_user(&bob.id, Page::default()).await.unwrap();
        assert!(for_bob.is_empty());
    }

    #[tokio::test]
    async fn test_soft_delete_cascades_to_messages() {
        let pool = temp_pool().await;
        let creator = seed_user(&pool, "alice").await;
        let conversation = seed_conversation(&pool, &creator).await;
        let repo = SqliteConversationRepository::new(pool.clone());
        let message_repo = SqliteMessageRepository::new(pool.clone());

        let message = Message::new(
            conversation.id,
            Sender::User(creator.id),
            "to be cascaded".to_string(),
        )
        .unwrap();
        message_repo.create(&message).await.unwrap();

        assert!(repo.soft_delete(&conversation.id).await.unwrap());
        assert!(!repo.soft_delete(&conversation.id).await.unwrap());

        let stored = message_repo.get_by_id(&message.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
    }
}
