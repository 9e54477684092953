//! Conversation lifecycle and participant management.

use chrono::Utc;
use tracing::info;

use parley_types::conversation::{
    Actor, AddParticipantRequest, Conversation, CreateConversationRequest, Participant,
    ParticipantRole, UpdateConversationRequest,
};
use parley_types::error::{ConversationError, RepositoryError};
use parley_types::id::{ConversationId, UserId};

use crate::repository::conversation::ConversationRepository;
use crate::repository::Page;

/// Validation and orchestration over [`ConversationRepository`].
pub struct ConversationService<C: ConversationRepository> {
    repo: C,
}

impl<C: ConversationRepository> ConversationService<C> {
    pub fn new(repo: C) -> Self {
        Self { repo }
    }

    /// Create a conversation. The creator is always added as a
    /// participant with the owner role.
    pub async fn create_conversation(
        &self,
        creator: UserId,
        request: CreateConversationRequest,
    ) -> Result<Conversation, ConversationError> {
        let conversation = Conversation::new(request.title, request.description, creator);
        self.repo.create(&conversation).await.map_err(map_repo_err)?;

        let owner = Participant {
            conversation_id: conversation.id,
            actor: Actor::User(creator),
            role: ParticipantRole::Owner,
            joined_at: Utc::now(),
        };
        self.repo.add_participant(&owner).await.map_err(map_repo_err)?;

        info!(conversation_id = %conversation.id, "Conversation created");
        Ok(conversation)
    }

    pub async fn get_conversation(
        &self,
        id: &ConversationId,
    ) -> Result<Conversation, ConversationError> {
        self.repo
            .get_by_id(id)
            .await
            .map_err(map_repo_err)?
            .ok_or(ConversationError::NotFound)
    }

    pub async fn list_for_user(
        &self,
        user_id: &UserId,
        page: Page,
    ) -> Result<Vec<Conversation>, ConversationError> {
        self.repo.list_for_user(user_id, page).await.map_err(map_repo_err)
    }

    /// Update a conversation's title or description. Owner only.
    pub async fn update_conversation(
        &self,
        id: &ConversationId,
        caller: UserId,
        request: UpdateConversationRequest,
    ) -> Result<Conversation, ConversationError> {
        let mut conversation = self.get_conversation(id).await?;
        if conversation.created_by != caller {
            return Err(ConversationError::NotOwner);
        }
        if let Some(title) = request.title {
            conversation.title = title;
        }
        if let Some(description) = request.description {
            conversation.description = Some(description);
        }
        conversation.updated_at = Utc::now();
        self.repo.update(&conversation).await.map_err(map_repo_err)?;
        Ok(conversation)
    }

    /// Soft-delete a conversation and its messages. Owner only.
    pub async fn delete_conversation(
        &self,
        id: &ConversationId,
        caller: UserId,
    ) -> Result<(), ConversationError> {
        let conversation = self.get_conversation(id).await?;
        if conversation.created_by != caller {
            return Err(ConversationError::NotOwner);
        }
        let removed = self.repo.soft_delete(id).await.map_err(map_repo_err)?;
        if removed { Ok(()) } else { Err(ConversationError::NotFound) }
    }

    /// Add a participant. Bots default to the bot role, humans to
    /// participant.
    pub async fn add_participant(
        &self,
        conversation_id: &ConversationId,
        request: AddParticipantRequest,
    ) -> Result<Participant, ConversationError> {
        // Ensure the conversation exists and is active first.
        self.get_conversation(conversation_id).await?;

        let role = request.role.unwrap_or(match request.actor {
            Actor::User(_) => ParticipantRole::Participant,
            Actor::Bot(_) => ParticipantRole::Bot,
        });
        let participant = Participant {
            conversation_id: *conversation_id,
            actor: request.actor,
            role,
            joined_at: Utc::now(),
        };
        self.repo
            .add_participant(&participant)
            .await
            .map_err(|err| match err {
                RepositoryError::Conflict(_) => ConversationError::ParticipantExists,
                other => map_repo_err(other),
            })?;
        Ok(participant)
    }

    pub async fn remove_participant(
        &self,
        conversation_id: &ConversationId,
        actor: &Actor,
    ) -> Result<(), ConversationError> {
        let removed = self
            .repo
            .remove_participant(conversation_id, actor)
            .await
            .map_err(map_repo_err)?;
        if removed {
            Ok(())
        } else {
            Err(ConversationError::ParticipantNotFound)
        }
    }

    pub async fn list_participants(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Participant>, ConversationError> {
        self.repo
            .list_participants(conversation_id)
            .await
            .map_err(map_repo_err)
    }
}

fn map_repo_err(err: RepositoryError) -> ConversationError {
    match err {
        RepositoryError::NotFound => ConversationError::NotFound,
        other => ConversationError::Storage(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::id::BotId;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryConversationRepo {
        conversations: Mutex<HashMap<ConversationId, Conversation>>,
        participants: Mutex<Vec<Participant>>,
    }

    impl ConversationRepository for InMemoryConversationRepo {
        async fn create(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
            self.conversations
                .lock()
                .unwrap()
                .insert(conversation.id, conversation.clone());
            Ok(())
        }

        async fn get_by_id(
            &self,
            id: &ConversationId,
        ) -> Result<Option<Conversation>, RepositoryError> {
            Ok(self.conversations.lock().unwrap().get(id).cloned())
        }

        async fn list_for_user(
            &self,
            user_id: &UserId,
            _page: Page,
        ) -> Result<Vec<Conversation>, RepositoryError> {
            let participants = self.participants.lock().unwrap();
            let member_of: Vec<ConversationId> = participants
                .iter()
                .filter(|p| p.actor == Actor::User(*user_id))
                .map(|p| p.conversation_id)
                .collect();
            Ok(self
                .conversations
                .lock()
                .unwrap()
                .values()
                .filter(|c| c.is_active && member_of.contains(&c.id))
                .cloned()
                .collect())
        }

        async fn update(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
            self.conversations
                .lock()
                .unwrap()
                .insert(conversation.id, conversation.clone());
            Ok(())
        }

        async fn soft_delete(&self, id: &ConversationId) -> Result<bool, RepositoryError> {
            let mut conversations = self.conversations.lock().unwrap();
            match conversations.get_mut(id) {
                Some(c) if c.is_active => {
                    c.is_active = false;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn add_participant(&self, participant: &Participant) -> Result<(), RepositoryError> {
            let mut participants = self.participants.lock().unwrap();
            if participants.iter().any(|p| {
                p.conversation_id == participant.conversation_id && p.actor == participant.actor
            }) {
                return Err(RepositoryError::Conflict("already present".to_string()));
            }
            participants.push(participant.clone());
            Ok(())
        }

        async fn remove_participant(
            &self,
            conversation_id: &ConversationId,
            actor: &Actor,
        ) -> Result<bool, RepositoryError> {
            let mut participants = self.participants.lock().unwrap();
            let before = participants.len();
            participants.retain(|p| !(p.conversation_id == *conversation_id && p.actor == *actor));
            Ok(participants.len() < before)
        }

        async fn list_participants(
            &self,
            conversation_id: &ConversationId,
        ) -> Result<Vec<Participant>, RepositoryError> {
            Ok(self
                .participants
                .lock()
                .unwrap()
                .iter()
                .filter(|p| p.conversation_id == *conversation_id)
                .cloned()
                .collect())
        }
    }

    fn create_request() -> CreateConversationRequest {
        CreateConversationRequest {
            title: "Planning".to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_creator_becomes_owner_participant() {
        let service = ConversationService::new(InMemoryConversationRepo::default());
        let creator = UserId::new();
        let conversation = service
            .create_conversation(creator, create_request())
            .await
            .unwrap();

        let participants = service.list_participants(&conversation.id).await.unwrap();
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].actor, Actor::User(creator));
        assert_eq!(participants[0].role, ParticipantRole::Owner);
    }

    #[tokio::test]
    async fn test_bot_participant_defaults_to_bot_role() {
        let service = ConversationService::new(InMemoryConversationRepo::default());
        let conversation = service
            .create_conversation(UserId::new(), create_request())
            .await
            .unwrap();

        let bot_id = BotId::new();
        let participant = service
            .add_participant(
                &conversation.id,
                AddParticipantRequest {
                    actor: Actor::Bot(bot_id),
                    role: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(participant.role, ParticipantRole::Bot);
    }

    #[tokio::test]
    async fn test_duplicate_participant_rejected() {
        let service = ConversationService::new(InMemoryConversationRepo::default());
        let creator = UserId::new();
        let conversation = service
            .create_conversation(creator, create_request())
            .await
            .unwrap();

        let err = service
            .add_participant(
                &conversation.id,
                AddParticipantRequest {
                    actor: Actor::User(creator),
                    role: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ConversationError::ParticipantExists));
    }

    #[tokio::test]
    async fn test_delete_is_owner_only() {
        let service = ConversationService::new(InMemoryConversationRepo::default());
        let creator = UserId::new();
        let conversation = service
            .create_conversation(creator, create_request())
            .await
            .unwrap();

        let err = service
            .delete_conversation(&conversation.id, UserId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ConversationError::NotOwner));

        service
            .delete_conversation(&conversation.id, creator)
            .await
            .unwrap();
        let stored = service.get_conversation(&conversation.id).await.unwrap();
        assert!(!stored.is_active);
    }
}
