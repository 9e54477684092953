//! Bot lifecycle service.

use chrono::Utc;

use parley_types::bot::{Bot, CreateBotRequest, Temperature, UpdateBotRequest};
use parley_types::error::{BotError, RepositoryError};
use parley_types::id::{BotId, UserId};

use crate::repository::bot::BotRepository;
use crate::repository::Page;

/// Validation and orchestration over [`BotRepository`].
///
/// Bots are mutable only by their creator and are soft-deleted, never
/// removed.
pub struct BotService<B: BotRepository> {
    repo: B,
}

impl<B: BotRepository> BotService<B> {
    pub fn new(repo: B) -> Self {
        Self { repo }
    }

    pub async fn create_bot(
        &self,
        creator: UserId,
        request: CreateBotRequest,
    ) -> Result<Bot, BotError> {
        let temperature = Temperature::from_scaled(request.temperature.unwrap_or(70))?;
        let now = Utc::now();
        let bot = Bot {
            id: BotId::new(),
            name: request.name,
            display_name: request.display_name,
            description: request.description,
            avatar_url: request.avatar_url,
            model_name: request.model_name,
            provider: request.provider,
            system_prompt: request.system_prompt,
            temperature,
            max_tokens: request.max_tokens.unwrap_or(1000),
            is_active: true,
            is_public: request.is_public.unwrap_or(false),
            auto_trigger: request.auto_trigger.unwrap_or(true),
            api_key: request.api_key,
            api_base_url: request.api_base_url,
            config: request.config,
            created_by: creator,
            created_at: now,
            updated_at: now,
        };

        match self.repo.create(&bot).await {
            Ok(()) => Ok(bot),
            Err(RepositoryError::Conflict(_)) => Err(BotError::NameConflict(bot.name)),
            Err(other) => Err(BotError::Storage(other.to_string())),
        }
    }

    pub async fn get_bot(&self, id: &BotId) -> Result<Bot, BotError> {
        self.repo
            .get_by_id(id)
            .await
            .map_err(|e| BotError::Storage(e.to_string()))?
            .ok_or(BotError::NotFound)
    }

    pub async fn get_bot_by_name(&self, name: &str) -> Result<Bot, BotError> {
        self.repo
            .get_by_name(name)
            .await
            .map_err(|e| BotError::Storage(e.to_string()))?
            .ok_or(BotError::NotFound)
    }

    pub async fn list_bots(&self, page: Page) -> Result<Vec<Bot>, BotError> {
        self.repo
            .list(page)
            .await
            .map_err(|e| BotError::Storage(e.to_string()))
    }

    /// Update a bot. Only its creator may do so.
    pub async fn update_bot(
        &self,
        id: &BotId,
        caller: UserId,
        request: UpdateBotRequest,
    ) -> Result<Bot, BotError> {
        let mut bot = self.get_bot(id).await?;
        if bot.created_by != caller {
            return Err(BotError::NotCreator);
        }

        if let Some(temperature) = request.temperature {
            bot.temperature = Temperature::from_scaled(temperature)?;
        }
        if let Some(display_name) = request.display_name {
            bot.display_name = display_name;
        }
        if let Some(description) = request.description {
            bot.description = Some(description);
        }
        if let Some(avatar_url) = request.avatar_url {
            bot.avatar_url = Some(avatar_url);
        }
        if let Some(model_name) = request.model_name {
            bot.model_name = model_name;
        }
        if let Some(system_prompt) = request.system_prompt {
            bot.system_prompt = Some(system_prompt);
        }
        if let Some(max_tokens) = request.max_tokens {
            bot.max_tokens = max_tokens;
        }
        if let Some(is_active) = request.is_active {
            bot.is_active = is_active;
        }
        if let Some(is_public) = request.is_public {
            bot.is_public = is_public;
        }
        if let Some(auto_trigger) = request.auto_trigger {
            bot.auto_trigger = auto_trigger;
        }
        if let Some(api_key) = request.api_key {
            bot.api_key = Some(api_key);
        }
        if let Some(api_base_url) = request.api_base_url {
            bot.api_base_url = Some(api_base_url);
        }
        if let Some(config) = request.config {
            bot.config = Some(config);
        }
        bot.updated_at = Utc::now();

        self.repo
            .update(&bot)
            .await
            .map_err(|e| BotError::Storage(e.to_string()))?;
        Ok(bot)
    }

    /// Soft-delete a bot. Only its creator may do so.
    pub async fn delete_bot(&self, id: &BotId, caller: UserId) -> Result<(), BotError> {
        let bot = self.get_bot(id).await?;
        if bot.created_by != caller {
            return Err(BotError::NotCreator);
        }
        let removed = self
            .repo
            .soft_delete(id)
            .await
            .map_err(|e| BotError::Storage(e.to_string()))?;
        if removed { Ok(()) } else { Err(BotError::NotFound) }
    }
}
