//! SQLite bot repository implementation.
//!
//! Implements `BotRepository` from `parley-core` using sqlx with split
//! read/write pools.

use sqlx::Row;

use parley_core::repository::bot::BotRepository;
use parley_core::repository::Page;
use parley_types::bot::{Bot, ProviderKind, Temperature};
use parley_types::error::RepositoryError;
use parley_types::id::BotId;

use super::pool::DatabasePool;
use super::user::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `BotRepository`.
pub struct SqliteBotRepository {
    pool: DatabasePool,
}

impl SqliteBotRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to the domain Bot.
struct BotRow {
    id: String,
    name: String,
    display_name: String,
    description: Option<String>,
    avatar_url: Option<String>,
    model_name: String,
    provider: String,
    system_prompt: Option<String>,
    temperature: i32,
    max_tokens: i64,
    is_active: bool,
    is_public: bool,
    auto_trigger: bool,
    api_key: Option<String>,
    api_base_url: Option<String>,
    config: Option<String>,
    created_by: String,
    created_at: String,
    updated_at: String,
}

impl BotRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            display_name: row.try_get("display_name")?,
            description: row.try_get("description")?,
            avatar_url: row.try_get("avatar_url")?,
            model_name: row.try_get("model_name")?,
            provider: row.try_get("provider")?,
            system_prompt: row.try_get("system_prompt")?,
            temperature: row.try_get("temperature")?,
            max_tokens: row.try_get("max_tokens")?,
            is_active: row.try_get("is_active")?,
            is_public: row.try_get("is_public")?,
            auto_trigger: row.try_get("auto_trigger")?,
            api_key: row.try_get("api_key")?,
            api_base_url: row.try_get("api_base_url")?,
            config: row.try_get("config")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_bot(self) -> Result<Bot, RepositoryError> {
        let id: BotId = self
            .id
            .parse()
            .map_err(|e| RepositoryError::Query(format!("invalid bot id: {e}")))?;

        let provider: ProviderKind = self
            .provider
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        let temperature = Temperature::from_scaled(self.temperature)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let config = self
            .config
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("invalid config JSON: {e}")))?;

        let created_by = self
            .created_by
            .parse()
            .map_err(|e| RepositoryError::Query(format!("invalid creator id: {e}")))?;

        Ok(Bot {
            id,
            name: self.name,
            display_name: self.display_name,
            description: self.description,
            avatar_url: self.avatar_url,
            model_name: self.model_name,
            provider,
            system_prompt: self.system_prompt,
            temperature,
            max_tokens: self.max_tokens as u32,
            is_active: self.is_active,
            is_public: self.is_public,
            auto_trigger: self.auto_trigger,
            api_key: self.api_key,
            api_base_url: self.api_base_url,
            config,
            created_by,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn rows_to_bots(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Bot>, RepositoryError> {
    let mut bots = Vec::with_capacity(rows.len());
    for row in rows {
        let bot_row = BotRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
        bots.push(bot_row.into_bot()?);
    }
    Ok(bots)
}

impl BotRepository for SqliteBotRepository {
    async fn create(&self, bot: &Bot) -> Result<(), RepositoryError> {
        let config_json = bot
            .config
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO bots (id, name, display_name, description, avatar_url, model_name,
                               provider, system_prompt, temperature, max_tokens, is_active,
                               is_public, auto_trigger, api_key, api_base_url, config,
                               created_by, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(bot.id.to_string())
        .bind(&bot.name)
        .bind(&bot.display_name)
        .bind(&bot.description)
        .bind(&bot.avatar_url)
        .bind(&bot.model_name)
        .bind(bot.provider.to_string())
        .bind(&bot.system_prompt)
        .bind(bot.temperature.scaled())
        .bind(bot.max_tokens as i64)
        .bind(bot.is_active)
        .bind(bot.is_public)
        .bind(bot.auto_trigger)
        .bind(&bot.api_key)
        .bind(&bot.api_base_url)
        .bind(&config_json)
        .bind(bot.created_by.to_string())
        .bind(format_datetime(&bot.created_at))
        .bind(format_datetime(&bot.updated_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => Err(
                RepositoryError::Conflict(format!("bot name '{}' already exists", bot.name)),
            ),
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn get_by_id(&self, id: &BotId) -> Result<Option<Bot>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM bots WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let bot_row =
                    BotRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(bot_row.into_bot()?))
            }
            None => Ok(None),
        }
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Bot>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM bots WHERE name = ? AND is_active = 1")
            .bind(name)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let bot_row =
                    BotRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(bot_row.into_bot()?))
            }
            None => Ok(None),
        }
    }

    async fn list(&self, page: Page) -> Result<Vec<Bot>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM bots WHERE is_active = 1 ORDER BY id DESC LIMIT ? OFFSET ?",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows_to_bots(&rows)
    }

    async fn list_active(&self) -> Result<Vec<Bot>, RepositoryError> {
        // Ordered by id ascending: v7 ids put the earliest-created bot
        // first, which the default selection policy depends on.
        let rows = sqlx::query("SELECT * FROM bots WHERE is_active = 1 ORDER BY id ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows_to_bots(&rows)
    }

    async fn update(&self, bot: &Bot) -> Result<(), RepositoryError> {
        let config_json = bot
            .config
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query(
            "UPDATE bots SET display_name = ?, description = ?, avatar_url = ?, model_name = ?,
                             system_prompt = ?, temperature = ?, max_tokens = ?, is_active = ?,
                             is_public = ?, auto_trigger = ?, api_key = ?, api_base_url = ?,
                             config = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&bot.display_name)
        .bind(&bot.description)
        .bind(&bot.avatar_url)
        .bind(&bot.model_name)
        .bind(&bot.system_prompt)
        .bind(bot.temperature.scaled())
        .bind(bot.max_tokens as i64)
        .bind(bot.is_active)
        .bind(bot.is_public)
        .bind(bot.auto_trigger)
        .bind(&bot.api_key)
        .bind(&bot.api_base_url)
        .bind(&config_json)
        .bind(format_datetime(&bot.updated_at))
        .bind(bot.id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn soft_delete(&self, id: &BotId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE bots SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1",
        )
        .bind(format_datetime(&chrono::Utc::now()))
        .bind(id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
