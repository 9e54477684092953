use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::error::BotError;
use crate::id::{BotId, UserId};

/// Language-model provider backing a bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Azure,
    Anthropic,
    Deepseek,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::Azure => write!(f, "azure"),
            ProviderKind::Anthropic => write!(f, "anthropic"),
            ProviderKind::Deepseek => write!(f, "deepseek"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "azure" => Ok(ProviderKind::Azure),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "deepseek" => Ok(ProviderKind::Deepseek),
            other => Err(format!("invalid provider: '{other}'")),
        }
    }
}

/// Sampling temperature stored as an integer scaled x100.
///
/// The stored range 0-200 maps to the logical range 0.0-2.0. The scaled
/// form is what lives in the database and on the wire; [`Temperature::as_f64`]
/// decodes it for provider requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Temperature(i32);

impl Temperature {
    pub const MIN_SCALED: i32 = 0;
    pub const MAX_SCALED: i32 = 200;

    /// Validate a scaled (x100) temperature value.
    pub fn from_scaled(raw: i32) -> Result<Self, BotError> {
        if (Self::MIN_SCALED..=Self::MAX_SCALED).contains(&raw) {
            Ok(Self(raw))
        } else {
            Err(BotError::InvalidTemperature(raw))
        }
    }

    /// The stored x100 integer form.
    pub fn scaled(self) -> i32 {
        self.0
    }

    /// The logical 0.0-2.0 value sent to providers.
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Default for Temperature {
    fn default() -> Self {
        Self(70)
    }
}

/// A configured AI participant.
///
/// Bots are created by a user, mutable only by their creator, and
/// soft-deleted rather than removed. The `api_key` never serializes
/// outward and is redacted from `Debug` output; it only leaves the
/// process inside provider request headers.
#[derive(Clone, Serialize, Deserialize)]
pub struct Bot {
    pub id: BotId,
    /// Unique handle used in @mentions and lookups.
    pub name: String,
    /// Human-readable name surfaced in conversations and fallback replies.
    pub display_name: String,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    /// Model identifier passed to the provider (e.g. "gpt-4o-mini").
    pub model_name: String,
    pub provider: ProviderKind,
    pub system_prompt: Option<String>,
    pub temperature: Temperature,
    /// Maximum response tokens per generation.
    pub max_tokens: u32,
    /// Whether the bot is enabled (soft-delete flag).
    pub is_active: bool,
    /// Whether the bot can be used by anyone or only its creator.
    pub is_public: bool,
    /// Whether the bot responds to @mentions at all.
    pub auto_trigger: bool,
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    /// Free-form provider-specific configuration (e.g. Azure endpoint
    /// and API version).
    pub config: Option<serde_json::Value>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bot {
    /// Materialize the value handed to the trigger pipeline.
    ///
    /// Decodes the scaled temperature and snapshots everything agent
    /// construction needs. Infallible: credential validation is deferred
    /// to provider construction so a misconfigured bot degrades to a
    /// placeholder reply instead of failing the lookup.
    pub fn materialize(&self) -> BotConfig {
        BotConfig {
            bot_id: self.id,
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            model: self.model_name.clone(),
            provider: self.provider,
            system_prompt: self.system_prompt.clone(),
            temperature: self.temperature.as_f64(),
            max_tokens: self.max_tokens,
            api_key: self.api_key.clone(),
            api_base_url: self.api_base_url.clone(),
            extra: self.config.clone(),
        }
    }
}

impl fmt::Debug for Bot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bot")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("display_name", &self.display_name)
            .field("model_name", &self.model_name)
            .field("provider", &self.provider)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("is_active", &self.is_active)
            .field("is_public", &self.is_public)
            .field("auto_trigger", &self.auto_trigger)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("created_by", &self.created_by)
            .finish_non_exhaustive()
    }
}

/// Fully materialized bot configuration consumed by the agent invoker.
///
/// A value, not a live handle: the trigger pipeline works from this
/// snapshot even if the bot row changes mid-flight.
#[derive(Clone)]
pub struct BotConfig {
    pub bot_id: BotId,
    pub name: String,
    pub display_name: String,
    pub model: String,
    pub provider: ProviderKind,
    pub system_prompt: Option<String>,
    /// Decoded logical temperature (0.0-2.0).
    pub temperature: f64,
    pub max_tokens: u32,
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub extra: Option<serde_json::Value>,
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("bot_id", &self.bot_id)
            .field("name", &self.name)
            .field("display_name", &self.display_name)
            .field("model", &self.model)
            .field("provider", &self.provider)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .finish_non_exhaustive()
    }
}

impl BotConfig {
    /// Resolve the strongly-typed provider settings for this bot.
    ///
    /// This is where configuration errors surface: missing credentials or
    /// malformed provider config fail here, at agent construction time.
    pub fn provider_settings(&self) -> Result<ProviderSettings, BotError> {
        match self.provider {
            ProviderKind::OpenAi => Ok(ProviderSettings::OpenAi {
                api_key: self.require_api_key()?,
                base_url: self.api_base_url.clone(),
            }),
            ProviderKind::Deepseek => Ok(ProviderSettings::Deepseek {
                api_key: self.require_api_key()?,
                base_url: self.api_base_url.clone(),
            }),
            ProviderKind::Anthropic => Ok(ProviderSettings::Anthropic {
                api_key: self.require_api_key()?,
            }),
            ProviderKind::Azure => {
                let extra = self.extra.as_ref();
                let endpoint = extra
                    .and_then(|c| c.get("azure_endpoint"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .or_else(|| self.api_base_url.clone())
                    .ok_or_else(|| {
                        BotError::InvalidProviderConfig("azure_endpoint is required".to_string())
                    })?;
                let api_version = extra
                    .and_then(|c| c.get("api_version"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("2024-07-01-preview")
                    .to_string();
                let deployment = extra
                    .and_then(|c| c.get("deployment_id"))
                    .and_then(|v| v.as_str())
                    .unwrap_or(&self.model)
                    .to_string();
                Ok(ProviderSettings::Azure {
                    api_key: self.require_api_key()?,
                    endpoint,
                    api_version,
                    deployment,
                })
            }
        }
    }

    fn require_api_key(&self) -> Result<String, BotError> {
        self.api_key
            .clone()
            .ok_or(BotError::MissingApiKey(self.provider))
    }
}

/// Per-provider connection settings, one variant per backend.
///
/// Simple providers carry just a key (and optionally a base URL override);
/// Azure needs the full endpoint/version/deployment wiring. `Debug`
/// output redacts the key.
#[derive(Clone, PartialEq, Eq)]
pub enum ProviderSettings {
    OpenAi {
        api_key: String,
        base_url: Option<String>,
    },
    Deepseek {
        api_key: String,
        base_url: Option<String>,
    },
    Anthropic {
        api_key: String,
    },
    Azure {
        api_key: String,
        endpoint: String,
        api_version: String,
        deployment: String,
    },
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderSettings::OpenAi { base_url, .. } => f
                .debug_struct("OpenAi")
                .field("api_key", &"<redacted>")
                .field("base_url", base_url)
                .finish(),
            ProviderSettings::Deepseek { base_url, .. } => f
                .debug_struct("Deepseek")
                .field("api_key", &"<redacted>")
                .field("base_url", base_url)
                .finish(),
            ProviderSettings::Anthropic { .. } => f
                .debug_struct("Anthropic")
                .field("api_key", &"<redacted>")
                .finish(),
            ProviderSettings::Azure {
                endpoint,
                api_version,
                deployment,
                ..
            } => f
                .debug_struct("Azure")
                .field("api_key", &"<redacted>")
                .field("endpoint", endpoint)
                .field("api_version", api_version)
                .field("deployment", deployment)
                .finish(),
        }
    }
}

/// Request payload for creating a bot. Only `name`, `display_name`, and
/// `model_name` are required; everything else gets defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBotRequest {
    pub name: String,
    pub display_name: String,
    pub model_name: String,
    pub provider: ProviderKind,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub system_prompt: Option<String>,
    /// Scaled x100 (0-200); defaults to 70 (logical 0.7).
    pub temperature: Option<i32>,
    pub max_tokens: Option<u32>,
    pub is_public: Option<bool>,
    pub auto_trigger: Option<bool>,
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub config: Option<serde_json::Value>,
}

/// Request payload for updating a bot. All fields optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBotRequest {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub model_name: Option<String>,
    pub system_prompt: Option<String>,
    pub temperature: Option<i32>,
    pub max_tokens: Option<u32>,
    pub is_active: Option<bool>,
    pub is_public: Option<bool>,
    pub auto_trigger: Option<bool>,
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub config: Option<serde_json::Value>,
}
