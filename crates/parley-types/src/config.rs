//! Application configuration deserialized from `config.toml`.
//!
//! Every section and field has a serde default so a partial (or absent)
//! file yields a fully usable configuration.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the Parley backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub trigger: TriggerConfig,
    #[serde(default)]
    pub condenser: CondenserConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

/// HTTP server binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Trigger evaluation knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Activation keywords matched as substrings of mentions.
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    /// Extra patterns matched as substrings of message content.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            patterns: Vec::new(),
        }
    }
}

fn default_keywords() -> Vec<String> {
    ["assistant", "bot", "ai", "help"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// History condenser knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CondenserConfig {
    /// Context length at or below which condensing is a no-op.
    #[serde(default = "default_threshold")]
    pub threshold: usize,
    /// Number of most-recent entries kept verbatim when condensing.
    #[serde(default = "default_keep_recent")]
    pub keep_recent: usize,
    /// Model for the summarization call. When unset, the triggering bot's
    /// own model is used.
    #[serde(default)]
    pub summarizer_model: Option<String>,
}

impl Default for CondenserConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            keep_recent: default_keep_recent(),
            summarizer_model: None,
        }
    }
}

fn default_threshold() -> usize {
    10
}

fn default_keep_recent() -> usize {
    8
}

/// Agent invoker knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Deadline on each provider call, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Total attempts per invocation for transient provider errors
    /// (1 = no retry).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Agent cache capacity. Unset means unbounded, which is acceptable
    /// for an operator-curated bot set.
    #[serde(default)]
    pub max_cached_agents: Option<usize>,
    /// Number of prior messages pulled into the context window.
    #[serde(default = "default_context_window")]
    pub context_window: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            max_attempts: default_max_attempts(),
            max_cached_agents: None,
            context_window: default_context_window(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    1
}

fn default_context_window() -> u32 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.trigger.keywords, vec!["assistant", "bot", "ai", "help"]);
        assert!(config.trigger.patterns.is_empty());
        assert_eq!(config.condenser.threshold, 10);
        assert_eq!(config.condenser.keep_recent, 8);
        assert!(config.condenser.summarizer_model.is_none());
        assert_eq!(config.agent.request_timeout_secs, 60);
        assert_eq!(config.agent.max_attempts, 1);
        assert!(config.agent.max_cached_agents.is_none());
        assert_eq!(config.agent.context_window, 10);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
[server]
port = 9090

[condenser]
summarizer_model = "gpt-4o-mini"
"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.condenser.threshold, 10);
        assert_eq!(
            config.condenser.summarizer_model.as_deref(),
            Some("gpt-4o-mini")
        );
    }

    #[test]
    fn test_empty_toml_is_valid() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.agent.context_window, 10);
    }
}
