//! Configuration loading for Parley.
//!
//! Reads `config.toml` from the data directory (`~/.parley/` in
//! production) and deserializes it into
//! [`AppConfig`](parley_types::config::AppConfig). Falls back to defaults
//! when the file is missing or malformed.

use std::path::{Path, PathBuf};

use parley_types::config::AppConfig;

/// Resolve the data directory: `PARLEY_DATA_DIR` env var, falling back
/// to `~/.parley`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PARLEY_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".parley")
}

/// The SQLite URL for the database file inside a data directory.
pub fn database_url(data_dir: &Path) -> String {
    format!("sqlite://{}?mode=rwc", data_dir.join("parley.db").display())
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`AppConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns
///   the default.
/// - If the file exists and parses successfully, returns the parsed
///   config.
pub async fn load_config(data_dir: &Path) -> AppConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(
                "No config.toml found at {}, using defaults",
                config_path.display()
            );
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!(
                "Failed to read {}: {err}, using defaults",
                config_path.display()
            );
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config.condenser.threshold, 10);
        assert_eq!(config.agent.max_attempts, 1);
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[trigger]
keywords = ["helper"]
patterns = ["urgent"]

[agent]
request_timeout_secs = 30
max_cached_agents = 16
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.trigger.keywords, vec!["helper"]);
        assert_eq!(config.trigger.patterns, vec!["urgent"]);
        assert_eq!(config.agent.request_timeout_secs, 30);
        assert_eq!(config.agent.max_cached_agents, Some(16));
        // Untouched sections keep their defaults.
        assert_eq!(config.condenser.keep_recent, 8);
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.condenser.threshold, 10);
    }

    #[test]
    fn database_url_points_into_data_dir() {
        let url = database_url(Path::new("/tmp/parley-data"));
        assert!(url.starts_with("sqlite://"));
        assert!(url.contains("/tmp/parley-data/parley.db"));
    }
}
