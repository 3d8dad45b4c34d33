//! Configuration loader for ChatBet.
//!
//! Reads `config.toml` from the data directory (`~/.chatbet/` by default)
//! and deserializes it into [`ChatBetConfig`]. Falls back to defaults when
//! the file is missing or malformed.

use std::path::{Path, PathBuf};

use chatbet_types::config::{ChatBetConfig, ModelConfig};
use secrecy::SecretString;

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`ChatBetConfig::default()`].
/// - If the file exists but fails to read or parse, logs a warning and returns the default.
pub async fn load_config(data_dir: &Path) -> ChatBetConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ChatBetConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ChatBetConfig::default();
        }
    };

    match toml::from_str::<ChatBetConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", config_path.display());
            ChatBetConfig::default()
        }
    }
}

/// Resolve the data directory.
///
/// Priority:
/// 1. `CHATBET_DATA_DIR` environment variable
/// 2. `~/.chatbet`
/// 3. `.chatbet` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CHATBET_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".chatbet");
    }

    PathBuf::from(".chatbet")
}

/// Read the model API key from the environment variable named in config.
///
/// Empty values count as missing.
pub fn resolve_api_key(config: &ModelConfig) -> Option<SecretString> {
    std::env::var(&config.api_key_env)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .map(SecretString::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config.max_history, 10);
        assert_eq!(config.server.port, 8000);
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
max_history = 4
analysis_min_confidence = 0.5
known_teams = ["Boca Juniors", "River Plate"]

[cache]
odds_ttl_secs = 30

[model]
model = "gemini-2.0-flash"
temperature = 0.2

[server]
port = 9100
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.max_history, 4);
        assert_eq!(config.analysis_min_confidence, 0.5);
        assert_eq!(config.known_teams, vec!["Boca Juniors", "River Plate"]);
        assert_eq!(config.cache.odds_ttl_secs, 30);
        // Unset keys in a present section keep their defaults.
        assert_eq!(config.cache.fixtures_ttl_secs, 600);
        assert_eq!(config.model.model, "gemini-2.0-flash");
        assert_eq!(config.model.max_tokens, 1024);
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.max_history, 10);
        assert_eq!(config.session_timeout_secs, 3600);
    }

    #[test]
    fn resolve_api_key_reads_named_variable() {
        let config = ModelConfig {
            api_key_env: "CHATBET_TEST_MODEL_KEY".to_string(),
            ..Default::default()
        };
        // SAFETY: only this test touches this variable.
        unsafe { std::env::set_var("CHATBET_TEST_MODEL_KEY", "sk-test") };
        let key = resolve_api_key(&config).unwrap();
        assert_eq!(key.expose_secret(), "sk-test");

        unsafe { std::env::set_var("CHATBET_TEST_MODEL_KEY", "  ") };
        assert!(resolve_api_key(&config).is_none());
        unsafe { std::env::remove_var("CHATBET_TEST_MODEL_KEY") };
    }

    #[test]
    fn resolve_api_key_missing_variable_is_none() {
        let config = ModelConfig {
            api_key_env: "CHATBET_TEST_UNSET_KEY".to_string(),
            ..Default::default()
        };
        assert!(resolve_api_key(&config).is_none());
    }
}
