//! Configuration types for ChatBet.
//!
//! `ChatBetConfig` represents the top-level `config.toml`. Every field has
//! a default so an empty or missing file yields a working configuration.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
///
/// Loaded from `~/.chatbet/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatBetConfig {
    /// Turns kept per session (and included in prompts).
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Idle time after which a session is evicted.
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: u64,

    /// How often the background pruner sweeps expired sessions.
    #[serde(default = "default_prune_interval_secs")]
    pub prune_interval_secs: u64,

    /// Minimum model confidence before the analysis engine runs on an
    /// eligible intent. `0.0` means always run.
    #[serde(default)]
    pub analysis_min_confidence: f64,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,

    #[serde(default)]
    pub prompt: PromptConfig,

    #[serde(default)]
    pub data_api: DataApiConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub server: ServerConfig,

    /// Team names recognised in user messages.
    #[serde(default = "default_known_teams")]
    pub known_teams: Vec<String>,
}

fn default_max_history() -> usize {
    10
}

fn default_session_timeout_secs() -> u64 {
    3600
}

fn default_prune_interval_secs() -> u64 {
    300
}

fn default_known_teams() -> Vec<String> {
    [
        "Barcelona",
        "Real Madrid",
        "Atletico Madrid",
        "Sevilla",
        "Liverpool",
        "Manchester City",
        "Manchester United",
        "Arsenal",
        "Chelsea",
        "Tottenham",
        "Newcastle",
        "PSG",
        "Marseille",
        "Bayern Munich",
        "Borussia Dortmund",
        "Juventus",
        "Inter Milan",
        "AC Milan",
        "Napoli",
        "Benfica",
        "Porto",
        "Ajax",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for ChatBetConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            session_timeout_secs: default_session_timeout_secs(),
            prune_interval_secs: default_prune_interval_secs(),
            analysis_min_confidence: 0.0,
            cache: CacheConfig::default(),
            timeouts: TimeoutConfig::default(),
            prompt: PromptConfig::default(),
            data_api: DataApiConfig::default(),
            model: ModelConfig::default(),
            server: ServerConfig::default(),
            known_teams: default_known_teams(),
        }
    }
}

/// Freshness windows per resource kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_tournaments_ttl_secs")]
    pub tournaments_ttl_secs: u64,
    #[serde(default = "default_fixtures_ttl_secs")]
    pub fixtures_ttl_secs: u64,
    #[serde(default = "default_odds_ttl_secs")]
    pub odds_ttl_secs: u64,
    /// How long an expired entry is kept as a stale fallback before it is evicted.
    #[serde(default = "default_stale_retain_secs")]
    pub stale_retain_secs: u64,
}

fn default_tournaments_ttl_secs() -> u64 {
    30 * 60
}

fn default_fixtures_ttl_secs() -> u64 {
    10 * 60
}

fn default_odds_ttl_secs() -> u64 {
    2 * 60
}

fn default_stale_retain_secs() -> u64 {
    60 * 60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            tournaments_ttl_secs: default_tournaments_ttl_secs(),
            fixtures_ttl_secs: default_fixtures_ttl_secs(),
            odds_ttl_secs: default_odds_ttl_secs(),
            stale_retain_secs: default_stale_retain_secs(),
        }
    }
}

/// Caller-side timeouts for the two suspending operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_model_timeout_ms")]
    pub model_timeout_ms: u64,
    #[serde(default = "default_data_timeout_ms")]
    pub data_timeout_ms: u64,
}

fn default_model_timeout_ms() -> u64 {
    30_000
}

fn default_data_timeout_ms() -> u64 {
    30_000
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            model_timeout_ms: default_model_timeout_ms(),
            data_timeout_ms: default_data_timeout_ms(),
        }
    }
}

/// Bounds on what goes into a prompt and into payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Upper bound on the data block, in characters.
    #[serde(default = "default_max_data_chars")]
    pub max_data_chars: usize,
    /// Fixtures listed in schedule answers and prompt data.
    #[serde(default = "default_max_fixtures")]
    pub max_fixtures: usize,
    /// Fixtures whose odds are fetched per turn.
    #[serde(default = "default_max_odds_fixtures")]
    pub max_odds_fixtures: usize,
}

fn default_max_data_chars() -> usize {
    6_000
}

fn default_max_fixtures() -> usize {
    10
}

fn default_max_odds_fixtures() -> usize {
    5
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            max_data_chars: default_max_data_chars(),
            max_fixtures: default_max_fixtures(),
            max_odds_fixtures: default_max_odds_fixtures(),
        }
    }
}

/// Sports data API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataApiConfig {
    #[serde(default = "default_data_base_url")]
    pub base_url: String,
    #[serde(default = "default_sport_id")]
    pub sport_id: u32,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

fn default_data_base_url() -> String {
    "https://v46fnhvrjvtlrsmnismnwhdh5y0lckdl.lambda-url.us-east-1.on.aws".to_string()
}

fn default_sport_id() -> u32 {
    1
}

fn default_language() -> String {
    "en".to_string()
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

impl Default for DataApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_data_base_url(),
            sport_id: default_sport_id(),
            language: default_language(),
            time_zone: default_time_zone(),
        }
    }
}

/// Model provider settings (OpenAI-compatible chat completions endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_model_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_api_key_env() -> String {
    "GOOGLE_AI_API_KEY".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_model_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = ChatBetConfig::default();
        assert_eq!(config.max_history, 10);
        assert_eq!(config.session_timeout_secs, 3600);
        assert_eq!(config.cache.odds_ttl_secs, 120);
        assert_eq!(config.cache.stale_retain_secs, 3600);
        assert_eq!(config.model.model, "gemini-1.5-flash");
        assert!(config.known_teams.iter().any(|t| t == "Liverpool"));
    }

    #[test]
    fn test_config_deserialize_empty_uses_defaults() {
        let config: ChatBetConfig = toml::from_str("").unwrap();
        assert_eq!(config.max_history, 10);
        assert_eq!(config.cache.fixtures_ttl_secs, 600);
        assert_eq!(config.timeouts.model_timeout_ms, 30_000);
        assert_eq!(config.server.port, 8000);
        assert!(config.analysis_min_confidence.abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_deserialize_partial_sections() {
        let toml_str = r#"
max_history = 6
analysis_min_confidence = 0.4
known_teams = ["Celtic", "Rangers"]

[cache]
odds_ttl_secs = 30

[model]
model = "gemini-2.0-flash"

[server]
port = 9090
"#;
        let config: ChatBetConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.max_history, 6);
        assert!((config.analysis_min_confidence - 0.4).abs() < f64::EPSILON);
        assert_eq!(config.known_teams, vec!["Celtic", "Rangers"]);
        assert_eq!(config.cache.odds_ttl_secs, 30);
        assert_eq!(config.cache.tournaments_ttl_secs, 1800);
        assert_eq!(config.model.model, "gemini-2.0-flash");
        assert_eq!(config.model.api_key_env, "GOOGLE_AI_API_KEY");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
    }
}
