//! Model provider implementations.
//!
//! Contains the concrete [`ModelCapability`](chatbet_core::llm::capability::ModelCapability)
//! used in production and a factory that builds it from configuration.

pub mod openai_compat;

use chatbet_core::llm::box_capability::BoxModelCapability;
use chatbet_types::config::ModelConfig;
use chatbet_types::llm::ModelError;

use self::openai_compat::OpenAiCompatModel;
use crate::config::resolve_api_key;

/// Build the configured model capability.
///
/// Fails with [`ModelError::Authentication`] when the API key variable is unset.
pub fn create_model(config: &ModelConfig) -> Result<BoxModelCapability, ModelError> {
    let api_key = resolve_api_key(config).ok_or_else(|| {
        ModelError::Authentication(format!("environment variable {} is not set", config.api_key_env))
    })?;
    let model = OpenAiCompatModel::new(config, api_key)?;
    Ok(BoxModelCapability::new(model))
}
