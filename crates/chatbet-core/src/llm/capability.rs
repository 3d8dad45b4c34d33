//! ModelCapability trait definition.

use chatbet_types::llm::{ModelError, ModelRequest, ModelResponse};

/// A language model able to answer with JSON constrained by a response schema.
///
/// Uses native async fn in traits (RPITIT). Implementations live in
/// chatbet-infra (e.g., `OpenAiCompatModel`). Callers still enforce
/// `request.timeout` themselves; implementations should honour it too.
pub trait ModelCapability: Send + Sync {
    /// Human-readable provider name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Send the prompt and return the raw structured output.
    fn invoke(
        &self,
        request: &ModelRequest,
    ) -> impl std::future::Future<Output = Result<ModelResponse, ModelError>> + Send;
}
