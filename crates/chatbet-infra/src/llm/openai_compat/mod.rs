//! OpenAiCompatModel -- [`ModelCapability`] over any OpenAI-compatible
//! chat completions endpoint (Gemini's OpenAI beta endpoint by default).
//!
//! Structured output is requested with a strict `json_schema` response
//! format built from the request's [`ResponseSchema`](chatbet_types::llm::ResponseSchema).
//! The API key is wrapped in [`secrecy::SecretString`] and only exposed when
//! setting the authorization header.

pub mod types;

use std::time::Duration;

use chatbet_core::llm::capability::ModelCapability;
use chatbet_types::config::ModelConfig;
use chatbet_types::llm::{ModelError, ModelRequest, ModelResponse};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use self::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, JsonSchemaFormat, ResponseFormat};

/// Chat completions client for one model.
///
/// Deliberately has no `Debug` impl.
pub struct OpenAiCompatModel {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    provider_name: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl OpenAiCompatModel {
    pub fn new(config: &ModelConfig, api_key: SecretString) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ModelError::Provider(format!("failed to build HTTP client: {e}")))?;
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self {
            client,
            api_key,
            provider_name: provider_name_for(&base_url).to_string(),
            base_url,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn to_wire_request(&self, request: &ModelRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(request.system.clone()),
                ChatMessage::user(request.user.clone()),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: request.response_schema.name.clone(),
                    schema: request.response_schema.schema.clone(),
                    strict: true,
                },
            },
        }
    }
}

/// Provider label inferred from well-known base URLs.
fn provider_name_for(base_url: &str) -> &'static str {
    if base_url.contains("generativelanguage.googleapis.com") {
        "gemini"
    } else if base_url.contains("api.openai.com") {
        "openai"
    } else {
        "openai-compatible"
    }
}

fn status_error(status: StatusCode, body: String) -> ModelError {
    match status.as_u16() {
        401 | 403 => ModelError::Authentication(format!("HTTP {status}")),
        429 => ModelError::RateLimited,
        _ => ModelError::Provider(format!("HTTP {status}: {body}")),
    }
}

fn content_of(response: ChatCompletionResponse) -> Result<String, ModelError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ModelError::MalformedOutput("response has no choices".to_string()))?;
    match choice.message.content {
        Some(content) if !content.trim().is_empty() => Ok(content),
        _ => Err(ModelError::MalformedOutput(format!(
            "empty message content (finish_reason: {})",
            choice.finish_reason.as_deref().unwrap_or("unknown")
        ))),
    }
}

impl ModelCapability for OpenAiCompatModel {
    fn name(&self) -> &str {
        &self.provider_name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn invoke(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        let body = self.to_wire_request(request);
        let timeout: Duration = request.timeout;

        let response = self
            .client
            .post(self.url())
            .bearer_auth(self.api_key.expose_secret())
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout(timeout)
                } else {
                    ModelError::Provider(format!("HTTP request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(status_error(status, error_body));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ModelError::Timeout(timeout)
            } else {
                ModelError::MalformedOutput(format!("failed to parse response: {e}"))
            }
        })?;
        let model = parsed.model.clone().unwrap_or_else(|| self.model.clone());
        let content = content_of(parsed)?;
        debug!(provider = %self.provider_name, %model, chars = content.len(), "model responded");

        Ok(ModelResponse { content, model })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatbet_types::llm::ResponseSchema;
    use serde_json::json;

    fn model() -> OpenAiCompatModel {
        OpenAiCompatModel::new(&ModelConfig::default(), SecretString::from("k".to_string())).unwrap()
    }

    fn request() -> ModelRequest {
        ModelRequest {
            system: "You are a betting assistant.".to_string(),
            user: "Who plays tomorrow?".to_string(),
            response_schema: ResponseSchema {
                name: "ModelOutput".to_string(),
                schema: json!({"type": "object", "additionalProperties": false}),
            },
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn wire_request_carries_strict_json_schema() {
        let body = serde_json::to_value(model().to_wire_request(&request())).unwrap();
        assert_eq!(body["model"], "gemini-1.5-flash");
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Who plays tomorrow?");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "ModelOutput");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
    }

    #[test]
    fn provider_name_follows_base_url() {
        assert_eq!(model().name(), "gemini");
        assert_eq!(provider_name_for("https://api.openai.com/v1"), "openai");
        assert_eq!(provider_name_for("http://localhost:11434/v1"), "openai-compatible");
    }

    #[test]
    fn status_codes_map_to_model_errors() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, String::new()),
            ModelError::Authentication(_)
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, String::new()),
            ModelError::Authentication(_)
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, String::new()),
            ModelError::RateLimited
        ));
        assert!(matches!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR, "oops".to_string()),
            ModelError::Provider(ref m) if m.contains("oops")
        ));
    }

    #[test]
    fn missing_content_is_malformed_output() {
        let empty: ChatCompletionResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(content_of(empty), Err(ModelError::MalformedOutput(_))));

        let filtered: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"content": null}, "finish_reason": "content_filter"}]
        }))
        .unwrap();
        assert!(matches!(
            content_of(filtered),
            Err(ModelError::MalformedOutput(ref m)) if m.contains("content_filter")
        ));

        let ok: ChatCompletionResponse = serde_json::from_value(json!({
            "model": "gemini-1.5-flash",
            "choices": [{"message": {"content": "{\"intent\":\"general_query\"}"}}]
        }))
        .unwrap();
        assert_eq!(content_of(ok).unwrap(), "{\"intent\":\"general_query\"}");
    }

    #[tokio::test]
    async fn invoke_returns_message_content() {
        use axum::Router;
        use axum::http::HeaderMap;
        use axum::routing::post;

        let router = Router::new().route(
            "/chat/completions",
            post(|headers: HeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                axum::Json(json!({
                    "model": "test-model",
                    "choices": [{"message": {"role": "assistant", "content": auth}}]
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let config = ModelConfig {
            base_url: format!("http://{addr}"),
            ..Default::default()
        };
        let model = OpenAiCompatModel::new(&config, SecretString::from("sk-local".to_string())).unwrap();
        let response = model.invoke(&request()).await.unwrap();
        assert_eq!(response.content, "Bearer sk-local");
        assert_eq!(response.model, "test-model");
    }
}
