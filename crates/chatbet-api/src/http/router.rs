//! Axum router configuration with middleware.
//!
//! API routes live under `/api/v1/`. Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/chat", post(handlers::chat::send_chat))
        .route("/chat/context/{session_id}", get(handlers::chat::get_context));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/", get(root))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET / - Service banner.
async fn root() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "service": "chatbet",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /health - Liveness check.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use chatbet_core::data::box_client::BoxSportsDataClient;
    use chatbet_core::data::client::SportsDataClient;
    use chatbet_core::llm::box_capability::BoxModelCapability;
    use chatbet_core::llm::capability::ModelCapability;
    use chatbet_types::config::ChatBetConfig;
    use chatbet_types::error::DataError;
    use chatbet_types::llm::{ModelError, ModelRequest, ModelResponse};
    use chatbet_types::sports::{DataRecords, DataRequest, ResourceKind};
    use serde_json::{Value, json};

    struct EmptyData;

    impl SportsDataClient for EmptyData {
        fn name(&self) -> &str {
            "empty"
        }

        async fn fetch(&self, request: &DataRequest) -> Result<DataRecords, DataError> {
            Ok(match request.kind {
                ResourceKind::Tournaments => DataRecords::Tournaments(Vec::new()),
                ResourceKind::Fixtures => DataRecords::Fixtures(Vec::new()),
                ResourceKind::Odds => DataRecords::Odds(Vec::new()),
            })
        }
    }

    struct GreetingModel;

    impl ModelCapability for GreetingModel {
        fn name(&self) -> &str {
            "fake"
        }

        fn model(&self) -> &str {
            "fake-1"
        }

        async fn invoke(&self, _request: &ModelRequest) -> Result<ModelResponse, ModelError> {
            Ok(ModelResponse {
                content: json!({
                    "intent": "general",
                    "confidence": 0.95,
                    "narrative": "Hi! Ask me about fixtures or odds.",
                    "entities": {"teams": [], "dates": []}
                })
                .to_string(),
                model: "fake-1".to_string(),
            })
        }
    }

    async fn serve() -> String {
        let state = AppState::from_parts(
            ChatBetConfig::default(),
            BoxSportsDataClient::new(EmptyData),
            BoxModelCapability::new(GreetingModel),
            PathBuf::from("."),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let base = serve().await;
        let body: Value = reqwest::get(format!("{base}/health")).await.unwrap().json().await.unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn chat_creates_session_and_context_reflects_it() {
        let base = serve().await;
        let http = reqwest::Client::new();

        let resp = http
            .post(format!("{base}/api/v1/chat"))
            .json(&json!({"message": "hello"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        let session_id = body["data"]["session_id"].as_str().unwrap().to_string();
        assert!(!session_id.is_empty());
        assert_eq!(body["data"]["result"]["intent"], "general");

        let resp = http
            .get(format!("{base}/api/v1/chat/context/{session_id}"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["data"]["turn_count"], 2);
        assert_eq!(body["data"]["turns"][0]["role"], "user");
        assert_eq!(body["data"]["last_intent"], "general");
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let base = serve().await;
        let resp = reqwest::Client::new()
            .post(format!("{base}/api/v1/chat"))
            .json(&json!({"message": "   "}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["errors"][0]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_session_context_is_404() {
        let base = serve().await;
        let resp = reqwest::get(format!("{base}/api/v1/chat/context/nope")).await.unwrap();
        assert_eq!(resp.status(), 404);
    }
}
