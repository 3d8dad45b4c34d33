//! Chat handlers: send a message, inspect a session's context.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use chatbet_types::analysis::{AnalysisResult, Intent};
use chatbet_types::chat::Turn;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Turns returned by the context endpoint.
const CONTEXT_TURNS: usize = 5;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Omit to start a new conversation.
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub session_id: String,
    pub result: AnalysisResult,
}

#[derive(Debug, Serialize)]
pub struct SessionContext {
    pub session_id: String,
    pub turns: Vec<Turn>,
    pub mentioned_teams: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_intent: Option<Intent>,
    pub turn_count: usize,
}

/// POST /api/v1/chat - Handle one user message.
pub async fn send_chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ApiResponse<ChatReply>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let message = body.message.trim();
    if message.is_empty() {
        return Err(AppError::Validation("message must not be empty".to_string()));
    }
    let session_id = body
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::now_v7().to_string());

    let result = state
        .orchestrator
        .handle_message(&session_id, body.user_key.as_deref(), message)
        .await;

    let elapsed = start.elapsed().as_millis() as u64;
    tracing::debug!(%session_id, intent = %result.intent, elapsed_ms = elapsed, "chat request served");
    Ok(Json(ApiResponse::success(
        ChatReply { session_id, result },
        request_id,
        elapsed,
    )))
}

/// GET /api/v1/chat/context/{session_id} - Recent turns and remembered state.
pub async fn get_context(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<SessionContext>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let session = state
        .context
        .snapshot(&session_id)
        .await
        .ok_or_else(|| AppError::SessionNotFound(session_id.clone()))?;

    let context = SessionContext {
        turns: session.recent_turns(CONTEXT_TURNS).to_vec(),
        mentioned_teams: session.mentioned_teams.clone(),
        last_intent: session.last_intent,
        turn_count: session.turns.len(),
        session_id,
    };

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(context, request_id, elapsed)))
}
