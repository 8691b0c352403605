//! HTTP Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use botato_core::{AgentError, Message, ThreadId, ToolSchema};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub inference: String,
    pub inference_connected: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub thread_id: ThreadId,
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendResponse {
    pub thread_id: ThreadId,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub thread_id: ThreadId,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Agent error carried to the HTTP boundary
pub struct ApiError(AgentError);

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            AgentError::UnknownThread(_) => (StatusCode::NOT_FOUND, "UNKNOWN_THREAD"),
            AgentError::LoopLimitExceeded(_) => (StatusCode::UNPROCESSABLE_ENTITY, "LOOP_LIMIT_EXCEEDED"),
            AgentError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            AgentError::Inference(_)
            | AgentError::InferenceUnavailable(_)
            | AgentError::InferenceTimeout(_)
            | AgentError::Auth(_) => (StatusCode::BAD_GATEWAY, "INFERENCE_ERROR"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "AGENT_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(code, error = %self.0, "Request failed");
        } else {
            tracing::warn!(code, error = %self.0, "Request rejected");
        }

        let body = ErrorResponse {
            error: self.0.user_message(),
            code: code.into(),
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let inference_connected = state.inference.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        inference: state.inference.name().to_string(),
        inference_connected,
    })
}

/// Tools advertised to the model
pub async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolSchema>> {
    Json(state.sessions.tools())
}

/// Start a conversation
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let thread_id = state.sessions.new_session().await?;
    Ok((StatusCode::CREATED, Json(SessionResponse { thread_id })))
}

/// Run one turn on a conversation
pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<SendRequest>,
) -> Result<Json<SendResponse>, ApiError> {
    let thread_id = ThreadId::from_string(id);
    tracing::info!(thread_id = %thread_id, question = %payload.message, "Received question");

    let answer = state.sessions.send(&thread_id, &payload.message).await?;
    tracing::info!(thread_id = %thread_id, response = %answer, "Sending response");

    Ok(Json(SendResponse {
        thread_id,
        message: answer,
    }))
}

/// Full history of a conversation
pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let thread_id = ThreadId::from_string(id);
    let messages = state.sessions.history(&thread_id).await?;
    Ok(Json(HistoryResponse { thread_id, messages }))
}
