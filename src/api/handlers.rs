//! Axum request handlers for the HTTP API.
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::Instrument;
use uuid::Uuid;

use crate::api::routes::AppState;
use crate::error::AppError;
use crate::prompt::PromptComposer;

#[derive(Debug, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A failed generation, carrying the sanitized prompt when we got that far.
pub struct ApiError {
    error: AppError,
    prompt: Option<String>,
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        ApiError { error, prompt: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = GenerationResponse {
            success: false,
            image: None,
            prompt: self.prompt,
            error: Some(self.error.user_message().to_string()),
        };
        (self.error.status_code(), Json(body)).into_response()
    }
}

pub async fn root() -> &'static str {
    "Inklings coloring page generator"
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Inklings coloring page generator is ready!",
        "model": state.generator.model(),
        "provider": state.generator.provider_name(),
    }))
}

pub async fn generate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<GenerationResponse>, ApiError> {
    let span = tracing::info_span!("generate", request_id = %Uuid::new_v4());
    run_generate(state, payload).instrument(span).await
}

async fn run_generate(
    state: Arc<AppState>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<GenerationResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!("Rejected generate body: {}", rejection);
        AppError::InvalidPrompt
    })?;
    let composed = PromptComposer::compose(&request.prompt)?;

    match state.generator.render(&composed).await {
        Ok(image) => Ok(Json(GenerationResponse {
            success: true,
            image: Some(image.data_uri),
            prompt: Some(composed.sanitized().to_string()),
            error: None,
        })),
        Err(error) => {
            tracing::error!(kind = error.kind(), "Generation error: {}", error);
            Err(ApiError {
                error,
                prompt: Some(composed.sanitized().to_string()),
            })
        }
    }
}
