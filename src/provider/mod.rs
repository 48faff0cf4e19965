//! Image providers: interchangeable backends that turn a composed prompt into
//! image data.
//!
//! - `inference`: one synchronous call to a hosted text-to-image endpoint.
//! - `space_queue`: queue join, then read the space's event stream.
//! - `space_call`: the space's call API (what the client libraries use).
//! - `mock`: scripted in-process provider for tests and offline runs.
//!
//! The backend is picked once from [`Config`] by [`from_config`].
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;

use crate::config::{Config, ProviderKind};
use crate::error::{classify_upstream, AppError, AppResult};
use crate::prompt::{ComposedPrompt, NEGATIVE_PROMPT};

pub mod inference;
pub mod mock;
pub mod output;
pub mod space;
pub mod space_call;
pub mod space_queue;

pub use inference::InferenceProvider;
pub use mock::MockProvider;
pub use space_call::SpaceCallProvider;
pub use space_queue::SpaceQueueProvider;

/// Whatever a backend handed back, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderResult {
    InlineImageBytes {
        bytes: Vec<u8>,
        content_type: Option<String>,
    },
    RemoteImageUrl(String),
    DataUri(String),
}

/// Fixed per deployment; never taken from the request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub guidance_scale: f32,
    pub negative_prompt: String,
}

impl GenerationParams {
    pub fn from_config(config: &Config) -> Self {
        GenerationParams {
            width: config.image_width,
            height: config.image_height,
            steps: config.inference_steps,
            guidance_scale: config.guidance_scale,
            negative_prompt: NEGATIVE_PROMPT.to_string(),
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        GenerationParams {
            width: 1024,
            height: 1024,
            steps: 4,
            guidance_scale: 3.5,
            negative_prompt: NEGATIVE_PROMPT.to_string(),
        }
    }
}

#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Short backend identifier, as accepted by `INKLINGS_PROVIDER`.
    fn name(&self) -> &'static str;

    fn model(&self) -> &str;

    /// Submit one prompt. Implementations never retry.
    async fn generate(
        &self,
        prompt: &ComposedPrompt,
        params: &GenerationParams,
    ) -> AppResult<ProviderResult>;
}

pub fn http_client(timeout: Duration) -> AppResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(AppError::HttpClient)
}

pub async fn ensure_success(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error body".to_string());
    let message = error_message(&body);
    tracing::error!("Provider request failed. Status: {}, Body: {}", status, message);
    Err(classify_upstream(Some(status), message))
}

/// Pull a readable message out of an error body: `{"error": "..."}` or
/// `{"detail": "..."}` when present, otherwise the raw text.
pub fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let from_json = parsed.as_ref().and_then(|v| {
        v.get("error")
            .or_else(|| v.get("detail"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    let message = from_json.unwrap_or_else(|| body.trim().to_string());
    message.chars().take(300).collect()
}

pub fn from_config(config: &Config, client: Client) -> Arc<dyn ImageProvider> {
    match config.provider {
        ProviderKind::Inference => Arc::new(InferenceProvider::from_config(config, client)),
        ProviderKind::SpaceQueue => Arc::new(SpaceQueueProvider::from_config(config, client)),
        ProviderKind::SpaceCall => Arc::new(SpaceCallProvider::from_config(config, client)),
        ProviderKind::Mock => Arc::new(MockProvider::new().with_model(config.hf_model.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(provider: &str) -> Config {
        let map: HashMap<&str, &str> = [("INKLINGS_PROVIDER", provider)].into_iter().collect();
        Config::from_lookup(|k| map.get(k).map(|v| v.to_string())).unwrap()
    }

    #[test]
    fn selects_backend_from_config() {
        let client = Client::new();
        assert_eq!(from_config(&config("inference"), client.clone()).name(), "inference");
        assert_eq!(from_config(&config("space-queue"), client.clone()).name(), "space-queue");
        assert_eq!(from_config(&config("space-call"), client.clone()).name(), "space-call");
        assert_eq!(from_config(&config("mock"), client).name(), "mock");
    }

    #[test]
    fn error_message_prefers_json_fields() {
        assert_eq!(error_message(r#"{"error":"Model is loading"}"#), "Model is loading");
        assert_eq!(error_message(r#"{"detail":"Not Found"}"#), "Not Found");
        assert_eq!(error_message("  plain text  "), "plain text");
    }

    #[test]
    fn params_follow_config() {
        let params = GenerationParams::from_config(&config("inference"));
        assert_eq!(params, GenerationParams::default());
    }
}
