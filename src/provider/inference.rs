//! Direct text-to-image call against a hosted inference endpoint.
//!
//! One `POST {base}/{model}`; a successful reply is the raw image.
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::error::{classify_upstream, AppError, AppResult};
use crate::prompt::ComposedPrompt;
use crate::provider::output::extract_image;
use crate::provider::{
    ensure_success, error_message, GenerationParams, ImageProvider, ProviderResult,
};

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters<'a>,
    options: InferenceOptions,
}

#[derive(Serialize)]
struct InferenceParameters<'a> {
    width: u32,
    height: u32,
    num_inference_steps: u32,
    guidance_scale: f32,
    negative_prompt: &'a str,
}

#[derive(Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

pub struct InferenceProvider {
    client: Client,
    base_url: String,
    model: String,
    token: Option<String>,
}

impl InferenceProvider {
    pub fn new(client: Client, base_url: String, model: String, token: Option<String>) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        InferenceProvider { client, base_url, model, token }
    }

    pub fn from_config(config: &Config, client: Client) -> Self {
        Self::new(
            client,
            config.inference_url.clone(),
            config.hf_model.clone(),
            config.hf_token.clone(),
        )
    }
}

#[async_trait]
impl ImageProvider for InferenceProvider {
    fn name(&self) -> &'static str {
        "inference"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &ComposedPrompt,
        params: &GenerationParams,
    ) -> AppResult<ProviderResult> {
        let token = self.token.as_deref().ok_or(AppError::MissingCredential)?;
        let url = format!("{}/{}", self.base_url, self.model);
        let request = InferenceRequest {
            inputs: prompt.full(),
            parameters: InferenceParameters {
                width: params.width,
                height: params.height,
                num_inference_steps: params.steps,
                guidance_scale: params.guidance_scale,
                negative_prompt: &params.negative_prompt,
            },
            options: InferenceOptions { wait_for_model: true },
        };

        tracing::info!(model = %self.model, "Sending prompt to inference endpoint at URL: {}", url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(AppError::HttpClient)?;
        let response = ensure_success(response).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // Some routed models answer with JSON (an error, or a reference to the image).
        if content_type.as_deref().map_or(false, |ct| ct.starts_with("application/json")) {
            let value: Value = response.json().await.map_err(AppError::HttpClient)?;
            if let Some(message) = value.get("error").and_then(Value::as_str) {
                return Err(classify_upstream(None, message));
            }
            return extract_image(value, None);
        }

        if !is_image_body(content_type.as_deref()) {
            let text = response.text().await.map_err(AppError::HttpClient)?;
            tracing::error!(content_type = ?content_type, "Inference reply is not an image");
            return Err(classify_upstream(None, error_message(&text)));
        }

        let bytes = response.bytes().await.map_err(AppError::HttpClient)?.to_vec();
        if bytes.is_empty() {
            return Err(AppError::NoImageReturned);
        }
        tracing::debug!(len = bytes.len(), content_type = ?content_type, "received image bytes");
        Ok(ProviderResult::InlineImageBytes { bytes, content_type })
    }
}

/// Raw bodies count as an image only when typed as one, or left untyped.
fn is_image_body(content_type: Option<&str>) -> bool {
    match content_type.map(str::to_ascii_lowercase) {
        Some(ct) => ct.starts_with("image/") || ct.starts_with("application/octet-stream"),
        None => true,
    }
}
