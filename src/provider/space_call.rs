//! Space backend through its call API, the same two-step exchange the
//! official client libraries perform for `predict`.
//!
//! `POST /gradio_api/call/{api}` returns an `event_id`; the result is then
//! streamed from `GET /gradio_api/call/{api}/{event_id}` as named events.
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::{classify_upstream, AppResult};
use crate::prompt::ComposedPrompt;
use crate::provider::output::extract_image;
use crate::provider::space::{space_inputs, SpaceClient};
use crate::provider::{GenerationParams, ImageProvider, ProviderResult};
use crate::utils::sse::{read_events, Flow, SseEvent};

#[derive(Debug, Deserialize)]
struct CallStarted {
    event_id: String,
}

pub struct SpaceCallProvider {
    space: SpaceClient,
    model: String,
    api_name: String,
}

impl SpaceCallProvider {
    pub fn new(space: SpaceClient, model: String, api_name: String) -> Self {
        let api_name = api_name.trim_start_matches('/').to_string();
        SpaceCallProvider { space, model, api_name }
    }

    pub fn from_config(config: &Config, client: Client) -> Self {
        let space = SpaceClient::new(
            client,
            config.space_url.clone(),
            config.hf_token.clone(),
            config.max_stream_reads,
        );
        Self::new(space, config.hf_model.clone(), config.space_api_name.clone())
    }
}

fn handle_call_event(event: &SseEvent, file_base: &str) -> AppResult<Flow<ProviderResult>> {
    match event.event.as_deref() {
        Some("complete") => {
            let value: Value = serde_json::from_str(&event.data)?;
            extract_image(value, Some(file_base)).map(Flow::Done)
        }
        Some("error") => {
            let data = event.data.trim();
            let reason = if data.is_empty() || data == "null" {
                "space reported an error"
            } else {
                data
            };
            Err(classify_upstream(None, reason))
        }
        _ => Ok(Flow::Continue),
    }
}

#[async_trait]
impl ImageProvider for SpaceCallProvider {
    fn name(&self) -> &'static str {
        "space-call"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &ComposedPrompt,
        params: &GenerationParams,
    ) -> AppResult<ProviderResult> {
        let call_path = format!("/gradio_api/call/{}", self.api_name);
        let started = self
            .space
            .post_json(&call_path, &json!({ "data": space_inputs(prompt, params) }))
            .await?;
        let started: CallStarted = serde_json::from_value(started)?;
        tracing::info!(event_id = %started.event_id, "Started space call {}", call_path);

        let response = self
            .space
            .open_stream(&format!("{}/{}", call_path, started.event_id), &[])
            .await?;

        let base = self.space.base_url();
        read_events(response.bytes_stream(), self.space.max_reads(), |event| {
            handle_call_event(&event, base)
        })
        .await
    }
}
