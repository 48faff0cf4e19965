//! Queue-based space backend: join the queue, then poll the event stream.
//!
//! The stream carries `data:` lines holding JSON messages tagged by `msg`.
//! Only `process_completed` and `unexpected_error` end the request; every
//! other message (estimation, heartbeats, progress) is skipped.
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{classify_upstream, AppResult};
use crate::prompt::ComposedPrompt;
use crate::provider::output::extract_image;
use crate::provider::space::{space_inputs, SpaceClient};
use crate::provider::{GenerationParams, ImageProvider, ProviderResult};
use crate::utils::sse::{read_events, Flow, SseEvent};

#[derive(Debug, Deserialize)]
#[serde(tag = "msg", rename_all = "snake_case")]
enum QueueMessage {
    ProcessCompleted {
        success: Option<bool>,
        #[serde(default)]
        output: Value,
    },
    UnexpectedError {
        message: Option<String>,
    },
    #[serde(other)]
    Other,
}

pub struct SpaceQueueProvider {
    space: SpaceClient,
    model: String,
    fn_index: u32,
}

impl SpaceQueueProvider {
    pub fn new(space: SpaceClient, model: String, fn_index: u32) -> Self {
        SpaceQueueProvider { space, model, fn_index }
    }

    pub fn from_config(config: &Config, client: Client) -> Self {
        let space = SpaceClient::new(
            client,
            config.space_url.clone(),
            config.hf_token.clone(),
            config.max_stream_reads,
        );
        Self::new(space, config.hf_model.clone(), config.space_fn_index)
    }
}

fn handle_queue_event(event: &SseEvent, file_base: &str) -> AppResult<Flow<ProviderResult>> {
    let message: QueueMessage = match serde_json::from_str(&event.data) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!("skipping unparseable queue event: {}", e);
            return Ok(Flow::Continue);
        }
    };

    match message {
        QueueMessage::ProcessCompleted { success, output } => {
            if success == Some(false) {
                let reason = output
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("space reported a failed job");
                return Err(classify_upstream(None, reason));
            }
            let data = output.get("data").cloned().unwrap_or(Value::Null);
            extract_image(data, Some(file_base)).map(Flow::Done)
        }
        QueueMessage::UnexpectedError { message } => Err(classify_upstream(
            None,
            message.unwrap_or_else(|| "space raised an unexpected error".to_string()),
        )),
        QueueMessage::Other => Ok(Flow::Continue),
    }
}

#[async_trait]
impl ImageProvider for SpaceQueueProvider {
    fn name(&self) -> &'static str {
        "space-queue"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &ComposedPrompt,
        params: &GenerationParams,
    ) -> AppResult<ProviderResult> {
        let session_hash = Uuid::new_v4().simple().to_string();
        let join = json!({
            "data": space_inputs(prompt, params),
            "event_data": null,
            "fn_index": self.fn_index,
            "trigger_id": null,
            "session_hash": session_hash,
        });

        let joined = self.space.post_json("/gradio_api/queue/join", &join).await?;
        tracing::info!(
            event_id = ?joined.get("event_id"),
            session_hash = %session_hash,
            "Joined space queue at {}",
            self.space.base_url()
        );

        let response = self
            .space
            .open_stream("/gradio_api/queue/data", &[("session_hash", session_hash.as_str())])
            .await?;

        let base = self.space.base_url();
        read_events(response.bytes_stream(), self.space.max_reads(), |event| {
            handle_queue_event(&event, base)
        })
        .await
    }
}
