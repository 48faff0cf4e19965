//! Thin HTTP client shared by the two space-backed providers.
//!
//! - `post_json` posts a JSON body and returns the decoded JSON reply.
//! - `open_stream` starts a GET whose body is an event stream.
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::prompt::ComposedPrompt;
use crate::provider::{ensure_success, GenerationParams};

#[derive(Clone)]
pub struct SpaceClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    max_reads: usize,
}

impl SpaceClient {
    pub fn new(client: Client, base_url: String, token: Option<String>, max_reads: usize) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        SpaceClient { client, base_url, token, max_reads }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn max_reads(&self) -> usize {
        self.max_reads
    }

    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> AppResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("POST {}", url);
        let response = self
            .authorize(self.client.post(&url))
            .json(body)
            .send()
            .await
            .map_err(AppError::HttpClient)?;
        let response = ensure_success(response).await?;
        response.json().await.map_err(AppError::HttpClient)
    }

    pub async fn open_stream(&self, path: &str, query: &[(&str, &str)]) -> AppResult<Response> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {} (event stream)", url);
        let response = self
            .authorize(self.client.get(&url))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .query(query)
            .send()
            .await
            .map_err(AppError::HttpClient)?;
        ensure_success(response).await
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Positional inputs of the FLUX.1-schnell space's `infer` endpoint:
/// prompt, seed, randomize seed, width, height, steps.
pub fn space_inputs(prompt: &ComposedPrompt, params: &GenerationParams) -> Value {
    json!([prompt.full(), 0, true, params.width, params.height, params.steps])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::PromptComposer;

    #[test]
    fn inputs_are_positional() {
        let prompt = PromptComposer::compose("a dragon").unwrap();
        let inputs = space_inputs(&prompt, &GenerationParams::default());
        assert_eq!(inputs[0].as_str(), Some(prompt.full()));
        assert_eq!(inputs[2], json!(true));
        assert_eq!(inputs[3], json!(1024));
        assert_eq!(inputs[5], json!(4));
    }
}
