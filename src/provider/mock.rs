use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{AppError, AppResult};
use crate::prompt::ComposedPrompt;
use crate::provider::{GenerationParams, ImageProvider, ProviderResult};

/// 1x1 PNG returned when nothing has been scripted.
pub const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77,
    0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, // IDAT
    0x54, 0x08, 0x99, 0x63, 0xF8, 0xCF, 0xC0, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0xE2, 0x25,
    0x00, 0xBC, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, // IEND
    0x44, 0xAE, 0x42, 0x60, 0x82,
];

type ErrorFactory = Arc<dyn Fn() -> AppError + Send + Sync>;

#[derive(Clone)]
enum Scripted {
    Image(ProviderResult),
    Fail(ErrorFactory),
}

pub struct MockProvider {
    model: String,
    responses: Arc<Mutex<Vec<Scripted>>>,
    call_count: Arc<Mutex<usize>>,
    last_prompt: Arc<Mutex<Option<String>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            model: "mock".to_string(),
            responses: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            last_prompt: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_result(self, result: ProviderResult) -> Self {
        self.responses.lock().unwrap().push(Scripted::Image(result));
        self
    }

    /// Queue a failure. Errors are not `Clone`, so a factory builds one per call.
    pub fn with_error<F>(self, make: F) -> Self
    where
        F: Fn() -> AppError + Send + Sync + 'static,
    {
        self.responses.lock().unwrap().push(Scripted::Fail(Arc::new(make)));
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Full composed prompt of the most recent call.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &ComposedPrompt,
        _params: &GenerationParams,
    ) -> AppResult<ProviderResult> {
        let count = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count
        };
        *self.last_prompt.lock().unwrap() = Some(prompt.full().to_string());

        let next = {
            let responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                None
            } else {
                Some(responses[(count - 1) % responses.len()].clone())
            }
        };

        match next {
            None => Ok(ProviderResult::InlineImageBytes {
                bytes: TINY_PNG.to_vec(),
                content_type: Some("image/png".to_string()),
            }),
            Some(Scripted::Image(result)) => Ok(result),
            Some(Scripted::Fail(make)) => Err(make()),
        }
    }
}
