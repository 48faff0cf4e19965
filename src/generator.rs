//! The per-request pipeline: composed prompt → provider → normalizer.
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::error::AppResult;
use crate::image::{NormalizedImage, ResponseNormalizer};
use crate::prompt::ComposedPrompt;
use crate::provider::{self, GenerationParams, ImageProvider};

pub struct Generator {
    provider: Arc<dyn ImageProvider>,
    normalizer: ResponseNormalizer,
    params: GenerationParams,
}

impl Generator {
    pub fn new(
        provider: Arc<dyn ImageProvider>,
        normalizer: ResponseNormalizer,
        params: GenerationParams,
    ) -> Self {
        Generator { provider, normalizer, params }
    }

    /// Wire up the configured provider; one HTTP client is shared by the
    /// provider and the normalizer.
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let client = provider::http_client(config.request_timeout)?;
        Ok(Self::new(
            provider::from_config(config, client.clone()),
            ResponseNormalizer::new(client),
            GenerationParams::from_config(config),
        ))
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub async fn render(&self, prompt: &ComposedPrompt) -> AppResult<NormalizedImage> {
        let started = Instant::now();
        let preview: String = prompt.sanitized().chars().take(50).collect();
        tracing::info!(provider = self.provider.name(), "Generating: {}...", preview);

        let result = self.provider.generate(prompt, &self.params).await?;
        let image = self.normalizer.normalize(result).await?;

        tracing::info!(
            mime = %image.mime,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Generated coloring page"
        );
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::prompt::PromptComposer;
    use crate::provider::{MockProvider, ProviderResult};
    use reqwest::Client;

    fn generator(provider: MockProvider) -> Generator {
        Generator::new(
            Arc::new(provider),
            ResponseNormalizer::new(Client::new()),
            GenerationParams::default(),
        )
    }

    #[tokio::test]
    async fn renders_mock_png() {
        let generator = generator(MockProvider::new());
        let prompt = PromptComposer::compose("a dragon").unwrap();
        let image = generator.render(&prompt).await.unwrap();
        assert!(image.data_uri.starts_with("data:image/png;base64,iVBORw0KGgo"));
        assert_eq!(generator.provider_name(), "mock");
    }

    #[tokio::test]
    async fn provider_errors_are_not_retried() {
        let provider = Arc::new(
            MockProvider::new()
                .with_error(|| AppError::Upstream("boom".into()))
                .with_result(ProviderResult::DataUri("data:image/png;base64,AA==".into())),
        );
        let generator = Generator::new(
            provider.clone(),
            ResponseNormalizer::new(Client::new()),
            GenerationParams::default(),
        );
        let prompt = PromptComposer::compose("a dragon").unwrap();
        assert!(generator.render(&prompt).await.is_err());
        assert_eq!(provider.get_call_count(), 1);
    }
}
