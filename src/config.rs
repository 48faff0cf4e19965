//! Env-driven configuration for the service and CLI.
//!
//! Values are read once at startup; `dotenv` is loaded on demand by the
//! binaries. Defaults point at the public FLUX.1-schnell model and space.
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, AppResult};

pub const DEFAULT_MODEL: &str = "black-forest-labs/FLUX.1-schnell";
pub const DEFAULT_INFERENCE_URL: &str = "https://router.huggingface.co/hf-inference/models";
pub const DEFAULT_SPACE_URL: &str = "https://black-forest-labs-flux-1-schnell.hf.space";

/// Which backend strategy answers `generate` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Inference,
    SpaceQueue,
    SpaceCall,
    Mock,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Inference => "inference",
            ProviderKind::SpaceQueue => "space-queue",
            ProviderKind::SpaceCall => "space-call",
            ProviderKind::Mock => "mock",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "inference" | "direct" => Ok(ProviderKind::Inference),
            "space-queue" | "queue" => Ok(ProviderKind::SpaceQueue),
            "space-call" | "call" => Ok(ProviderKind::SpaceCall),
            "mock" => Ok(ProviderKind::Mock),
            other => Err(AppError::Config(format!("unknown provider '{}'", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_host: String,
    pub api_port: String,
    pub provider: ProviderKind,
    pub hf_token: Option<String>,
    pub hf_model: String,
    pub inference_url: String,
    pub space_url: String,
    pub space_api_name: String,
    pub space_fn_index: u32,
    pub image_width: u32,
    pub image_height: u32,
    pub inference_steps: u32,
    pub guidance_scale: f32,
    pub max_stream_reads: usize,
    pub request_timeout: Duration,
}

impl Config {
    pub fn dotenv_load() {
        dotenv::dotenv().ok();
    }

    pub fn new() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let hf_model = get("HF_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let default_steps = if hf_model.contains("schnell") { 4 } else { 25 };

        Ok(Config {
            api_host: get("API_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            api_port: get("API_PORT").unwrap_or_else(|| "3000".to_string()),
            provider: match get("INKLINGS_PROVIDER") {
                Some(v) => v.parse()?,
                None => ProviderKind::Inference,
            },
            hf_token: get("HF_TOKEN"),
            inference_url: get("HF_INFERENCE_URL")
                .unwrap_or_else(|| DEFAULT_INFERENCE_URL.to_string()),
            space_url: get("HF_SPACE_URL").unwrap_or_else(|| DEFAULT_SPACE_URL.to_string()),
            space_api_name: get("HF_SPACE_API_NAME").unwrap_or_else(|| "infer".to_string()),
            space_fn_index: parse_or("HF_SPACE_FN_INDEX", get("HF_SPACE_FN_INDEX"), 0)?,
            image_width: parse_or("IMAGE_WIDTH", get("IMAGE_WIDTH"), 1024)?,
            image_height: parse_or("IMAGE_HEIGHT", get("IMAGE_HEIGHT"), 1024)?,
            inference_steps: parse_or("INFERENCE_STEPS", get("INFERENCE_STEPS"), default_steps)?,
            guidance_scale: parse_or("GUIDANCE_SCALE", get("GUIDANCE_SCALE"), 3.5)?,
            max_stream_reads: parse_or("MAX_STREAM_READS", get("MAX_STREAM_READS"), 200)?,
            request_timeout: Duration::from_secs(parse_or(
                "REQUEST_TIMEOUT_SECS",
                get("REQUEST_TIMEOUT_SECS"),
                120,
            )?),
            hf_model,
        })
    }

    /// Log the effective configuration. The token is never printed.
    pub fn log_summary(&self) {
        tracing::info!(
            provider = self.provider.as_str(),
            model = %self.hf_model,
            inference_url = %self.inference_url,
            space_url = %self.space_url,
            hf_token = if self.hf_token.is_some() { "<set>" } else { "<unset>" },
            width = self.image_width,
            height = self.image_height,
            steps = self.inference_steps,
            guidance = self.guidance_scale,
            "configuration loaded"
        );
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> AppResult<T> {
    match raw {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has invalid value '{}'", key, v))),
        None => Ok(default),
    }
}
