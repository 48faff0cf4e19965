//! Turns any provider result into a single base64 data URI.
//!
//! - `DataUri` passes through untouched.
//! - `InlineImageBytes` is encoded directly.
//! - `RemoteImageUrl` is fetched once and fully buffered before encoding.
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use crate::error::{AppError, AppResult};
use crate::provider::ProviderResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    pub data_uri: String,
    pub mime: String,
}

#[derive(Clone)]
pub struct ResponseNormalizer {
    client: Client,
}

impl ResponseNormalizer {
    pub fn new(client: Client) -> Self {
        ResponseNormalizer { client }
    }

    pub async fn normalize(&self, result: ProviderResult) -> AppResult<NormalizedImage> {
        match result {
            ProviderResult::DataUri(data_uri) => {
                let mime = data_uri_mime(&data_uri).unwrap_or("image/png").to_string();
                Ok(NormalizedImage { data_uri, mime })
            }
            ProviderResult::InlineImageBytes { bytes, content_type } => {
                encode_image(&bytes, content_type.as_deref())
            }
            ProviderResult::RemoteImageUrl(url) => self.fetch(&url).await,
        }
    }

    async fn fetch(&self, url: &str) -> AppResult<NormalizedImage> {
        tracing::info!("Fetching generated image from {}", url);
        let response = self.client.get(url).send().await.map_err(AppError::HttpClient)?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Image fetch failed. Status: {}", status);
            return Err(AppError::FetchFailed(status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(AppError::HttpClient)?;
        encode_image(&bytes, content_type.as_deref())
    }
}

/// PNG unless the declared type says JPEG.
pub fn mime_for(content_type: Option<&str>) -> &'static str {
    match content_type.map(str::to_ascii_lowercase) {
        Some(ct) if ct.contains("jpeg") || ct.contains("jpg") => "image/jpeg",
        _ => "image/png",
    }
}

pub fn encode_image(bytes: &[u8], content_type: Option<&str>) -> AppResult<NormalizedImage> {
    if bytes.is_empty() {
        return Err(AppError::NoImageReturned);
    }
    let mime = mime_for(content_type);
    Ok(NormalizedImage {
        data_uri: format!("data:{};base64,{}", mime, STANDARD.encode(bytes)),
        mime: mime.to_string(),
    })
}

fn data_uri_mime(uri: &str) -> Option<&str> {
    let header = uri.strip_prefix("data:")?.split(',').next()?;
    let mime = header.split(';').next()?;
    if mime.is_empty() {
        None
    } else {
        Some(mime)
    }
}

/// Split a base64 data URI back into its MIME type and bytes.
pub fn decode_data_uri(uri: &str) -> AppResult<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| AppError::Upstream("not a data URI".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| AppError::Upstream("data URI has no payload".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(AppError::Upstream("data URI is not base64 encoded".to_string()));
    }
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| AppError::Upstream(format!("invalid base64 payload: {}", e)))?;
    let mime = data_uri_mime(uri).unwrap_or("image/png").to_string();
    Ok((mime, bytes))
}
