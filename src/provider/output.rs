//! Image reference extraction from heterogeneous provider output.
//!
//! Spaces answer with a list of outputs whose first entry is the image, but
//! the exact shape depends on the backend version: a file object with `url`
//! and/or `path`, a bare string, or the same nested one level deeper. Each
//! shape is an explicit case; anything else is `NoImageReturned`.
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::provider::ProviderResult;

const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".webp", ".gif"];

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OutputShape {
    Nested(Vec<OutputShape>),
    File {
        url: Option<String>,
        path: Option<String>,
    },
    Text(String),
    Other(Value),
}

impl OutputShape {
    /// `file_base` is the space root used to turn server-side paths into URLs.
    pub fn resolve(&self, file_base: Option<&str>) -> Option<ProviderResult> {
        match self {
            OutputShape::Nested(items) => items.iter().find_map(|item| item.resolve(file_base)),
            OutputShape::File { url, path } => url
                .as_deref()
                .and_then(|u| resolve_text(u, file_base))
                .or_else(|| path.as_deref().and_then(|p| resolve_path(p, file_base))),
            OutputShape::Text(text) => resolve_text(text, file_base),
            OutputShape::Other(_) => None,
        }
    }
}

pub fn extract_image(value: Value, file_base: Option<&str>) -> AppResult<ProviderResult> {
    let shape: OutputShape = serde_json::from_value(value)?;
    shape.resolve(file_base).ok_or_else(|| {
        tracing::warn!("provider output had no recognizable image reference");
        AppError::NoImageReturned
    })
}

pub fn file_url(base: &str, path: &str) -> String {
    format!("{}/gradio_api/file={}", base.trim_end_matches('/'), path)
}

fn resolve_text(text: &str, file_base: Option<&str>) -> Option<ProviderResult> {
    let text = text.trim();
    if text.starts_with("data:") {
        Some(ProviderResult::DataUri(text.to_string()))
    } else if text.starts_with("http://") || text.starts_with("https://") {
        Some(ProviderResult::RemoteImageUrl(text.to_string()))
    } else if looks_like_image_path(text) {
        resolve_path(text, file_base)
    } else {
        None
    }
}

fn resolve_path(path: &str, file_base: Option<&str>) -> Option<ProviderResult> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    if path.starts_with("http://") || path.starts_with("https://") {
        return Some(ProviderResult::RemoteImageUrl(path.to_string()));
    }
    file_base.map(|base| ProviderResult::RemoteImageUrl(file_url(base, path)))
}

fn looks_like_image_path(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: &str = "https://space.example";

    #[test]
    fn file_object_prefers_url() {
        let out = extract_image(
            json!([{ "url": "https://cdn.example/a.webp", "path": "/tmp/a.webp" }, 42]),
            Some(BASE),
        )
        .unwrap();
        assert_eq!(out, ProviderResult::RemoteImageUrl("https://cdn.example/a.webp".into()));
    }

    #[test]
    fn path_only_is_served_from_space() {
        let out =
            extract_image(json!([{ "path": "/tmp/gradio/x.png", "url": null }]), Some(BASE))
                .unwrap();
        let expected = "https://space.example/gradio_api/file=/tmp/gradio/x.png";
        assert_eq!(out, ProviderResult::RemoteImageUrl(expected.into()));
    }

    #[test]
    fn list_of_lists_is_walked() {
        let shape = json!([[{ "image": null }, "https://cdn.example/b.png"]]);
        let out = extract_image(shape, Some(BASE)).unwrap();
        assert_eq!(out, ProviderResult::RemoteImageUrl("https://cdn.example/b.png".into()));
    }

    #[test]
    fn data_uri_string_passes_through() {
        let out = extract_image(json!(["data:image/png;base64,AAAA"]), None).unwrap();
        assert_eq!(out, ProviderResult::DataUri("data:image/png;base64,AAAA".into()));
    }

    #[test]
    fn plain_text_and_numbers_fail_closed() {
        let err = extract_image(json!(["a lovely picture", 1234, true]), Some(BASE)).unwrap_err();
        assert!(matches!(err, AppError::NoImageReturned));
        let err = extract_image(json!({ "seed": 7 }), Some(BASE)).unwrap_err();
        assert!(matches!(err, AppError::NoImageReturned));
        let err = extract_image(json!([]), Some(BASE)).unwrap_err();
        assert!(matches!(err, AppError::NoImageReturned));
    }

    #[test]
    fn bare_path_without_base_fails_closed() {
        let err = extract_image(json!(["/tmp/gradio/x.png"]), None).unwrap_err();
        assert!(matches!(err, AppError::NoImageReturned));
    }
}
