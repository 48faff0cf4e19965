//! Common error type and alias.
//!
//! Every failure a request can hit is one `AppError` variant. The HTTP layer
//! only ever needs `status_code()` and `user_message()`; logs get `Display`.
use axum::http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("prompt is empty or not a string")]
    InvalidPrompt,

    #[error("provider credential is not configured")]
    MissingCredential,

    #[error("provider rejected credentials: {0}")]
    AuthFailure(String),

    #[error("provider rate limit: {0}")]
    RateLimited(String),

    #[error("provider returned no image")]
    NoImageReturned,

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("gave up after {0} stream reads without a result")]
    Timeout(usize),

    #[error("failed to fetch generated image: {0}")]
    FetchFailed(StatusCode),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Stable machine-readable code, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidPrompt => "INVALID_PROMPT",
            AppError::MissingCredential => "MISSING_CREDENTIAL",
            AppError::AuthFailure(_) => "AUTH_FAILURE",
            AppError::RateLimited(_) => "RATE_LIMITED",
            AppError::NoImageReturned => "NO_IMAGE_RETURNED",
            AppError::Timeout(_) => "TIMEOUT",
            AppError::HttpClient(e) if e.is_timeout() => "TIMEOUT",
            AppError::FetchFailed(_) => "FETCH_FAILED",
            AppError::Config(_) => "CONFIG",
            AppError::Upstream(_) | AppError::HttpClient(_) | AppError::Serialization(_) => {
                "UPSTREAM_ERROR"
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidPrompt => StatusCode::BAD_REQUEST,
            AppError::AuthFailure(_) => StatusCode::UNAUTHORIZED,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short, friendly text returned to the browser.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::InvalidPrompt => "Please describe what you'd like to color!",
            AppError::MissingCredential => {
                "Oops! The coloring machine isn't set up yet. Please add your HF_TOKEN."
            }
            AppError::AuthFailure(_) => "The coloring machine needs a valid HF_TOKEN to work!",
            AppError::RateLimited(_) => {
                "Whoa, too many drawings! Please wait a moment and try again."
            }
            _ => "Oops! Something went wrong. Please try again!",
        }
    }
}

const AUTH_MARKERS: &[&str] = &[
    "unauthorized",
    "authorization",
    "invalid credentials",
    "invalid token",
    "401",
];

const RATE_LIMIT_MARKERS: &[&str] = &["rate limit", "too many requests", "quota"];

/// Map an upstream failure onto the error taxonomy.
///
/// The status wins when it is conclusive; otherwise the message is matched
/// against a fixed list of substrings (case-insensitive).
pub fn classify_upstream(status: Option<StatusCode>, message: impl Into<String>) -> AppError {
    let message = message.into();
    if let Some(status) = status {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return AppError::AuthFailure(message);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return AppError::RateLimited(message);
        }
    }

    let lower = message.to_lowercase();
    if AUTH_MARKERS.iter().any(|m| lower.contains(m)) {
        AppError::AuthFailure(message)
    } else if RATE_LIMIT_MARKERS.iter().any(|m| lower.contains(m)) {
        AppError::RateLimited(message)
    } else {
        match status {
            Some(status) => AppError::Upstream(format!("status {}: {}", status, message)),
            None => AppError::Upstream(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_table() {
        assert_eq!(AppError::InvalidPrompt.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::AuthFailure("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::RateLimited("x".into()).status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::MissingCredential.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::Timeout(200).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            AppError::FetchFailed(StatusCode::NOT_FOUND).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn classify_prefers_status() {
        let err = classify_upstream(Some(StatusCode::UNAUTHORIZED), "nope");
        assert!(matches!(err, AppError::AuthFailure(_)));
        let err = classify_upstream(Some(StatusCode::FORBIDDEN), "nope");
        assert!(matches!(err, AppError::AuthFailure(_)));
        let err = classify_upstream(Some(StatusCode::TOO_MANY_REQUESTS), "slow down");
        assert!(matches!(err, AppError::RateLimited(_)));
    }

    #[test]
    fn classify_falls_back_to_message() {
        let err = classify_upstream(None, "Invalid credentials in Authorization header");
        assert!(matches!(err, AppError::AuthFailure(_)));
        let err = classify_upstream(None, "You have exceeded your GPU quota");
        assert!(matches!(err, AppError::RateLimited(_)));
        let err = classify_upstream(Some(StatusCode::SERVICE_UNAVAILABLE), "model is loading");
        assert_eq!(err.kind(), "UPSTREAM_ERROR");
    }

    #[test]
    fn auth_message_mentions_token() {
        assert!(AppError::AuthFailure(String::new()).user_message().contains("HF_TOKEN"));
    }
}
