//! Inklings: coloring-book page generator service library
//!
//! Modules:
//! - `api`: Axum HTTP handlers and router setup used by the binary.
//! - `prompt`: Coloring-book style prefix and prompt sanitizing.
//! - `provider`: Interchangeable image-generation backends behind `ImageProvider`.
//! - `image`: Normalization of provider output into base64 data URIs.
//! - `generator`: The composed prompt → provider → normalizer pipeline.
//! - `utils`: Event-stream decoding shared by the space backends.
//! - `config`: Env-driven configuration loader.
//! - `error`: Common error type and alias.
//!
//! Re-exports are provided for common types: `Config`, `Generator`,
//! `PromptComposer`, `ImageProvider` and `ResponseNormalizer`.
pub mod api;
pub mod config;
pub mod error;
pub mod generator;
pub mod image;
pub mod prompt;
pub mod provider;
pub mod utils;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use generator::Generator;
pub use image::ResponseNormalizer;
pub use prompt::PromptComposer;
pub use provider::ImageProvider;
