//! Coloring-book prompt composition.
//!
//! The user's text is trimmed, capped at [`MAX_PROMPT_CHARS`] characters, and
//! appended to a fixed style prefix that pushes the model toward clean
//! black-and-white line art.
use crate::error::{AppError, AppResult};

pub const STYLE_PREFIX: &str = "Coloring book page illustration, black and white line art, clean bold outlines, no shading, no gradients, no color fill, no grayscale, simple design suitable for children to color in, white background, thick black lines, cartoon style, cute and friendly, ";

pub const NEGATIVE_PROMPT: &str = "color, colored, shading, gradient, grayscale, gray, photorealistic, photo, 3d render, shadows, texture, filled areas, painted, watercolor, scary, dark, violent";

pub const MAX_PROMPT_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt {
    full: String,
    sanitized: String,
}

impl ComposedPrompt {
    /// The text sent to the provider.
    pub fn full(&self) -> &str {
        &self.full
    }

    /// The user's own text after trimming and truncation.
    pub fn sanitized(&self) -> &str {
        &self.sanitized
    }
}

pub struct PromptComposer;

impl PromptComposer {
    pub fn compose(raw: &str) -> AppResult<ComposedPrompt> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidPrompt);
        }

        let sanitized: String = trimmed.chars().take(MAX_PROMPT_CHARS).collect();
        Ok(ComposedPrompt {
            full: format!("{}{}", STYLE_PREFIX, sanitized),
            sanitized,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_plus_trimmed_text() {
        let composed = PromptComposer::compose("  a dragon \n").unwrap();
        assert_eq!(composed.full(), format!("{}a dragon", STYLE_PREFIX));
        assert_eq!(composed.sanitized(), "a dragon");
        assert!(composed.full().starts_with("Coloring book page"));
    }

    #[test]
    fn rejects_blank_input() {
        assert!(matches!(PromptComposer::compose(""), Err(AppError::InvalidPrompt)));
        assert!(matches!(PromptComposer::compose(" \t\n "), Err(AppError::InvalidPrompt)));
    }

    #[test]
    fn exactly_max_length_is_kept_whole() {
        let text = "x".repeat(MAX_PROMPT_CHARS);
        let composed = PromptComposer::compose(&text).unwrap();
        assert_eq!(composed.sanitized(), text);
    }

    #[test]
    fn long_input_is_truncated_after_trim() {
        let text = format!("   {}{}", "a".repeat(MAX_PROMPT_CHARS), "b".repeat(50));
        let composed = PromptComposer::compose(&text).unwrap();
        assert_eq!(composed.sanitized(), "a".repeat(MAX_PROMPT_CHARS));
        assert_eq!(composed.full(), format!("{}{}", STYLE_PREFIX, "a".repeat(MAX_PROMPT_CHARS)));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let text = "🐉".repeat(MAX_PROMPT_CHARS + 10);
        let composed = PromptComposer::compose(&text).unwrap();
        assert_eq!(composed.sanitized().chars().count(), MAX_PROMPT_CHARS);
    }

    #[test]
    fn is_deterministic() {
        let a = PromptComposer::compose("a bunny in a garden").unwrap();
        let b = PromptComposer::compose("a bunny in a garden").unwrap();
        assert_eq!(a, b);
    }
}
