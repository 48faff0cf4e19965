//! Prompt composition for coloring-book pages.
pub mod composer;

pub use composer::{ComposedPrompt, PromptComposer, NEGATIVE_PROMPT, STYLE_PREFIX};
