//! Prompt system for Footprint answer synthesis.
//!
//! - YAML prompt definitions with a built-in cited-answer default
//! - Handlebars rendering of the question and numbered context blocks

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{default_prompt, load_prompt, DEFAULT_PROMPT_ID};
pub use types::{BuiltPrompt, BuiltPromptMetadata, ContextBlock, PromptDefinition};
