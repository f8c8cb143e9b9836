//! Prompt loader for YAML prompt definitions.

use crate::types::PromptDefinition;
use footprint_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Identifier of the built-in cited-answer prompt.
pub const DEFAULT_PROMPT_ID: &str = "answer.cited";

const DEFAULT_SYSTEM: &str = "You answer questions about one person using only the \
context fragments provided from their public footprint (code profile, blog feed, \
social feed, resume). Cite every claim with the fragment number in square brackets, \
like [2]. If the fragments do not contain the answer, say so plainly instead of guessing.";

const DEFAULT_TEMPLATE: &str = "Question: {{question}}

{{#if hasContext}}Context:
{{#each context}}
[{{index}}] {{source}}{{#if title}} | {{title}}{{/if}} | {{date}}{{#if url}} | {{url}}{{/if}}
{{content}}
{{/each}}
{{/if}}
Answer the question using the context above and cite sources as [n].";

/// The built-in cited-answer prompt.
pub fn default_prompt() -> PromptDefinition {
    PromptDefinition {
        id: DEFAULT_PROMPT_ID.to_string(),
        title: "Cited answer".to_string(),
        system: Some(DEFAULT_SYSTEM.to_string()),
        template: DEFAULT_TEMPLATE.to_string(),
    }
}

/// Path of a prompt override: `.footprint/prompts/<id>.yml`.
pub fn prompt_path(workspace_path: &Path, prompt_id: &str) -> PathBuf {
    workspace_path
        .join(footprint_core::config::STATE_DIR)
        .join("prompts")
        .join(format!("{}.yml", prompt_id))
}

/// Load a prompt definition by ID from the workspace.
///
/// A workspace file wins; the built-in definition is used when
/// `prompt_id` is [`DEFAULT_PROMPT_ID`] and no file exists.
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompt_path(workspace_path, prompt_id);

    if !prompt_file.exists() {
        if prompt_id == DEFAULT_PROMPT_ID {
            tracing::debug!("Using built-in prompt '{}'", prompt_id);
            return Ok(default_prompt());
        }
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!("Failed to read prompt file {:?}: {}", prompt_file, e))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt YAML {:?}: {}", prompt_file, e))
    })?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

fn validate_prompt(definition: &PromptDefinition) -> AppResult<()> {
    if definition.id.trim().is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if definition.template.trim().is_empty() {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' has an empty template",
            definition.id
        )));
    }

    Ok(())
}
