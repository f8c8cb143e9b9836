//! Prompt builder: renders the question and context blocks through Handlebars.

use crate::types::{BuiltPrompt, BuiltPromptMetadata, ContextBlock, PromptDefinition};
use footprint_core::{AppError, AppResult};
use handlebars::Handlebars;

/// Build a synthesis prompt from a definition, the question and its context.
///
/// # Example
/// ```
/// use footprint_prompt::{build_prompt, default_prompt};
///
/// let built = build_prompt(&default_prompt(), "What do they build?", &[]).unwrap();
/// assert!(built.user.contains("What do they build?"));
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    question: &str,
    context: &[ContextBlock],
) -> AppResult<BuiltPrompt> {
    tracing::debug!(
        "Building prompt '{}' with {} context blocks",
        definition.id,
        context.len()
    );

    let data = serde_json::json!({
        "question": question,
        "context": context,
        "hasContext": !context.is_empty(),
    });

    let user = render_template(&definition.template, &data)?;

    Ok(BuiltPrompt {
        system: definition.system.clone(),
        user,
        metadata: BuiltPromptMetadata {
            source_prompt_id: definition.id.clone(),
            context_blocks: context.len(),
        },
    })
}

/// Render a Handlebars template with the given data.
fn render_template(template: &str, data: &serde_json::Value) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text prompts, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", data)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
