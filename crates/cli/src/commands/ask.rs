//! Ask command handler.
//!
//! Plans the question, retrieves context from the footprint, and streams a
//! cited answer. Ctrl-C stops generation and discards the partial answer.

use super::{print_json, Workspace};
use clap::Args;
use footprint_core::{config::AppConfig, AppError, AppResult};
use footprint_knowledge::embeddings::create_provider;
use footprint_knowledge::rag::AnswerBody;
use footprint_knowledge::{Assistant, Citation};
use footprint_llm::{create_client, LlmStream};
use footprint_prompt::{load_prompt, DEFAULT_PROMPT_ID};
use futures::StreamExt;
use std::io::Write;
use std::path::PathBuf;

/// Ask a question about the footprint
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: Option<String>,

    /// Read the question from a file
    #[arg(short, long, conflicts_with = "question")]
    pub file: Option<PathBuf>,

    /// Prompt definition id under .footprint/prompts/
    #[arg(long, default_value = DEFAULT_PROMPT_ID)]
    pub prompt: String,

    /// Wait for the whole answer instead of streaming it
    #[arg(long)]
    pub no_stream: bool,

    /// Output as JSON (implies --no-stream)
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let question = self.question()?;
        config.validate()?;

        let workspace = Workspace::open(config)?;
        let embedder = create_provider(&workspace.index.embedding)?;
        let generator =
            create_client(&config.provider, config.endpoint(), config.timeout_secs())?;
        let prompt = load_prompt(&config.workspace, &self.prompt)?;

        let assistant = Assistant::new(
            embedder,
            workspace.vectors,
            workspace.documents,
            generator,
            workspace.index,
            &config.model,
        )
        .with_prompt(prompt);

        let answer = assistant.answer(&question).await?;

        if self.json || self.no_stream {
            let response = answer.into_response().await?;
            if self.json {
                return print_json(&response);
            }
            println!("{}", response.answer);
            print_sources(&response.citations);
            return Ok(());
        }

        match answer.body {
            AnswerBody::NoInformation => {
                println!("{}", footprint_knowledge::rag::NO_INFORMATION_ANSWER);
            }
            AnswerBody::Stream(stream) => {
                if !stream_to_stdout(stream).await? {
                    eprintln!("\nInterrupted.");
                    return Ok(());
                }
                print_sources(&answer.citations);
            }
        }

        Ok(())
    }

    fn question(&self) -> AppResult<String> {
        let text = match (&self.question, &self.file) {
            (Some(question), _) => question.clone(),
            (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| {
                AppError::Config(format!("Failed to read question file {:?}: {}", path, e))
            })?,
            (None, None) => return Err(AppError::Config("No question provided".to_string())),
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Config("Question is empty".to_string()));
        }
        Ok(text.to_string())
    }
}

/// Print chunks as they arrive. Returns false when interrupted.
async fn stream_to_stdout(mut stream: LlmStream) -> AppResult<bool> {
    let mut stdout = std::io::stdout();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Generation interrupted");
                return Ok(false);
            }
            next = stream.next() => {
                let Some(chunk) = next else { break };
                let chunk = chunk?;
                print!("{}", chunk.content);
                stdout.flush().ok();
                if chunk.done {
                    if let Some(usage) = chunk.usage {
                        tracing::debug!(
                            "Token usage - Prompt: {}, Completion: {}, Total: {}",
                            usage.prompt_tokens,
                            usage.completion_tokens,
                            usage.total_tokens
                        );
                    }
                    break;
                }
            }
        }
    }

    println!();
    Ok(true)
}

fn print_sources(citations: &[Citation]) {
    if citations.is_empty() {
        return;
    }

    println!("\nSources:");
    for citation in citations {
        let title = citation.title.as_deref().unwrap_or(&citation.id);
        match &citation.url {
            Some(url) => println!(
                "  [{}] {} ({}, {}) {}",
                citation.index, title, citation.source, citation.date, url
            ),
            None => println!(
                "  [{}] {} ({}, {})",
                citation.index, title, citation.source, citation.date
            ),
        }
    }
}
