//! RAG (Retrieval-Augmented Generation) answering.
//!
//! Plans the query, retrieves diverse context and streams a cited answer.

pub mod ask;
pub mod types;

pub use ask::{context_blocks, Assistant};
pub use types::{AnswerBody, Citation, RagAnswer, RagResponse, Retrieval, NO_INFORMATION_ANSWER};
