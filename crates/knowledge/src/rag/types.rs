//! RAG answer types.

use crate::planner::{Intent, Plan};
use crate::types::{ContextFragment, SourceTag};
use footprint_core::AppResult;
use footprint_llm::{collect_stream, LlmStream};
use serde::{Deserialize, Serialize};

/// Shown instead of a generated answer when retrieval finds nothing.
pub const NO_INFORMATION_ANSWER: &str =
    "I could not find relevant information about that in the available sources.";

/// A numbered source the answer may cite as `[index]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    /// 1-based, matches the number in the prompt
    pub index: usize,
    pub id: String,
    pub source: SourceTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// YYYY-MM-DD
    pub date: String,
    pub score: f32,
}

impl Citation {
    pub fn from_fragment(index: usize, fragment: &ContextFragment) -> Self {
        Self {
            index,
            id: fragment.id.clone(),
            source: fragment.source,
            title: fragment.title.clone(),
            url: fragment.url.clone(),
            date: fragment.date.format("%Y-%m-%d").to_string(),
            score: fragment.score,
        }
    }
}

/// Plan plus selected context for one question.
#[derive(Debug, Clone)]
pub struct Retrieval {
    pub plan: Plan,
    pub fragments: Vec<ContextFragment>,
}

/// Where the answer text comes from.
pub enum AnswerBody {
    /// Incremental chunks from the generator. Dropping it cancels generation.
    Stream(LlmStream),
    /// Nothing relevant was retrieved; the generator was not called.
    NoInformation,
}

/// An answer in progress.
pub struct RagAnswer {
    pub plan: Plan,
    pub citations: Vec<Citation>,
    pub body: AnswerBody,
}

impl RagAnswer {
    pub fn no_information(plan: Plan) -> Self {
        Self {
            plan,
            citations: Vec::new(),
            body: AnswerBody::NoInformation,
        }
    }

    pub fn has_context(&self) -> bool {
        !self.citations.is_empty()
    }

    /// Wait for the whole answer.
    pub async fn into_response(self) -> AppResult<RagResponse> {
        let answer = match self.body {
            AnswerBody::Stream(stream) => collect_stream(stream).await?,
            AnswerBody::NoInformation => NO_INFORMATION_ANSWER.to_string(),
        };

        Ok(RagResponse {
            answer,
            intent: self.plan.intent,
            citations: self.citations,
        })
    }
}

/// A finished answer, as printed by `ask --json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagResponse {
    pub answer: String,
    pub intent: Intent,
    pub citations: Vec<Citation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::make_plan;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_citation_from_fragment() {
        let fragment = ContextFragment {
            id: "post-7".to_string(),
            score: 0.42,
            content: "body".to_string(),
            truncated: false,
            source: SourceTag::Feed,
            title: Some("On parsers".to_string()),
            url: Some("https://blog.example/parsers".to_string()),
            date: Utc.with_ymd_and_hms(2024, 3, 9, 17, 0, 0).unwrap(),
        };

        let citation = Citation::from_fragment(2, &fragment);
        assert_eq!(citation.index, 2);
        assert_eq!(citation.date, "2024-03-09");
        assert_eq!(citation.source, SourceTag::Feed);
    }

    #[tokio::test]
    async fn test_no_information_response() {
        let answer = RagAnswer::no_information(make_plan("hello"));
        assert!(!answer.has_context());

        let response = answer.into_response().await.unwrap();
        assert_eq!(response.answer, NO_INFORMATION_ANSWER);
        assert_eq!(response.intent, Intent::General);
        assert!(response.citations.is_empty());
    }
}
