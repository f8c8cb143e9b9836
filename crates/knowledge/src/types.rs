//! Content records and per-query context types.

use chrono::{DateTime, Utc};
use footprint_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Fixed classification of where a document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceTag {
    /// Code hosting profile (repositories, READMEs)
    ProfileHost,
    /// Blog or RSS/Atom feed entries
    Feed,
    /// Uploaded documents such as a resume
    Document,
    /// Social network posts
    Social,
}

impl SourceTag {
    /// Every tag, in display order.
    pub const ALL: [SourceTag; 4] = [
        SourceTag::ProfileHost,
        SourceTag::Feed,
        SourceTag::Document,
        SourceTag::Social,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::ProfileHost => "profile-host",
            SourceTag::Feed => "feed",
            SourceTag::Document => "document",
            SourceTag::Social => "social",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceTag {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        SourceTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| AppError::Knowledge(format!("Unknown source tag: '{}'", s)))
    }
}

/// A normalized content record produced by a fetcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Stable unique identifier
    pub id: String,

    pub source: SourceTag,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Full text body
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(
        default,
        alias = "publishedAt",
        skip_serializing_if = "Option::is_none"
    )]
    pub published_at: Option<DateTime<Utc>>,

    #[serde(alias = "fetchedAt")]
    pub fetched_at: DateTime<Utc>,
}

impl Document {
    /// SHA-256 over everything that shapes the indexed entry: the source
    /// tag and the embedded text. A change here means a re-embed.
    pub fn index_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.source.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(self.embedding_text().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Publication date when known, otherwise the fetch date.
    pub fn date(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(self.fetched_at)
    }

    /// Text handed to the embedding provider.
    pub fn embedding_text(&self) -> String {
        match &self.title {
            Some(title) if !title.trim().is_empty() => format!("{}\n\n{}", title, self.content),
            _ => self.content.clone(),
        }
    }
}

/// A bounded, attributed snippet selected for a synthesis prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextFragment {
    /// Document identifier
    pub id: String,

    /// Cosine similarity to the query
    pub score: f32,

    /// Content, possibly truncated
    pub content: String,

    /// Whether `content` was cut to the character budget
    pub truncated: bool,

    pub source: SourceTag,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// published_at if present, else fetched_at
    pub date: DateTime<Utc>,
}
