//! Context selection: ranked hits to a bounded, diverse fragment list.

use crate::documents::DocumentStore;
use crate::store::VectorStore;
use crate::types::{ContextFragment, SourceTag};
use footprint_core::AppResult;
use std::collections::{BTreeSet, HashMap};

/// Appended to content cut at the character budget.
pub const TRUNCATION_MARKER: &str = "... [truncated]";

/// Fragments allowed per source tag unless configured otherwise.
pub const DEFAULT_DIVERSITY_CAP: usize = 3;

/// Roughly 500 tokens at ~4 characters per token.
pub const DEFAULT_MAX_CHARS_PER_FRAGMENT: usize = 2000;

/// Knobs for [`pick_context`].
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionOptions {
    /// How many hits to request from the store
    pub max_results: i64,
    pub max_chars_per_fragment: usize,
    /// Max fragments sharing one source tag
    pub diversity_cap: usize,
    /// When set, hits from other categories are dropped
    pub eligible: Option<BTreeSet<SourceTag>>,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            max_results: 10,
            max_chars_per_fragment: DEFAULT_MAX_CHARS_PER_FRAGMENT,
            diversity_cap: DEFAULT_DIVERSITY_CAP,
            eligible: None,
        }
    }
}

impl SelectionOptions {
    pub fn new(max_results: i64) -> Self {
        Self {
            max_results,
            ..Self::default()
        }
    }

    pub fn with_eligible(mut self, eligible: BTreeSet<SourceTag>) -> Self {
        self.eligible = Some(eligible);
        self
    }
}

/// Search the store and turn the ranked hits into context fragments.
///
/// Hits whose id has no document are skipped. At most
/// `diversity_cap` fragments share a source tag; extra hits from a capped
/// tag are dropped even when they outrank others. Survivors keep their rank
/// order. An empty result is a normal outcome.
///
/// # Errors
/// Store errors (dimension mismatch, unavailable) and document store errors
/// propagate unchanged.
pub fn pick_context(
    query_vector: &[f32],
    store: &dyn VectorStore,
    documents: &dyn DocumentStore,
    options: &SelectionOptions,
) -> AppResult<Vec<ContextFragment>> {
    let hits = store.search(query_vector, options.max_results)?;

    let mut per_source: HashMap<SourceTag, usize> = HashMap::new();
    let mut fragments = Vec::new();

    for hit in hits {
        let Some(document) = documents.find_by_id(&hit.id)? else {
            tracing::warn!("Skipping '{}': indexed but no longer in the content store", hit.id);
            continue;
        };

        if let Some(eligible) = &options.eligible {
            if !eligible.contains(&document.source) {
                tracing::debug!("Skipping '{}': {} not eligible", hit.id, document.source);
                continue;
            }
        }

        let taken = per_source.entry(document.source).or_insert(0);
        if *taken >= options.diversity_cap {
            tracing::debug!("Skipping '{}': {} cap reached", hit.id, document.source);
            continue;
        }
        *taken += 1;

        let (content, truncated) = truncate_chars(&document.content, options.max_chars_per_fragment);
        fragments.push(ContextFragment {
            id: document.id.clone(),
            score: hit.score,
            content,
            truncated,
            source: document.source,
            date: document.date(),
            title: document.title,
            url: document.url,
        });
    }

    tracing::debug!(
        "Selected {} context fragments (max_results={})",
        fragments.len(),
        options.max_results
    );
    Ok(fragments)
}

/// Cut `content` to `max_chars` characters and append [`TRUNCATION_MARKER`].
///
/// Counts Unicode scalar values, so a code point is never split.
pub fn truncate_chars(content: &str, max_chars: usize) -> (String, bool) {
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => (format!("{}{}", &content[..cut], TRUNCATION_MARKER), true),
        None => (content.to_string(), false),
    }
}
