//! Keeps the vector store in step with the content store.
//!
//! Documents are re-embedded only when their content hash changed. Work is
//! grouped by source tag and cut into batches; every batch that embeds
//! successfully is committed on its own, so a failing batch leaves earlier
//! ones in place and is simply retried on the next sync.

use crate::embeddings::{embed_with_retry, EmbeddingProvider};
use crate::store::{document_metadata, VectorEntry, VectorStore, INDEX_HASH_KEY};
use crate::types::{Document, SourceTag};
use footprint_core::{AppError, AppResult};
use footprint_llm::RetryPolicy;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// A batch that could not be embedded.
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub source: SourceTag,
    pub ids: Vec<String>,
    pub error: String,
}

/// Outcome of one sync.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexReport {
    /// Documents embedded and written
    pub indexed: usize,
    /// Documents whose stored hash already matched
    pub unchanged: usize,
    /// Vector entries with no matching document, deleted
    pub removed: usize,
    pub failures: Vec<BatchFailure>,
}

impl IndexReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of documents left unindexed because their batch failed.
    pub fn failed(&self) -> usize {
        self.failures.iter().map(|f| f.ids.len()).sum()
    }
}

pub struct Indexer {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    batch_size: usize,
    retry: RetryPolicy,
}

impl Indexer {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            provider,
            store,
            batch_size: 10,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Bring the store in line with `documents`.
    ///
    /// # Errors
    /// Structural failures abort the run: a provider whose dimension differs
    /// from the store's, or any store error. Embedding failures are recorded
    /// in the report instead.
    pub async fn sync(&self, documents: &[Document]) -> AppResult<IndexReport> {
        if self.provider.dimensions() != self.store.dimension() {
            return Err(AppError::dimension_mismatch(
                self.store.dimension(),
                self.provider.dimensions(),
            ));
        }

        let mut report = IndexReport::default();
        let mut pending: Vec<&Document> = Vec::new();

        for document in documents {
            let stored_hash = self
                .store
                .metadata(&document.id)?
                .and_then(|m| m.get(INDEX_HASH_KEY).cloned());

            if stored_hash.as_deref() == Some(document.index_hash().as_str()) {
                report.unchanged += 1;
            } else {
                pending.push(document);
            }
        }

        tracing::info!(
            "Indexing {} documents ({} unchanged) with {} ({})",
            pending.len(),
            report.unchanged,
            self.provider.provider_name(),
            self.provider.model_name()
        );

        for source in SourceTag::ALL {
            let group: Vec<&Document> = pending
                .iter()
                .copied()
                .filter(|d| d.source == source)
                .collect();

            for batch in group.chunks(self.batch_size) {
                match self.embed_documents(batch).await {
                    Ok(entries) => {
                        self.store.upsert(&entries)?;
                        report.indexed += entries.len();
                    }
                    Err(e @ AppError::DimensionMismatch { .. }) => return Err(e),
                    Err(e) => {
                        tracing::warn!(
                            "Embedding batch of {} {} documents failed: {}",
                            batch.len(),
                            source,
                            e
                        );
                        report.failures.push(BatchFailure {
                            source,
                            ids: batch.iter().map(|d| d.id.clone()).collect(),
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        let live: HashSet<&str> = documents.iter().map(|d| d.id.as_str()).collect();
        let stale: Vec<String> = self
            .store
            .ids()?
            .into_iter()
            .filter(|id| !live.contains(id.as_str()))
            .collect();
        if !stale.is_empty() {
            report.removed = self.store.delete(&stale)?;
        }

        tracing::info!(
            "Index sync done: {} indexed, {} unchanged, {} removed, {} failed",
            report.indexed,
            report.unchanged,
            report.removed,
            report.failed()
        );
        Ok(report)
    }

    async fn embed_documents(&self, batch: &[&Document]) -> AppResult<Vec<VectorEntry>> {
        let texts: Vec<String> = batch.iter().map(|d| d.embedding_text()).collect();
        let vectors = embed_with_retry(self.provider.as_ref(), &texts, self.retry).await?;

        if vectors.len() != batch.len() {
            return Err(AppError::UpstreamFailure(format!(
                "Provider returned {} vectors for {} texts",
                vectors.len(),
                batch.len()
            )));
        }

        Ok(batch
            .iter()
            .zip(vectors)
            .map(|(d, v)| VectorEntry::new(d.id.clone(), v, document_metadata(d)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockProvider;
    use crate::store::{metadata_source, SqliteVectorStore};
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn doc(id: &str, source: SourceTag, content: &str) -> Document {
        Document {
            id: id.to_string(),
            source,
            title: None,
            content: content.to_string(),
            url: None,
            published_at: None,
            fetched_at: Utc::now(),
        }
    }

    fn indexer(provider: Arc<dyn EmbeddingProvider>, store: Arc<SqliteVectorStore>) -> Indexer {
        Indexer::new(provider, store)
            .with_batch_size(2)
            .with_retry(RetryPolicy::immediate(2))
    }

    /// Fails every batch containing a document whose text starts with "boom".
    #[derive(Debug)]
    struct Picky {
        inner: MockProvider,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for Picky {
        fn provider_name(&self) -> &str {
            "picky"
        }

        fn model_name(&self) -> &str {
            "picky"
        }

        fn dimensions(&self) -> usize {
            self.inner.dimensions()
        }

        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if texts.iter().any(|t| t.starts_with("boom")) {
                return Err(AppError::UpstreamFailure("connection reset".to_string()));
            }
            self.inner.embed_batch(texts).await
        }
    }

    #[tokio::test]
    async fn test_sync_indexes_then_skips_unchanged() {
        let store = Arc::new(SqliteVectorStore::open_in_memory(32).unwrap());
        let indexer = indexer(Arc::new(MockProvider::new(32)), store.clone());
        let mut docs = vec![
            doc("a", SourceTag::Feed, "first post"),
            doc("b", SourceTag::Feed, "second post"),
            doc("c", SourceTag::Social, "a toot"),
        ];

        let report = indexer.sync(&docs).await.unwrap();
        assert_eq!(report.indexed, 3);
        assert_eq!(report.unchanged, 0);
        assert!(report.is_clean());
        assert_eq!(store.count().unwrap(), 3);

        docs[1].content = "second post, edited".to_string();
        let report = indexer.sync(&docs).await.unwrap();
        assert_eq!(report.indexed, 1);
        assert_eq!(report.unchanged, 2);
    }

    #[tokio::test]
    async fn test_title_or_source_edit_triggers_reembed() {
        let store = Arc::new(SqliteVectorStore::open_in_memory(32).unwrap());
        let provider = Arc::new(MockProvider::new(32));
        let indexer = indexer(provider.clone(), store.clone());

        let mut docs = vec![doc("a", SourceTag::Feed, "same body")];
        docs[0].title = Some("Old title".to_string());
        indexer.sync(&docs).await.unwrap();

        docs[0].title = Some("A completely different headline".to_string());
        let report = indexer.sync(&docs).await.unwrap();
        assert_eq!(report.indexed, 1);
        assert_eq!(report.unchanged, 0);

        let current = provider.embed(&docs[0].embedding_text()).await.unwrap();
        let hits = store.search(&current, 1).unwrap();
        assert_eq!(hits[0].id, "a");
        assert!((hits[0].score - 1.0).abs() < 1e-5);

        docs[0].source = SourceTag::Social;
        let report = indexer.sync(&docs).await.unwrap();
        assert_eq!(report.indexed, 1);
        assert_eq!(
            metadata_source(&store.metadata("a").unwrap().unwrap()),
            Some(SourceTag::Social)
        );
    }

    #[tokio::test]
    async fn test_sync_removes_stale_entries() {
        let store = Arc::new(SqliteVectorStore::open_in_memory(32).unwrap());
        let indexer = indexer(Arc::new(MockProvider::new(32)), store.clone());

        indexer
            .sync(&[doc("a", SourceTag::Feed, "x"), doc("b", SourceTag::Feed, "y")])
            .await
            .unwrap();
        let report = indexer.sync(&[doc("a", SourceTag::Feed, "x")]).await.unwrap();

        assert_eq!(report.removed, 1);
        assert_eq!(store.ids().unwrap(), vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_batch_is_reported_and_others_commit() {
        let store = Arc::new(SqliteVectorStore::open_in_memory(32).unwrap());
        let provider = Arc::new(Picky {
            inner: MockProvider::new(32),
            calls: AtomicUsize::new(0),
        });
        let indexer = indexer(provider.clone(), store.clone());

        let docs = vec![
            doc("r1", SourceTag::ProfileHost, "boom repo"),
            doc("r2", SourceTag::ProfileHost, "another repo"),
            doc("f1", SourceTag::Feed, "fine post"),
        ];
        let report = indexer.sync(&docs).await.unwrap();

        assert_eq!(report.indexed, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].source, SourceTag::ProfileHost);
        assert_eq!(report.failures[0].ids, vec!["r1", "r2"]);
        assert_eq!(report.failed(), 2);
        assert_eq!(store.ids().unwrap(), vec!["f1".to_string()]);
        // two attempts on the failing batch, one on the good one
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_dimension_disagreement_is_fatal() {
        let store = Arc::new(SqliteVectorStore::open_in_memory(16).unwrap());
        let indexer = indexer(Arc::new(MockProvider::new(32)), store);

        assert!(matches!(
            indexer.sync(&[doc("a", SourceTag::Feed, "x")]).await,
            Err(AppError::DimensionMismatch { expected: 16, actual: 32 })
        ));
    }
}
