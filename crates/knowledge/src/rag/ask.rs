//! Question answering over the indexed footprint.

use crate::config::IndexConfig;
use crate::context::pick_context;
use crate::documents::DocumentStore;
use crate::embeddings::EmbeddingProvider;
use crate::indexer::{IndexReport, Indexer};
use crate::planner::{Plan, RetrievalPlanner};
use crate::rag::types::{AnswerBody, Citation, RagAnswer, Retrieval};
use crate::store::VectorStore;
use crate::types::ContextFragment;
use footprint_core::AppResult;
use footprint_llm::{retry_async, LlmClient, LlmRequest};
use footprint_prompt::{build_prompt, default_prompt, ContextBlock, PromptDefinition};
use std::sync::Arc;

/// Lower temperature keeps answers close to the retrieved facts.
const ANSWER_TEMPERATURE: f32 = 0.3;

/// Plans, retrieves and synthesizes answers.
///
/// Every collaborator is passed in, so tests can swap any of them for a fake.
pub struct Assistant {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    documents: Arc<dyn DocumentStore>,
    generator: Arc<dyn LlmClient>,
    config: IndexConfig,
    planner: RetrievalPlanner,
    prompt: PromptDefinition,
    model: String,
}

impl Assistant {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        documents: Arc<dyn DocumentStore>,
        generator: Arc<dyn LlmClient>,
        config: IndexConfig,
        model: impl Into<String>,
    ) -> Self {
        let planner = RetrievalPlanner::new(config.planner.clone());
        Self {
            embedder,
            store,
            documents,
            generator,
            config,
            planner,
            prompt: default_prompt(),
            model: model.into(),
        }
    }

    /// Use a different synthesis prompt.
    pub fn with_prompt(mut self, prompt: PromptDefinition) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn plan(&self, question: &str) -> Plan {
        self.planner.make_plan(question)
    }

    /// Re-embed changed documents from the content store.
    pub async fn refresh(&self) -> AppResult<IndexReport> {
        let documents = self.documents.all()?;
        Indexer::new(self.embedder.clone(), self.store.clone())
            .with_batch_size(self.config.embedding.batch_size)
            .with_retry(self.config.retry)
            .sync(&documents)
            .await
    }

    /// Plan the question and select its context.
    ///
    /// A plan asking for fresh data refreshes the index first; if that
    /// refresh fails, retrieval carries on with what is already indexed.
    #[tracing::instrument(skip(self, question))]
    pub async fn retrieve(&self, question: &str) -> AppResult<Retrieval> {
        let plan = self.plan(question);
        tracing::info!(
            "Intent {} -> {} results from {:?}",
            plan.intent,
            plan.max_results,
            plan.eligible_categories
        );

        if plan.force_fresh {
            match self.refresh().await {
                Ok(report) => tracing::info!(
                    "Refreshed index: {} indexed, {} removed",
                    report.indexed,
                    report.removed
                ),
                Err(e) => tracing::warn!("Index refresh failed, using existing index: {}", e),
            }
        }

        let embedder = self.embedder.as_ref();
        let query_vector = retry_async(self.config.retry, "query embedding", move || {
            embedder.embed(question)
        })
        .await?;

        let options = self.config.selection_options(&plan);
        let fragments = pick_context(
            &query_vector,
            self.store.as_ref(),
            self.documents.as_ref(),
            &options,
        )?;

        Ok(Retrieval { plan, fragments })
    }

    /// Answer a question with citations.
    ///
    /// With no context, returns the explicit no-information answer without
    /// calling the generator.
    pub async fn answer(&self, question: &str) -> AppResult<RagAnswer> {
        let Retrieval { plan, fragments } = self.retrieve(question).await?;

        if fragments.is_empty() {
            tracing::info!("No relevant context for question");
            return Ok(RagAnswer::no_information(plan));
        }

        let built = build_prompt(&self.prompt, question, &context_blocks(&fragments))?;
        let mut request =
            LlmRequest::new(built.user, &self.model).with_temperature(ANSWER_TEMPERATURE);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        tracing::debug!(
            "Generating with {} ({} context blocks)",
            self.generator.provider_name(),
            built.metadata.context_blocks
        );

        let generator = self.generator.as_ref();
        let request = &request;
        let stream =
            retry_async(self.config.retry, "generation", move || generator.stream(request)).await?;

        let citations = fragments
            .iter()
            .enumerate()
            .map(|(i, f)| Citation::from_fragment(i + 1, f))
            .collect();

        Ok(RagAnswer {
            plan,
            citations,
            body: AnswerBody::Stream(stream),
        })
    }
}

/// Number fragments 1..n for the prompt, in rank order.
pub fn context_blocks(fragments: &[ContextFragment]) -> Vec<ContextBlock> {
    fragments
        .iter()
        .enumerate()
        .map(|(i, f)| ContextBlock {
            index: i + 1,
            source: f.source.to_string(),
            title: f.title.clone(),
            url: f.url.clone(),
            date: f.date.format("%Y-%m-%d").to_string(),
            content: f.content.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::DocumentSet;
    use crate::embeddings::MockProvider;
    use crate::rag::types::NO_INFORMATION_ANSWER;
    use crate::store::SqliteVectorStore;
    use crate::types::{Document, SourceTag};
    use chrono::Utc;
    use footprint_core::AppError;
    use footprint_llm::{LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
    use std::sync::Mutex;

    /// Records prompts and replies with a fixed two-chunk stream.
    #[derive(Default)]
    struct ScriptedGenerator {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl LlmClient for ScriptedGenerator {
        fn provider_name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            Ok(LlmResponse {
                content: "They build databases [1].".to_string(),
                model: request.model.clone(),
                usage: LlmUsage::default(),
            })
        }

        async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            let chunks = vec![
                Ok(LlmStreamChunk {
                    content: "They build ".to_string(),
                    done: false,
                    usage: None,
                }),
                Ok(LlmStreamChunk {
                    content: "databases [1].".to_string(),
                    done: true,
                    usage: None,
                }),
            ];
            Ok(Box::pin(futures::stream::iter(chunks)))
        }
    }

    fn doc(id: &str, source: SourceTag, content: &str) -> Document {
        Document {
            id: id.to_string(),
            source,
            title: Some(id.to_string()),
            content: content.to_string(),
            url: None,
            published_at: None,
            fetched_at: Utc::now(),
        }
    }

    fn corpus() -> Vec<Document> {
        vec![
            doc("tinydb", SourceTag::ProfileHost, "tinydb: an embedded rust key-value database"),
            doc("blog-1", SourceTag::Feed, "notes from a marathon training block"),
            doc("resume", SourceTag::Document, "senior engineer, storage and databases"),
        ]
    }

    struct Fixture {
        assistant: Assistant,
        store: Arc<SqliteVectorStore>,
        generator: Arc<ScriptedGenerator>,
    }

    async fn fixture(indexed: bool) -> Fixture {
        let mut config = IndexConfig::default();
        config.embedding.dimensions = 64;
        config.retry = footprint_llm::RetryPolicy::immediate(1);

        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(MockProvider::new(64));
        let store = Arc::new(SqliteVectorStore::open_in_memory(64).unwrap());
        let documents = Arc::new(DocumentSet::new(corpus()));
        let generator = Arc::new(ScriptedGenerator::default());

        let assistant = Assistant::new(
            embedder,
            store.clone(),
            documents,
            generator.clone(),
            config,
            "test-model",
        );
        if indexed {
            assistant.refresh().await.unwrap();
        }

        Fixture {
            assistant,
            store,
            generator,
        }
    }

    #[tokio::test]
    async fn test_retrieve_respects_plan_categories() {
        let f = fixture(true).await;
        let retrieval = f.assistant.retrieve("Which rust code do they maintain?").await.unwrap();

        assert_eq!(retrieval.plan.max_results, 15);
        assert!(!retrieval.fragments.is_empty());
        assert!(retrieval
            .fragments
            .iter()
            .all(|frag| frag.source != SourceTag::Feed));
    }

    #[tokio::test]
    async fn test_answer_streams_with_citations() {
        let f = fixture(true).await;
        let answer = f.assistant.answer("What rust code have they written?").await.unwrap();

        assert!(answer.has_context());
        assert_eq!(answer.citations[0].index, 1);

        let prompts = f.generator.prompts.lock().unwrap().clone();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("[1] "));
        assert!(prompts[0].contains("What rust code have they written?"));

        let response = answer.into_response().await.unwrap();
        assert_eq!(response.answer, "They build databases [1].");
    }

    #[tokio::test]
    async fn test_empty_index_answers_without_generator() {
        let f = fixture(false).await;
        let answer = f.assistant.answer("What rust code have they written?").await.unwrap();

        assert!(!answer.has_context());
        assert!(f.generator.prompts.lock().unwrap().is_empty());
        assert_eq!(
            answer.into_response().await.unwrap().answer,
            NO_INFORMATION_ANSWER
        );
    }

    #[tokio::test]
    async fn test_recency_refreshes_index_first() {
        let f = fixture(false).await;
        assert_eq!(f.store.count().unwrap(), 0);

        let retrieval = f.assistant.retrieve("What is the latest on their resume?").await.unwrap();

        assert!(retrieval.plan.force_fresh);
        assert_eq!(f.store.count().unwrap(), 3);
        assert!(!retrieval.fragments.is_empty());
    }

    /// Lookups work, listing fails, so every refresh errors out.
    struct UnlistableDocuments(DocumentSet);

    impl DocumentStore for UnlistableDocuments {
        fn find_by_id(&self, id: &str) -> AppResult<Option<Document>> {
            self.0.find_by_id(id)
        }

        fn find_by_source(&self, source: SourceTag) -> AppResult<Vec<Document>> {
            self.0.find_by_source(source)
        }

        fn all(&self) -> AppResult<Vec<Document>> {
            Err(AppError::Knowledge("content store listing failed".to_string()))
        }
    }

    #[tokio::test]
    async fn test_failed_refresh_falls_back_to_existing_index() {
        let f = fixture(true).await;
        assert_eq!(f.store.count().unwrap(), 3);

        let mut config = IndexConfig::default();
        config.embedding.dimensions = 64;
        config.retry = footprint_llm::RetryPolicy::immediate(1);
        let assistant = Assistant::new(
            Arc::new(MockProvider::new(64)),
            f.store.clone(),
            Arc::new(UnlistableDocuments(DocumentSet::new(corpus()))),
            f.generator.clone(),
            config,
            "test-model",
        );
        assert!(assistant.refresh().await.is_err());

        let retrieval = assistant.retrieve("latest repo news").await.unwrap();
        assert!(retrieval.plan.force_fresh);
        assert!(!retrieval.fragments.is_empty());
        assert!(retrieval.fragments.iter().any(|frag| frag.id == "tinydb"));
    }

    #[tokio::test]
    async fn test_closed_store_surfaces_after_refresh() {
        let f = fixture(true).await;
        f.store.close().unwrap();

        let result = f.assistant.retrieve("latest repo news").await;
        assert!(matches!(result, Err(AppError::StoreUnavailable(_))));
    }

    #[test]
    fn test_context_blocks_are_numbered_in_order() {
        let fragments = vec![
            ContextFragment {
                id: "a".to_string(),
                score: 0.9,
                content: "first".to_string(),
                truncated: false,
                source: SourceTag::Social,
                title: None,
                url: None,
                date: Utc::now(),
            },
            ContextFragment {
                id: "b".to_string(),
                score: 0.5,
                content: "second".to_string(),
                truncated: true,
                source: SourceTag::Feed,
                title: None,
                url: None,
                date: Utc::now(),
            },
        ];

        let blocks = context_blocks(&fragments);
        assert_eq!(blocks[0].index, 1);
        assert_eq!(blocks[0].source, "social");
        assert_eq!(blocks[1].index, 2);
        assert_eq!(blocks[1].content, "second");
    }
}
