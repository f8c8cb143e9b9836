//! Durable vector store with exact cosine search.
//!
//! Entries are `(id, vector, metadata)` triples of a fixed dimension `D`,
//! kept in SQLite. Search is a full scan: every stored vector is scored
//! against the query and the best `k` are returned, ties in first-insertion
//! order.

use crate::similarity::{cosine_similarity, rank_by_score};
use crate::types::{Document, SourceTag};
use footprint_core::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

/// Opaque string metadata stored next to a vector.
pub type Metadata = BTreeMap<String, String>;

/// Metadata key holding the document's source tag.
pub const SOURCE_KEY: &str = "source";

/// Metadata key holding the content hash the vector was computed from.
pub const INDEX_HASH_KEY: &str = "index_hash";

/// One vector to write.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: Metadata,
}

impl VectorEntry {
    pub fn new(id: impl Into<String>, vector: Vec<f32>, metadata: Metadata) -> Self {
        Self {
            id: id.into(),
            vector,
            metadata,
        }
    }
}

/// One search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    pub metadata: Metadata,
}

/// Metadata recorded for a document's vector: its source tag and index hash.
pub fn document_metadata(document: &Document) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert(SOURCE_KEY.to_string(), document.source.to_string());
    metadata.insert(INDEX_HASH_KEY.to_string(), document.index_hash());
    metadata
}

/// Source tag recorded in metadata, if any and valid.
pub fn metadata_source(metadata: &Metadata) -> Option<SourceTag> {
    metadata.get(SOURCE_KEY).and_then(|s| s.parse().ok())
}

/// Storage contract for the retrieval core.
///
/// Writers are serialized by the implementation; `search` sees either all
/// or none of a concurrent batch.
pub trait VectorStore: Send + Sync {
    /// The fixed vector length `D`.
    fn dimension(&self) -> usize;

    /// Insert or replace entries. All-or-nothing per call; a vector of the
    /// wrong length or with a non-finite component rejects the whole batch.
    fn upsert(&self, entries: &[VectorEntry]) -> AppResult<()>;

    /// The `k` most similar entries, best first. `k <= 0` yields nothing.
    fn search(&self, query: &[f32], k: i64) -> AppResult<Vec<SearchHit>>;

    /// Remove entries by id; unknown ids are ignored. Returns how many went.
    fn delete(&self, ids: &[String]) -> AppResult<usize>;

    /// Remove every entry. The dimension stays fixed.
    fn delete_all(&self) -> AppResult<()>;

    /// Number of stored entries.
    fn count(&self) -> AppResult<usize>;

    /// Every stored id, in insertion order.
    fn ids(&self) -> AppResult<Vec<String>>;

    /// Stored metadata for `id`.
    fn metadata(&self, id: &str) -> AppResult<Option<Metadata>>;
}

/// SQLite-backed [`VectorStore`].
pub struct SqliteVectorStore {
    conn: Mutex<Option<Connection>>,
    dimension: usize,
}

impl std::fmt::Debug for SqliteVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteVectorStore")
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl SqliteVectorStore {
    /// Open or create a store at `path` with dimension `dimension`.
    ///
    /// # Errors
    /// `StoreUnavailable` if the file cannot be opened, `DimensionMismatch`
    /// if the store was created with a different dimension.
    pub fn open(path: &Path, dimension: usize) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::StoreUnavailable(format!(
                    "Failed to create index directory {:?}: {}",
                    parent, e
                ))
            })?;
        }

        let conn = Connection::open(path).map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to open vector store {:?}: {}", path, e))
        })?;

        tracing::debug!("Opened vector store at {:?} (D={})", path, dimension);
        Self::init(conn, dimension)
    }

    /// A non-durable store, for tests and dry runs.
    pub fn open_in_memory(dimension: usize) -> AppResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to open in-memory vector store: {}", e))
        })?;
        Self::init(conn, dimension)
    }

    fn init(conn: Connection, dimension: usize) -> AppResult<Self> {
        if dimension == 0 {
            return Err(AppError::Config(
                "Vector store dimension must be positive".to_string(),
            ));
        }

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS vectors (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                embedding BLOB NOT NULL,
                metadata TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| AppError::StoreUnavailable(format!("Failed to create tables: {}", e)))?;

        let stored: Option<String> = conn
            .query_row("SELECT value FROM meta WHERE key = 'dimension'", [], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| AppError::StoreUnavailable(format!("Failed to read store meta: {}", e)))?;

        match stored {
            Some(value) => {
                let expected: usize = value.parse().map_err(|_| {
                    AppError::StoreUnavailable(format!("Corrupt dimension in store meta: {}", value))
                })?;
                if expected != dimension {
                    return Err(AppError::dimension_mismatch(expected, dimension));
                }
            }
            None => {
                conn.execute(
                    "INSERT INTO meta (key, value) VALUES ('dimension', ?1)",
                    params![dimension.to_string()],
                )
                .map_err(|e| {
                    AppError::StoreUnavailable(format!("Failed to write store meta: {}", e))
                })?;
            }
        }

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            dimension,
        })
    }

    /// Close the store. Later calls fail with `StoreUnavailable`.
    pub fn close(&self) -> AppResult<()> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| AppError::StoreUnavailable("Vector store lock poisoned".to_string()))?;

        if let Some(conn) = guard.take() {
            conn.close().map_err(|(_, e)| {
                AppError::StoreUnavailable(format!("Failed to close vector store: {}", e))
            })?;
            tracing::debug!("Closed vector store");
        }
        Ok(())
    }

    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> AppResult<T>) -> AppResult<T> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| AppError::StoreUnavailable("Vector store lock poisoned".to_string()))?;
        let conn = guard
            .as_mut()
            .ok_or_else(|| AppError::StoreUnavailable("Vector store is closed".to_string()))?;
        f(conn)
    }

    /// Length must be `D` and every component finite.
    fn check_vector(&self, vector: &[f32]) -> AppResult<()> {
        if vector.len() != self.dimension {
            return Err(AppError::dimension_mismatch(self.dimension, vector.len()));
        }
        if let Some(index) = vector.iter().position(|x| !x.is_finite()) {
            return Err(AppError::Knowledge(format!(
                "Vector component {} is not finite ({})",
                index, vector[index]
            )));
        }
        Ok(())
    }
}

fn sql_error(action: &str) -> impl Fn(rusqlite::Error) -> AppError + '_ {
    move |e| AppError::Knowledge(format!("Failed to {}: {}", action, e))
}

impl VectorStore for SqliteVectorStore {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn upsert(&self, entries: &[VectorEntry]) -> AppResult<()> {
        // validate the whole batch before touching the table
        for entry in entries {
            self.check_vector(&entry.vector)?;
        }
        if entries.is_empty() {
            return Ok(());
        }

        self.with_conn(|conn| {
            let tx = conn.transaction().map_err(sql_error("begin upsert"))?;
            {
                let mut stmt = tx
                    .prepare(
                        "INSERT INTO vectors (id, embedding, metadata) VALUES (?1, ?2, ?3)
                         ON CONFLICT(id) DO UPDATE SET
                             embedding = excluded.embedding,
                             metadata = excluded.metadata",
                    )
                    .map_err(sql_error("prepare upsert"))?;

                for entry in entries {
                    let metadata = serde_json::to_string(&entry.metadata)?;
                    stmt.execute(params![
                        entry.id,
                        embedding_to_bytes(&entry.vector),
                        metadata
                    ])
                    .map_err(sql_error("upsert vector"))?;
                }
            }
            tx.commit().map_err(sql_error("commit upsert"))?;

            tracing::debug!("Upserted {} vectors", entries.len());
            Ok(())
        })
    }

    fn search(&self, query: &[f32], k: i64) -> AppResult<Vec<SearchHit>> {
        self.check_vector(query)?;
        if k <= 0 {
            return Ok(Vec::new());
        }
        let limit = usize::try_from(k).unwrap_or(usize::MAX);

        let mut hits = self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, embedding, metadata FROM vectors ORDER BY seq")
                .map_err(sql_error("prepare search"))?;

            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Vec<u8>>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                })
                .map_err(sql_error("scan vectors"))?;

            let mut hits = Vec::new();
            for row in rows {
                let (id, blob, metadata) = row.map_err(sql_error("read vector row"))?;
                let vector = bytes_to_embedding(&blob, self.dimension)?;
                hits.push(SearchHit {
                    score: cosine_similarity(query, &vector),
                    metadata: serde_json::from_str(&metadata)?,
                    id,
                });
            }
            Ok(hits)
        })?;

        let scanned = hits.len();
        rank_by_score(&mut hits, |hit| hit.score);
        hits.truncate(limit);

        tracing::debug!(
            "Search scanned {} vectors, returning {} (k={})",
            scanned,
            hits.len(),
            k
        );
        Ok(hits)
    }

    fn delete(&self, ids: &[String]) -> AppResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        self.with_conn(|conn| {
            let tx = conn.transaction().map_err(sql_error("begin delete"))?;
            let mut removed = 0;
            {
                let mut stmt = tx
                    .prepare("DELETE FROM vectors WHERE id = ?1")
                    .map_err(sql_error("prepare delete"))?;
                for id in ids {
                    removed += stmt.execute(params![id]).map_err(sql_error("delete vector"))?;
                }
            }
            tx.commit().map_err(sql_error("commit delete"))?;

            tracing::debug!("Deleted {} of {} requested vectors", removed, ids.len());
            Ok(removed)
        })
    }

    fn delete_all(&self) -> AppResult<()> {
        self.with_conn(|conn| {
            let removed = conn
                .execute("DELETE FROM vectors", [])
                .map_err(sql_error("clear vectors"))?;
            tracing::info!("Cleared vector store ({} entries)", removed);
            Ok(())
        })
    }

    fn count(&self) -> AppResult<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM vectors", [], |row| row.get(0))
                .map_err(sql_error("count vectors"))?;
            Ok(count as usize)
        })
    }

    fn ids(&self) -> AppResult<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id FROM vectors ORDER BY seq")
                .map_err(sql_error("prepare id scan"))?;
            let ids = stmt
                .query_map([], |row| row.get(0))
                .map_err(sql_error("scan ids"))?
                .collect::<Result<Vec<String>, _>>()
                .map_err(sql_error("read id"))?;
            Ok(ids)
        })
    }

    fn metadata(&self, id: &str) -> AppResult<Option<Metadata>> {
        self.with_conn(|conn| {
            let raw: Option<String> = conn
                .query_row(
                    "SELECT metadata FROM vectors WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(sql_error("read metadata"))?;

            match raw {
                Some(json) => Ok(Some(serde_json::from_str(&json)?)),
                None => Ok(None),
            }
        })
    }
}

/// Little-endian f32 encoding.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn bytes_to_embedding(bytes: &[u8], dimension: usize) -> AppResult<Vec<f32>> {
    if bytes.len() != dimension * 4 {
        return Err(AppError::dimension_mismatch(dimension, bytes.len() / 4));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
