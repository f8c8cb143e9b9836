//! Content store for normalized document records.

use crate::types::{Document, SourceTag};
use chrono::{DateTime, Utc};
use footprint_core::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;
use std::sync::Mutex;

/// Lookup contract the retrieval core needs from the content store.
pub trait DocumentStore: Send + Sync {
    fn find_by_id(&self, id: &str) -> AppResult<Option<Document>>;

    /// Documents with the given tag, in no particular order.
    fn find_by_source(&self, source: SourceTag) -> AppResult<Vec<Document>>;

    fn all(&self) -> AppResult<Vec<Document>>;
}

/// In-memory document collection.
///
/// A later document with an id already present replaces the earlier one.
#[derive(Debug, Clone, Default)]
pub struct DocumentSet {
    documents: Vec<Document>,
    by_id: HashMap<String, usize>,
}

impl DocumentSet {
    pub fn new(documents: impl IntoIterator<Item = Document>) -> Self {
        let mut set = Self::default();
        for document in documents {
            set.insert(document);
        }
        set
    }

    pub fn insert(&mut self, document: Document) {
        match self.by_id.get(&document.id) {
            Some(&index) => self.documents[index] = document,
            None => {
                self.by_id.insert(document.id.clone(), self.documents.len());
                self.documents.push(document);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }
}

impl FromIterator<Document> for DocumentSet {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl DocumentStore for DocumentSet {
    fn find_by_id(&self, id: &str) -> AppResult<Option<Document>> {
        Ok(self.by_id.get(id).map(|&i| self.documents[i].clone()))
    }

    fn find_by_source(&self, source: SourceTag) -> AppResult<Vec<Document>> {
        Ok(self
            .documents
            .iter()
            .filter(|d| d.source == source)
            .cloned()
            .collect())
    }

    fn all(&self) -> AppResult<Vec<Document>> {
        Ok(self.documents.clone())
    }
}

/// SQLite-backed content store.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

const SELECT_COLUMNS: &str =
    "SELECT id, source, title, content, url, published_at, fetched_at FROM documents";

impl SqliteDocumentStore {
    /// Open or create the content store at `path`.
    pub fn open(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::StoreUnavailable(format!(
                    "Failed to create index directory {:?}: {}",
                    parent, e
                ))
            })?;
        }

        let conn = Connection::open(path).map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to open document store {:?}: {}", path, e))
        })?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to open in-memory document store: {}", e))
        })?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> AppResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                title TEXT,
                content TEXT NOT NULL,
                url TEXT,
                published_at TEXT,
                fetched_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_source ON documents(source);
            "#,
        )
        .map_err(|e| AppError::StoreUnavailable(format!("Failed to create tables: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> AppResult<T>) -> AppResult<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| AppError::StoreUnavailable("Document store lock poisoned".to_string()))?;
        f(&mut *conn)
    }

    /// Insert or replace documents in one transaction. Returns the batch size.
    pub fn upsert(&self, documents: &[Document]) -> AppResult<usize> {
        self.with_conn(|conn| {
            let tx = conn
                .transaction()
                .map_err(|e| AppError::Knowledge(format!("Failed to begin import: {}", e)))?;
            {
                let mut stmt = tx
                    .prepare(
                        "INSERT OR REPLACE INTO documents
                         (id, source, title, content, url, published_at, fetched_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    )
                    .map_err(|e| AppError::Knowledge(format!("Failed to prepare import: {}", e)))?;

                for doc in documents {
                    stmt.execute(params![
                        doc.id,
                        doc.source.as_str(),
                        doc.title,
                        doc.content,
                        doc.url,
                        doc.published_at.map(|d| d.to_rfc3339()),
                        doc.fetched_at.to_rfc3339(),
                    ])
                    .map_err(|e| {
                        AppError::Knowledge(format!("Failed to store document '{}': {}", doc.id, e))
                    })?;
                }
            }
            tx.commit()
                .map_err(|e| AppError::Knowledge(format!("Failed to commit import: {}", e)))?;

            tracing::debug!("Stored {} documents", documents.len());
            Ok(documents.len())
        })
    }

    /// Remove documents by id; unknown ids are ignored.
    pub fn delete(&self, ids: &[String]) -> AppResult<usize> {
        self.with_conn(|conn| {
            let mut removed = 0;
            for id in ids {
                removed += conn
                    .execute("DELETE FROM documents WHERE id = ?1", params![id])
                    .map_err(|e| AppError::Knowledge(format!("Failed to delete document: {}", e)))?;
            }
            Ok(removed)
        })
    }

    pub fn count(&self) -> AppResult<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
                .map_err(|e| AppError::Knowledge(format!("Failed to count documents: {}", e)))?;
            Ok(count as usize)
        })
    }

    fn query(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> AppResult<Vec<Document>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(sql)
                .map_err(|e| AppError::Knowledge(format!("Failed to prepare query: {}", e)))?;
            let rows = stmt
                .query_map(args, raw_row)
                .map_err(|e| AppError::Knowledge(format!("Failed to query documents: {}", e)))?;

            let mut documents = Vec::new();
            for row in rows {
                let raw =
                    row.map_err(|e| AppError::Knowledge(format!("Failed to read document: {}", e)))?;
                documents.push(raw.into_document()?);
            }
            Ok(documents)
        })
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn find_by_id(&self, id: &str) -> AppResult<Option<Document>> {
        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        let raw = self.with_conn(|conn| {
            conn.query_row(&sql, params![id], raw_row)
                .optional()
                .map_err(|e| AppError::Knowledge(format!("Failed to look up document: {}", e)))
        })?;
        raw.map(RawDocument::into_document).transpose()
    }

    fn find_by_source(&self, source: SourceTag) -> AppResult<Vec<Document>> {
        let sql = format!("{} WHERE source = ?1 ORDER BY rowid", SELECT_COLUMNS);
        self.query(&sql, &[&source.as_str()])
    }

    fn all(&self) -> AppResult<Vec<Document>> {
        let sql = format!("{} ORDER BY rowid", SELECT_COLUMNS);
        self.query(&sql, &[])
    }
}

/// Row as stored; converted outside the rusqlite callback so parse errors
/// keep our own error type.
struct RawDocument {
    id: String,
    source: String,
    title: Option<String>,
    content: String,
    url: Option<String>,
    published_at: Option<String>,
    fetched_at: String,
}

fn raw_row(row: &Row<'_>) -> rusqlite::Result<RawDocument> {
    Ok(RawDocument {
        id: row.get(0)?,
        source: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        url: row.get(4)?,
        published_at: row.get(5)?,
        fetched_at: row.get(6)?,
    })
}

impl RawDocument {
    fn into_document(self) -> AppResult<Document> {
        Ok(Document {
            source: self.source.parse()?,
            published_at: self.published_at.as_deref().map(parse_timestamp).transpose()?,
            fetched_at: parse_timestamp(&self.fetched_at)?,
            id: self.id,
            title: self.title,
            content: self.content,
            url: self.url,
        })
    }
}

fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| AppError::Knowledge(format!("Invalid stored timestamp '{}': {}", value, e)))
}

/// Read documents from a JSON Lines file, one record per line.
pub fn import_jsonl(path: &Path) -> AppResult<Vec<Document>> {
    let file = std::fs::File::open(path).map_err(|e| {
        AppError::Knowledge(format!("Failed to open import file {:?}: {}", path, e))
    })?;
    let documents = parse_jsonl(std::io::BufReader::new(file))?;
    tracing::info!("Read {} documents from {:?}", documents.len(), path);
    Ok(documents)
}

/// Parse JSON Lines; blank lines are skipped, a bad line fails with its number.
pub fn parse_jsonl(reader: impl BufRead) -> AppResult<Vec<Document>> {
    let mut documents = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let document: Document = serde_json::from_str(&line).map_err(|e| {
            AppError::Serialization(format!("Line {}: {}", index + 1, e))
        })?;
        documents.push(document);
    }
    Ok(documents)
}
