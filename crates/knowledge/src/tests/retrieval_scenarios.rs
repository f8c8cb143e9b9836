//! Retrieval behaviour across the store, selector and planner.

use crate::context::{pick_context, SelectionOptions, TRUNCATION_MARKER};
use crate::documents::SqliteDocumentStore;
use crate::planner::{classify_intent, Intent};
use crate::store::{document_metadata, SqliteVectorStore, VectorEntry, VectorStore};
use crate::types::{Document, SourceTag};
use chrono::{TimeZone, Utc};
use footprint_core::AppError;
use std::collections::BTreeSet;
use tempfile::TempDir;

#[cfg(test)]
mod tests {
    use super::*;

    fn document(id: &str, source: SourceTag, content: &str) -> Document {
        Document {
            id: id.to_string(),
            source,
            title: Some(format!("Title of {}", id)),
            content: content.to_string(),
            url: Some(format!("https://example.org/{}", id)),
            published_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
            fetched_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        }
    }

    /// Durable stores in a temp dir, filled with `(document, vector)` pairs.
    struct Footprint {
        _dir: TempDir,
        vectors: SqliteVectorStore,
        documents: SqliteDocumentStore,
    }

    impl Footprint {
        fn new(dimension: usize, items: &[(Document, Vec<f32>)]) -> Self {
            let dir = TempDir::new().unwrap();
            let vectors = SqliteVectorStore::open(&dir.path().join("vectors.sqlite"), dimension)
                .unwrap();
            let documents = SqliteDocumentStore::open(&dir.path().join("documents.sqlite")).unwrap();

            let docs: Vec<Document> = items.iter().map(|(d, _)| d.clone()).collect();
            documents.upsert(&docs).unwrap();

            let entries: Vec<VectorEntry> = items
                .iter()
                .map(|(d, v)| VectorEntry::new(d.id.clone(), v.clone(), document_metadata(d)))
                .collect();
            vectors.upsert(&entries).unwrap();

            Self {
                _dir: dir,
                vectors,
                documents,
            }
        }
    }

    fn three_vectors() -> Footprint {
        Footprint::new(
            2,
            &[
                (document("x", SourceTag::Feed, "x axis"), vec![1.0, 0.0]),
                (document("y", SourceTag::Feed, "y axis"), vec![0.0, 1.0]),
                (document("xy", SourceTag::Feed, "diagonal"), vec![1.0, 1.0]),
            ],
        )
    }

    #[test]
    fn test_search_ranks_by_cosine() {
        let fp = three_vectors();
        let hits = fp.vectors.search(&[1.0, 0.0], 3).unwrap();

        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "xy", "y"]);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
        assert!((hits[1].score - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-4);
        assert!(hits[2].score.abs() < 1e-6);
    }

    #[test]
    fn test_search_is_bounded_by_k() {
        let fp = three_vectors();
        let query = [0.3, 0.7];

        assert_eq!(fp.vectors.search(&query, 2).unwrap().len(), 2);
        assert_eq!(fp.vectors.search(&query, 3).unwrap().len(), 3);
        assert_eq!(fp.vectors.search(&query, 50).unwrap().len(), 3);
        assert!(fp.vectors.search(&query, 0).unwrap().is_empty());
        assert!(fp.vectors.search(&query, -4).unwrap().is_empty());
    }

    #[test]
    fn test_deleted_ids_never_come_back() {
        let fp = three_vectors();

        assert_eq!(fp.vectors.delete(&["xy".to_string()]).unwrap(), 1);
        assert_eq!(fp.vectors.count().unwrap(), 2);
        assert!(fp
            .vectors
            .search(&[1.0, 1.0], 10)
            .unwrap()
            .iter()
            .all(|h| h.id != "xy"));

        assert_eq!(fp.vectors.delete(&["missing".to_string()]).unwrap(), 0);
        assert_eq!(fp.vectors.count().unwrap(), 2);
    }

    #[test]
    fn test_upsert_keeps_one_entry_with_latest_vector() {
        let fp = three_vectors();
        let doc = document("x", SourceTag::Feed, "x axis");

        fp.vectors
            .upsert(&[VectorEntry::new("x", vec![0.0, 1.0], document_metadata(&doc))])
            .unwrap();

        assert_eq!(fp.vectors.count().unwrap(), 3);
        let hits = fp.vectors.search(&[1.0, 0.0], 3).unwrap();
        let x = hits.iter().find(|h| h.id == "x").unwrap();
        assert!(x.score.abs() < 1e-6);
        assert_eq!(hits[0].id, "xy");
    }

    #[test]
    fn test_wrong_length_vectors_are_rejected() {
        let fp = three_vectors();
        let doc = document("z", SourceTag::Feed, "z axis");

        let err = fp
            .vectors
            .upsert(&[VectorEntry::new("z", vec![0.0, 0.0, 1.0], document_metadata(&doc))])
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));

        assert!(matches!(
            fp.vectors.search(&[1.0], 3),
            Err(AppError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
        assert_eq!(fp.vectors.count().unwrap(), 3);
    }

    #[test]
    fn test_store_survives_reopen_with_same_dimension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vectors.sqlite");
        let doc = document("a", SourceTag::Social, "hello");

        {
            let store = SqliteVectorStore::open(&path, 2).unwrap();
            store
                .upsert(&[VectorEntry::new("a", vec![0.5, 0.5], document_metadata(&doc))])
                .unwrap();
        }

        let store = SqliteVectorStore::open(&path, 2).unwrap();
        assert_eq!(store.ids().unwrap(), vec!["a".to_string()]);
        drop(store);

        assert!(matches!(
            SqliteVectorStore::open(&path, 3),
            Err(AppError::DimensionMismatch { .. })
        ));
    }

    /// Five "feed" documents ranked above two "social" ones.
    fn crowded_feed() -> Footprint {
        let mut items = Vec::new();
        for i in 0..5 {
            let id = format!("feed-{}", i);
            items.push((
                document(&id, SourceTag::Feed, "feed body"),
                vec![1.0, 0.1 * i as f32],
            ));
        }
        for i in 0..2 {
            let id = format!("social-{}", i);
            items.push((
                document(&id, SourceTag::Social, "social body"),
                vec![1.0, 0.8 + 0.1 * i as f32],
            ));
        }
        Footprint::new(2, &items)
    }

    #[test]
    fn test_diversity_cap_within_window() {
        let fp = crowded_feed();

        let fragments = pick_context(
            &[1.0, 0.0],
            &fp.vectors,
            &fp.documents,
            &SelectionOptions::new(5),
        )
        .unwrap();

        // the two social documents sit outside the top-5 window
        let ids: Vec<&str> = fragments.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["feed-0", "feed-1", "feed-2"]);
    }

    #[test]
    fn test_diversity_cap_lets_other_sources_through() {
        let fp = crowded_feed();

        let fragments = pick_context(
            &[1.0, 0.0],
            &fp.vectors,
            &fp.documents,
            &SelectionOptions::new(7),
        )
        .unwrap();

        let ids: Vec<&str> = fragments.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["feed-0", "feed-1", "feed-2", "social-0", "social-1"]
        );
        assert!(fragments.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_long_content_is_truncated() {
        let long = "a".repeat(5000);
        let short = "b".repeat(1500);
        let fp = Footprint::new(
            2,
            &[
                (document("long", SourceTag::Document, &long), vec![1.0, 0.0]),
                (document("short", SourceTag::Document, &short), vec![0.9, 0.1]),
            ],
        );

        let fragments = pick_context(
            &[1.0, 0.0],
            &fp.vectors,
            &fp.documents,
            &SelectionOptions::new(2),
        )
        .unwrap();

        assert_eq!(fragments[0].id, "long");
        assert!(fragments[0].truncated);
        assert_eq!(
            fragments[0].content,
            format!("{}{}", "a".repeat(2000), TRUNCATION_MARKER)
        );

        assert_eq!(fragments[1].id, "short");
        assert!(!fragments[1].truncated);
        assert_eq!(fragments[1].content, short);
    }

    #[test]
    fn test_planner_examples() {
        assert_eq!(classify_intent("Can you review my latest repo?"), Intent::Coding);
        assert_eq!(classify_intent("Help me write a cover letter"), Intent::Career);
        assert_eq!(classify_intent("hello"), Intent::General);
    }

    #[test]
    fn test_mixed_sources_end_to_end() {
        let body = "c".repeat(2600);
        let fp = Footprint::new(
            3,
            &[
                (document("repo-near", SourceTag::ProfileHost, &body), vec![1.0, 0.9, 0.0]),
                (document("repo-far", SourceTag::ProfileHost, "far repo"), vec![0.0, 0.0, 1.0]),
                (document("post-near", SourceTag::Feed, "near post"), vec![1.0, 1.0, 0.1]),
                (document("post-far", SourceTag::Feed, "far post"), vec![0.1, 0.0, 1.0]),
            ],
        );

        let eligible = BTreeSet::from([SourceTag::ProfileHost, SourceTag::Feed]);
        let options = SelectionOptions::new(4).with_eligible(eligible);
        let fragments = pick_context(&[1.0, 1.0, 0.0], &fp.vectors, &fp.documents, &options).unwrap();

        assert_eq!(fragments.len(), 4);
        let sources: BTreeSet<SourceTag> = fragments.iter().map(|f| f.source).collect();
        assert_eq!(sources.len(), 2);

        let top: BTreeSet<&str> = fragments[..2].iter().map(|f| f.id.as_str()).collect();
        assert_eq!(top, BTreeSet::from(["repo-near", "post-near"]));
        assert!(fragments.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(fragments
            .iter()
            .all(|f| f.content.chars().count() <= 2000 + TRUNCATION_MARKER.chars().count()));

        let first = &fragments[0];
        assert_eq!(first.date, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        assert!(first.title.is_some());
    }
}
