//! Cosine similarity and deterministic ranking.

use std::cmp::Ordering;

/// Cosine similarity of two equal-length vectors, in [-1, 1].
///
/// A zero vector on either side scores 0, as does any non-finite result
/// (NaN or infinite components). Length agreement is the caller's job; the
/// store checks it before scoring.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    if !score.is_finite() {
        return 0.0;
    }
    let score = score.clamp(-1.0, 1.0);
    // fold -0.0 into 0.0 so it ties with other zero scores
    if score == 0.0 {
        0.0
    } else {
        score
    }
}

/// Descending order on scores. Total, so NaN never breaks the sort.
pub fn by_score_desc(a: f32, b: f32) -> Ordering {
    b.total_cmp(&a)
}

/// Sort `items` by descending score, keeping the incoming order for ties.
pub fn rank_by_score<T>(items: &mut [T], score: impl Fn(&T) -> f32) {
    // sort_by is stable
    items.sort_by(|a, b| by_score_desc(score(a), score(b)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 1.0]) - 0.70710677).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_is_scale_invariant() {
        let a = cosine_similarity(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]);
        let b = cosine_similarity(&[10.0, 20.0, 30.0], &[0.3, 0.2, 0.1]);
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_non_finite_components_score_zero() {
        assert_eq!(cosine_similarity(&[f32::NAN, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[f32::INFINITY, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[f32::MAX, f32::MAX], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let mut items = vec![("a", 0.5), ("b", 0.9), ("c", 0.5), ("d", 0.9), ("e", -0.1)];
        rank_by_score(&mut items, |item| item.1);
        let order: Vec<&str> = items.iter().map(|item| item.0).collect();
        assert_eq!(order, vec!["b", "d", "a", "c", "e"]);
    }
}
