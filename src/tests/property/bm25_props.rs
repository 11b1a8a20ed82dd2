//! Property-based tests for BM25 keyword scoring

use proptest::prelude::*;

use crate::core::search::keyword::{normalize_score, Bm25Params, KeywordIndex};
use crate::core::search::models::Document;
use crate::core::search::tokenizer::tokenize;

/// Document with `hits` occurrences of `term` padded to `length` words
fn padded_document(term: &str, hits: usize, length: usize) -> Document {
    let mut words = vec![term; hits];
    words.extend(std::iter::repeat("filler").take(length - hits));
    Document::new("target", words.join(" "))
}

fn arb_corpus() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-z]{2,8}( [a-z]{2,8}){0,12}", 1..12)
}

proptest! {
    /// Property: adding occurrences of a query term at a fixed document
    /// length never decreases the document's score
    #[test]
    fn prop_more_occurrences_never_lower_score(
        length in 4usize..40,
        k1 in 0.5f32..3.0,
        b in 0.0f32..1.0,
    ) {
        let params = Bm25Params { k1, b };
        let others = vec![
            Document::new("a", "goblins lurk in the caves"),
            Document::new("b", "the innkeeper pours ale for the party"),
        ];
        let query = vec!["fireball".to_string()];

        let mut previous = 0.0f32;
        for hits in 1..=length {
            let mut corpus = vec![padded_document("fireball", hits, length)];
            corpus.extend(others.iter().cloned());
            let score = KeywordIndex::build(corpus, params).scores(&query)[0];

            prop_assert!(
                score >= previous,
                "score fell from {} to {} at {} hits",
                previous,
                score,
                hits
            );
            previous = score;
        }
    }

    /// Property: raw scores are finite and non-negative for any query
    #[test]
    fn prop_scores_finite_non_negative(
        texts in arb_corpus(),
        query in "[a-z]{2,8}( [a-z]{2,8}){0,4}",
    ) {
        let documents: Vec<Document> = texts
            .iter()
            .enumerate()
            .map(|(i, text)| Document::new(format!("d{i}"), text.clone()))
            .collect();
        let index = KeywordIndex::build(documents, Bm25Params::default());

        let scores = index.scores(&tokenize(&query));
        prop_assert_eq!(scores.len(), texts.len());
        for score in scores {
            prop_assert!(score.is_finite());
            prop_assert!(score >= 0.0);
        }
    }

    /// Property: search results are sorted and only contain matching documents
    #[test]
    fn prop_search_sorted_and_positive(
        texts in arb_corpus(),
        query in "[a-z]{2,8}( [a-z]{2,8}){0,4}",
        k in 1usize..10,
    ) {
        let documents: Vec<Document> = texts
            .iter()
            .enumerate()
            .map(|(i, text)| Document::new(format!("d{i}"), text.clone()))
            .collect();
        let index = KeywordIndex::build(documents, Bm25Params::default());
        let hits = index.search(&tokenize(&query), k);

        prop_assert!(hits.len() <= k);
        for pair in hits.windows(2) {
            prop_assert!(pair[0].1 >= pair[1].1);
        }
        for (_, score) in hits {
            prop_assert!(score > 0.0);
        }
    }

    /// Property: normalised scores stay within [0, 1] and preserve order
    #[test]
    fn prop_normalize_bounded_monotonic(
        a in 0.0f32..100.0,
        b in 0.0f32..100.0,
        cap in 0.1f32..50.0,
    ) {
        let (na, nb) = (normalize_score(a, cap), normalize_score(b, cap));
        prop_assert!((0.0..=1.0).contains(&na));
        prop_assert!((0.0..=1.0).contains(&nb));
        if a <= b {
            prop_assert!(na <= nb);
        }
    }
}
