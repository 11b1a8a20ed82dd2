//! Property-based tests for hybrid fusion and boosting

use proptest::prelude::*;

use crate::core::search::hybrid::{
    apply_boosts, fuse, rank, QueryAnalysis, QueryIntent, SearchConfig,
};
use crate::core::search::models::{Document, ScoredDocument};

fn arb_intent() -> impl Strategy<Value = QueryIntent> {
    prop_oneof![
        Just(QueryIntent::General),
        Just(QueryIntent::Instruction),
        Just(QueryIntent::Definition),
        Just(QueryIntent::Rules),
        Just(QueryIntent::Stats),
        Just(QueryIntent::List),
        Just(QueryIntent::DiceMechanics),
    ]
}

/// Documents that trigger as many boosts as possible
fn arb_document() -> impl Strategy<Value = Document> {
    (
        "[a-z]{1,6}",
        prop::option::of(1u32..400),
        prop::bool::ANY,
    )
        .prop_map(|(id, page, definition)| {
            let mut doc = Document::new(id, "Goblin AC 15 HP 7 STR 8")
                .with_title("Armor and Spell Rules");
            if let Some(page) = page {
                doc = doc.with_page(page);
            }
            if definition {
                doc = doc.with_content_type("definition");
            }
            doc
        })
}

fn arb_weighted_config() -> impl Strategy<Value = SearchConfig> {
    (0.0f32..1.0, prop::bool::ANY).prop_map(|(semantic, reranking)| SearchConfig {
        semantic_weight: semantic,
        keyword_weight: 1.0 - semantic,
        min_score_threshold: 0.0,
        max_results: 50,
        enable_reranking: reranking,
    })
}

fn scored(documents: &[Document], scores: &[f32]) -> Vec<ScoredDocument> {
    documents
        .iter()
        .zip(scores)
        .map(|(document, &score)| ScoredDocument {
            document: document.clone(),
            score,
        })
        .collect()
}

proptest! {
    /// Property: no boost sequence pushes a score outside [0, 1]
    #[test]
    fn prop_boosted_score_bounded(
        score in 0.0f32..=1.0,
        document in arb_document(),
        intent in arb_intent(),
    ) {
        let analysis = QueryAnalysis {
            intent,
            focus_terms: vec!["armor".to_string(), "spell".to_string()],
        };
        let boosted = apply_boosts(score, &document, &analysis);
        prop_assert!((0.0..=1.0).contains(&boosted));
        prop_assert!(boosted >= score.min(1.0));
    }

    /// Property: fused scores stay within [0, 1] for weights summing to one
    #[test]
    fn prop_fused_scores_bounded(
        documents in prop::collection::vec(arb_document(), 1..10),
        semantic_scores in prop::collection::vec(0.0f32..=1.0, 10),
        keyword_scores in prop::collection::vec(0.0f32..=1.0, 10),
        config in arb_weighted_config(),
        intent in arb_intent(),
    ) {
        let analysis = QueryAnalysis {
            intent,
            focus_terms: vec!["armor".to_string()],
        };
        let results = fuse(
            scored(&documents, &semantic_scores),
            scored(&documents, &keyword_scores),
            &config,
            &analysis,
        );

        for result in results {
            prop_assert!((0.0..=1.0).contains(&result.relevance_score));
        }
    }

    /// Property: a document absent from the keyword side scores exactly
    /// `semantic_weight * semantic_score`
    #[test]
    fn prop_missing_keyword_side_contributes_zero(
        semantic_score in 0.0f32..=1.0,
        semantic_weight in 0.0f32..=1.0,
        keyword_weight in 0.0f32..=1.0,
    ) {
        let config = SearchConfig {
            semantic_weight,
            keyword_weight,
            min_score_threshold: 0.0,
            max_results: 10,
            enable_reranking: false,
        };
        let document = Document::new("only-semantic", "text");
        let results = fuse(
            scored(&[document], &[semantic_score]),
            Vec::new(),
            &config,
            &QueryAnalysis::default(),
        );

        let expected = (semantic_weight * semantic_score).clamp(0.0, 1.0);
        prop_assert_eq!(results[0].relevance_score, expected);
    }

    /// Property: ranking is sorted, thresholded and truncated
    #[test]
    fn prop_rank_sorted_and_thresholded(
        documents in prop::collection::vec(arb_document(), 1..10),
        semantic_scores in prop::collection::vec(0.0f32..=1.0, 10),
        threshold in 0.0f32..0.5,
        max_results in 1usize..10,
    ) {
        let config = SearchConfig {
            min_score_threshold: threshold,
            max_results,
            enable_reranking: false,
            ..Default::default()
        };
        let results = rank(
            fuse(
                scored(&documents, &semantic_scores),
                Vec::new(),
                &config,
                &QueryAnalysis::default(),
            ),
            &config,
        );

        prop_assert!(results.len() <= max_results);
        for result in &results {
            prop_assert!(result.relevance_score >= threshold);
        }
        for pair in results.windows(2) {
            prop_assert!(pair[0].relevance_score >= pair[1].relevance_score);
        }
    }
}
