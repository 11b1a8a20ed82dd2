//! Property-based tests for the search tokenizer

use proptest::prelude::*;

use crate::core::search::tokenizer::{normalize, tokenize, unigrams};

/// ASCII game text: words, numbers, dice and modifiers
fn arb_game_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 +\\-.,]{0,60}"
}

/// A dice expression like `3d8`
fn arb_dice() -> impl Strategy<Value = (u32, u32)> {
    (1u32..20, 2u32..100)
}

proptest! {
    /// Property: tokenizing normalised text gives the same tokens
    #[test]
    fn prop_normalize_is_idempotent(text in arb_game_text()) {
        let normalized = normalize(&text);
        prop_assert_eq!(tokenize(&normalized), tokenize(&text));
        prop_assert_eq!(normalize(&normalized), normalized);
    }

    /// Property: every token is lowercase and non-empty
    #[test]
    fn prop_tokens_lowercase(text in arb_game_text()) {
        for token in tokenize(&text) {
            prop_assert!(!token.is_empty());
            prop_assert_eq!(token.to_lowercase(), token);
        }
    }

    /// Property: token stream is unigrams followed by one bigram per adjacent pair
    #[test]
    fn prop_bigram_count(text in arb_game_text()) {
        let words = unigrams(&text);
        let expected = if words.is_empty() { 0 } else { words.len() * 2 - 1 };
        prop_assert_eq!(tokenize(&text).len(), expected);
    }

    /// Property: "XdY" and "X d Y" share the dice number tokens
    #[test]
    fn prop_dice_spacing_shares_tokens((count, sides) in arb_dice()) {
        let compact = tokenize(&format!("{}d{}", count, sides));
        let spaced = tokenize(&format!("{} d {}", count, sides));

        for token in unigrams(&format!("{} d {}", count, sides)) {
            prop_assert!(compact.contains(&token), "compact form missing {}", token);
            prop_assert!(spaced.contains(&token));
        }
        prop_assert!(compact.contains(&"dice".to_string()));
    }
}
