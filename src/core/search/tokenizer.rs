//! Search Tokenizer
//!
//! Converts rulebook text into lexical tokens tuned for game notation.
//! Dice expressions (`2d6`) become `2 d 6 dice roll`, signed modifiers
//! become `plus N` / `minus N`, and adjacent-token bigrams joined with `_`
//! are appended so phrase matches work without a positional index.

use regex::Regex;
use std::sync::LazyLock;

/// Separator used when joining adjacent tokens into a bigram
pub const BIGRAM_SEPARATOR: char = '_';

static DICE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)d(\d+)").expect("dice pattern is valid"));
static PLUS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+(\d+)").expect("plus pattern is valid"));
static MINUS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-(\d+)").expect("minus pattern is valid"));
static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+").expect("word pattern is valid"));

/// Lowercase and rewrite dice and modifier notation into plain words
fn rewrite_notation(text: &str) -> String {
    let lowered = text.to_lowercase();
    let dice = DICE_PATTERN.replace_all(&lowered, " $1 d $2 dice roll ");
    let plus = PLUS_PATTERN.replace_all(&dice, " plus $1 ");
    MINUS_PATTERN.replace_all(&plus, " minus $1 ").into_owned()
}

/// Base unigram tokens, without bigrams
pub fn unigrams(text: &str) -> Vec<String> {
    let rewritten = rewrite_notation(text);
    WORD_PATTERN
        .find_iter(&rewritten)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Adjacent-token pairs joined by [`BIGRAM_SEPARATOR`]
pub fn bigrams(tokens: &[String]) -> Vec<String> {
    tokens
        .windows(2)
        .map(|pair| format!("{}{}{}", pair[0], BIGRAM_SEPARATOR, pair[1]))
        .collect()
}

/// Full token stream: unigrams followed by bigrams. Never fails.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = unigrams(text);
    let pairs = bigrams(&tokens);
    tokens.extend(pairs);
    tokens
}

/// Normalised text form: the unigrams joined by single spaces.
///
/// `tokenize(&normalize(s)) == tokenize(s)` for ASCII input.
pub fn normalize(text: &str) -> String {
    unigrams(text).join(" ")
}
