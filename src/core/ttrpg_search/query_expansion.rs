//! Query Expansion Module
//!
//! Domain vocabulary tables (abbreviations, synonyms, misspellings, stop
//! words) and the synonym expander used on the keyword retrieval path.

use std::collections::{HashMap, HashSet};

// ============================================================================
// Constants - Abbreviation Expansions
// ============================================================================

/// Common TTRPG abbreviations and their expansions, applied in this order
pub const ABBREVIATIONS: &[(&str, &str)] = &[
    // Core mechanics
    ("ac", "armor class"),
    ("hp", "hit points"),
    ("mp", "magic points"),
    ("pc", "player character"),
    ("npc", "non-player character"),
    ("dm", "dungeon master"),
    ("gm", "game master"),
    ("cr", "challenge rating"),
    ("xp", "experience points"),

    // Ability scores
    ("str", "strength"),
    ("dex", "dexterity"),
    ("con", "constitution"),
    ("int", "intelligence"),
    ("wis", "wisdom"),
    ("cha", "charisma"),

    // Source books
    ("phb", "players handbook"),
    ("dmg", "dungeon masters guide"),
    ("mm", "monster manual"),

    // Actions
    ("aoo", "attack of opportunity"),
];

// ============================================================================
// Constants - Synonyms
// ============================================================================

/// Keyword-path synonyms. Entries joined with `_` match tokenizer bigrams.
pub const SYNONYMS: &[(&str, &[&str])] = &[
    ("damage", &["dmg", "harm", "injury", "hurt"]),
    ("armor", &["ac", "armor_class", "defence", "defense"]),
    ("spell", &["magic", "cantrip", "incantation", "ritual"]),
    ("weapon", &["sword", "bow", "staff", "blade", "gun"]),
    ("monster", &["creature", "enemy", "foe", "beast", "npc"]),
    ("character", &["pc", "player_character", "hero", "protagonist"]),
    ("skill", &["ability", "proficiency", "talent"]),
    ("save", &["saving_throw", "resistance", "check"]),
    ("roll", &["dice", "check", "test", "throw"]),
    ("level", &["lvl", "tier", "rank"]),
    ("class", &["job", "profession", "archetype"]),
    ("race", &["species", "ancestry", "heritage"]),
    ("hp", &["health", "hit_points", "life", "vitality"]),
    ("mp", &["mana", "magic_points", "spell_points"]),
];

// ============================================================================
// Constants - Misspellings
// ============================================================================

/// Frequent misspellings in TTRPG queries and their corrections
pub const MISSPELLINGS: &[(&str, &str)] = &[
    ("armour", "armor"),
    ("defence", "defense"),
    ("rouge", "rogue"),
    ("lightening", "lightning"),
    ("magick", "magic"),
    ("dexterety", "dexterity"),
    ("charsima", "charisma"),
    ("wizzard", "wizard"),
    ("theif", "thief"),
    ("initative", "initiative"),
    ("grappel", "grapple"),
    ("paladine", "paladin"),
];

// ============================================================================
// Constants - Stop Words
// ============================================================================

/// Stop words excluded from vocabulary and never spell-corrected
pub const STOP_WORDS: &[&str] = &[
    // Articles
    "a", "an", "the",
    // Pronouns
    "i", "you", "he", "she", "it", "we", "they",
    "me", "him", "her", "us", "them",
    "my", "your", "his", "its", "our", "their",
    "this", "that", "these", "those",
    "who", "whom", "whose", "which", "what",
    // Prepositions
    "in", "on", "at", "to", "for", "of", "with",
    "by", "from", "as", "into", "through", "during",
    "before", "after", "above", "below", "between",
    "under", "over", "out", "up", "down", "off",
    "about", "against", "among", "around",
    // Conjunctions
    "and", "or", "but", "nor", "so", "yet",
    "because", "although", "while", "if", "unless",
    // Verbs (common)
    "is", "are", "was", "were", "be", "been", "being",
    "have", "has", "had", "having",
    "do", "does", "did", "doing",
    "will", "would", "could", "should", "may", "might", "must",
    "can", "shall",
    // Adverbs
    "not", "no", "very", "just", "only", "also",
    "too", "more", "most", "less", "least",
    "now", "then", "here", "there", "when", "where",
    "why", "how", "all", "each", "every", "both",
    "few", "many", "some", "any", "other", "such",
    "own", "same",
];

// ============================================================================
// Constants - Query Shape Terms
// ============================================================================

/// Body keywords that mark a stat block
pub const STAT_KEYWORDS: &[&str] = &["hp", "ac", "str", "dex", "con"];

/// Terms that make a short query too vague to be useful on its own
pub const VAGUE_TERMS: &[&str] = &["rules", "how", "mechanics", "stats"];

/// Notation terms that favour exact keyword matching
pub const SPECIFIC_TERMS: &[&str] = &["d20", "ac", "hp", "spell slot"];

/// Words that mark a conceptual question
pub const CONCEPTUAL_WORDS: &[&str] = &["how", "why", "explain", "understand"];

/// Content types worth calling out when explaining a result
pub const RELEVANT_CONTENT_TYPES: &[&str] = &["rule", "definition", "stat_block"];

/// Check if a word is a stop word
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Whole-word (or whole-phrase) containment over lowercase whitespace words
pub fn contains_term(words: &[&str], term: &str) -> bool {
    let parts: Vec<&str> = term.split_whitespace().collect();
    if parts.is_empty() || parts.len() > words.len() {
        return false;
    }
    words.windows(parts.len()).any(|window| window == parts.as_slice())
}

// ============================================================================
// Query Expander
// ============================================================================

/// Keyword-path query expansion
#[derive(Debug, Clone)]
pub struct ExpandedTerms {
    /// Synonyms to append to the lexical token stream
    pub synonyms: Vec<String>,
    /// Query words that had synonyms, in query order
    pub focus_terms: Vec<String>,
}

/// Expands query words with domain synonyms.
#[derive(Debug, Clone)]
pub struct QueryExpander {
    synonyms: HashMap<&'static str, &'static [&'static str]>,
}

impl Default for QueryExpander {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryExpander {
    pub fn new() -> Self {
        Self {
            synonyms: SYNONYMS.iter().copied().collect(),
        }
    }

    /// Get synonyms for a term.
    pub fn get_synonyms(&self, term: &str) -> Option<&'static [&'static str]> {
        self.synonyms.get(term.to_lowercase().as_str()).copied()
    }

    /// Collect synonyms and focus terms for the given query words.
    pub fn expand_words<S: AsRef<str>>(&self, words: &[S]) -> ExpandedTerms {
        let mut synonyms = Vec::new();
        let mut focus_terms = Vec::new();
        let mut seen_focus = HashSet::new();

        for word in words {
            let word = word.as_ref().to_lowercase();
            if let Some(group) = self.get_synonyms(&word) {
                synonyms.extend(group.iter().map(|s| s.to_string()));
                if seen_focus.insert(word.clone()) {
                    focus_terms.push(word);
                }
            }
        }

        ExpandedTerms {
            synonyms,
            focus_terms,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
