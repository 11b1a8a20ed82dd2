//! Query Intent Templates
//!
//! Recognises how-to, definition, rules, stats, spell and character questions
//! and proposes alternative phrasings of the extracted topic.

use std::fmt;

use crate::core::search::error::SearchError;
use crate::core::ttrpg_search::PatternTable;

/// Kind of answer a query is after
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentKind {
    HowTo,
    Definition,
    Rules,
    Stats,
    Spell,
    Character,
}

/// Intent templates. The first capture group is the topic.
const INTENT_TEMPLATES: &[(IntentKind, &str)] = &[
    (IntentKind::HowTo, r"how\s+(?:do|does|can)\s+(?:i|you|one)\s+(.+)"),
    (IntentKind::HowTo, r"how\s+to\s+(.+)"),
    (IntentKind::HowTo, r"what.*way.*to\s+(.+)"),
    (IntentKind::Definition, r"what\s+(?:is|are)\s+(?:an?\s+)?(.+)"),
    (IntentKind::Definition, r"define\s+(.+)"),
    (IntentKind::Definition, r"(?:meaning|definition)\s+of\s+(.+)"),
    (IntentKind::Rules, r"(.+)\s+rules?"),
    (IntentKind::Rules, r"rules?\s+for\s+(.+)"),
    (IntentKind::Rules, r"how\s+does\s+(.+)\s+work"),
    (IntentKind::Stats, r"(.+)\s+stats?"),
    (IntentKind::Stats, r"statistics?\s+for\s+(.+)"),
    (IntentKind::Stats, r"(.+)\s+(?:ac|hp|damage|abilities)"),
    (IntentKind::Spell, r"(.+)\s+spell"),
    (IntentKind::Spell, r"spell\s+(.+)"),
    (IntentKind::Spell, r"cast(?:ing)?\s+(.+)"),
    (IntentKind::Character, r"character\s+(.+)"),
    (IntentKind::Character, r"build\s+(.+)"),
    (IntentKind::Character, r"creating?\s+(.+)\s+character"),
];

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::HowTo => "how_to",
            IntentKind::Definition => "definition",
            IntentKind::Rules => "rules",
            IntentKind::Stats => "stats",
            IntentKind::Spell => "spell",
            IntentKind::Character => "character",
        }
    }

    /// Alternative phrasings for a topic: `(query, explanation)`
    pub fn phrasings(&self, topic: &str) -> Vec<(String, &'static str)> {
        match self {
            IntentKind::HowTo => vec![
                (format!("{} rules", topic), "Try searching for the rules directly"),
                (format!("{} mechanics", topic), "Search for game mechanics"),
            ],
            IntentKind::Definition => {
                vec![(format!("{} explanation", topic), "Search for detailed explanation")]
            }
            IntentKind::Rules => vec![(
                format!("how does {} work", topic),
                "Ask how the rule works in play",
            )],
            IntentKind::Stats => {
                vec![(format!("{} stat block", topic), "Search for the full stat block")]
            }
            IntentKind::Spell => vec![(
                format!("{} spell description", topic),
                "Search for the spell description",
            )],
            IntentKind::Character => vec![(
                format!("{} character options", topic),
                "Search for character options",
            )],
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A matched intent with its extracted topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentMatch {
    pub kind: IntentKind,
    pub topic: String,
}

/// Matches queries against the intent templates.
#[derive(Debug)]
pub struct IntentDetector {
    templates: PatternTable<IntentKind>,
}

impl Default for IntentDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentDetector {
    pub fn new() -> Self {
        Self::from_templates(INTENT_TEMPLATES.iter().copied())
    }

    /// Build from custom templates; invalid ones are skipped
    pub fn from_templates<'a, I>(templates: I) -> Self
    where
        I: IntoIterator<Item = (IntentKind, &'a str)>,
    {
        Self {
            templates: PatternTable::compile("intent", templates),
        }
    }

    /// Every intent family that matches, in table order.
    ///
    /// Within a family the first matching template wins; a match with an
    /// empty topic is ignored.
    pub fn detect(&self, query: &str) -> Vec<IntentMatch> {
        let mut matches: Vec<IntentMatch> = Vec::new();

        for pattern in self.templates.iter() {
            if matches.iter().any(|m| m.kind == pattern.label) {
                continue;
            }
            let Some(captures) = pattern.regex.captures(query) else {
                continue;
            };
            let topic = captures.get(1).map_or("", |m| m.as_str().trim());
            if !topic.is_empty() {
                matches.push(IntentMatch {
                    kind: pattern.label,
                    topic: topic.to_string(),
                });
            }
        }

        matches
    }

    pub fn errors(&self) -> &[SearchError] {
        self.templates.errors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_how_to_topic() {
        let detector = IntentDetector::new();
        let matches = detector.detect("how do i grapple a goblin");
        assert_eq!(
            matches[0],
            IntentMatch {
                kind: IntentKind::HowTo,
                topic: "grapple a goblin".to_string()
            }
        );
    }

    #[test]
    fn test_definition_strips_article() {
        let detector = IntentDetector::new();
        let matches = detector.detect("What is an opportunity attack");
        assert_eq!(matches[0].kind, IntentKind::Definition);
        assert_eq!(matches[0].topic, "opportunity attack");
    }

    #[test]
    fn test_multiple_families_match() {
        let detector = IntentDetector::new();
        let kinds: Vec<IntentKind> = detector
            .detect("fireball spell rules")
            .into_iter()
            .map(|m| m.kind)
            .collect();
        assert!(kinds.contains(&IntentKind::Rules));
        assert!(kinds.contains(&IntentKind::Spell));
    }

    #[test]
    fn test_no_intent() {
        let detector = IntentDetector::new();
        assert!(detector.detect("goblin").is_empty());
        assert!(detector.detect("").is_empty());
    }

    #[test]
    fn test_phrasings() {
        let phrasings = IntentKind::HowTo.phrasings("cast spells");
        let queries: Vec<&str> = phrasings.iter().map(|(q, _)| q.as_str()).collect();
        assert_eq!(queries, vec!["cast spells rules", "cast spells mechanics"]);
        assert_eq!(
            IntentKind::Definition.phrasings("armor class")[0].0,
            "armor class explanation"
        );
    }

    #[test]
    fn test_invalid_template_skipped() {
        let detector = IntentDetector::from_templates([
            (IntentKind::Rules, r"(.+)\s+rules?"),
            (IntentKind::Stats, r"([unclosed"),
        ]);
        assert_eq!(detector.errors().len(), 1);
        assert_eq!(detector.detect("combat rules")[0].topic, "combat");
    }
}
