//! Pattern rule records and the per-language rule set.
//!
//! Rules are immutable once loaded. Anything that needs to reinterpret a rule
//! (e.g. treating a composite rule as a simple one) keeps that state on the
//! side, keyed by [`RuleKey`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;

/// How a rule's pattern was authored, which decides how it gets verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleVariant {
    /// A single token sequence.
    Simple,
    /// One phrase alternative of a rule built from several phrases. All
    /// alternatives share the public id and sub-id.
    Composite,
    /// A regular expression over the raw sentence text.
    RegexBased,
}

/// One element of a token pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternToken {
    pub text: String,
    /// Interpret `text` as a regular expression anchored to the whole token.
    #[serde(default)]
    pub regex: bool,
}

impl PatternToken {
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            regex: false,
        }
    }

    pub fn regex(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            regex: true,
        }
    }
}

/// What a rule looks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Tokens(Vec<PatternToken>),
    Regex(String),
}

/// An example sentence that must trigger the rule exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncorrectExample {
    /// Raw text including the `<marker>…</marker>` span.
    pub example: String,
    /// Expected suggestions, in order. `[""]` means "no suggestion".
    pub corrections: Vec<String>,
}

impl IncorrectExample {
    pub fn new(example: impl Into<String>, corrections: Vec<String>) -> Self {
        Self {
            example: example.into(),
            corrections,
        }
    }
}

/// A single pattern rule as loaded from a rule file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub id: String,
    pub sub_id: String,
    /// Short language code the rule belongs to.
    pub language: String,
    pub variant: RuleVariant,
    pub pattern: Pattern,
    /// Token sequences that suppress any overlapping match.
    pub antipatterns: Vec<Vec<PatternToken>>,
    pub message: String,
    pub suggestions_out_msg: String,
    pub case_sensitive: bool,
    pub default_off: bool,
    pub incorrect_examples: Vec<IncorrectExample>,
    pub correct_examples: Vec<String>,
}

impl Rule {
    /// Build a simple token rule with an empty example list.
    pub fn simple(id: impl Into<String>, language: impl Into<String>, tokens: Vec<PatternToken>) -> Self {
        Self {
            id: id.into(),
            sub_id: "1".to_string(),
            language: language.into(),
            variant: RuleVariant::Simple,
            pattern: Pattern::Tokens(tokens),
            antipatterns: Vec::new(),
            message: String::new(),
            suggestions_out_msg: String::new(),
            case_sensitive: false,
            default_off: false,
            incorrect_examples: Vec::new(),
            correct_examples: Vec::new(),
        }
    }

    /// `ID[sub_id]`, the form used in every diagnostic.
    pub fn full_id(&self) -> String {
        format!("{}[{}]", self.id, self.sub_id)
    }

    /// Whether the message or the suggestion-out message declares a
    /// `<suggestion>` element.
    pub fn declares_suggestion(&self) -> bool {
        self.message.contains("<suggestion>") || self.suggestions_out_msg.contains("<suggestion>")
    }

    pub fn is_composite(&self) -> bool {
        self.variant == RuleVariant::Composite
    }
}

/// Position of a rule inside its [`RuleSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleKey(pub usize);

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The ordered pattern rules of one language.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    language: String,
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(language: impl Into<String>, rules: Vec<Rule>) -> Self {
        Self {
            language: language.into(),
            rules,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, key: RuleKey) -> Option<&Rule> {
        self.rules.get(key.0)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn keys(&self) -> impl Iterator<Item = RuleKey> + '_ {
        (0..self.rules.len()).map(RuleKey)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RuleKey, &Rule)> + '_ {
        self.rules.iter().enumerate().map(|(idx, rule)| (RuleKey(idx), rule))
    }

    /// All rules sharing a public id and sub-id. A rule built from phrase
    /// alternatives shows up here once per alternative.
    pub fn rules_by_id_and_sub_id(&self, id: &str, sub_id: &str) -> Vec<RuleKey> {
        self.iter()
            .filter(|(_, rule)| rule.id == id && rule.sub_id == sub_id)
            .map(|(key, _)| key)
            .collect()
    }

    pub fn extend(&mut self, rules: impl IntoIterator<Item = Rule>) {
        self.rules.extend(rules);
    }
}

/// Keys are only meaningful for the set that produced them.
impl Index<RuleKey> for RuleSet {
    type Output = Rule;

    fn index(&self, key: RuleKey) -> &Rule {
        &self.rules[key.0]
    }
}
