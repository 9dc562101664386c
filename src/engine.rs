//! The contract between a matching engine and the code that drives it.

use crate::analyze::AnalyzedSentence;
use crate::rule::{Rule, RuleKey};
use std::fmt;

/// A span flagged by a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub rule_id: String,
    pub sub_id: String,
    /// Byte offset where the flagged span starts.
    pub start: usize,
    /// Byte offset one past the flagged span.
    pub end: usize,
    /// Suggested replacements for the span, in order.
    pub suggestions: Vec<String>,
}

impl fmt::Display for RuleMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]:{}-{}:{:?}",
            self.rule_id, self.sub_id, self.start, self.end, self.suggestions
        )
    }
}

/// How a rule's pattern is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchMode {
    /// Phrase-alternative semantics: tokens are compared literally.
    Composite,
    /// Single-pattern semantics: the rule's own settings apply.
    Single,
}

impl MatchMode {
    /// The mode a rule gets when nothing overrides it.
    pub fn for_rule(rule: &Rule) -> Self {
        if rule.is_composite() {
            MatchMode::Composite
        } else {
            MatchMode::Single
        }
    }
}

/// The kind of rule behind an id. All pattern rules share one class; other
/// rules (spelling, built-in checks) are identified by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleClass {
    Pattern,
    Builtin(String),
}

impl fmt::Display for RuleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleClass::Pattern => write!(f, "pattern rule"),
            RuleClass::Builtin(name) => write!(f, "{}", name),
        }
    }
}

/// Id and class of every rule an engine knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDescriptor {
    pub id: String,
    pub class: RuleClass,
}

impl RuleDescriptor {
    pub fn new(id: impl Into<String>, class: RuleClass) -> Self {
        Self { id: id.into(), class }
    }
}

/// A matching engine for one language.
///
/// Matches come back in engine order; callers must not assume they are
/// sorted by position.
pub trait MatchEngine {
    /// Tokenize a sentence the way the engine sees it.
    fn analyze(&self, sentence: &str) -> AnalyzedSentence;

    /// Evaluate one rule against a single sentence.
    fn match_rule(&self, rule: &Rule, mode: MatchMode, sentence: &str) -> Vec<RuleMatch>;

    /// Every rule the engine knows about, pattern rules included.
    fn all_rules(&self) -> Vec<RuleDescriptor>;

    /// Split `text` into sentences and run every enabled rule on each, in
    /// the mode `mode_of` picks for it.
    fn check_text(&self, text: &str, mode_of: &dyn Fn(RuleKey, &Rule) -> MatchMode) -> Vec<RuleMatch>;

    /// Ids of the currently enabled rules.
    fn active_rule_ids(&self) -> Vec<String>;

    fn enable_rule(&mut self, id: &str);

    fn disable_rule(&mut self, id: &str);

    /// Release engine resources. Called exactly once by the owner.
    fn shutdown(&mut self) {}
}
