#![doc(
    html_logo_url = "https://raw.githubusercontent.com/storyscript/layered-nlp/main/assets/layered-nlp.svg",
    issue_tracker_base_url = "https://github.com/storyscript/layered-nlp/issues/"
)]

//! Pattern rules for grammar checking.
//!
//! This crate holds the rule model shared by rule loaders, matching engines and
//! the conformance harness, plus a small reference engine.
//!
//! ## Core Types
//!
//! - [`Rule`] / [`RuleSet`] - Immutable rule records, addressed by [`RuleKey`]
//! - [`RuleRepository`] - Loads and validates TOML rule files
//! - [`Language`] - Language descriptors and their rule files
//! - [`MatchEngine`] - What a matching engine must provide
//! - [`PatternEngine`] - Token-pattern and regex reference engine
//!
//! ## Example
//!
//! ```
//! use layered_rules::{MatchEngine, MatchMode, PatternEngine, PatternToken, Rule, RuleSet};
//! use std::sync::Arc;
//!
//! let mut rule = Rule::simple("A_AN", "en", vec![
//!     PatternToken::literal("a"),
//!     PatternToken::regex("[aeiou].*"),
//! ]);
//! rule.message = "Did you mean <suggestion>an \\2</suggestion>?".to_string();
//!
//! let engine = PatternEngine::new(Arc::new(RuleSet::new("en", vec![rule.clone()])));
//! let matches = engine.match_rule(&rule, MatchMode::Single, "This is a apple.");
//! assert_eq!(matches[0].suggestions, vec!["an apple"]);
//! ```

mod analyze;
mod engine;
mod language;
mod pattern_engine;
mod rule;
mod rule_file;

pub use analyze::{analyze, split_sentences, AnalyzedSentence, AnalyzedToken};
pub use engine::{MatchEngine, MatchMode, RuleClass, RuleDescriptor, RuleMatch};
pub use language::{load_languages, Language};
pub use pattern_engine::PatternEngine;
pub use rule::{IncorrectExample, Pattern, PatternToken, Rule, RuleKey, RuleSet, RuleVariant};
pub use rule_file::{parse_rule_file, RuleFileError, RuleRepository};
