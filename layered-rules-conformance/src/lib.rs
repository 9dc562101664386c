#![doc(
    html_logo_url = "https://raw.githubusercontent.com/storyscript/layered-nlp/main/assets/layered-nlp.svg",
    issue_tracker_base_url = "https://github.com/storyscript/layered-nlp/issues/"
)]

//! Conformance harness for pattern rules.
//!
//! Every rule carries its own examples: incorrect sentences with a
//! `<marker>…</marker>` span the rule must flag (and optionally the exact
//! suggestions it must offer) and correct sentences it must leave alone. This
//! crate runs those examples against a [`MatchEngine`](layered_rules::MatchEngine)
//! and reports every violation.
//!
//! ## Modules
//!
//! - [`markup`] - Extracts sentence, expected span and corrections from examples
//! - [`verifier`] - Verifies a rule's examples against the engine
//! - [`resolver`] - Multi-pass resolution of phrase-alternative rules
//! - [`suggestion`] - Suggestion equality and the correction fixpoint check
//! - [`ruleset`] - Id uniqueness and example coverage across a rule set
//! - [`lint`] - Warnings for suspicious regex use in pattern tokens
//! - [`driver`] - Per-language orchestration and engine lifecycle
//! - [`report`] - Per-language and whole-run results
//! - [`config`] - Harness configuration loaded from TOML
//! - [`errors`] - Error types for the harness

pub mod config;
pub mod driver;
pub mod errors;
pub mod lint;
pub mod markup;
pub mod report;
pub mod resolver;
pub mod ruleset;
pub mod suggestion;
pub mod verifier;

// Re-exports for convenient access to core types
pub use config::HarnessConfig;
pub use driver::{cross_check_sentence_splitting, grammar_file_names, pattern_engine, EngineSession, HarnessDriver};
pub use errors::{ConfigError, HarnessError, HarnessResult};
pub use lint::{lint_rule_set, lint_token};
pub use markup::{
    collapse_indentation, parse_correct_example, parse_incorrect_example, strip_tags, ExpectedCorrections,
    ParsedExample, MARKER_END, MARKER_START,
};
pub use report::{LanguageReport, LanguageStatus, RunReport};
pub use resolver::{
    ComplexPhraseResolver, DemotionOverrides, PendingEntry, ResolutionOutcome, ResolutionState,
    NEVER_MATCHED_MESSAGE,
};
pub use ruleset::{validate_example_coverage, validate_rule_ids};
pub use suggestion::{check_corrections_resolve, check_suggestions};
pub use verifier::{verify_correct_example, verify_incorrect_example, VerificationPath, VerifyContext};

#[cfg(test)]
mod tests;
