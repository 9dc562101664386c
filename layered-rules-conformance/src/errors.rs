//! Error types for the conformance harness.
//!
//! Every variant names the language, the rule (as `ID[sub_id]`) and, where one
//! exists, the sentence, so a failure can be acted on without re-running.

use thiserror::Error;

/// A violated rule or rule-set invariant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HarnessError {
    /// An incorrect example has no `<marker>…</marker>` pair.
    #[error("{language}: No error position markup ('<marker>...</marker>') in bad example in rule {rule}")]
    MissingMarker { language: String, rule: String },

    /// A tag other than the marker appears before or inside the marker span,
    /// so marker offsets would not line up with the cleaned sentence.
    #[error("{language}: Markup '{tag}' before or inside the marker in rule {rule}: {example}")]
    MisplacedMarkup {
        language: String,
        rule: String,
        tag: String,
        example: String,
    },

    /// An incorrect example has more than one marker tag pair.
    #[error("{language}: More than one error position markup in bad example in rule {rule}: {example}")]
    MultipleMarkers {
        language: String,
        rule: String,
        example: String,
    },

    /// An example is empty once markup and indentation are removed.
    #[error("{language}: Empty {kind} example in rule {rule}")]
    EmptyExample {
        language: String,
        rule: String,
        kind: &'static str,
    },

    #[error("{language} rule {rule}:\n\"{sentence}\"\nErrors expected: 1\nErrors found   : {found}\nMessage: {message}\nAnalyzed token readings:\n{token_dump}\nMatches: [{matches}]")]
    WrongMatchCount {
        language: String,
        rule: String,
        sentence: String,
        found: usize,
        message: String,
        token_dump: String,
        matches: String,
    },

    #[error("{language}: Incorrect match position markup for rule {rule}, sentence: {sentence}\nexpected {expected_start}-{expected_end}, found {found_start}-{found_end}")]
    WrongPosition {
        language: String,
        rule: String,
        sentence: String,
        expected_start: usize,
        expected_end: usize,
        found_start: usize,
        found_end: usize,
    },

    #[error("{language}: Incorrect suggestions: {expected} != {found} for rule {rule} on input: {sentence}")]
    SuggestionMismatch {
        language: String,
        rule: String,
        sentence: String,
        expected: String,
        found: String,
    },

    /// Applying a suggested correction still triggers the rule.
    #[error("Incorrect input:\n  {sentence}\nCorrected sentence:\n  {corrected}\nBy Rule:\n  {rule}\nThe correction triggered an error itself:\n  {found}")]
    SuggestionSelfTrigger {
        language: String,
        rule: String,
        sentence: String,
        corrected: String,
        found: String,
    },

    #[error("{language}: Did not expect error in:\n  {sentence}\nMatching Rule: {rule}")]
    UnexpectedMatch {
        language: String,
        rule: String,
        sentence: String,
    },

    #[error("No incorrect examples found for rule {rule} in language {language}")]
    NoIncorrectExamples { language: String, rule: String },

    #[error("Rule {rule} in language {language} needs at least one example with a correction or one correct example")]
    MissingCorrection { language: String, rule: String },

    #[error("Rule id occurs more than once: '{rule}' ({first_class} and {second_class}), language: {language}")]
    DuplicateRuleId {
        language: String,
        rule: String,
        first_class: String,
        second_class: String,
    },

    /// A demoted rule came back unresolved, so another pass would not progress.
    #[error("{language}: rule {rule} stayed unresolved after demotion")]
    DemotionDidNotConverge { language: String, rule: String },

    /// A rule file exists but could not be read.
    #[error("{language}: {message}")]
    RuleFileUnreadable { language: String, message: String },

    /// Raised by the rule file loader, passed through verbatim.
    #[error("{message}")]
    SchemaValidation { language: String, message: String },
}

impl HarnessError {
    pub fn language(&self) -> &str {
        match self {
            HarnessError::MissingMarker { language, .. }
            | HarnessError::MisplacedMarkup { language, .. }
            | HarnessError::MultipleMarkers { language, .. }
            | HarnessError::EmptyExample { language, .. }
            | HarnessError::WrongMatchCount { language, .. }
            | HarnessError::WrongPosition { language, .. }
            | HarnessError::SuggestionMismatch { language, .. }
            | HarnessError::SuggestionSelfTrigger { language, .. }
            | HarnessError::UnexpectedMatch { language, .. }
            | HarnessError::NoIncorrectExamples { language, .. }
            | HarnessError::MissingCorrection { language, .. }
            | HarnessError::DuplicateRuleId { language, .. }
            | HarnessError::DemotionDidNotConverge { language, .. }
            | HarnessError::RuleFileUnreadable { language, .. }
            | HarnessError::SchemaValidation { language, .. } => language,
        }
    }
}

/// Result type for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// A harness configuration file that could not be used.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Failed to load config {path}: {message}")]
pub struct ConfigError {
    pub path: String,
    pub message: String,
}
