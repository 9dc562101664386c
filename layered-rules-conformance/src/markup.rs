//! Parser for example markup.
//!
//! Incorrect examples carry exactly one `<marker>…</marker>` pair around the
//! span the rule must flag; a second pair is rejected. Indentation (runs of newlines and tabs) is removed
//! first, then the marker offsets are taken, then every inline tag is
//! stripped to produce the sentence fed to the engine.

use crate::errors::{HarnessError, HarnessResult};
use layered_rules::{IncorrectExample, Rule};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::ops::Range;

pub const MARKER_START: &str = "<marker>";
pub const MARKER_END: &str = "</marker>";

static INDENTATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\n\t]+").expect("valid indentation regex"));
static INLINE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<([^<].*?)>").expect("valid tag regex"));

/// What an incorrect example says about suggestions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedCorrections {
    /// No correction given: suggestions are not checked.
    Unspecified,
    /// A single empty correction: the match must carry no suggestion.
    NoSuggestion,
    /// The exact, ordered suggestion list.
    Literal(Vec<String>),
}

impl ExpectedCorrections {
    pub fn from_corrections(corrections: &[String]) -> Self {
        match corrections {
            [] => ExpectedCorrections::Unspecified,
            [only] if only.is_empty() => ExpectedCorrections::NoSuggestion,
            _ => ExpectedCorrections::Literal(corrections.to_vec()),
        }
    }
}

impl fmt::Display for ExpectedCorrections {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedCorrections::Unspecified => write!(f, "<unspecified>"),
            ExpectedCorrections::NoSuggestion => write!(f, "<no suggestion>"),
            ExpectedCorrections::Literal(corrections) => write!(f, "{:?}", corrections),
        }
    }
}

/// An incorrect example ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedExample {
    /// Sentence with indentation and all tags removed.
    pub sentence: String,
    /// Byte range the rule must flag in `sentence`.
    pub span: Range<usize>,
    pub corrections: ExpectedCorrections,
}

/// Remove runs of newlines and tabs used to indent examples in rule files.
pub fn collapse_indentation(raw: &str) -> String {
    INDENTATION.replace_all(raw, "").into_owned()
}

/// Remove every inline tag.
pub fn strip_tags(text: &str) -> String {
    INLINE_TAG.replace_all(text, "").into_owned()
}

/// Extract the sentence, expected span and expected corrections of an
/// incorrect example.
pub fn parse_incorrect_example(
    language: &str,
    rule: &Rule,
    example: &IncorrectExample,
) -> HarnessResult<ParsedExample> {
    let collapsed = collapse_indentation(&example.example);

    let (start, close) = match (collapsed.find(MARKER_START), collapsed.find(MARKER_END)) {
        (Some(start), Some(close)) if close >= start + MARKER_START.len() => (start, close),
        _ => {
            return Err(HarnessError::MissingMarker {
                language: language.to_string(),
                rule: rule.full_id(),
            })
        }
    };

    // Offsets are only valid in the cleaned sentence if the opening marker is
    // the sole tag ahead of the closing one.
    if let Some(tag) = INLINE_TAG
        .find_iter(&collapsed[..close])
        .find(|tag| tag.start() != start)
    {
        return Err(HarnessError::MisplacedMarkup {
            language: language.to_string(),
            rule: rule.full_id(),
            tag: tag.as_str().to_string(),
            example: collapsed.clone(),
        });
    }

    let rest = &collapsed[close + MARKER_END.len()..];
    if rest.contains(MARKER_START) || rest.contains(MARKER_END) {
        return Err(HarnessError::MultipleMarkers {
            language: language.to_string(),
            rule: rule.full_id(),
            example: collapsed.clone(),
        });
    }

    let sentence = strip_tags(&collapsed);
    if sentence.trim().is_empty() {
        return Err(HarnessError::EmptyExample {
            language: language.to_string(),
            rule: rule.full_id(),
            kind: "incorrect",
        });
    }

    Ok(ParsedExample {
        sentence,
        span: start..close - MARKER_START.len(),
        corrections: ExpectedCorrections::from_corrections(&example.corrections),
    })
}

/// Clean a correct example into the sentence fed to the engine.
pub fn parse_correct_example(language: &str, rule: &Rule, raw: &str) -> HarnessResult<String> {
    let sentence = strip_tags(&collapse_indentation(raw));
    if sentence.trim().is_empty() {
        return Err(HarnessError::EmptyExample {
            language: language.to_string(),
            rule: rule.full_id(),
            kind: "correct",
        });
    }
    Ok(sentence)
}
