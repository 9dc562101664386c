//! Suggestion checks for a resolved match.

use crate::errors::{HarnessError, HarnessResult};
use crate::markup::{ExpectedCorrections, ParsedExample};
use crate::verifier::VerifyContext;
use layered_rules::{MatchEngine, RuleKey, RuleMatch};

const NO_SUGGESTION: &str = "<no suggestion>";
const NO_SUGGESTION_DECLARED: &str = "<message declares no suggestion>";

/// Compare the suggestions of `found` with what the example expects.
pub fn check_suggestions<E: MatchEngine + ?Sized>(
    ctx: &VerifyContext<'_, E>,
    key: RuleKey,
    example: &ParsedExample,
    found: &RuleMatch,
) -> HarnessResult<()> {
    let rule = ctx.rule(key);
    let mismatch = |found: String| HarnessError::SuggestionMismatch {
        language: ctx.language.to_string(),
        rule: rule.full_id(),
        sentence: example.sentence.clone(),
        expected: example.corrections.to_string(),
        found,
    };

    match &example.corrections {
        ExpectedCorrections::Unspecified => Ok(()),
        ExpectedCorrections::NoSuggestion => {
            if !found.suggestions.is_empty() {
                Err(mismatch(format!("{:?}", found.suggestions)))
            } else if rule.declares_suggestion() {
                Err(mismatch(format!("{} (message: {})", NO_SUGGESTION, rule.message)))
            } else {
                Ok(())
            }
        }
        ExpectedCorrections::Literal(expected) => {
            let first_non_empty = expected.first().map_or(false, |first| !first.is_empty());
            if first_non_empty && !rule.declares_suggestion() {
                return Err(mismatch(NO_SUGGESTION_DECLARED.to_string()));
            }
            if found.suggestions.is_empty() {
                return Err(mismatch(NO_SUGGESTION.to_string()));
            }
            if &found.suggestions != expected {
                return Err(mismatch(format!("{:?}", found.suggestions)));
            }
            Ok(())
        }
    }
}

/// Apply every suggestion of `found` to the sentence; the rule must not
/// match any of the corrected sentences.
pub fn check_corrections_resolve<E: MatchEngine + ?Sized>(
    ctx: &VerifyContext<'_, E>,
    key: RuleKey,
    sentence: &str,
    found: &RuleMatch,
) -> HarnessResult<()> {
    let head = sentence.get(..found.start).unwrap_or_default();
    let tail = sentence.get(found.end..).unwrap_or_default();

    for replacement in &found.suggestions {
        let corrected = format!("{}{}{}", head, replacement, tail);
        if let Some(again) = ctx.matches(key, &corrected).first() {
            return Err(HarnessError::SuggestionSelfTrigger {
                language: ctx.language.to_string(),
                rule: ctx.rule(key).full_id(),
                sentence: sentence.to_string(),
                corrected,
                found: again.to_string(),
            });
        }
    }
    Ok(())
}
