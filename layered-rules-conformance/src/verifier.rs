//! Example verification for a single rule.
//!
//! A rule's public id may stand for several rule instances (phrase
//! alternatives). For simple and regex rules, a match from any instance
//! sharing the id and sub-id counts as the rule matching.

use crate::errors::{HarnessError, HarnessResult};
use crate::markup::{parse_correct_example, ParsedExample};
use crate::resolver::DemotionOverrides;
use crate::suggestion::{check_corrections_resolve, check_suggestions};
use layered_rules::{MatchEngine, MatchMode, Pattern, Rule, RuleKey, RuleMatch, RuleSet, RuleVariant};

/// Which verification procedure applies to a rule right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationPath {
    Simple,
    /// A phrase alternative still awaiting resolution.
    Composite,
    RegexBased,
}

/// Everything needed to run one rule's examples.
pub struct VerifyContext<'a, E: MatchEngine + ?Sized> {
    pub engine: &'a E,
    pub rules: &'a RuleSet,
    pub overrides: &'a DemotionOverrides,
    pub language: &'a str,
}

impl<'a, E: MatchEngine + ?Sized> VerifyContext<'a, E> {
    pub fn new(engine: &'a E, rules: &'a RuleSet, overrides: &'a DemotionOverrides, language: &'a str) -> Self {
        Self {
            engine,
            rules,
            overrides,
            language,
        }
    }

    pub fn rule(&self, key: RuleKey) -> &'a Rule {
        &self.rules[key]
    }

    pub fn path(&self, key: RuleKey) -> VerificationPath {
        match self.rule(key).variant {
            RuleVariant::Composite if !self.overrides.is_demoted(key) => VerificationPath::Composite,
            RuleVariant::Composite | RuleVariant::Simple => VerificationPath::Simple,
            RuleVariant::RegexBased => VerificationPath::RegexBased,
        }
    }

    pub fn mode(&self, key: RuleKey) -> MatchMode {
        self.overrides.mode(key, self.rule(key))
    }

    /// The rule's message, or the diagnostic that replaced it on demotion.
    pub fn message(&self, key: RuleKey) -> &'a str {
        self.overrides
            .message(key)
            .unwrap_or(self.rule(key).message.as_str())
    }

    /// Matches of this rule instance alone.
    pub fn matches(&self, key: RuleKey, sentence: &str) -> Vec<RuleMatch> {
        self.engine.match_rule(self.rule(key), self.mode(key), sentence)
    }

    /// Matches of every instance sharing this rule's id and sub-id.
    pub fn sibling_matches(&self, key: RuleKey, sentence: &str) -> Vec<RuleMatch> {
        let rule = self.rule(key);
        self.rules
            .rules_by_id_and_sub_id(&rule.id, &rule.sub_id)
            .into_iter()
            .flat_map(|sibling| self.matches(sibling, sentence))
            .collect()
    }
}

/// A correct example must not be matched by any sibling instance.
pub fn verify_correct_example<E: MatchEngine + ?Sized>(
    ctx: &VerifyContext<'_, E>,
    key: RuleKey,
    raw: &str,
) -> HarnessResult<()> {
    let rule = ctx.rule(key);
    let sentence = parse_correct_example(ctx.language, rule, raw)?;
    if ctx.sibling_matches(key, &sentence).is_empty() {
        Ok(())
    } else {
        Err(HarnessError::UnexpectedMatch {
            language: ctx.language.to_string(),
            rule: rule.full_id(),
            sentence,
        })
    }
}

/// An incorrect example of a simple or regex rule: exactly one match across
/// all sibling instances, at the marked span, with the expected suggestions.
pub fn verify_incorrect_example<E: MatchEngine + ?Sized>(
    ctx: &VerifyContext<'_, E>,
    key: RuleKey,
    example: &ParsedExample,
) -> HarnessResult<()> {
    let matches = ctx.sibling_matches(key, &example.sentence);
    check_resolved_match(ctx, key, example, &matches)
}

/// Checks shared by every path once an example has produced matches.
pub(crate) fn check_resolved_match<E: MatchEngine + ?Sized>(
    ctx: &VerifyContext<'_, E>,
    key: RuleKey,
    example: &ParsedExample,
    matches: &[RuleMatch],
) -> HarnessResult<()> {
    let found = match matches {
        [only] => only,
        _ => return Err(wrong_match_count(ctx, key, &example.sentence, matches)),
    };

    if found.start != example.span.start || found.end != example.span.end {
        return Err(HarnessError::WrongPosition {
            language: ctx.language.to_string(),
            rule: ctx.rule(key).full_id(),
            sentence: example.sentence.clone(),
            expected_start: example.span.start,
            expected_end: example.span.end,
            found_start: found.start,
            found_end: found.end,
        });
    }

    check_suggestions(ctx, key, example, found)?;
    check_corrections_resolve(ctx, key, &example.sentence, found)
}

fn wrong_match_count<E: MatchEngine + ?Sized>(
    ctx: &VerifyContext<'_, E>,
    key: RuleKey,
    sentence: &str,
    matches: &[RuleMatch],
) -> HarnessError {
    let rule = ctx.rule(key);
    let mut message = ctx.message(key).to_string();
    if let Pattern::Regex(pattern) = &rule.pattern {
        message.push_str("\nRegexp: ");
        message.push_str(pattern);
    }
    HarnessError::WrongMatchCount {
        language: ctx.language.to_string(),
        rule: rule.full_id(),
        sentence: sentence.to_string(),
        found: matches.len(),
        message,
        token_dump: ctx.engine.analyze(sentence).to_string(),
        matches: matches
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    }
}
