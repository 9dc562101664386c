//! Multi-pass verification of phrase-alternative rules.
//!
//! A rule written as several phrases becomes one rule instance per phrase,
//! all sharing an id. An individual phrase is allowed to miss an example as
//! long as one of its siblings matches it. Examples are tracked per
//! `(rule id, sentence)`:
//!
//! * a miss records the first instance that missed, unless the pair is
//!   already known;
//! * any match marks the pair resolved for good.
//!
//! Pairs still pending after a pass name instances that matched none of
//! their siblings' examples. Those instances are demoted to single-pattern
//! matching and verified again in a fresh pass. A demoted instance coming
//! back pending stops the loop.

use crate::errors::{HarnessError, HarnessResult};
use crate::markup::{parse_incorrect_example, ParsedExample};
use crate::verifier::{
    check_resolved_match, verify_correct_example, verify_incorrect_example, VerificationPath, VerifyContext,
};
use layered_rules::{MatchEngine, MatchMode, Rule, RuleKey, RuleSet};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

/// Message given to a demoted rule instance.
pub const NEVER_MATCHED_MESSAGE: &str = "The rule contains a phrase that never matched any incorrect example.";

/// State of one `(rule id, sentence)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingEntry {
    /// Only misses so far; holds the first instance that missed.
    Pending(RuleKey),
    Resolved,
}

/// Per-pass bookkeeping of composite examples.
#[derive(Debug, Default)]
pub struct ResolutionState {
    entries: BTreeMap<(String, String), PendingEntry>,
}

impl ResolutionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A rule instance produced no match. Never overrides an existing entry.
    pub fn record_miss(&mut self, rule_id: &str, sentence: &str, key: RuleKey) {
        self.entries
            .entry((rule_id.to_string(), sentence.to_string()))
            .or_insert(PendingEntry::Pending(key));
    }

    /// Some instance of `rule_id` matched `sentence`.
    pub fn resolve(&mut self, rule_id: &str, sentence: &str) {
        self.entries
            .insert((rule_id.to_string(), sentence.to_string()), PendingEntry::Resolved);
    }

    pub fn entry(&self, rule_id: &str, sentence: &str) -> Option<PendingEntry> {
        self.entries
            .get(&(rule_id.to_string(), sentence.to_string()))
            .copied()
    }

    /// Distinct instances still pending, in key order.
    pub fn unresolved(&self) -> Vec<RuleKey> {
        self.entries
            .values()
            .filter_map(|entry| match entry {
                PendingEntry::Pending(key) => Some(*key),
                PendingEntry::Resolved => None,
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Rule instances reinterpreted as single patterns, with their replacement
/// messages. Rules themselves are never modified.
#[derive(Debug, Clone, Default)]
pub struct DemotionOverrides {
    demoted: BTreeMap<RuleKey, String>,
}

impl DemotionOverrides {
    pub fn is_demoted(&self, key: RuleKey) -> bool {
        self.demoted.contains_key(&key)
    }

    pub fn demote(&mut self, key: RuleKey, message: impl Into<String>) {
        self.demoted.insert(key, message.into());
    }

    pub fn message(&self, key: RuleKey) -> Option<&str> {
        self.demoted.get(&key).map(String::as_str)
    }

    /// Composite instances match literally until demoted.
    pub fn mode(&self, key: RuleKey, rule: &Rule) -> MatchMode {
        if self.is_demoted(key) {
            MatchMode::Single
        } else {
            MatchMode::for_rule(rule)
        }
    }

    /// The first of `keys` that is already demoted.
    pub fn first_demoted(&self, keys: &[RuleKey]) -> Option<RuleKey> {
        keys.iter().copied().find(|&key| self.is_demoted(key))
    }

    pub fn demoted_keys(&self) -> Vec<RuleKey> {
        self.demoted.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.demoted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.demoted.is_empty()
    }
}

/// Result of running the resolver over a batch of rules.
#[derive(Debug, Default)]
pub struct ResolutionOutcome {
    /// Incorrect and correct examples run, across all passes.
    pub examples_checked: usize,
    pub passes: usize,
    /// Instances demoted while running, in demotion order.
    pub demoted: Vec<RuleKey>,
    pub failures: Vec<HarnessError>,
}

impl ResolutionOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives verification of a rule set, demoting composite instances that
/// never resolve.
pub struct ComplexPhraseResolver<'a, E: MatchEngine + ?Sized> {
    engine: &'a E,
    rules: &'a RuleSet,
    language: String,
    overrides: DemotionOverrides,
}

impl<'a, E: MatchEngine + ?Sized> ComplexPhraseResolver<'a, E> {
    pub fn new(engine: &'a E, rules: &'a RuleSet) -> Self {
        Self {
            engine,
            rules,
            language: rules.language().to_string(),
            overrides: DemotionOverrides::default(),
        }
    }

    pub fn overrides(&self) -> &DemotionOverrides {
        &self.overrides
    }

    pub fn into_overrides(self) -> DemotionOverrides {
        self.overrides
    }

    /// Verify every rule in `batch`, then re-verify demoted instances until
    /// nothing is pending.
    pub fn run(&mut self, batch: Vec<RuleKey>) -> ResolutionOutcome {
        let mut outcome = ResolutionOutcome::default();
        let mut batch = batch;

        while !batch.is_empty() {
            outcome.passes += 1;
            debug!(
                "{}: resolution pass {} over {} rules",
                self.language,
                outcome.passes,
                batch.len()
            );

            let mut state = ResolutionState::new();
            for &key in &batch {
                self.verify_rule(key, &mut state, &mut outcome);
            }

            let unresolved = state.unresolved();
            if let Some(err) = self.stalled(&unresolved) {
                outcome.failures.push(err);
                break;
            }

            for &key in &unresolved {
                debug!(
                    "{}: demoting {} ({}) to a single pattern",
                    self.language,
                    self.rules[key].full_id(),
                    key
                );
                self.overrides.demote(key, NEVER_MATCHED_MESSAGE);
                outcome.demoted.push(key);
            }
            batch = unresolved;
        }

        outcome
    }

    /// Fails when an instance pending after a pass was already demoted.
    ///
    /// Demoted instances are verified on the simple path, which never records
    /// a miss, so with the verification paths in this crate this stays `None`.
    /// It bounds the loop if that ever changes.
    fn stalled(&self, unresolved: &[RuleKey]) -> Option<HarnessError> {
        self.overrides
            .first_demoted(unresolved)
            .map(|stuck| HarnessError::DemotionDidNotConverge {
                language: self.language.clone(),
                rule: self.rules[stuck].full_id(),
            })
    }

    fn verify_rule(&self, key: RuleKey, state: &mut ResolutionState, outcome: &mut ResolutionOutcome) {
        let ctx = VerifyContext::new(self.engine, self.rules, &self.overrides, &self.language);
        let rule = ctx.rule(key);

        for example in &rule.incorrect_examples {
            outcome.examples_checked += 1;
            let result = parse_incorrect_example(&self.language, rule, example).and_then(|parsed| {
                match ctx.path(key) {
                    VerificationPath::Composite => verify_composite_example(&ctx, key, &parsed, state),
                    VerificationPath::Simple | VerificationPath::RegexBased => {
                        verify_incorrect_example(&ctx, key, &parsed)
                    }
                }
            });
            if let Err(err) = result {
                outcome.failures.push(err);
            }
        }

        for raw in &rule.correct_examples {
            outcome.examples_checked += 1;
            if let Err(err) = verify_correct_example(&ctx, key, raw) {
                outcome.failures.push(err);
            }
        }
    }
}

fn verify_composite_example<E: MatchEngine + ?Sized>(
    ctx: &VerifyContext<'_, E>,
    key: RuleKey,
    example: &ParsedExample,
    state: &mut ResolutionState,
) -> HarnessResult<()> {
    let rule = ctx.rule(key);
    let matches = ctx.matches(key, &example.sentence);
    if matches.is_empty() {
        state.record_miss(&rule.id, &example.sentence, key);
        return Ok(());
    }
    state.resolve(&rule.id, &example.sentence);
    check_resolved_match(ctx, key, example, &matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use layered_rules::{IncorrectExample, Pattern, PatternEngine, PatternToken, RuleVariant};
    use std::sync::Arc;

    fn phrase(id: &str, words: &[&str]) -> Rule {
        let mut rule = Rule::simple(id, "en", words.iter().map(|w| PatternToken::literal(*w)).collect());
        rule.variant = RuleVariant::Composite;
        rule
    }

    fn incorrect(text: &str, correction: &str) -> IncorrectExample {
        IncorrectExample::new(text, vec![correction.to_string()])
    }

    fn resolve(rules: Vec<Rule>) -> (ResolutionOutcome, DemotionOverrides) {
        let set = Arc::new(RuleSet::new("en", rules));
        let engine = PatternEngine::new(Arc::clone(&set));
        let mut resolver = ComplexPhraseResolver::new(&engine, &set);
        let outcome = resolver.run(set.keys().collect());
        (outcome, resolver.into_overrides())
    }

    #[test]
    fn test_state_keeps_first_miss_and_resolution() {
        let mut state = ResolutionState::new();
        state.record_miss("R", "s", RuleKey(0));
        state.record_miss("R", "s", RuleKey(1));
        assert_eq!(state.entry("R", "s"), Some(PendingEntry::Pending(RuleKey(0))));
        state.record_miss("R", "t", RuleKey(1));
        assert_eq!(state.unresolved(), vec![RuleKey(0), RuleKey(1)]);

        state.resolve("R", "s");
        state.record_miss("R", "s", RuleKey(2));
        assert_eq!(state.entry("R", "s"), Some(PendingEntry::Resolved));
        assert_eq!(state.unresolved(), vec![RuleKey(1)]);
    }

    #[test]
    fn test_sibling_resolves_missing_phrase() {
        let message = "Use <suggestion>with regard to</suggestion>.";
        let mut first = phrase("IN_REGARDS_TO", &["with", "regards", "to"]);
        first.message = message.to_string();
        first.incorrect_examples = vec![incorrect(
            "We spoke <marker>in regards to</marker> the plan.",
            "with regard to",
        )];
        first.correct_examples = vec!["We spoke with regard to the plan.".to_string()];
        let mut second = first.clone();
        second.pattern = Pattern::Tokens(vec![
            PatternToken::literal("in"),
            PatternToken::literal("regards"),
            PatternToken::literal("to"),
        ]);

        let (outcome, overrides) = resolve(vec![first, second]);
        assert!(outcome.is_success(), "{:?}", outcome.failures);
        assert_eq!(outcome.passes, 1);
        assert!(outcome.demoted.is_empty());
        assert!(overrides.is_empty());
        assert_eq!(outcome.examples_checked, 4);
    }

    #[test]
    fn test_demotion_enables_case_insensitive_match() {
        let mut rule = phrase("COULD_OF", &["could", "of"]);
        rule.message = "Did you mean <suggestion>\\1 have</suggestion>?".to_string();
        rule.incorrect_examples = vec![
            incorrect("<marker>Could of</marker> been worse.", "Could have"),
            incorrect("I <marker>could of</marker> won.", "could have"),
        ];
        rule.correct_examples = vec!["I could have won.".to_string()];

        let (outcome, overrides) = resolve(vec![rule]);
        assert!(outcome.is_success(), "{:?}", outcome.failures);
        assert_eq!(outcome.passes, 2);
        assert_eq!(outcome.demoted, vec![RuleKey(0)]);
        assert_eq!(overrides.message(RuleKey(0)), Some(NEVER_MATCHED_MESSAGE));
        assert_eq!(outcome.examples_checked, 6);
    }

    #[test]
    fn test_rerun_after_demotion_is_stable() {
        let mut rule = phrase("COULD_OF", &["could", "of"]);
        rule.message = "Did you mean <suggestion>\\1 have</suggestion>?".to_string();
        rule.incorrect_examples = vec![incorrect("<marker>Could of</marker> been worse.", "Could have")];

        let set = Arc::new(RuleSet::new("en", vec![rule]));
        let engine = PatternEngine::new(Arc::clone(&set));
        let mut resolver = ComplexPhraseResolver::new(&engine, &set);

        let first = resolver.run(set.keys().collect());
        assert!(first.is_success(), "{:?}", first.failures);
        assert_eq!(first.demoted, vec![RuleKey(0)]);

        let second = resolver.run(set.keys().collect());
        assert!(second.is_success(), "{:?}", second.failures);
        assert!(second.demoted.is_empty());
        assert_eq!(second.passes, 1);
        assert_eq!(resolver.overrides().demoted_keys(), vec![RuleKey(0)]);
    }

    #[test]
    fn test_pending_demoted_instance_stalls() {
        let set = RuleSet::new("en", vec![phrase("A", &["a"]), phrase("B", &["b"])]);
        let engine = PatternEngine::new(Arc::new(set.clone()));
        let mut resolver = ComplexPhraseResolver::new(&engine, &set);
        assert_eq!(resolver.stalled(&[RuleKey(0), RuleKey(1)]), None);

        resolver.overrides.demote(RuleKey(1), NEVER_MATCHED_MESSAGE);
        assert_eq!(resolver.stalled(&[RuleKey(0)]), None);
        assert_eq!(
            resolver.stalled(&[RuleKey(0), RuleKey(1)]),
            Some(HarnessError::DemotionDidNotConverge {
                language: "en".to_string(),
                rule: "B[1]".to_string(),
            })
        );
    }

    #[test]
    fn test_demoted_rule_that_still_misses_stops() {
        let mut rule = phrase("NEVER", &["nothing", "here"]);
        rule.incorrect_examples = vec![incorrect("This <marker>never</marker> matches.", "")];

        let (outcome, _) = resolve(vec![rule]);
        assert_eq!(outcome.passes, 2);
        assert_eq!(outcome.demoted, vec![RuleKey(0)]);
        assert_eq!(outcome.failures.len(), 1);
        match &outcome.failures[0] {
            HarnessError::WrongMatchCount { found, message, .. } => {
                assert_eq!(*found, 0);
                assert_eq!(message, NEVER_MATCHED_MESSAGE);
            }
            other => panic!("unexpected failure {:?}", other),
        }
    }

    #[test]
    fn test_first_demoted() {
        let mut overrides = DemotionOverrides::default();
        assert_eq!(overrides.first_demoted(&[RuleKey(0), RuleKey(3)]), None);

        overrides.demote(RuleKey(3), NEVER_MATCHED_MESSAGE);
        overrides.demote(RuleKey(5), NEVER_MATCHED_MESSAGE);
        assert_eq!(overrides.first_demoted(&[RuleKey(0), RuleKey(5), RuleKey(3)]), Some(RuleKey(5)));
        assert_eq!(overrides.demoted_keys(), vec![RuleKey(3), RuleKey(5)]);

        let composite = phrase("X", &["x"]);
        assert_eq!(overrides.mode(RuleKey(0), &composite), MatchMode::Composite);
        assert_eq!(overrides.mode(RuleKey(3), &composite), MatchMode::Single);
    }

    #[test]
    fn test_composite_more_than_one_match_fails() {
        let mut rule = phrase("TWICE", &["the"]);
        rule.incorrect_examples = vec![IncorrectExample::new("<marker>the</marker> cat and the dog", Vec::new())];

        let (outcome, _) = resolve(vec![rule]);
        assert_eq!(outcome.passes, 1);
        assert!(matches!(outcome.failures[..], [HarnessError::WrongMatchCount { found: 2, .. }]));
    }
}
