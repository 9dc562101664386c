//! Invariants that span a whole rule set.

use crate::errors::{HarnessError, HarnessResult};
use layered_rules::{RuleClass, RuleDescriptor, RuleSet};
use log::warn;
use std::collections::HashMap;

/// Every rule needs incorrect examples, and must show either a correct
/// sentence or a concrete correction.
pub fn validate_example_coverage(language: &str, rules: &RuleSet) -> HarnessResult<()> {
    for rule in rules.rules() {
        if rule.incorrect_examples.is_empty() {
            return Err(HarnessError::NoIncorrectExamples {
                language: language.to_string(),
                rule: rule.full_id(),
            });
        }

        let has_correction = rule
            .incorrect_examples
            .iter()
            .any(|example| !example.corrections.is_empty());
        if rule.correct_examples.is_empty() && !has_correction {
            return Err(HarnessError::MissingCorrection {
                language: language.to_string(),
                rule: rule.full_id(),
            });
        }
    }
    Ok(())
}

/// An id may repeat only within one rule class. All pattern rules form a
/// single class, so phrase alternatives and sub-ids never conflict.
pub fn validate_rule_ids(language: &str, rules: &[RuleDescriptor]) -> HarnessResult<()> {
    let mut claimed: HashMap<&str, &RuleClass> = HashMap::new();

    for rule in rules {
        match claimed.get(rule.id.as_str()) {
            Some(&first) if *first != rule.class => {
                return Err(HarnessError::DuplicateRuleId {
                    language: language.to_string(),
                    rule: rule.id.clone(),
                    first_class: first.to_string(),
                    second_class: rule.class.to_string(),
                });
            }
            Some(_) => {}
            None => {
                claimed.insert(&rule.id, &rule.class);
            }
        }

        if rule.id.eq_ignore_ascii_case("ID") {
            warn!(
                "{} has a rule with id '{}', this should probably be changed",
                language, rule.id
            );
        }
    }
    Ok(())
}
