//! Warnings for pattern tokens whose regex use looks unintended.
//!
//! None of these stop a language. A literal token with regex syntax simply
//! never matches, and an anchored or over-escaped regex token works but hides
//! what the author meant, so they are reported next to the run's results.

use layered_rules::{Pattern, PatternToken, RuleSet};
use log::warn;
use regex::Regex;

/// Characters that only mean something in a regex.
const REGEX_SYNTAX: &[char] = &['|', '?', '*', '+', '(', ')', '[', ']', '{', '}', '\\', '^', '$'];

/// Punctuation that a backslash changes or that may need escaping in a class.
const ESCAPABLE: &str = r"\.+*?()|[]{}^$-#&~";

/// Problems with a single pattern token, if any.
pub fn lint_token(token: &PatternToken) -> Vec<String> {
    let text = token.text.as_str();
    let mut problems = Vec::new();

    if !token.regex {
        if text.contains(REGEX_SYNTAX) && text.chars().any(char::is_alphanumeric) {
            problems.push(format!(
                "token '{}' contains regex syntax but is not marked as a regex",
                text
            ));
        }
        return problems;
    }

    if let Err(e) = Regex::new(text) {
        problems.push(format!("token '{}' is not a valid regex: {}", text, e));
        return problems;
    }
    if !text.contains(REGEX_SYNTAX) && !text.contains('.') {
        problems.push(format!("token '{}' is marked as a regex but is a plain word", text));
    }
    if text.starts_with('^') || (text.ends_with('$') && !text.ends_with("\\$")) {
        problems.push(format!(
            "token '{}' has a redundant anchor, tokens always match whole",
            text
        ));
    }

    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            continue;
        }
        match chars.next() {
            Some(escaped) if escaped.is_ascii_punctuation() && !ESCAPABLE.contains(escaped) => {
                problems.push(format!("token '{}' has a needless escape '\\{}'", text, escaped));
            }
            _ => {}
        }
    }
    problems
}

/// Lint the token patterns and antipatterns of every rule, logging each
/// finding with `warn!`.
pub fn lint_rule_set(language: &str, rules: &RuleSet) -> Vec<String> {
    let mut warnings = Vec::new();

    for rule in rules.rules() {
        let mut problems = Vec::new();
        if let Pattern::Tokens(tokens) = &rule.pattern {
            problems.extend(tokens.iter().flat_map(lint_token));
        }
        for antipattern in &rule.antipatterns {
            problems.extend(
                antipattern
                    .iter()
                    .flat_map(lint_token)
                    .map(|problem| format!("antipattern {}", problem)),
            );
        }

        for problem in problems {
            let warning = format!("{}: rule {}: {}", language, rule.full_id(), problem);
            warn!("{}", warning);
            warnings.push(warning);
        }
    }
    warnings
}
