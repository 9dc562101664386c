//! Reference [`MatchEngine`] for token-pattern and regex rules.

use crate::analyze::{analyze, split_sentences, AnalyzedSentence, AnalyzedToken};
use crate::engine::{MatchEngine, MatchMode, RuleClass, RuleDescriptor, RuleMatch};
use crate::rule::{Pattern, PatternToken, Rule, RuleKey, RuleSet};
use log::warn;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::Arc;

static SUGGESTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<suggestion>(.*?)</suggestion>").expect("valid suggestion regex"));
static BACK_REFERENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\(\d+)").expect("valid backref regex"));

enum TokenMatcher {
    Literal { text: String, case_sensitive: bool },
    Regex(Regex),
}

impl TokenMatcher {
    fn compile(token: &PatternToken, case_sensitive: bool) -> Result<Self, regex::Error> {
        if token.regex {
            let regex = RegexBuilder::new(&format!("^(?:{})$", token.text))
                .case_insensitive(!case_sensitive)
                .build()?;
            Ok(TokenMatcher::Regex(regex))
        } else {
            Ok(TokenMatcher::Literal {
                text: token.text.clone(),
                case_sensitive,
            })
        }
    }

    fn matches(&self, token: &str) -> bool {
        match self {
            TokenMatcher::Literal {
                text,
                case_sensitive: true,
            } => text == token,
            TokenMatcher::Literal {
                text,
                case_sensitive: false,
            } => text.to_lowercase() == token.to_lowercase(),
            TokenMatcher::Regex(regex) => regex.is_match(token),
        }
    }
}

fn compile_sequence(tokens: &[PatternToken], case_sensitive: bool) -> Result<Vec<TokenMatcher>, regex::Error> {
    tokens
        .iter()
        .map(|token| TokenMatcher::compile(token, case_sensitive))
        .collect()
}

fn sequence_matches_at(matchers: &[TokenMatcher], tokens: &[AnalyzedToken], idx: usize) -> bool {
    idx + matchers.len() <= tokens.len()
        && matchers
            .iter()
            .zip(&tokens[idx..])
            .all(|(matcher, token)| matcher.matches(&token.text))
}

/// Byte ranges of every occurrence of every antipattern.
fn antipattern_ranges(
    antipatterns: &[Vec<PatternToken>],
    case_sensitive: bool,
    analyzed: &AnalyzedSentence,
) -> Result<Vec<Range<usize>>, regex::Error> {
    let mut ranges = Vec::new();
    for antipattern in antipatterns {
        let matchers = compile_sequence(antipattern, case_sensitive)?;
        for idx in 0..analyzed.tokens.len() {
            if !matchers.is_empty() && sequence_matches_at(&matchers, &analyzed.tokens, idx) {
                let last = &analyzed.tokens[idx + matchers.len() - 1];
                ranges.push(analyzed.tokens[idx].start..last.end);
            }
        }
    }
    Ok(ranges)
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

/// Expand the `<suggestion>` elements of a rule against the matched groups.
/// `\1` refers to the first group.
fn expand_suggestions(rule: &Rule, groups: &[String]) -> Vec<String> {
    let mut suggestions: Vec<String> = Vec::new();
    for template in [&rule.message, &rule.suggestions_out_msg] {
        for caps in SUGGESTION.captures_iter(template) {
            let expanded = BACK_REFERENCE.replace_all(&caps[1], |group: &regex::Captures| {
                group[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|n| groups.get(n))
                    .cloned()
                    .unwrap_or_default()
            });
            let expanded = expanded.into_owned();
            if !suggestions.contains(&expanded) {
                suggestions.push(expanded);
            }
        }
    }
    suggestions
}

/// Matches token sequences and regexes; suggestions come from the rule's
/// `<suggestion>` elements.
#[derive(Debug)]
pub struct PatternEngine {
    rules: Arc<RuleSet>,
    builtin: Vec<RuleDescriptor>,
    enabled: BTreeSet<String>,
    shut_down: bool,
}

impl PatternEngine {
    /// Create an engine with every rule that is not default-off enabled.
    pub fn new(rules: Arc<RuleSet>) -> Self {
        let enabled = rules
            .rules()
            .iter()
            .filter(|rule| !rule.default_off)
            .map(|rule| rule.id.clone())
            .collect();
        Self {
            rules,
            builtin: Vec::new(),
            enabled,
            shut_down: false,
        }
    }

    /// Register non-pattern rules so they take part in id bookkeeping.
    pub fn with_builtin_rules(mut self, builtin: Vec<RuleDescriptor>) -> Self {
        self.builtin = builtin;
        self
    }

    pub fn rule_set(&self) -> &Arc<RuleSet> {
        &self.rules
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    fn match_tokens(
        &self,
        rule: &Rule,
        tokens: &[PatternToken],
        mode: MatchMode,
        sentence: &str,
    ) -> Result<Vec<RuleMatch>, regex::Error> {
        let case_sensitive = mode == MatchMode::Composite || rule.case_sensitive;
        let analyzed = analyze(sentence);
        let matchers = compile_sequence(tokens, case_sensitive)?;
        let blocked = antipattern_ranges(&rule.antipatterns, rule.case_sensitive, &analyzed)?;

        let mut matches = Vec::new();
        if matchers.is_empty() {
            return Ok(matches);
        }

        let mut idx = 0;
        while idx + matchers.len() <= analyzed.tokens.len() {
            if sequence_matches_at(&matchers, &analyzed.tokens, idx) {
                let matched = &analyzed.tokens[idx..idx + matchers.len()];
                let span = matched[0].start..matched[matched.len() - 1].end;
                if !blocked.iter().any(|range| overlaps(range, &span)) {
                    let groups: Vec<String> = matched.iter().map(|t| t.text.clone()).collect();
                    matches.push(RuleMatch {
                        rule_id: rule.id.clone(),
                        sub_id: rule.sub_id.clone(),
                        start: span.start,
                        end: span.end,
                        suggestions: expand_suggestions(rule, &groups),
                    });
                    idx += matchers.len();
                    continue;
                }
            }
            idx += 1;
        }
        Ok(matches)
    }

    fn match_regex(&self, rule: &Rule, pattern: &str, sentence: &str) -> Result<Vec<RuleMatch>, regex::Error> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(!rule.case_sensitive)
            .build()?;
        let analyzed = analyze(sentence);
        let blocked = antipattern_ranges(&rule.antipatterns, rule.case_sensitive, &analyzed)?;

        let mut matches = Vec::new();
        for caps in regex.captures_iter(sentence) {
            let whole = match caps.get(0) {
                Some(whole) => whole,
                None => continue,
            };
            if whole.start() == whole.end() || blocked.iter().any(|range| overlaps(range, &whole.range())) {
                continue;
            }
            let groups: Vec<String> = caps
                .iter()
                .skip(1)
                .map(|group| group.map(|g| g.as_str().to_string()).unwrap_or_default())
                .collect();
            matches.push(RuleMatch {
                rule_id: rule.id.clone(),
                sub_id: rule.sub_id.clone(),
                start: whole.start(),
                end: whole.end(),
                suggestions: expand_suggestions(rule, &groups),
            });
        }
        Ok(matches)
    }
}

impl MatchEngine for PatternEngine {
    fn analyze(&self, sentence: &str) -> AnalyzedSentence {
        analyze(sentence)
    }

    fn match_rule(&self, rule: &Rule, mode: MatchMode, sentence: &str) -> Vec<RuleMatch> {
        let result = match &rule.pattern {
            Pattern::Tokens(tokens) => self.match_tokens(rule, tokens, mode, sentence),
            Pattern::Regex(pattern) => self.match_regex(rule, pattern, sentence),
        };
        result.unwrap_or_else(|e| {
            warn!("Rule {} has an unusable pattern: {}", rule.full_id(), e);
            Vec::new()
        })
    }

    fn all_rules(&self) -> Vec<RuleDescriptor> {
        self.rules
            .rules()
            .iter()
            .map(|rule| RuleDescriptor::new(rule.id.clone(), RuleClass::Pattern))
            .chain(self.builtin.iter().cloned())
            .collect()
    }

    fn check_text(&self, text: &str, mode_of: &dyn Fn(RuleKey, &Rule) -> MatchMode) -> Vec<RuleMatch> {
        let mut matches = Vec::new();
        for (offset, sentence) in split_sentences(text) {
            for (key, rule) in self.rules.iter() {
                if !self.enabled.contains(&rule.id) {
                    continue;
                }
                matches.extend(self.match_rule(rule, mode_of(key, rule), sentence).into_iter().map(|mut m| {
                    m.start += offset;
                    m.end += offset;
                    m
                }));
            }
        }
        matches
    }

    fn active_rule_ids(&self) -> Vec<String> {
        self.enabled.iter().cloned().collect()
    }

    fn enable_rule(&mut self, id: &str) {
        self.enabled.insert(id.to_string());
    }

    fn disable_rule(&mut self, id: &str) {
        self.enabled.remove(id);
    }

    fn shutdown(&mut self) {
        self.shut_down = true;
    }
}
