//! Rule file loading and validation.
//!
//! Rule files are TOML documents made of `[[rules]]` tables:
//!
//! ```toml
//! [[rules]]
//! id = "A_AN"
//! message = "Use <suggestion>an \\2</suggestion> before a vowel."
//! tokens = [{ text = "a" }, { text = "[aeiou].*", regex = true }]
//!
//! [[rules.example]]
//! type = "incorrect"
//! text = "This is <marker>a apple</marker>."
//! correction = "an apple"
//!
//! [[rules.example]]
//! type = "correct"
//! text = "This is an apple."
//! ```
//!
//! A rule declares exactly one of `tokens`, `phrases` or `regex`. Each entry of
//! `phrases` becomes its own composite rule sharing the id and sub-id.

use crate::rule::{IncorrectExample, Pattern, PatternToken, Rule, RuleSet, RuleVariant};
use log::info;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading rule and language files.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleFileError {
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    /// The file does not conform to the rule file schema.
    #[error("schema validation failed for {path}: {message}")]
    Schema { path: String, message: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<RuleDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleDef {
    id: String,
    #[serde(default = "default_sub_id")]
    sub_id: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    suggestions_out_msg: String,
    #[serde(default)]
    case_sensitive: bool,
    #[serde(default)]
    default_off: bool,
    #[serde(default)]
    tokens: Option<Vec<PatternToken>>,
    #[serde(default)]
    phrases: Option<Vec<Vec<PatternToken>>>,
    #[serde(default)]
    regex: Option<String>,
    #[serde(default)]
    antipatterns: Vec<Vec<PatternToken>>,
    #[serde(default, rename = "example")]
    examples: Vec<ExampleDef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ExampleType {
    Incorrect,
    Correct,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExampleDef {
    #[serde(rename = "type")]
    kind: ExampleType,
    text: String,
    /// `|`-separated corrections.
    #[serde(default)]
    correction: Option<String>,
}

fn default_sub_id() -> String {
    "1".to_string()
}

/// Parse and validate the contents of one rule file.
pub fn parse_rule_file(content: &str, path: &str, language: &str) -> Result<Vec<Rule>, RuleFileError> {
    let schema_error = |message: String| RuleFileError::Schema {
        path: path.to_string(),
        message,
    };

    let file: RuleFile = toml::from_str(content).map_err(|e| schema_error(e.to_string()))?;
    let mut rules = Vec::new();

    for def in file.rules {
        if def.id.trim().is_empty() {
            return Err(schema_error("rule with empty id".to_string()));
        }
        let full_id = format!("{}[{}]", def.id, def.sub_id);

        for tokens in &def.antipatterns {
            check_tokens(tokens).map_err(|m| schema_error(format!("{} antipattern: {}", full_id, m)))?;
        }

        let mut incorrect_examples = Vec::new();
        let mut correct_examples = Vec::new();
        for example in &def.examples {
            match example.kind {
                ExampleType::Incorrect => {
                    let corrections = example
                        .correction
                        .as_deref()
                        .map(|c| c.split('|').map(str::to_string).collect())
                        .unwrap_or_default();
                    incorrect_examples.push(IncorrectExample::new(example.text.clone(), corrections));
                }
                ExampleType::Correct => {
                    if example.correction.is_some() {
                        return Err(schema_error(format!(
                            "{}: correct example may not carry a correction",
                            full_id
                        )));
                    }
                    correct_examples.push(example.text.clone());
                }
            }
        }

        let patterns: Vec<(RuleVariant, Pattern)> = match (&def.tokens, &def.phrases, &def.regex) {
            (Some(tokens), None, None) => {
                check_tokens(tokens).map_err(|m| schema_error(format!("{}: {}", full_id, m)))?;
                vec![(RuleVariant::Simple, Pattern::Tokens(tokens.clone()))]
            }
            (None, Some(phrases), None) => {
                if phrases.is_empty() {
                    return Err(schema_error(format!("{}: empty phrase list", full_id)));
                }
                let mut out = Vec::new();
                for phrase in phrases {
                    check_tokens(phrase).map_err(|m| schema_error(format!("{}: {}", full_id, m)))?;
                    out.push((RuleVariant::Composite, Pattern::Tokens(phrase.clone())));
                }
                out
            }
            (None, None, Some(regex)) => {
                Regex::new(regex)
                    .map_err(|e| schema_error(format!("{}: invalid regex: {}", full_id, e)))?;
                vec![(RuleVariant::RegexBased, Pattern::Regex(regex.clone()))]
            }
            _ => {
                return Err(schema_error(format!(
                    "{}: exactly one of `tokens`, `phrases` or `regex` is required",
                    full_id
                )))
            }
        };

        for (variant, pattern) in patterns {
            rules.push(Rule {
                id: def.id.clone(),
                sub_id: def.sub_id.clone(),
                language: language.to_string(),
                variant,
                pattern,
                antipatterns: def.antipatterns.clone(),
                message: def.message.clone(),
                suggestions_out_msg: def.suggestions_out_msg.clone(),
                case_sensitive: def.case_sensitive,
                default_off: def.default_off,
                incorrect_examples: incorrect_examples.clone(),
                correct_examples: correct_examples.clone(),
            });
        }
    }

    Ok(rules)
}

fn check_tokens(tokens: &[PatternToken]) -> Result<(), String> {
    if tokens.is_empty() {
        return Err("empty token sequence".to_string());
    }
    for token in tokens {
        if token.regex {
            Regex::new(&format!("^(?:{})$", token.text))
                .map_err(|e| format!("invalid token regex '{}': {}", token.text, e))?;
        } else if token.text.is_empty() {
            return Err("empty literal token".to_string());
        }
    }
    Ok(())
}

/// Rule files under a rules directory, addressed by relative name
/// (e.g. `en/grammar.toml`).
#[derive(Debug, Clone)]
pub struct RuleRepository {
    rules_dir: PathBuf,
}

impl RuleRepository {
    pub fn new(rules_dir: impl Into<PathBuf>) -> Self {
        Self {
            rules_dir: rules_dir.into(),
        }
    }

    pub fn rules_dir(&self) -> &Path {
        &self.rules_dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.rules_dir.join(name)
    }

    pub fn rule_file_exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    /// Load and validate a single rule file.
    pub fn load_rule_file(&self, name: &str, language: &str) -> Result<Vec<Rule>, RuleFileError> {
        let path = self.path_for(name);
        let content = fs::read_to_string(&path).map_err(|e| RuleFileError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        parse_rule_file(&content, &path.display().to_string(), language)
    }

    /// Load all existing files of `names` into one rule set. Missing files are
    /// skipped; the first invalid file aborts the load.
    pub fn load_rule_set(&self, language: &str, names: &[String]) -> Result<RuleSet, RuleFileError> {
        let mut rule_set = RuleSet::new(language, Vec::new());
        for name in names {
            if !self.rule_file_exists(name) {
                info!("No rule file found at {}", self.path_for(name).display());
                continue;
            }
            info!("Running schema validation for {}", name);
            rule_set.extend(self.load_rule_file(name, language)?);
        }
        Ok(rule_set)
    }
}
