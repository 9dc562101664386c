//! Language descriptors.

use crate::rule_file::RuleFileError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// A language (optionally a country or private variant) with its rule files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Language {
    pub name: String,
    /// ISO code, e.g. `en`.
    pub short_name: String,
    #[serde(default)]
    pub country: Option<String>,
    /// Variant suffix, e.g. `x-simple-language` or `valencia`.
    #[serde(default)]
    pub variant: Option<String>,
    /// Rule file names as declared by the language; only the file name part is used.
    #[serde(default = "default_rule_files")]
    pub rule_files: Vec<String>,
}

impl Language {
    pub fn new(name: impl Into<String>, short_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short_name: short_name.into(),
            country: None,
            variant: None,
            rule_files: default_rule_files(),
        }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    pub fn with_rule_files(mut self, rule_files: Vec<String>) -> Self {
        self.rule_files = rule_files;
        self
    }

    /// `en`, `en-US`, `de-DE-x-simple-language`, ...
    pub fn short_name_with_country_and_variant(&self) -> String {
        let mut code = self.short_name.clone();
        for part in self.country.iter().chain(self.variant.iter()) {
            code.push('-');
            code.push_str(part);
        }
        code
    }
}

fn default_rule_files() -> Vec<String> {
    vec!["grammar.toml".to_string()]
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.short_name_with_country_and_variant())
    }
}

#[derive(Deserialize)]
struct LanguageList {
    #[serde(default)]
    languages: Vec<Language>,
}

/// Enumerate languages from a TOML file of `[[languages]]` tables.
pub fn load_languages(path: &Path) -> Result<Vec<Language>, RuleFileError> {
    let content = fs::read_to_string(path).map_err(|e| RuleFileError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let list: LanguageList = toml::from_str(&content).map_err(|e| RuleFileError::Schema {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(list.languages)
}
