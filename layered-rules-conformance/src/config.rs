//! Harness configuration.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Switches for a conformance run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Also check every incorrect example through sentence splitting, with
    /// only its own rule enabled. Mismatches are reported as warnings.
    pub check_with_sentence_splitting: bool,
    /// Language codes (`short_name_with_country_and_variant`) never tested.
    pub ignored_languages: Vec<String>,
    /// Run languages on the rayon thread pool.
    pub parallel: bool,
}

impl HarnessConfig {
    /// Every language, in parallel, without the sentence-splitting check.
    pub fn standard() -> Self {
        Self {
            check_with_sentence_splitting: false,
            ignored_languages: Vec::new(),
            parallel: true,
        }
    }

    pub fn with_ignored_languages(mut self, languages: Vec<String>) -> Self {
        self.ignored_languages = languages;
        self
    }

    pub fn with_sentence_splitting(mut self, enabled: bool) -> Self {
        self.check_with_sentence_splitting = enabled;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn is_ignored(&self, code: &str) -> bool {
        self.ignored_languages.iter().any(|ignored| ignored == code)
    }

    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let error = |message: String| ConfigError {
            path: path.display().to_string(),
            message,
        };
        let content = fs::read_to_string(path).map_err(|e| error(e.to_string()))?;
        toml::from_str(&content).map_err(|e| error(e.to_string()))
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_is_default() {
        let config = HarnessConfig::load(Path::new("/nonexistent/harness.toml")).unwrap();
        assert_eq!(config, HarnessConfig::standard());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "check_with_sentence_splitting = true").unwrap();
        writeln!(file, "ignored_languages = [\"de-CH\"]").unwrap();

        let config = HarnessConfig::load(file.path()).unwrap();
        assert!(config.check_with_sentence_splitting);
        assert!(config.parallel);
        assert!(config.is_ignored("de-CH"));
        assert!(!config.is_ignored("de"));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "paralel = false").unwrap();

        let err = HarnessConfig::load(file.path()).unwrap_err();
        assert_eq!(err.path, file.path().display().to_string());
        assert!(err.message.contains("paralel"), "{}", err.message);
    }
}
