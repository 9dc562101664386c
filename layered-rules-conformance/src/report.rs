//! Per-language and whole-run results.

use crate::errors::HarnessError;
use std::fmt;

/// How far a language got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageStatus {
    /// Not tested; holds the reason.
    Skipped(String),
    /// Every rule was verified. Individual failures may still exist.
    Completed,
    /// A rule-set level error stopped the language before or during
    /// verification.
    Aborted(HarnessError),
}

/// Outcome for one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageReport {
    /// `short_name_with_country_and_variant` of the language.
    pub language: String,
    pub status: LanguageStatus,
    pub rules_tested: usize,
    pub examples_checked: usize,
    pub passes: usize,
    /// Full ids of demoted rule instances.
    pub demoted: Vec<String>,
    pub failures: Vec<HarnessError>,
    /// Pattern token lints and sentence-splitting cross-check findings.
    pub warnings: Vec<String>,
}

impl LanguageReport {
    pub fn new(language: impl Into<String>, status: LanguageStatus) -> Self {
        Self {
            language: language.into(),
            status,
            rules_tested: 0,
            examples_checked: 0,
            passes: 0,
            demoted: Vec::new(),
            failures: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn skipped(language: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(language, LanguageStatus::Skipped(reason.into()))
    }

    pub fn aborted(language: impl Into<String>, error: HarnessError) -> Self {
        Self::new(language, LanguageStatus::Aborted(error))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, LanguageStatus::Skipped(_))
    }

    pub fn is_success(&self) -> bool {
        match self.status {
            LanguageStatus::Skipped(_) => true,
            LanguageStatus::Completed => self.failures.is_empty(),
            LanguageStatus::Aborted(_) => false,
        }
    }
}

impl fmt::Display for LanguageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            LanguageStatus::Skipped(reason) => return writeln!(f, "SKIP {}: {}", self.language, reason),
            LanguageStatus::Aborted(error) => {
                writeln!(f, "ABORT {}: {}", self.language, error)?;
            }
            LanguageStatus::Completed => {
                let verdict = if self.failures.is_empty() { "PASS" } else { "FAIL" };
                writeln!(
                    f,
                    "{} {}: {} rules tested, {} examples checked, {} passes, {} failures",
                    verdict,
                    self.language,
                    self.rules_tested,
                    self.examples_checked,
                    self.passes,
                    self.failures.len()
                )?;
            }
        }

        if !self.demoted.is_empty() {
            writeln!(f, "  demoted: {}", self.demoted.join(", "))?;
        }
        for warning in &self.warnings {
            writeln!(f, "  warning: {}", warning)?;
        }
        for failure in &self.failures {
            writeln!(f, "  - {}", failure.to_string().replace('\n', "\n    "))?;
        }
        Ok(())
    }
}

/// Outcome of a whole run, languages in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub languages: Vec<LanguageReport>,
}

impl RunReport {
    pub fn new(languages: Vec<LanguageReport>) -> Self {
        Self { languages }
    }

    pub fn passed(&self) -> usize {
        self.languages
            .iter()
            .filter(|report| !report.is_skipped() && report.is_success())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.languages.iter().filter(|report| !report.is_success()).count()
    }

    pub fn skipped(&self) -> usize {
        self.languages.iter().filter(|report| report.is_skipped()).count()
    }

    pub fn get(&self, language: &str) -> Option<&LanguageReport> {
        self.languages.iter().find(|report| report.language == language)
    }

    /// Get the exit code (0 = pass, 1 = failures).
    pub fn exit_code(&self) -> i32 {
        if self.success() {
            0
        } else {
            1
        }
    }

    pub fn success(&self) -> bool {
        self.failed() == 0
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for report in &self.languages {
            write!(f, "{}", report)?;
        }
        write!(
            f,
            "{} languages: {} passed, {} failed, {} skipped",
            self.languages.len(),
            self.passed(),
            self.failed(),
            self.skipped()
        )
    }
}
