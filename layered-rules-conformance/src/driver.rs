//! Runs the harness over a list of languages.
//!
//! Each language gets its own engine, created by the driver's engine factory
//! and shut down when the language is done, whatever the outcome.

use crate::config::HarnessConfig;
use crate::errors::HarnessError;
use crate::lint::lint_rule_set;
use crate::markup::parse_incorrect_example;
use crate::report::{LanguageReport, LanguageStatus, RunReport};
use crate::resolver::{ComplexPhraseResolver, DemotionOverrides};
use crate::ruleset::{validate_example_coverage, validate_rule_ids};
use layered_rules::{Language, MatchEngine, PatternEngine, RuleFileError, RuleRepository, RuleSet};
use log::{info, warn};
use rayon::prelude::*;
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::sync::Arc;

/// Rule file names to load for `language`, relative to the rules directory.
///
/// Country variants get their own subdirectory when more than one language
/// is under test. Private-use variants (`-x-`), `xx-XX` and `-ANY` always
/// share the base language directory.
pub fn grammar_file_names(language: &Language, languages_under_test: usize) -> Vec<String> {
    let code = language.short_name_with_country_and_variant();
    let mut names: Vec<String> = Vec::new();

    for rule_file in &language.rule_files {
        let name_only = Path::new(rule_file)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| rule_file.clone());

        let name = if code.contains("-x-") {
            format!("{}/{}", language.short_name, name_only)
        } else if code.contains('-') && code != "xx-XX" && !code.ends_with("-ANY") && languages_under_test > 1 {
            format!("{}/{}/{}", language.short_name, code, name_only)
        } else {
            format!("{}/{}", language.short_name, name_only)
        };

        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Owns an engine for the duration of one language and shuts it down on
/// drop.
pub struct EngineSession<E: MatchEngine> {
    engine: E,
}

impl<E: MatchEngine> EngineSession<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }
}

impl<E: MatchEngine> Deref for EngineSession<E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.engine
    }
}

impl<E: MatchEngine> DerefMut for EngineSession<E> {
    fn deref_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}

impl<E: MatchEngine> Drop for EngineSession<E> {
    fn drop(&mut self) {
        self.engine.shutdown();
    }
}

/// Run every incorrect example through sentence splitting with only its own
/// rule enabled, and report rules that stop matching.
///
/// The engine's enabled rules are restored afterwards.
pub fn cross_check_sentence_splitting<E: MatchEngine + ?Sized>(
    engine: &mut E,
    rules: &RuleSet,
    overrides: &DemotionOverrides,
    language_name: &str,
) -> Vec<String> {
    let mut warnings = Vec::new();

    for (key, rule) in rules.iter() {
        let saved = engine.active_rule_ids();
        for id in &saved {
            engine.disable_rule(id);
        }
        engine.enable_rule(&rule.id);

        for example in &rule.incorrect_examples {
            // Broken examples are reported by the resolver.
            let sentence = match parse_incorrect_example(rules.language(), rule, example) {
                Ok(parsed) => parsed.sentence,
                Err(_) => continue,
            };

            let matches = engine.match_rule(rule, overrides.mode(key, rule), &sentence);
            let real_ids: Vec<String> = engine
                .check_text(&sentence, &|k, r| overrides.mode(k, r))
                .into_iter()
                .map(|found| found.rule_id)
                .collect();

            for found in matches {
                if !rule.default_off && !real_ids.contains(&found.rule_id) {
                    let warning = format!(
                        "{}: missing rule match {} when splitting sentences for test sentence '{}'",
                        language_name, found.rule_id, sentence
                    );
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        engine.disable_rule(&rule.id);
        for id in &saved {
            engine.enable_rule(id);
        }
    }

    warnings
}

/// Engine factory for the reference [`PatternEngine`].
pub fn pattern_engine(_language: &Language, rules: Arc<RuleSet>) -> PatternEngine {
    PatternEngine::new(rules)
}

/// Tests the rule sets of a list of languages.
pub struct HarnessDriver<F> {
    repository: RuleRepository,
    languages: Vec<Language>,
    config: HarnessConfig,
    engine_factory: F,
}

impl HarnessDriver<fn(&Language, Arc<RuleSet>) -> PatternEngine> {
    /// A driver using the reference engine.
    pub fn with_pattern_engine(repository: RuleRepository, languages: Vec<Language>, config: HarnessConfig) -> Self {
        Self::new(repository, languages, config, pattern_engine)
    }
}

impl<F, E> HarnessDriver<F>
where
    F: Fn(&Language, Arc<RuleSet>) -> E + Sync,
    E: MatchEngine,
{
    pub fn new(repository: RuleRepository, languages: Vec<Language>, config: HarnessConfig, engine_factory: F) -> Self {
        Self {
            repository,
            languages,
            config,
            engine_factory,
        }
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// A country variant without its own rule files adds nothing over its
    /// base language. The first language is always tested.
    pub fn skip_country_variant(&self, language: &Language) -> bool {
        if self.languages.first() == Some(language) {
            return false;
        }
        let has_grammar_files = grammar_file_names(language, self.languages.len())
            .iter()
            .any(|name| self.repository.rule_file_exists(name));
        !has_grammar_files && self.languages.len() > 1
    }

    /// Test every language, in parallel when configured.
    pub fn run_languages(&self) -> RunReport {
        let reports: Vec<LanguageReport> = if self.config.parallel {
            self.languages
                .par_iter()
                .map(|language| self.run_language(language))
                .collect()
        } else {
            self.languages
                .iter()
                .map(|language| self.run_language(language))
                .collect()
        };
        if self.languages.is_empty() {
            warn!("No languages found, cannot run any grammar rule tests");
        }
        RunReport::new(reports)
    }

    pub fn run_language(&self, language: &Language) -> LanguageReport {
        let code = language.short_name_with_country_and_variant();

        if self.config.is_ignored(&code) {
            warn!("Skipping {} because it is ignored", language);
            return LanguageReport::skipped(code, "ignored by configuration");
        }
        if self.skip_country_variant(language) {
            warn!("Skipping {} because there are no specific rules for that variant", language);
            return LanguageReport::skipped(code, "no specific rules for this variant");
        }

        info!("Running pattern rule tests for {}", language.name);
        let grammar_files = grammar_file_names(language, self.languages.len());
        let rules = match self.repository.load_rule_set(&code, &grammar_files) {
            Ok(rules) => Arc::new(rules),
            Err(err) => {
                let message = err.to_string();
                let error = match err {
                    RuleFileError::Io { .. } => HarnessError::RuleFileUnreadable {
                        language: code.clone(),
                        message,
                    },
                    RuleFileError::Schema { .. } => HarnessError::SchemaValidation {
                        language: code.clone(),
                        message,
                    },
                };
                return LanguageReport::aborted(code, error);
            }
        };

        let mut session = EngineSession::new((self.engine_factory)(language, Arc::clone(&rules)));

        if let Err(err) = validate_rule_ids(&code, &session.all_rules())
            .and_then(|()| validate_example_coverage(&code, &rules))
        {
            return LanguageReport::aborted(code, err);
        }

        let lint_warnings = lint_rule_set(&code, &rules);

        let mut resolver = ComplexPhraseResolver::new(&*session, &rules);
        let outcome = resolver.run(rules.keys().collect());
        let overrides = resolver.into_overrides();

        let mut report = LanguageReport::new(code, LanguageStatus::Completed);
        report.rules_tested = rules.len();
        report.examples_checked = outcome.examples_checked;
        report.passes = outcome.passes;
        report.demoted = outcome.demoted.iter().map(|&key| rules[key].full_id()).collect();
        report.failures = outcome.failures;
        report.warnings = lint_warnings;

        if let Some(idx) = report
            .failures
            .iter()
            .position(|failure| matches!(failure, HarnessError::DemotionDidNotConverge { .. }))
        {
            report.status = LanguageStatus::Aborted(report.failures.remove(idx));
        }

        if self.config.check_with_sentence_splitting {
            let split_warnings = cross_check_sentence_splitting(&mut *session, &rules, &overrides, &language.name);
            report.warnings.extend(split_warnings);
        }

        info!("{} rules tested for {}", report.rules_tested, language);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layered_rules::{
        AnalyzedSentence, IncorrectExample, MatchMode, PatternToken, Rule, RuleClass, RuleDescriptor, RuleKey, RuleMatch,
        RuleVariant,
    };
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const PASSING: &str = r#"
[[rules]]
id = "A_AN"
message = "Use <suggestion>an \\2</suggestion>."
tokens = [{ text = "a" }, { text = "[aeiou].*", regex = true }]

[[rules.example]]
type = "incorrect"
text = "This is <marker>a apple</marker>."
correction = "an apple"

[[rules.example]]
type = "correct"
text = "This is an apple."
"#;

    fn write_rules(dir: &TempDir, name: &str, content: &str) {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Counts shutdowns of every engine it hands out.
    struct CountingEngine {
        inner: PatternEngine,
        shutdowns: Arc<AtomicUsize>,
    }

    impl MatchEngine for CountingEngine {
        fn analyze(&self, sentence: &str) -> AnalyzedSentence {
            self.inner.analyze(sentence)
        }

        fn match_rule(&self, rule: &Rule, mode: MatchMode, sentence: &str) -> Vec<RuleMatch> {
            self.inner.match_rule(rule, mode, sentence)
        }

        fn all_rules(&self) -> Vec<RuleDescriptor> {
            self.inner.all_rules()
        }

        fn check_text(&self, text: &str, mode_of: &dyn Fn(RuleKey, &Rule) -> MatchMode) -> Vec<RuleMatch> {
            self.inner.check_text(text, mode_of)
        }

        fn active_rule_ids(&self) -> Vec<String> {
            self.inner.active_rule_ids()
        }

        fn enable_rule(&mut self, id: &str) {
            self.inner.enable_rule(id)
        }

        fn disable_rule(&mut self, id: &str) {
            self.inner.disable_rule(id)
        }

        fn shutdown(&mut self) {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_grammar_file_names() {
        let en = Language::new("English", "en").with_rule_files(vec![
            "rules/en/grammar.toml".to_string(),
            "grammar.toml".to_string(),
            "style.toml".to_string(),
        ]);
        assert_eq!(grammar_file_names(&en, 3), vec!["en/grammar.toml", "en/style.toml"]);

        let en_us = Language::new("English (US)", "en").with_country("US");
        assert_eq!(grammar_file_names(&en_us, 3), vec!["en/en-US/grammar.toml"]);
        assert_eq!(grammar_file_names(&en_us, 1), vec!["en/grammar.toml"]);

        let simple = Language::new("Simple German", "de")
            .with_country("DE")
            .with_variant("x-simple-language");
        assert_eq!(grammar_file_names(&simple, 3), vec!["de/grammar.toml"]);

        let any = Language::new("Catalan", "ca").with_country("ANY");
        assert_eq!(grammar_file_names(&any, 3), vec!["ca/grammar.toml"]);

        let demo = Language::new("Demo", "xx").with_country("XX");
        assert_eq!(grammar_file_names(&demo, 3), vec!["xx/grammar.toml"]);
    }

    #[test]
    fn test_skip_country_variant() {
        let dir = TempDir::new().unwrap();
        write_rules(&dir, "en/grammar.toml", PASSING);
        write_rules(&dir, "en/en-GB/grammar.toml", PASSING);

        let en_us = Language::new("English (US)", "en").with_country("US");
        let en_gb = Language::new("English (GB)", "en").with_country("GB");
        let driver = HarnessDriver::with_pattern_engine(
            RuleRepository::new(dir.path()),
            vec![en_us.clone(), Language::new("English", "en"), en_gb.clone()],
            HarnessConfig::standard().with_parallel(false),
        );

        assert!(!driver.skip_country_variant(&en_us));
        assert!(driver.skip_country_variant(&driver.languages()[0].clone().with_country("AU")));
        assert!(!driver.skip_country_variant(&en_gb));
    }

    #[test]
    fn test_run_passing_language() {
        let dir = TempDir::new().unwrap();
        write_rules(&dir, "en/grammar.toml", PASSING);

        let driver = HarnessDriver::with_pattern_engine(
            RuleRepository::new(dir.path()),
            vec![Language::new("English", "en")],
            HarnessConfig::standard().with_sentence_splitting(true),
        );
        let run = driver.run_languages();

        let en = run.get("en").unwrap();
        assert_eq!(en.status, LanguageStatus::Completed);
        assert_eq!(en.rules_tested, 1);
        assert_eq!(en.examples_checked, 2);
        assert!(en.failures.is_empty(), "{:?}", en.failures);
        assert!(en.warnings.is_empty(), "{:?}", en.warnings);
        assert_eq!(run.exit_code(), 0);
    }

    #[test]
    fn test_token_lints_are_reported() {
        let dir = TempDir::new().unwrap();
        write_rules(
            &dir,
            "en/grammar.toml",
            &PASSING.replace(r#"{ text = "a" }"#, r#"{ text = "a|an" }"#),
        );

        let driver = HarnessDriver::with_pattern_engine(
            RuleRepository::new(dir.path()),
            vec![Language::new("English", "en")],
            HarnessConfig::standard(),
        );
        let report = driver.run_language(&driver.languages()[0]);
        assert_eq!(
            report.warnings,
            vec!["en: rule A_AN[1]: token 'a|an' contains regex syntax but is not marked as a regex"]
        );
        // The literal never matches, so the example fails as well.
        assert!(matches!(
            report.failures[..],
            [HarnessError::WrongMatchCount { found: 0, .. }]
        ));
    }

    #[test]
    fn test_ignored_language() {
        let dir = TempDir::new().unwrap();
        let driver = HarnessDriver::with_pattern_engine(
            RuleRepository::new(dir.path()),
            vec![Language::new("English", "en")],
            HarnessConfig::standard().with_ignored_languages(vec!["en".to_string()]),
        );
        let run = driver.run_languages();
        assert!(run.languages[0].is_skipped());
        assert!(run.success());
    }

    #[test]
    fn test_schema_error_aborts_language() {
        let dir = TempDir::new().unwrap();
        write_rules(&dir, "en/grammar.toml", "[[rules]]\nid = \"BROKEN\"\n");

        let driver = HarnessDriver::with_pattern_engine(
            RuleRepository::new(dir.path()),
            vec![Language::new("English", "en")],
            HarnessConfig::standard(),
        );
        let report = driver.run_language(&driver.languages()[0]);
        match report.status {
            LanguageStatus::Aborted(HarnessError::SchemaValidation { message, .. }) => {
                assert!(message.starts_with("schema validation failed for"), "{}", message);
            }
            other => panic!("expected schema abort, got {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_rule_file_is_not_a_schema_error() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("en")).unwrap();
        fs::write(dir.path().join("en/grammar.toml"), [0xff, 0xfe, 0x00]).unwrap();

        let driver = HarnessDriver::with_pattern_engine(
            RuleRepository::new(dir.path()),
            vec![Language::new("English", "en")],
            HarnessConfig::standard(),
        );
        let report = driver.run_language(&driver.languages()[0]);
        match report.status {
            LanguageStatus::Aborted(HarnessError::RuleFileUnreadable { language, message }) => {
                assert_eq!(language, "en");
                assert!(message.starts_with("failed to read"), "{}", message);
            }
            other => panic!("expected unreadable rule file, got {:?}", other),
        }
    }

    #[test]
    fn test_engine_shut_down_on_abort() {
        let dir = TempDir::new().unwrap();
        write_rules(&dir, "en/grammar.toml", PASSING);

        let shutdowns = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&shutdowns);
        let driver = HarnessDriver::new(
            RuleRepository::new(dir.path()),
            vec![Language::new("English", "en")],
            HarnessConfig::standard(),
            move |_: &Language, rules: Arc<RuleSet>| CountingEngine {
                inner: PatternEngine::new(rules).with_builtin_rules(vec![RuleDescriptor::new(
                    "A_AN",
                    RuleClass::Builtin("ArticleRule".to_string()),
                )]),
                shutdowns: Arc::clone(&counter),
            },
        );

        let report = driver.run_language(&driver.languages()[0]);
        assert!(matches!(
            report.status,
            LanguageStatus::Aborted(HarnessError::DuplicateRuleId { .. })
        ));
        assert_eq!(shutdowns.load(Ordering::SeqCst), 1);

        driver.run_language(&driver.languages()[0]);
        assert_eq!(shutdowns.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cross_check_restores_enabled_rules() {
        let mut could_of = Rule::simple(
            "COULD_OF",
            "en",
            vec![PatternToken::literal("could"), PatternToken::literal("of")],
        );
        could_of.variant = RuleVariant::Composite;
        could_of.incorrect_examples = vec![IncorrectExample::new(
            "<marker>Could of</marker> been worse.",
            Vec::new(),
        )];
        let mut across = Rule::simple(
            "ACROSS",
            "en",
            vec![
                PatternToken::literal("here"),
                PatternToken::literal("."),
                PatternToken::literal("Then"),
            ],
        );
        across.incorrect_examples = vec![IncorrectExample::new("Stop <marker>here. Then</marker> go.", Vec::new())];
        let other = Rule::simple("OTHER", "en", vec![PatternToken::literal("x")]);

        let rules = Arc::new(RuleSet::new("en", vec![could_of, across, other]));
        let mut engine = PatternEngine::new(Arc::clone(&rules));
        let mut overrides = DemotionOverrides::default();
        overrides.demote(RuleKey(0), "demoted");

        // The demoted phrase matches the same way in both runs; the match
        // spanning two sentences is lost by splitting.
        let warnings = cross_check_sentence_splitting(&mut engine, &rules, &overrides, "English");
        assert_eq!(
            warnings,
            vec!["English: missing rule match ACROSS when splitting sentences for test sentence 'Stop here. Then go.'"]
        );
        assert_eq!(engine.active_rule_ids(), vec!["ACROSS", "COULD_OF", "OTHER"]);
    }
}
