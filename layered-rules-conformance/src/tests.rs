use crate::{HarnessConfig, HarnessDriver, HarnessError, LanguageStatus, RunReport};
use layered_rules::{load_languages, RuleRepository};
use std::path::{Path, PathBuf};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Run every fixture language through the reference engine.
fn run_fixtures(config: HarnessConfig) -> RunReport {
    let languages = load_languages(&fixtures_dir().join("languages.toml")).expect("Failed to load fixture languages");
    let driver = HarnessDriver::with_pattern_engine(RuleRepository::new(fixtures_dir().join("rules")), languages, config);
    driver.run_languages()
}

#[test]
fn test_fixture_languages() {
    let run = run_fixtures(HarnessConfig::standard());

    let codes: Vec<_> = run.languages.iter().map(|report| report.language.as_str()).collect();
    assert_eq!(codes, vec!["en", "en-US", "de"]);
    assert_eq!((run.passed(), run.failed(), run.skipped()), (1, 1, 1));
    assert_eq!(run.exit_code(), 1);
}

#[test]
fn test_english_rules_pass() {
    let run = run_fixtures(HarnessConfig::standard().with_parallel(false));
    let en = run.get("en").unwrap();

    assert_eq!(en.status, LanguageStatus::Completed);
    assert!(en.failures.is_empty(), "{:#?}", en.failures);
    assert_eq!(en.rules_tested, 6);
    assert_eq!(en.examples_checked, 19);
    assert_eq!(en.passes, 2);
    assert_eq!(en.demoted, vec!["COULD_OF[1]"]);
    assert!(en.warnings.is_empty());
}

#[test]
fn test_country_variant_without_rules_is_skipped() {
    let run = run_fixtures(HarnessConfig::standard());
    assert_eq!(
        run.get("en-US").unwrap().status,
        LanguageStatus::Skipped("no specific rules for this variant".to_string())
    );
}

#[test]
fn test_german_rules_fail() {
    let run = run_fixtures(HarnessConfig::standard());
    let de = run.get("de").unwrap();

    assert_eq!(de.status, LanguageStatus::Completed);
    assert_eq!(de.examples_checked, 5);
    assert_eq!(de.failures.len(), 4, "{:#?}", de.failures);

    match &de.failures[0] {
        HarnessError::WrongPosition {
            rule,
            expected_start,
            expected_end,
            found_start,
            found_end,
            ..
        } => {
            assert_eq!(rule, "SEIT_SEID[1]");
            assert_eq!((*expected_start, *expected_end), (10, 22));
            assert_eq!((*found_start, *found_end), (10, 14));
        }
        other => panic!("expected wrong position, got {:?}", other),
    }

    insta::assert_snapshot!(de.failures[1].to_string(), @r###"
    de: Did not expect error in:
      Weil es regnet, bleibe ich.
    Matching Rule: KOMMA_WEIL[1]
    "###);

    insta::assert_snapshot!(de.failures[2].to_string(), @r###"
    Incorrect input:
      Das ist gross.
    Corrected sentence:
      Das ist sehr gross.
    By Rule:
      GROSS[1]
    The correction triggered an error itself:
      GROSS[1]:13-18:["sehr gross"]
    "###);

    insta::assert_snapshot!(de.failures[3].to_string(), @r###"de: Incorrect suggestions: ["wider spiegeln"] != ["widerspiegeln"] for rule WIEDERSPIEGELN[1] on input: Die Zahlen wiederspiegeln das."###);
}

#[test]
fn test_sentence_splitting_cross_check() {
    let run = run_fixtures(HarnessConfig::standard().with_sentence_splitting(true));
    let en = run.get("en").unwrap();

    // The demoted COULD_OF phrase is checked with the same mode both ways.
    assert_eq!(en.demoted, vec!["COULD_OF[1]"]);
    assert!(en.warnings.is_empty(), "{:?}", en.warnings);
    assert!(run.get("de").unwrap().warnings.is_empty());
}
