use std::io::Write;

use tally::config::{EngineConfig, IntentConfig};
use tally::error::ConfigError;
use tally::patterns::{Autonomy, PatternAccess, PatternStore};

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::load(&dir.path().join("tally.toml")).unwrap();
    assert_eq!(config, EngineConfig::default());
    assert_eq!(config.intent.confidence_threshold, 0.6);
    assert_eq!(config.patterns.max_suggestions_per_day, 3);
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[intent]
confidence_threshold = 0.7

[patterns]
postpone_autonomy = "auto"
max_suggestions_per_day = 5
"#
    )
    .unwrap();

    let config = EngineConfig::load(file.path()).unwrap();

    assert_eq!(config.intent.confidence_threshold, 0.7);
    assert_eq!(config.intent.max_suggestions, IntentConfig::default().max_suggestions);
    assert_eq!(config.patterns.postpone_autonomy, Autonomy::Auto);
    assert_eq!(config.patterns.max_suggestions_per_day, 5);
    assert_eq!(config.scan.interval_secs, 300);

    let store = PatternStore::new(&config.patterns);
    assert_eq!(store.preferences().postpone.autonomy, Autonomy::Auto);
    assert_eq!(store.quotas().per_day, 5);
}

#[test]
fn test_malformed_toml_reports_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[intent\nconfidence_threshold = ").unwrap();

    match EngineConfig::load(file.path()) {
        Err(ConfigError::Parse { path, .. }) => assert_eq!(path, file.path()),
        other => panic!("Expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_invalid_values_are_rejected() {
    let cases = [
        ("[intent]\nconfidence_threshold = 1.5", "intent.confidence_threshold"),
        ("[intent]\nsuggestion_floor = 0.8", "intent.suggestion_floor"),
        (
            "[patterns]\nmax_suggestions_per_day = 12\nmax_suggestions_per_week = 10",
            "patterns.max_suggestions_per_week",
        ),
        ("[scan]\ninterval_secs = 0", "scan.interval_secs"),
    ];
    for (toml, expected) in cases {
        match EngineConfig::from_toml_str(toml) {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected),
            other => panic!("Expected {expected} to be rejected, got {other:?}"),
        }
    }
}

#[test]
fn test_unknown_autonomy_is_a_parse_error() {
    let result = EngineConfig::from_toml_str("[patterns]\npostpone_autonomy = \"sometimes\"");
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}
