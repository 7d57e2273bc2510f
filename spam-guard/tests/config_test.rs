//! Integration tests for configuration loading

use spam_guard::config::{GuardConfig, LogFormat};
use spam_guard::llm::{Credentials, ProviderPreference};
use spam_guard::pipeline::SpamPipeline;
use spam_guard::spam::{DetectionLayer, Message, PatternRuleSet};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_file(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_from_file() {
    let file = write_file(
        r#"
        dry_run = true
        custom_keywords = ["cheap followers"]

        [ai]
        provider = "gemini"
        timeout_secs = 5

        [rate_limit]
        max_checks_per_window = 10
        window_ms = 30000

        [logging]
        format = "compact"
        "#,
    );

    let config = GuardConfig::load_with_prefix(Some(file.path()), "SG_TEST_FILE").unwrap();
    assert!(config.dry_run);
    assert_eq!(config.custom_keywords, vec!["cheap followers".to_string()]);
    assert_eq!(config.ai.provider, ProviderPreference::Gemini);
    assert_eq!(config.ai.timeout_secs, 5);
    assert_eq!(config.rate_limit.max_checks_per_window, 10);
    assert_eq!(config.logging.format, LogFormat::Compact);
}

#[test]
fn test_missing_file_is_an_error() {
    let result = GuardConfig::load_with_prefix(
        Some(std::path::Path::new("/nonexistent/spam-guard.toml")),
        "SG_TEST_MISSING",
    );
    assert!(result.is_err());
}

#[test]
fn test_invalid_values_rejected() {
    let file = write_file(
        r#"
        [rate_limit]
        window_ms = 0
        "#,
    );
    assert!(GuardConfig::load_with_prefix(Some(file.path()), "SG_TEST_INVALID").is_err());
}

#[test]
fn test_environment_overrides_file() {
    let file = write_file(
        r#"
        dry_run = false

        [ai]
        provider = "gemini"
        "#,
    );

    std::env::set_var("SG_TEST_ENV_DRY_RUN", "true");
    std::env::set_var("SG_TEST_ENV_AI__PROVIDER", "openai");
    std::env::set_var("SG_TEST_ENV_CUSTOM_KEYWORDS", "promo,free spins");

    let config = GuardConfig::load_with_prefix(Some(file.path()), "SG_TEST_ENV").unwrap();

    std::env::remove_var("SG_TEST_ENV_DRY_RUN");
    std::env::remove_var("SG_TEST_ENV_AI__PROVIDER");
    std::env::remove_var("SG_TEST_ENV_CUSTOM_KEYWORDS");

    assert!(config.dry_run);
    assert_eq!(config.ai.provider, ProviderPreference::OpenAi);
    assert_eq!(
        config.custom_keywords,
        vec!["promo".to_string(), "free spins".to_string()]
    );
}

#[test]
fn test_no_file_no_env_gives_defaults() {
    let config = GuardConfig::load_with_prefix(None, "SG_TEST_NOTHING").unwrap();
    assert!(config.use_ai);
    assert_eq!(config.rate_limit.max_checks_per_window, 30);
    assert_eq!(config.rate_limit.window_ms, 60_000);
}

#[tokio::test]
async fn test_custom_pattern_table() {
    let patterns = write_file(
        r#"
        high_confidence_phrases = ["únete a nuestro grupo de inversión"]
        invite_patterns = ['(?i)chat\.example\.org/[a-z0-9]{8,}']

        [[categories]]
        name = "finanzas"
        terms = ["ganancias", "inversión", "cripto"]
        "#,
    );

    let config = GuardConfig {
        use_ai: false,
        patterns_file: Some(patterns.path().to_path_buf()),
        ..GuardConfig::default()
    };
    let pipeline = SpamPipeline::from_config(&config, &Credentials::default()).unwrap();

    let decision = pipeline
        .decide(&Message::new(
            "Únete a nuestro grupo de inversión hoy",
            "Ana",
            "Vecinos",
        ))
        .await;
    assert_eq!(decision.layer, DetectionLayer::Pattern);
    assert_eq!(decision.verdict.confidence, 95);

    let decision = pipeline
        .decide(&Message::new(
            "cripto chat.example.org/abcdefgh12",
            "Ana",
            "Vecinos",
        ))
        .await;
    assert_eq!(decision.verdict.confidence, 75);

    // Built-in English phrases are replaced, not merged
    let decision = pipeline
        .decide(&Message::new("guaranteed returns", "Ana", "Vecinos"))
        .await;
    assert!(!decision.verdict.is_spam);
}

#[tokio::test]
async fn test_broken_pattern_table_fails_startup() {
    let patterns = write_file(r#"invite_patterns = ["(unclosed"]"#);
    let config = GuardConfig {
        patterns_file: Some(patterns.path().to_path_buf()),
        ..GuardConfig::default()
    };
    assert!(SpamPipeline::from_config(&config, &Credentials::default()).is_err());
}

#[test]
fn test_example_pattern_file() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/patterns.example.toml");
    let rules = PatternRuleSet::from_file(path).unwrap();
    assert_eq!(rules.vocabulary_size(), 10);
    assert!(rules.has_invite_link("t.me/joinchat/AbCdEfGhIjK"));
}
