/*!
 * Tests for configuration loading and validation
 */

use markwai::app_config::{Config, LogLevel, ModelProvider};
use markwai::marking::SampleLevel;

use crate::common::{create_temp_dir, create_test_file, test_config};

#[test]
fn test_defaultConfig_shouldUseOpenAiWithoutKey() {
    let config = Config::default();

    assert_eq!(config.marking.provider, ModelProvider::OpenAI);
    assert_eq!(config.marking.get_model(), "gpt-3.5-turbo");
    assert_eq!(config.marking.get_endpoint(), "https://api.openai.com/v1");
    assert_eq!(config.marking.get_timeout_secs(), 60);
    assert!(config.marking.get_api_key().is_empty());
    assert_eq!(config.marking.common.sample_level, SampleLevel::Medium);
    assert_eq!(config.marking.common.temperature, None);
    assert_eq!(config.scoring.default_score, 5);
    assert_eq!(config.rubric.criterion_column, "Criterion");
    assert_eq!(config.log_level, LogLevel::Info);
}

#[test]
fn test_validate_withoutApiKey_shouldNameEnvironmentVariable() {
    let error = Config::default().validate().unwrap_err();
    assert!(error.to_string().contains("OPENAI_API_KEY"));
}

#[test]
fn test_validate_withInjectedKey_shouldPass() {
    assert!(test_config().validate().is_ok());
}

#[test]
fn test_validate_withBadValues_shouldFail() {
    let mut bad_score = test_config();
    bad_score.scoring.default_score = 11;
    assert!(bad_score.validate().is_err());

    let mut bad_column = test_config();
    bad_column.rubric.criterion_column = "  ".to_string();
    assert!(bad_column.validate().is_err());

    let mut bad_endpoint = test_config();
    bad_endpoint.marking.available_providers[0].endpoint = "not a url".to_string();
    assert!(bad_endpoint.validate().is_err());

    let mut bad_timeout = test_config();
    bad_timeout.marking.available_providers[0].timeout_secs = 0;
    assert!(bad_timeout.validate().is_err());
}

#[test]
fn test_applyEnvCredentials_shouldOnlyFillEmptyKey() {
    let mut config = Config::default();
    config.marking.available_providers[0].api_key = "from-config".to_string();

    config.apply_env_credentials(|_| Some("from-env".to_string()));

    assert_eq!(config.marking.get_api_key(), "from-config");
}

#[test]
fn test_applyEnvCredentials_shouldLookUpActiveProviderVariable() {
    let mut config = Config::default();
    config.marking.provider = ModelProvider::Anthropic;

    config.apply_env_credentials(|name| (name == "ANTHROPIC_API_KEY").then(|| "sk-ant".to_string()));

    assert_eq!(config.marking.get_api_key(), "sk-ant");
    assert_eq!(config.marking.get_max_tokens(), Some(4096));
}

#[test]
fn test_applyEnvCredentials_withBlankVariable_shouldLeaveKeyEmpty() {
    let mut config = Config::default();
    config.apply_env_credentials(|_| Some("   ".to_string()));
    assert!(config.marking.get_api_key().is_empty());
}

#[test]
fn test_setModel_withoutProviderEntry_shouldAddOne() {
    let mut config = Config::default();
    config.marking.available_providers.clear();

    config.marking.set_model("gpt-4o");

    assert_eq!(config.marking.get_model(), "gpt-4o");
    assert_eq!(config.marking.available_providers.len(), 1);
}

#[test]
fn test_saveAndLoad_shouldPreserveSettings() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");
    let mut config = test_config();
    config.marking.common.sample_level = SampleLevel::High;
    config.scoring.default_score = 7;

    config.save(&path).unwrap();
    let loaded = Config::load(&path).unwrap();

    assert_eq!(loaded.marking.common.sample_level, SampleLevel::High);
    assert_eq!(loaded.scoring.default_score, 7);
    assert_eq!(loaded.marking.get_api_key(), "test-key");
}

#[test]
fn test_load_withPartialJson_shouldFillDefaults() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(
        dir.path(),
        "conf.json",
        r#"{ "marking": { "provider": "anthropic", "common": { "sample_level": "low" } }, "log_level": "debug" }"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();

    assert_eq!(config.marking.provider, ModelProvider::Anthropic);
    assert_eq!(config.marking.common.sample_level, SampleLevel::Low);
    assert_eq!(config.marking.common.retry_count, 3);
    assert_eq!(config.marking.get_model(), "claude-3-haiku-20240307");
    assert_eq!(config.log_level, LogLevel::Debug);
}

#[test]
fn test_load_withInvalidJson_shouldReportPath() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(dir.path(), "conf.json", "{ not json").unwrap();

    let error = Config::load(&path).unwrap_err();

    assert!(error.to_string().contains("conf.json"));
}
