//! Table-driven tests for configuration loading and validation.

use std::io::Write;

use stockmeta::config::load_config_from_str;
use stockmeta::config::schema::{DEFAULT_EXPORT_FILENAME, DEFAULT_MAX_PIXELS, DEFAULT_MODEL};
use stockmeta::{load_config, load_config_or_default, BatchOrchestrator, ConfigError};

/// Represents a single config loading test case.
struct ConfigTestCase {
    name: &'static str,
    config_json: &'static str,
    should_succeed: bool,
    /// Expected error substring (if should_succeed is false).
    expected_error: Option<&'static str>,
}

const JSON_CONFIG_TESTS: &[ConfigTestCase] = &[
    ConfigTestCase {
        name: "empty_object_uses_defaults",
        config_json: "{}",
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "valid_minimal",
        config_json: r#"{ "version": "1.0" }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "valid_full",
        config_json: r#"{
            "version": "1.0",
            "downsample": { "max_pixels": 4000000, "quality": 0.7 },
            "extractor": {
                "endpoint": "http://localhost:8080/v1beta",
                "model": "gemini-2.5-pro",
                "temperature": 0.0,
                "timeout_secs": 120,
                "connect_timeout_secs": 5,
                "strict_metadata": true
            },
            "export": { "output_file": "reports/batch.csv" }
        }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "invalid_json",
        config_json: r#"{ "version": "1.0", "#,
        should_succeed: false,
        expected_error: Some("Failed to parse config JSON"),
    },
    ConfigTestCase {
        name: "invalid_unknown_section",
        config_json: r#"{ "version": "1.0", "ocr": { "enabled": true } }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "invalid_quality_above_one",
        config_json: r#"{ "downsample": { "quality": 1.5 } }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "invalid_zero_pixel_budget",
        config_json: r#"{ "downsample": { "max_pixels": 0 } }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "invalid_empty_model",
        config_json: r#"{ "extractor": { "model": "" } }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "invalid_version",
        config_json: r#"{ "version": "2.0" }"#,
        should_succeed: false,
        expected_error: Some("Unsupported config version"),
    },
    ConfigTestCase {
        name: "invalid_endpoint_scheme",
        config_json: r#"{ "extractor": { "endpoint": "ftp://example.com" } }"#,
        should_succeed: false,
        expected_error: Some("must be an http(s) URL"),
    },
];

#[test]
fn test_json_config_loading() {
    for test_case in JSON_CONFIG_TESTS {
        let result = load_config_from_str(test_case.config_json);

        if test_case.should_succeed {
            assert!(
                result.is_ok(),
                "Test '{}': Expected success but got error: {:?}",
                test_case.name,
                result.err()
            );
        } else {
            assert!(
                result.is_err(),
                "Test '{}': Expected error but got success",
                test_case.name
            );

            if let Some(expected_error) = test_case.expected_error {
                let error_msg = result.err().unwrap().to_string();
                assert!(
                    error_msg.contains(expected_error),
                    "Test '{}': Expected error containing '{}', got '{}'",
                    test_case.name,
                    expected_error,
                    error_msg
                );
            }
        }
    }
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config_or_default(dir.path().join("config.json")).unwrap();

    assert_eq!(config.extractor.model, DEFAULT_MODEL);
    assert_eq!(config.export.output_file, DEFAULT_EXPORT_FILENAME);
    assert_eq!(config.downsample.max_pixels, DEFAULT_MAX_PIXELS);
}

#[test]
fn test_missing_file_is_an_error_when_named_explicitly() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_config(dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
}

#[test]
fn test_file_config_drives_the_orchestrator() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(
        file,
        r#"{{ "extractor": {{ "endpoint": "http://127.0.0.1:9/v1beta", "model": "gemini-local" }} }}"#
    )
    .unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.extractor.model, "gemini-local");
    assert!(BatchOrchestrator::from_config(&config).is_ok());
}
