// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Linecast configuration system.

use linecast_config::diagnostic::{ConfigError, suggest_key};
use linecast_config::model::LinecastConfig;
use linecast_config::{load_and_validate_str, load_config, load_config_from_str};

/// Valid TOML with all known sections deserializes successfully.
#[test]
fn valid_toml_deserializes_into_linecast_config() {
    let toml = r#"
[service]
name = "linecast-test"
log_level = "debug"

[storage]
database_path = "/tmp/linecast-test.db"
wal_mode = false

[rotation]
min_send_interval_ms = 30000
tick_interval_ms = 250

[audience]
batch_size = 50
batch_pause_ms = 0

[settings]
max_sms_rate = 120
persist = false

[notifications]
capacity = 16
log = false

[[lines]]
id = "east"
name = "East"
number = "+1 212 555 0100"

[[lines]]
id = "west"
name = "West"
number = "415.555.0100"

[[campaigns]]
id = "fall-drive"
lines = ["east", "west"]
message_variants = 3
sms_rate = 30

[campaigns.schedule]
days_of_week = ["Mon", "Wed", "Fri"]
timezone = "America/New_York"
start_time = "09:00"
end_time = "17:00"
start_date = "2026-11-02"
end_date = "2026-12-18"
"#;

    let config = load_and_validate_str(toml).expect("valid TOML should load");
    assert_eq!(config.service.name, "linecast-test");
    assert_eq!(config.service.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/linecast-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.rotation.min_send_interval_ms, 30_000);
    assert_eq!(config.rotation.tick_interval_ms, 250);
    assert_eq!(config.audience.batch_size, 50);
    assert_eq!(config.audience.batch_pause_ms, 0);
    assert_eq!(config.audience.phone_fields, 5);
    assert_eq!(config.settings.max_sms_rate, 120);
    assert!(!config.settings.persist);
    assert_eq!(config.notifications.capacity, 16);
    assert_eq!(config.lines.len(), 2);
    assert_eq!(config.campaigns[0].lines, vec!["east", "west"]);
    assert_eq!(config.campaigns[0].schedule.days_of_week.len(), 3);
}

/// Missing sections fall back to defaults, including the five-line pool.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("[service]\nname = \"x\"\n").unwrap();
    assert_eq!(config.service.log_level, "info");
    assert_eq!(config.rotation.min_send_interval_ms, 60_000);
    assert_eq!(config.audience.batch_size, 100);
    assert_eq!(config.audience.batch_pause_ms, 10);
    assert_eq!(config.lines.len(), 5);
    assert!(config.campaigns.is_empty());
}

/// `LINECAST_ROTATION_TICK_INTERVAL_MS` maps to `rotation.tick_interval_ms`,
/// not `rotation.tick.interval.ms`.
#[test]
fn env_var_overrides_nested_key() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("linecast.toml", "[rotation]\ntick_interval_ms = 500\n")?;
        jail.set_env("LINECAST_ROTATION_TICK_INTERVAL_MS", "250");
        jail.set_env("LINECAST_SERVICE_LOG_LEVEL", "trace");

        let config = load_config()?;
        assert_eq!(config.rotation.tick_interval_ms, 250);
        assert_eq!(config.service.log_level, "trace");
        Ok(())
    });
}

/// Local `linecast.toml` is picked up from the working directory.
#[test]
fn local_file_overrides_defaults() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("linecast.toml", "[audience]\nbatch_size = 7\n")?;
        let config = load_config()?;
        assert_eq!(config.audience.batch_size, 7);
        Ok(())
    });
}

/// Unknown key inside a section is rejected.
#[test]
fn unknown_field_in_rotation_produces_error() {
    let err = load_config_from_str("[rotation]\ntick_intervl_ms = 5\n")
        .expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("tick_intervl_ms"),
        "got: {err_str}"
    );
}

/// Unknown top-level section is rejected.
#[test]
fn deny_unknown_fields_at_top_level() {
    assert!(load_config_from_str("[transport]\nkind = \"twilio\"\n").is_err());
}

#[test]
fn diagnostic_bacth_size_suggests_batch_size() {
    let suggestion = suggest_key("bacth_size", &["batch_size", "batch_pause_ms", "phone_fields"]);
    assert_eq!(suggestion.as_deref(), Some("batch_size"));
}

/// The diagnostic carries the unknown key, a suggestion and the valid keys.
#[test]
fn diagnostic_error_includes_unknown_key() {
    let errors = load_and_validate_str("[audience]\nbacth_size = 10\n")
        .expect_err("should produce errors");

    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "bacth_size"
                && suggestion.as_deref() == Some("batch_size")
                && valid_keys.contains("phone_fields")
        })
    });
    assert!(found, "expected UnknownKey for bacth_size, got: {errors:?}");
}

/// A string where a number is expected produces a type error.
#[test]
fn diagnostic_invalid_type_message() {
    let errors = load_and_validate_str("[rotation]\ntick_interval_ms = \"fast\"\n")
        .expect_err("should reject invalid type");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. })),
        "got: {errors:?}"
    );
}

/// ConfigError implements miette::Diagnostic with linecast codes.
#[test]
fn config_error_implements_diagnostic() {
    use miette::Diagnostic;

    let error = ConfigError::UnknownKey {
        key: "naem".into(),
        suggestion: Some("name".into()),
        valid_keys: "name, log_level".into(),
        span: None,
        src: None,
    };
    let code = error.code().map(|c| c.to_string());
    assert_eq!(code.as_deref(), Some("linecast::config::unknown_key"));
    let help = error.help().map(|h| h.to_string()).unwrap_or_default();
    assert!(help.contains("did you mean `name`?"), "got: {help}");
}

/// Semantic validation runs after a successful load.
#[test]
fn validation_catches_campaign_on_unknown_line() {
    let toml = r#"
[[campaigns]]
id = "x"
lines = ["99"]

[campaigns.schedule]
days_of_week = ["Tue"]
timezone = "UTC"
start_time = "08:00"
end_time = "12:00"
start_date = "2026-11-03"
"#;
    let errors = load_and_validate_str(toml).expect_err("unknown line must fail");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("`99`")))
    );
}

#[test]
fn load_and_validate_defaults() {
    let config = load_and_validate_str("").expect("empty config is valid");
    let defaults = LinecastConfig::default();
    assert_eq!(config.lines, defaults.lines);
    assert_eq!(config.service.name, defaults.service.name);
}
