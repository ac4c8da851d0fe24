// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes: positive intervals, a consistent line pool, and campaigns that
//! lease only lines the pool actually has.

use std::collections::{HashMap, HashSet};

use linecast_core::PhoneNumber;

use crate::diagnostic::ConfigError;
use crate::model::LinecastConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &LinecastConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(invalid("storage.database_path must not be empty"));
    }

    let positive = [
        (
            "rotation.min_send_interval_ms",
            config.rotation.min_send_interval_ms,
        ),
        ("rotation.tick_interval_ms", config.rotation.tick_interval_ms),
        ("audience.batch_size", config.audience.batch_size as u64),
        ("audience.phone_fields", config.audience.phone_fields as u64),
        ("settings.max_sms_rate", u64::from(config.settings.max_sms_rate)),
        ("notifications.capacity", config.notifications.capacity as u64),
    ];
    for (key, value) in positive {
        if value == 0 {
            errors.push(invalid(format!("{key} must be at least 1")));
        }
    }

    validate_lines(config, &mut errors);
    validate_campaigns(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_lines(config: &LinecastConfig, errors: &mut Vec<ConfigError>) {
    let mut seen_ids = HashSet::new();
    let mut seen_numbers = HashMap::new();

    for (i, line) in config.lines.iter().enumerate() {
        if line.id.trim().is_empty() {
            errors.push(invalid(format!("lines[{i}].id must not be empty")));
        } else if !seen_ids.insert(line.id.as_str()) {
            errors.push(invalid(format!(
                "duplicate line id `{}` in [[lines]] array",
                line.id
            )));
        }

        match PhoneNumber::normalize(&line.number) {
            Some(number) => {
                if let Some(other) = seen_numbers.insert(number.clone(), line.id.as_str()) {
                    errors.push(invalid(format!(
                        "lines `{other}` and `{}` share the number {number}",
                        line.id
                    )));
                }
            }
            None => errors.push(invalid(format!(
                "lines[{i}].number `{}` must contain at least 10 digits",
                line.number
            ))),
        }
    }
}

fn validate_campaigns(config: &LinecastConfig, errors: &mut Vec<ConfigError>) {
    let known_lines: HashSet<&str> = config.lines.iter().map(|l| l.id.as_str()).collect();
    let mut seen_ids = HashSet::new();
    let mut leased_by: HashMap<&str, &str> = HashMap::new();

    for (i, campaign) in config.campaigns.iter().enumerate() {
        if campaign.id.trim().is_empty() {
            errors.push(invalid(format!("campaigns[{i}].id must not be empty")));
        } else if !seen_ids.insert(campaign.id.as_str()) {
            errors.push(invalid(format!(
                "duplicate campaign id `{}` in [[campaigns]] array",
                campaign.id
            )));
        }

        if campaign.message_variants == 0 {
            errors.push(invalid(format!(
                "campaigns[{i}].message_variants must be at least 1"
            )));
        }

        if campaign.sms_rate == 0 || campaign.sms_rate > config.settings.max_sms_rate {
            errors.push(invalid(format!(
                "campaigns[{i}].sms_rate must be within 1..={}, got {}",
                config.settings.max_sms_rate, campaign.sms_rate
            )));
        }

        for line_id in &campaign.lines {
            if !known_lines.contains(line_id.as_str()) {
                errors.push(invalid(format!(
                    "campaign `{}` references unknown line `{line_id}`",
                    campaign.id
                )));
                continue;
            }
            if let Some(holder) = leased_by.insert(line_id.as_str(), campaign.id.as_str())
                && holder != campaign.id
            {
                errors.push(invalid(format!(
                    "line `{line_id}` is leased by both `{holder}` and `{}`",
                    campaign.id
                )));
            }
        }
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}
