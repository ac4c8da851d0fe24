// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./linecast.toml` > `~/.config/linecast/linecast.toml`
//! > `/etc/linecast/linecast.toml` with environment variable overrides via the
//! `LINECAST_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::LinecastConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/linecast/linecast.toml";

/// Local configuration file, relative to the working directory.
pub const LOCAL_CONFIG_FILE: &str = "linecast.toml";

/// Sections addressable from `LINECAST_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &[
    "service",
    "storage",
    "rotation",
    "audience",
    "settings",
    "notifications",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/linecast/linecast.toml`
/// 3. `~/.config/linecast/linecast.toml`
/// 4. `./linecast.toml`
/// 5. `LINECAST_*` environment variables
pub fn load_config() -> Result<LinecastConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<LinecastConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LinecastConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<LinecastConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LinecastConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full layered Figment, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(LinecastConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// `~/.config/linecast/linecast.toml`, when a config dir exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("linecast").join(LOCAL_CONFIG_FILE))
}

/// Environment provider mapping `LINECAST_ROTATION_TICK_INTERVAL_MS` to
/// `rotation.tick_interval_ms`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores themselves.
fn env_provider() -> Env {
    Env::prefixed("LINECAST_").map(|key| map_env_key(key.as_str()).into())
}

/// Turn the first `<section>_` of a lowercased env key into `<section>.`.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(
            map_env_key("rotation_min_send_interval_ms"),
            "rotation.min_send_interval_ms"
        );
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(map_env_key("settings_max_sms_rate"), "settings.max_sms_rate");
    }

    #[test]
    fn unknown_env_section_passes_through() {
        assert_eq!(map_env_key("bogus_key"), "bogus_key");
    }

    #[test]
    fn empty_string_yields_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.service.name, "linecast");
        assert_eq!(config.lines.len(), 5);
    }

    #[test]
    fn toml_lines_replace_the_seed_set() {
        let config = load_config_from_str(
            r#"
[[lines]]
id = "a"
name = "Only Line"
number = "312-555-0100"
"#,
        )
        .unwrap();
        assert_eq!(config.lines.len(), 1);
        assert_eq!(config.lines[0].id, "a");
    }
}
