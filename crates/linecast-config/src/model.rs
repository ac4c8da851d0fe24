// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Linecast.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use linecast_core::Schedule;
use serde::{Deserialize, Serialize};

/// Top-level Linecast configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LinecastConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// SQLite storage for the DNC registry and settings snapshots.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Line rotation cadence.
    #[serde(default)]
    pub rotation: RotationConfig,

    /// Audience processing batch behavior.
    #[serde(default)]
    pub audience: AudienceConfig,

    /// Campaign settings limits.
    #[serde(default)]
    pub settings: SettingsConfig,

    /// Notification bus settings.
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// The phone line pool seed set.
    #[serde(default = "default_lines")]
    pub lines: Vec<LineConfig>,

    /// Campaigns started by `linecast serve`.
    #[serde(default)]
    pub campaigns: Vec<CampaignConfig>,
}

impl Default for LinecastConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            storage: StorageConfig::default(),
            rotation: RotationConfig::default(),
            audience: AudienceConfig::default(),
            settings: SettingsConfig::default(),
            notifications: NotificationConfig::default(),
            lines: default_lines(),
            campaigns: Vec::new(),
        }
    }
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name used in logs.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "linecast".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("linecast").join("linecast.db"))
        .unwrap_or_else(|| "linecast.db".into())
        .display()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Rotation engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RotationConfig {
    /// Minimum time between two sends of the same campaign.
    #[serde(default = "default_min_send_interval_ms")]
    pub min_send_interval_ms: u64,

    /// How often the driver polls every tracked campaign.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            min_send_interval_ms: default_min_send_interval_ms(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

fn default_min_send_interval_ms() -> u64 {
    60_000
}

fn default_tick_interval_ms() -> u64 {
    1_000
}

/// Audience processor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AudienceConfig {
    /// Contacts classified between two yield points.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between batches, in milliseconds.
    #[serde(default = "default_batch_pause_ms")]
    pub batch_pause_ms: u64,

    /// Number of `phoneN` fields examined per contact.
    #[serde(default = "default_phone_fields")]
    pub phone_fields: usize,
}

impl Default for AudienceConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_pause_ms: default_batch_pause_ms(),
            phone_fields: default_phone_fields(),
        }
    }
}

fn default_batch_size() -> usize {
    100
}

fn default_batch_pause_ms() -> u64 {
    10
}

fn default_phone_fields() -> usize {
    5
}

/// Campaign settings limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsConfig {
    /// Highest accepted `sms_rate`, in messages per minute.
    #[serde(default = "default_max_sms_rate")]
    pub max_sms_rate: u32,

    /// Save settings snapshots to storage on shutdown and restore them on start.
    #[serde(default = "default_persist")]
    pub persist: bool,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            max_sms_rate: default_max_sms_rate(),
            persist: default_persist(),
        }
    }
}

fn default_max_sms_rate() -> u32 {
    60
}

fn default_persist() -> bool {
    true
}

/// Notification bus configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationConfig {
    /// Broadcast buffer size.
    #[serde(default = "default_notification_capacity")]
    pub capacity: usize,

    /// Mirror every notification into the log.
    #[serde(default = "default_log_notifications")]
    pub log: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            capacity: default_notification_capacity(),
            log: default_log_notifications(),
        }
    }
}

fn default_notification_capacity() -> usize {
    256
}

fn default_log_notifications() -> bool {
    true
}

/// One phone line of the pool seed set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LineConfig {
    pub id: String,
    pub name: String,
    /// Any formatting; normalized to `(AAA) BBB-CCCC` when the pool is built.
    pub number: String,
}

fn default_lines() -> Vec<LineConfig> {
    [
        ("1", "Main Line", "(555) 010-0001"),
        ("2", "Sales Line", "(555) 010-0002"),
        ("3", "Support Line", "(555) 010-0003"),
        ("4", "Marketing Line", "(555) 010-0004"),
        ("5", "Overflow Line", "(555) 010-0005"),
    ]
    .into_iter()
    .map(|(id, name, number)| LineConfig {
        id: id.to_string(),
        name: name.to_string(),
        number: number.to_string(),
    })
    .collect()
}

/// A campaign registered at startup by `linecast serve`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CampaignConfig {
    pub id: String,

    /// Line ids leased to this campaign.
    pub lines: Vec<String>,

    /// Number of message variants rotated through.
    #[serde(default = "default_message_variants")]
    pub message_variants: usize,

    /// Messages per minute.
    #[serde(default = "default_sms_rate")]
    pub sms_rate: u32,

    pub schedule: Schedule,
}

fn default_message_variants() -> usize {
    1
}

fn default_sms_rate() -> u32 {
    10
}
