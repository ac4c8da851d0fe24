// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Linecast.
//!
//! This crate provides the error type, the canonical phone number type, the
//! data model shared by the campaign services and the storage layer, and the
//! trait seams (clock, notification sink, persistence) the services are
//! constructed with.

pub mod error;
pub mod phone;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{LinecastError, ValidationError};
pub use phone::PhoneNumber;
pub use types::{
    AdapterType, CampaignId, CampaignSettings, CampaignStatus, DncEntry, HealthStatus, LineId,
    Notification, NotificationKind, PhoneLine, Priority, Schedule,
};

pub use traits::{
    Clock, DncStore, NotificationSink, NullSink, PluginAdapter, SettingsRepository, SystemClock,
};
