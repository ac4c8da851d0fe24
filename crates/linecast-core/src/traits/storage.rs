// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence adapter traits.

use async_trait::async_trait;

use crate::error::LinecastError;
use crate::phone::PhoneNumber;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CampaignId, CampaignSettings, DncEntry};

/// Durable backing store for the do-not-contact registry.
#[async_trait]
pub trait DncStore: PluginAdapter {
    /// Insert an entry unless its number is already present.
    ///
    /// Returns `true` when a row was written.
    async fn insert_entry(&self, entry: &DncEntry) -> Result<bool, LinecastError>;

    /// Delete the entry for `number`. Returns `true` when a row was removed.
    async fn delete_entry(&self, number: &PhoneNumber) -> Result<bool, LinecastError>;

    /// All entries, oldest first.
    async fn list_entries(&self) -> Result<Vec<DncEntry>, LinecastError>;
}

/// Durable snapshots of campaign settings.
#[async_trait]
pub trait SettingsRepository: PluginAdapter {
    /// Insert or replace the settings of one campaign.
    async fn save_settings(
        &self,
        campaign_id: &CampaignId,
        settings: &CampaignSettings,
    ) -> Result<(), LinecastError>;

    /// Every stored campaign's settings.
    async fn load_settings(&self) -> Result<Vec<(CampaignId, CampaignSettings)>, LinecastError>;

    /// Remove a campaign's settings. Returns `true` when a row was removed.
    async fn delete_settings(&self, campaign_id: &CampaignId) -> Result<bool, LinecastError>;
}
