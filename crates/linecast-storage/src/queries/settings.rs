// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign settings snapshot operations.

use linecast_core::{CampaignId, CampaignSettings, LinecastError};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::queries::conversion_error;

/// Insert or replace one campaign's settings.
pub async fn save_settings(
    db: &Database,
    campaign_id: &CampaignId,
    settings: &CampaignSettings,
) -> Result<(), LinecastError> {
    let campaign_id = campaign_id.as_str().to_string();
    let json = serde_json::to_string(settings).map_err(|e| LinecastError::Storage {
        source: Box::new(e),
    })?;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO campaign_settings (campaign_id, settings) VALUES (?1, ?2)
                 ON CONFLICT(campaign_id) DO UPDATE SET
                   settings = excluded.settings,
                   updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![campaign_id, json],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Every stored snapshot, ordered by campaign id.
pub async fn load_settings(
    db: &Database,
) -> Result<Vec<(CampaignId, CampaignSettings)>, LinecastError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT campaign_id, settings FROM campaign_settings ORDER BY campaign_id",
            )?;
            let rows = stmt.query_map([], |row| {
                let id: String = row.get(0)?;
                let json: String = row.get(1)?;
                let settings: CampaignSettings =
                    serde_json::from_str(&json).map_err(|e| conversion_error(1, e))?;
                Ok((CampaignId(id), settings))
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Remove one campaign's snapshot.
pub async fn delete_settings(
    db: &Database,
    campaign_id: &CampaignId,
) -> Result<bool, LinecastError> {
    let campaign_id = campaign_id.as_str().to_string();
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM campaign_settings WHERE campaign_id = ?1",
                params![campaign_id],
            )?;
            Ok(deleted > 0)
        })
        .await
        .map_err(map_tr_err)
}
