// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `linecast lines` command implementation.

use linecast_campaign::LinePool;
use linecast_config::model::LinecastConfig;
use linecast_core::{CampaignId, LineId, LinecastError, PhoneLine};

/// The configured pool with each line marked by the campaign that leases it
/// at startup.
fn configured_lines(config: &LinecastConfig) -> Result<Vec<PhoneLine>, LinecastError> {
    let mut pool = LinePool::from_config(&config.lines)?;
    for campaign in &config.campaigns {
        let ids: Vec<LineId> = campaign
            .lines
            .iter()
            .map(|line| LineId::from(line.as_str()))
            .collect();
        pool.lease(&CampaignId::from(campaign.id.as_str()), &ids)?;
    }
    Ok(pool.lines().to_vec())
}

pub fn run_lines(config: &LinecastConfig, json: bool) -> Result<(), LinecastError> {
    let lines = configured_lines(config)?;

    if json {
        let out = serde_json::to_string_pretty(&lines)
            .map_err(|e| LinecastError::Internal(format!("cannot encode lines: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    for line in &lines {
        let holder = line
            .in_use_by
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "available".to_string());
        println!("{:<6} {:<18} {}  {holder}", line.id, line.name, line.number);
    }
    Ok(())
}
