// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `linecast process` command implementation.
//!
//! Runs the audience processor once against the persisted DNC list and
//! prints the result as JSON.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use linecast_campaign::{AudienceProcessingState, CampaignServices, ProcessingStatus};
use linecast_config::model::LinecastConfig;
use linecast_core::{
    CampaignId, Clock, DncStore, LinecastError, NotificationSink, NullSink, PluginAdapter,
    SystemClock,
};
use linecast_storage::SqliteStorage;
use serde::Serialize;
use serde_json::Value;

/// Counts-only view of a processing run.
#[derive(Debug, Serialize)]
struct ProcessSummary<'a> {
    campaign_id: &'a CampaignId,
    status: ProcessingStatus,
    progress: u8,
    eligible: usize,
    counts: &'a BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl<'a> From<&'a AudienceProcessingState> for ProcessSummary<'a> {
    fn from(state: &'a AudienceProcessingState) -> Self {
        Self {
            campaign_id: &state.id,
            status: state.status,
            progress: state.progress,
            eligible: state.eligible_count(),
            counts: &state.counts,
            error: state.error.as_deref(),
        }
    }
}

pub async fn run_process(
    config: &LinecastConfig,
    audience_path: &Path,
    campaign: &str,
    statuses: Vec<String>,
    full: bool,
) -> Result<(), LinecastError> {
    let content = tokio::fs::read_to_string(audience_path)
        .await
        .map_err(|e| {
            LinecastError::Internal(format!("cannot read {}: {e}", audience_path.display()))
        })?;
    let audience = parse_audience(&content)?;

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    let services = CampaignServices::build(
        config,
        Arc::clone(&storage) as Arc<dyn DncStore>,
        Arc::new(SystemClock) as Arc<dyn Clock>,
        Arc::new(NullSink) as Arc<dyn NotificationSink>,
    )
    .await?;

    let state = services
        .audience
        .process(CampaignId::from(campaign), audience, statuses)
        .await;
    storage.shutdown().await?;

    println!("{}", render(&state, full)?);

    match (state.status, state.error) {
        (ProcessingStatus::Failed, Some(error)) => Err(LinecastError::Internal(error)),
        _ => Ok(()),
    }
}

/// The audience file must hold a JSON array; each element is validated by
/// the processor.
fn parse_audience(content: &str) -> Result<Vec<Value>, LinecastError> {
    match serde_json::from_str::<Value>(content) {
        Ok(Value::Array(records)) => Ok(records),
        Ok(_) => Err(LinecastError::Internal(
            "audience file must contain a JSON array of contacts".into(),
        )),
        Err(e) => Err(LinecastError::Internal(format!(
            "audience file is not valid JSON: {e}"
        ))),
    }
}

fn render(state: &AudienceProcessingState, full: bool) -> Result<String, LinecastError> {
    let encoded = if full {
        serde_json::to_string_pretty(state)
    } else {
        serde_json::to_string_pretty(&ProcessSummary::from(state))
    };
    encoded.map_err(|e| LinecastError::Internal(format!("cannot encode result: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_audience_requires_array() {
        assert_eq!(parse_audience("[{\"phone1\": \"5551234567\"}]").unwrap().len(), 1);
        assert!(parse_audience("{\"phone1\": \"5551234567\"}").is_err());
        assert!(parse_audience("not json").is_err());
    }

    #[test]
    fn summary_omits_lists() {
        let state: AudienceProcessingState = serde_json::from_value(json!({
            "id": "fall",
            "status": "completed",
            "progress": 100,
            "lists": {
                "campaign": [{"contact_id": "1", "field": "phone1", "number": "(555) 123-4567"}],
                "dnc": [],
                "invalid": []
            },
            "counts": {"campaign": 1, "dnc": 0, "invalid": 0},
            "error": null
        }))
        .unwrap();

        let summary: Value = serde_json::from_str(&render(&state, false).unwrap()).unwrap();
        assert_eq!(summary["eligible"], 1);
        assert_eq!(summary["status"], "completed");
        assert_eq!(summary["counts"]["dnc"], 0);
        assert!(summary.get("lists").is_none());
        assert!(summary.get("error").is_none());

        let full: Value = serde_json::from_str(&render(&state, true).unwrap()).unwrap();
        assert_eq!(full["lists"]["campaign"][0]["number"], "(555) 123-4567");
    }
}
