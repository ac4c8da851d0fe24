// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign audience processing.
//!
//! The processor walks an audience in batches and sorts every phone number
//! it finds into exactly one bucket:
//!
//! - `dnc` when the number is suppressed,
//! - the first selected status the contact matches,
//! - `campaign` otherwise (the eligible list),
//! - `invalid` for non-empty phone fields that are not ten digits.
//!
//! Only string phone fields are examined. Selected statuses match the
//! contact's `status` exactly and may not reuse a built-in bucket name.
//!
//! Between batches the task yields. At each yield point it stops with status
//! `cancelled` if the campaign was paused or processing was cancelled.
//! Restarting processing for a campaign replaces its state; a superseded run
//! notices and stops without touching the new state.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::Display;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use linecast_config::model::AudienceConfig;
use linecast_core::{
    CampaignId, CampaignStatus, LinecastError, Notification, NotificationKind, NotificationSink,
    PhoneNumber, Priority, ValidationError,
};

use crate::dnc::DncRegistry;
use crate::metrics;
use crate::settings::CampaignSettingsStore;

/// Bucket holding eligible numbers.
pub const CAMPAIGN_BUCKET: &str = "campaign";
/// Bucket holding suppressed numbers.
pub const DNC_BUCKET: &str = "dnc";
/// Bucket holding phone fields that did not contain exactly ten digits.
pub const INVALID_BUCKET: &str = "invalid";

const RESERVED_BUCKETS: [&str; 3] = [CAMPAIGN_BUCKET, DNC_BUCKET, INVALID_BUCKET];

/// Lifecycle of one processing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProcessingStatus {
    Processing,
    Completed,
    Failed,
    Cancelled,
}

/// One classified phone field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketEntry {
    /// The contact's `id`, when it has one.
    pub contact_id: Option<String>,
    /// Field the number came from, e.g. `phone2`.
    pub field: String,
    /// Canonical number, or the raw value in the `invalid` bucket.
    pub number: String,
}

/// Progress and results of a campaign's audience processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudienceProcessingState {
    pub id: CampaignId,
    pub status: ProcessingStatus,
    /// Percentage of contacts examined, 0 to 100.
    pub progress: u8,
    pub lists: BTreeMap<String, Vec<BucketEntry>>,
    pub counts: BTreeMap<String, usize>,
    /// Set when the run failed.
    pub error: Option<String>,
}

impl AudienceProcessingState {
    fn new(id: CampaignId, statuses: &[String]) -> Self {
        let mut lists = BTreeMap::new();
        for bucket in [CAMPAIGN_BUCKET, DNC_BUCKET, INVALID_BUCKET]
            .into_iter()
            .chain(statuses.iter().map(String::as_str))
        {
            lists.insert(bucket.to_string(), Vec::new());
        }
        let counts = lists.keys().map(|k| (k.clone(), 0)).collect();
        Self {
            id,
            status: ProcessingStatus::Processing,
            progress: 0,
            lists,
            counts,
            error: None,
        }
    }

    /// Numbers left to contact.
    pub fn eligible_count(&self) -> usize {
        self.count(CAMPAIGN_BUCKET)
    }

    pub fn count(&self, bucket: &str) -> usize {
        self.counts.get(bucket).copied().unwrap_or(0)
    }

    fn push(&mut self, bucket: &str, entry: BucketEntry) {
        self.lists.entry(bucket.to_string()).or_default().push(entry);
        *self.counts.entry(bucket.to_string()).or_default() += 1;
    }
}

/// Where one phone field of a contact ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Placement {
    Bucket(String, BucketEntry),
    /// Same number already classified in this run.
    Duplicate,
}

struct Run {
    generation: u64,
    token: CancellationToken,
    state: AudienceProcessingState,
}

/// Batch pipeline classifying campaign audiences.
pub struct AudienceProcessor {
    runs: Mutex<HashMap<CampaignId, Run>>,
    next_generation: Mutex<u64>,
    dnc: Arc<DncRegistry>,
    settings: Arc<CampaignSettingsStore>,
    sink: Arc<dyn NotificationSink>,
    batch_size: usize,
    batch_pause: Duration,
    phone_fields: usize,
}

impl AudienceProcessor {
    pub fn new(
        config: &AudienceConfig,
        dnc: Arc<DncRegistry>,
        settings: Arc<CampaignSettingsStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            runs: Mutex::new(HashMap::new()),
            next_generation: Mutex::new(0),
            dnc,
            settings,
            sink,
            batch_size: config.batch_size.max(1),
            batch_pause: Duration::from_millis(config.batch_pause_ms),
            phone_fields: config.phone_fields,
        }
    }

    /// Start processing in the background.
    ///
    /// The initial `processing` state is visible through
    /// [`processing_state`](Self::processing_state) as soon as this returns.
    pub fn start_processing(
        self: &Arc<Self>,
        campaign_id: CampaignId,
        audience: Vec<Value>,
        selected_statuses: Vec<String>,
    ) -> JoinHandle<()> {
        let (generation, token) = self.begin(&campaign_id, &selected_statuses);
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.run(campaign_id, audience, selected_statuses, generation, token)
                .await;
        })
    }

    /// Process an audience to completion and return the final state.
    ///
    /// Errors are recorded in the state (status `failed`), never returned.
    pub async fn process(
        &self,
        campaign_id: CampaignId,
        audience: Vec<Value>,
        selected_statuses: Vec<String>,
    ) -> AudienceProcessingState {
        let (generation, token) = self.begin(&campaign_id, &selected_statuses);
        self.run(campaign_id, audience, selected_statuses, generation, token)
            .await
    }

    pub fn processing_state(&self, campaign_id: &CampaignId) -> Option<AudienceProcessingState> {
        self.lock()
            .get(campaign_id)
            .map(|run| run.state.clone())
    }

    /// Drop the campaign's state, cancelling a run still in progress.
    pub fn clear_processing_state(&self, campaign_id: &CampaignId) -> bool {
        match self.lock().remove(campaign_id) {
            Some(run) => {
                run.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Ask a running task to stop at its next yield point.
    pub fn cancel_processing(&self, campaign_id: &CampaignId) -> bool {
        match self.lock().get(campaign_id) {
            Some(run) if run.state.status == ProcessingStatus::Processing => {
                run.token.cancel();
                true
            }
            _ => false,
        }
    }

    fn begin(
        &self,
        campaign_id: &CampaignId,
        selected_statuses: &[String],
    ) -> (u64, CancellationToken) {
        let generation = {
            let mut next = self
                .next_generation
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *next += 1;
            *next
        };
        let token = CancellationToken::new();
        let run = Run {
            generation,
            token: token.clone(),
            state: AudienceProcessingState::new(campaign_id.clone(), selected_statuses),
        };
        if let Some(previous) = self.lock().insert(campaign_id.clone(), run) {
            previous.token.cancel();
        }
        info!(campaign_id = %campaign_id, generation, "audience processing started");
        (generation, token)
    }

    async fn run(
        &self,
        campaign_id: CampaignId,
        audience: Vec<Value>,
        selected_statuses: Vec<String>,
        generation: u64,
        token: CancellationToken,
    ) -> AudienceProcessingState {
        let outcome = self
            .classify_all(&campaign_id, &audience, &selected_statuses, generation, &token)
            .await;

        let finished = self.update(&campaign_id, generation, |state| match &outcome {
            Ok(Finish::Completed) => {
                state.status = ProcessingStatus::Completed;
                state.progress = 100;
            }
            Ok(Finish::Cancelled) => state.status = ProcessingStatus::Cancelled,
            Err(e) => {
                state.status = ProcessingStatus::Failed;
                state.error = Some(e.to_string());
            }
        });

        let Some(state) = finished else {
            debug!(campaign_id = %campaign_id, generation, "superseded run stopped");
            return self.superseded_state(&campaign_id, &selected_statuses);
        };

        match &outcome {
            Ok(Finish::Completed) => {
                for (bucket, count) in &state.counts {
                    metrics::record_bucket(bucket, *count);
                }
                info!(
                    campaign_id = %campaign_id,
                    eligible = state.eligible_count(),
                    dnc = state.count(DNC_BUCKET),
                    invalid = state.count(INVALID_BUCKET),
                    "audience processing completed"
                );
                self.sink.notify(Notification::success(
                    "Audience ready",
                    format!(
                        "{} contacts are eligible for campaign {campaign_id}",
                        state.eligible_count()
                    ),
                ));
            }
            Ok(Finish::Cancelled) => {
                info!(campaign_id = %campaign_id, progress = state.progress, "audience processing cancelled");
                self.sink.notify(Notification::new(
                    NotificationKind::Warning,
                    "Audience processing stopped",
                    format!("Processing for campaign {campaign_id} was cancelled"),
                    Priority::Normal,
                ));
            }
            Err(e) => {
                warn!(campaign_id = %campaign_id, error = %e, "audience processing failed");
                self.sink.notify(Notification::error(
                    "Audience processing failed",
                    e.to_string(),
                ));
            }
        }
        state
    }

    async fn classify_all(
        &self,
        campaign_id: &CampaignId,
        audience: &[Value],
        selected_statuses: &[String],
        generation: u64,
        token: &CancellationToken,
    ) -> Result<Finish, LinecastError> {
        if let Some(reserved) = selected_statuses
            .iter()
            .find(|s| RESERVED_BUCKETS.contains(&s.as_str()))
        {
            return Err(LinecastError::validation(ValidationError::ReservedStatus(
                reserved.clone(),
            )));
        }

        let total = audience.len();
        let mut seen = HashSet::new();

        for (batch_index, batch) in audience.chunks(self.batch_size).enumerate() {
            if batch_index > 0 {
                tokio::time::sleep(self.batch_pause).await;
                if self.should_stop(campaign_id, token) {
                    return Ok(Finish::Cancelled);
                }
            }

            let offset = batch_index * self.batch_size;
            let mut placements = Vec::new();
            let mut failure = None;
            for (i, record) in batch.iter().enumerate() {
                let Some(contact) = record.as_object() else {
                    failure = Some(LinecastError::InvalidRecord {
                        index: offset + i,
                        reason: "not an object".to_string(),
                    });
                    break;
                };
                placements.push(classify_contact(
                    contact,
                    self.phone_fields,
                    selected_statuses,
                    &self.dnc,
                    &mut seen,
                ));
            }

            let current = self.update(campaign_id, generation, |state| {
                for (i, contact) in placements.into_iter().enumerate() {
                    for placement in contact {
                        if let Placement::Bucket(bucket, entry) = placement {
                            state.push(&bucket, entry);
                        }
                    }
                    state.progress = progress(offset + i + 1, total);
                }
            });
            if current.is_none() {
                return Ok(Finish::Cancelled);
            }
            if let Some(e) = failure {
                return Err(e);
            }
        }
        Ok(Finish::Completed)
    }

    fn should_stop(&self, campaign_id: &CampaignId, token: &CancellationToken) -> bool {
        token.is_cancelled()
            || self.settings.status(campaign_id) == Some(CampaignStatus::Paused)
    }

    /// Mutate the state if `generation` is still the campaign's current run.
    fn update(
        &self,
        campaign_id: &CampaignId,
        generation: u64,
        f: impl FnOnce(&mut AudienceProcessingState),
    ) -> Option<AudienceProcessingState> {
        let mut runs = self.lock();
        let run = runs.get_mut(campaign_id)?;
        if run.generation != generation {
            return None;
        }
        f(&mut run.state);
        Some(run.state.clone())
    }

    fn superseded_state(
        &self,
        campaign_id: &CampaignId,
        selected_statuses: &[String],
    ) -> AudienceProcessingState {
        let mut state = AudienceProcessingState::new(campaign_id.clone(), selected_statuses);
        state.status = ProcessingStatus::Cancelled;
        state
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CampaignId, Run>> {
        self.runs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

enum Finish {
    Completed,
    Cancelled,
}

/// `round(done / total * 100)`, 100 for an empty audience.
fn progress(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done as f64 / total as f64) * 100.0).round().min(100.0) as u8
}

/// Classify every phone field of one contact.
pub(crate) fn classify_contact(
    contact: &Map<String, Value>,
    phone_fields: usize,
    selected_statuses: &[String],
    dnc: &DncRegistry,
    seen: &mut HashSet<PhoneNumber>,
) -> Vec<Placement> {
    let contact_id = contact.get("id").and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });
    let status = contact.get("status").and_then(Value::as_str);
    let matched_status = status.and_then(|status| {
        selected_statuses
            .iter()
            .find(|selected| selected.as_str() == status)
    });

    let mut placements = Vec::new();
    for n in 1..=phone_fields {
        let field = format!("phone{n}");
        let raw = match contact.get(&field) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            _ => continue,
        };
        let entry = |number: String| BucketEntry {
            contact_id: contact_id.clone(),
            field: field.clone(),
            number,
        };

        let Some(number) = PhoneNumber::parse_exact(&raw) else {
            placements.push(Placement::Bucket(INVALID_BUCKET.to_string(), entry(raw)));
            continue;
        };
        if !seen.insert(number.clone()) {
            placements.push(Placement::Duplicate);
            continue;
        }

        let bucket = if dnc.contains(&number) {
            DNC_BUCKET.to_string()
        } else if let Some(status) = matched_status {
            status.clone()
        } else {
            CAMPAIGN_BUCKET.to_string()
        };
        placements.push(Placement::Bucket(
            bucket,
            entry(number.as_str().to_string()),
        ));
    }
    placements
}
