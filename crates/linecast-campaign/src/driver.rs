// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic rotation driver.
//!
//! The rotation engine is poll based. [`RotationDriver`] polls every tracked
//! campaign on a fixed tick and turns each successful pick into a
//! [`DispatchSlot`] for whatever delivers messages. Campaigns that are not
//! `active` or are outside their send window are skipped.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use linecast_config::model::RotationConfig;
use linecast_core::{CampaignId, CampaignStatus, Clock, PhoneLine};

use crate::scheduler::SchedulerService;
use crate::settings::CampaignSettingsStore;

/// Permission for one send: which line, which message variant, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchSlot {
    pub campaign_id: CampaignId,
    pub line: PhoneLine,
    pub message_index: usize,
    pub at: DateTime<Utc>,
}

/// Ticks the rotation engine for every tracked campaign.
pub struct RotationDriver {
    scheduler: Arc<SchedulerService>,
    settings: Arc<CampaignSettingsStore>,
    clock: Arc<dyn Clock>,
    /// Campaign to number of message variants.
    campaigns: Mutex<BTreeMap<CampaignId, usize>>,
    tick_interval: Duration,
}

impl RotationDriver {
    pub fn new(
        config: &RotationConfig,
        scheduler: Arc<SchedulerService>,
        settings: Arc<CampaignSettingsStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            scheduler,
            settings,
            clock,
            campaigns: Mutex::new(BTreeMap::new()),
            tick_interval: Duration::from_millis(config.tick_interval_ms.max(1)),
        }
    }

    /// Start polling a campaign that rotates through `message_variants` messages.
    pub fn track(&self, campaign_id: CampaignId, message_variants: usize) {
        debug!(campaign_id = %campaign_id, message_variants, "campaign tracked");
        self.lock().insert(campaign_id, message_variants);
    }

    pub fn untrack(&self, campaign_id: &CampaignId) -> bool {
        self.lock().remove(campaign_id).is_some()
    }

    pub fn tracked(&self) -> Vec<CampaignId> {
        self.lock().keys().cloned().collect()
    }

    /// Poll every tracked campaign once.
    pub fn tick(&self) -> Vec<DispatchSlot> {
        let now = self.clock.now();
        let campaigns: Vec<(CampaignId, usize)> = self
            .lock()
            .iter()
            .map(|(id, variants)| (id.clone(), *variants))
            .collect();

        campaigns
            .into_iter()
            .filter(|(id, _)| self.settings.status(id) == Some(CampaignStatus::Active))
            .filter(|(id, _)| self.settings.is_within_send_window(id, now))
            .filter_map(|(id, variants)| {
                self.scheduler
                    .next_line_and_message(&id, variants)
                    .map(|pick| DispatchSlot {
                        campaign_id: id,
                        line: pick.line,
                        message_index: pick.message_index,
                        at: now,
                    })
            })
            .collect()
    }

    /// Tick until `cancel` fires, sending every slot to `dispatch`.
    ///
    /// Stops early if the receiving side is dropped.
    pub async fn run(
        self: Arc<Self>,
        dispatch: mpsc::Sender<DispatchSlot>,
        cancel: CancellationToken,
    ) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            tick_ms = self.tick_interval.as_millis() as u64,
            campaigns = self.lock().len(),
            "rotation driver started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    for slot in self.tick() {
                        info!(
                            campaign_id = %slot.campaign_id,
                            line_id = %slot.line.id,
                            number = %slot.line.number,
                            message_index = slot.message_index,
                            "dispatch slot ready"
                        );
                        if dispatch.send(slot).await.is_err() {
                            warn!("dispatch receiver dropped, stopping rotation driver");
                            return;
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("rotation driver shutting down");
                    return;
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<CampaignId, usize>> {
        self.campaigns
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
