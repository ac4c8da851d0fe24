// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Line leasing and rotation.
//!
//! [`SchedulerService`] owns the line pool together with every campaign's
//! rotation state, so leasing creates rotation state and releasing removes it
//! under the same lock. Rotation is poll based: callers ask for the next pick
//! and get `None` while the campaign is rate limited or holds no lines.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::TimeDelta;
use tracing::{debug, info};

use linecast_config::model::RotationConfig;
use linecast_core::{
    CampaignId, Clock, LineId, LinecastError, Notification, NotificationSink, PhoneLine,
};

use crate::metrics;
use crate::pool::LinePool;
use crate::rotation::{RotationPick, RotationState, send_window_open};

#[derive(Debug, Default)]
struct SchedulerState {
    pool: LinePool,
    rotations: HashMap<CampaignId, RotationState>,
}

/// Phone line pool plus per-campaign rotation engine.
pub struct SchedulerService {
    state: Mutex<SchedulerState>,
    min_send_interval: TimeDelta,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn NotificationSink>,
}

impl SchedulerService {
    pub fn new(
        pool: LinePool,
        config: &RotationConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let min_send_interval = i64::try_from(config.min_send_interval_ms)
            .ok()
            .and_then(TimeDelta::try_milliseconds)
            .unwrap_or(TimeDelta::MAX);
        Self {
            state: Mutex::new(SchedulerState {
                pool,
                rotations: HashMap::new(),
            }),
            min_send_interval,
            clock,
            sink,
        }
    }

    pub fn min_send_interval(&self) -> TimeDelta {
        self.min_send_interval
    }

    // --- Pool queries ---

    /// Every line, leased or not.
    pub fn lines(&self) -> Vec<PhoneLine> {
        self.lock().pool.lines().to_vec()
    }

    pub fn available_lines(&self) -> Vec<PhoneLine> {
        self.lock().pool.available().cloned().collect()
    }

    pub fn in_use_lines(&self) -> Vec<PhoneLine> {
        self.lock().pool.in_use().cloned().collect()
    }

    /// `false` for unknown ids.
    pub fn is_line_available(&self, line_id: &LineId) -> bool {
        self.lock()
            .pool
            .get(line_id)
            .is_some_and(PhoneLine::is_available)
    }

    pub fn lines_for_campaign(&self, campaign_id: &CampaignId) -> Vec<PhoneLine> {
        self.lock().pool.leased_to(campaign_id).cloned().collect()
    }

    // --- Leasing ---

    /// Lease `line_ids` to the campaign and restart its rotation from the
    /// first leased line.
    ///
    /// Fails without changing anything if a line is unknown or held by a
    /// different campaign. Lines the campaign already holds may be listed
    /// again.
    pub fn assign_lines_to_campaign(
        &self,
        campaign_id: &CampaignId,
        line_ids: &[LineId],
    ) -> Result<(), LinecastError> {
        let mut state = self.lock();
        state.pool.lease(campaign_id, line_ids)?;
        state
            .rotations
            .insert(campaign_id.clone(), RotationState::new(campaign_id.clone()));
        let leased = state.pool.leased_to(campaign_id).count();
        drop(state);

        info!(campaign_id = %campaign_id, leased, "lines assigned");
        Ok(())
    }

    /// Free the campaign's lines and drop its rotation state. Idempotent.
    pub fn release_lines(&self, campaign_id: &CampaignId) {
        let mut state = self.lock();
        let freed = state.pool.release(campaign_id);
        let had_rotation = state.rotations.remove(campaign_id).is_some();
        drop(state);

        if freed > 0 || had_rotation {
            info!(campaign_id = %campaign_id, freed, "lines released");
        }
    }

    // --- Rotation ---

    /// Pick the next line and message variant if the campaign may send now.
    ///
    /// Returns `None`, leaving state untouched, when the campaign has no
    /// rotation state, holds no lines, has no message variants, or sent less
    /// than the minimum interval ago.
    pub fn next_line_and_message(
        &self,
        campaign_id: &CampaignId,
        total_messages: usize,
    ) -> Option<RotationPick> {
        if total_messages == 0 {
            return None;
        }
        let now = self.clock.now();

        let mut guard = self.lock();
        let state = &mut *guard;
        let rotation = state.rotations.get_mut(campaign_id)?;
        let leased: Vec<&PhoneLine> = state.pool.leased_to(campaign_id).collect();
        if leased.is_empty() {
            return None;
        }
        if !send_window_open(rotation.last_send_time, now, self.min_send_interval) {
            debug!(campaign_id = %campaign_id, "rotation rate limited");
            return None;
        }

        rotation.advance(leased.len(), total_messages, now);
        let pick = RotationPick {
            line: leased[rotation.current_line_index].clone(),
            message_index: rotation.current_message_index,
        };
        drop(guard);

        metrics::record_rotation();
        debug!(
            campaign_id = %campaign_id,
            line_id = %pick.line.id,
            message_index = pick.message_index,
            "lines rotated"
        );
        self.sink.notify(Notification::info(
            "Lines rotated",
            format!(
                "Campaign {campaign_id} now sending from {} with message variant {}",
                pick.line.name,
                pick.message_index + 1
            ),
        ));
        Some(pick)
    }

    /// Snapshot of a campaign's rotation state.
    pub fn rotation_state(&self, campaign_id: &CampaignId) -> Option<RotationState> {
        self.lock().rotations.get(campaign_id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
