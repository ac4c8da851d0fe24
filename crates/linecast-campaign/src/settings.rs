// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign schedule and rate settings.
//!
//! Updates are validated as a whole against the merged result and either
//! applied completely or rejected completely. Every accepted mutation emits a
//! normal-priority notification, every rejection a high-priority one.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use linecast_config::model::SettingsConfig;
use linecast_core::{
    CampaignId, CampaignSettings, CampaignStatus, Clock, LinecastError, Notification,
    NotificationSink, Schedule, ValidationError,
};

use crate::metrics;

/// Partial schedule change. Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleUpdate {
    pub days_of_week: Option<Vec<Weekday>>,
    pub timezone: Option<String>,
    #[serde(with = "optional_clock_time")]
    pub start_time: Option<NaiveTime>,
    #[serde(with = "optional_clock_time")]
    pub end_time: Option<NaiveTime>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Partial settings change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsUpdate {
    pub schedule: Option<ScheduleUpdate>,
    pub sms_rate: Option<u32>,
    pub status: Option<CampaignStatus>,
}

mod optional_clock_time {
    use chrono::NaiveTime;
    use linecast_core::types::clock_time;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        time: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match time {
            Some(t) => serializer.serialize_some(&t.format("%H:%M").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| clock_time::parse(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Validated settings for every known campaign.
pub struct CampaignSettingsStore {
    campaigns: RwLock<HashMap<CampaignId, CampaignSettings>>,
    max_sms_rate: u32,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn NotificationSink>,
}

impl CampaignSettingsStore {
    pub fn new(
        config: &SettingsConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            campaigns: RwLock::new(HashMap::new()),
            max_sms_rate: config.max_sms_rate,
            clock,
            sink,
        }
    }

    /// Register a new campaign with fully specified settings.
    ///
    /// The start date may already have passed so a running campaign can be
    /// registered mid-flight.
    pub fn create_campaign(
        &self,
        campaign_id: &CampaignId,
        settings: CampaignSettings,
    ) -> Result<(), LinecastError> {
        if let Err(errors) = validate_settings(&settings, self.max_sms_rate) {
            return Err(self.reject(campaign_id, LinecastError::Validation { errors }));
        }

        {
            let mut campaigns = self.write();
            if campaigns.contains_key(campaign_id) {
                drop(campaigns);
                return Err(self.reject(
                    campaign_id,
                    LinecastError::CampaignExists {
                        campaign_id: campaign_id.to_string(),
                    },
                ));
            }
            campaigns.insert(campaign_id.clone(), settings);
        }

        info!(campaign_id = %campaign_id, "campaign created");
        self.sink.notify(Notification::success(
            "Campaign created",
            format!("Campaign {campaign_id} is ready"),
        ));
        Ok(())
    }

    /// Apply a partial update, returning the merged settings.
    pub fn update_settings(
        &self,
        campaign_id: &CampaignId,
        update: SettingsUpdate,
    ) -> Result<CampaignSettings, LinecastError> {
        let now = self.clock.now();
        let merged = {
            let mut campaigns = self.write();
            let Some(current) = campaigns.get_mut(campaign_id) else {
                drop(campaigns);
                return Err(self.reject(campaign_id, not_found(campaign_id)));
            };
            match merge_update(current, &update, self.max_sms_rate, now) {
                Ok(merged) => {
                    *current = merged.clone();
                    merged
                }
                Err(errors) => {
                    drop(campaigns);
                    return Err(self.reject(campaign_id, LinecastError::Validation { errors }));
                }
            }
        };

        info!(campaign_id = %campaign_id, status = %merged.status, "settings updated");
        self.sink.notify(Notification::success(
            "Settings updated",
            format!("Campaign {campaign_id} settings saved"),
        ));
        Ok(merged)
    }

    /// Set the campaign's status to `paused`.
    pub fn pause_campaign(&self, campaign_id: &CampaignId) -> Result<(), LinecastError> {
        let updated = self
            .write()
            .get_mut(campaign_id)
            .map(|settings| settings.status = CampaignStatus::Paused)
            .is_some();
        if !updated {
            return Err(self.reject(campaign_id, not_found(campaign_id)));
        }

        info!(campaign_id = %campaign_id, "campaign paused");
        self.sink.notify(Notification::success(
            "Campaign paused",
            format!("Campaign {campaign_id} is paused"),
        ));
        Ok(())
    }

    /// Resume a campaign: `scheduled` if its start date is still ahead,
    /// otherwise `active`.
    pub fn resume_campaign(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<CampaignStatus, LinecastError> {
        let now = self.clock.now();
        let status = self.write().get_mut(campaign_id).map(|settings| {
            settings.status = initial_status(&settings.schedule, now);
            settings.status
        });
        let Some(status) = status else {
            return Err(self.reject(campaign_id, not_found(campaign_id)));
        };

        info!(campaign_id = %campaign_id, status = %status, "campaign resumed");
        self.sink.notify(Notification::success(
            "Campaign resumed",
            format!("Campaign {campaign_id} is {status}"),
        ));
        Ok(status)
    }

    pub fn settings(&self, campaign_id: &CampaignId) -> Option<CampaignSettings> {
        self.read().get(campaign_id).cloned()
    }

    pub fn status(&self, campaign_id: &CampaignId) -> Option<CampaignStatus> {
        self.read().get(campaign_id).map(|s| s.status)
    }

    /// Forget a campaign. Returns whether it existed.
    pub fn remove_campaign(&self, campaign_id: &CampaignId) -> bool {
        self.write().remove(campaign_id).is_some()
    }

    /// Whether `now` falls on a selected day, inside the daily hours and
    /// inside the date range, all evaluated in the campaign's timezone.
    pub fn is_within_send_window(&self, campaign_id: &CampaignId, now: DateTime<Utc>) -> bool {
        self.read()
            .get(campaign_id)
            .is_some_and(|settings| schedule_allows(&settings.schedule, now))
    }

    /// Every campaign's settings, ordered by id.
    pub fn snapshot(&self) -> Vec<(CampaignId, CampaignSettings)> {
        let mut entries: Vec<_> = self
            .read()
            .iter()
            .map(|(id, settings)| (id.clone(), settings.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Load previously saved settings without re-validating them.
    pub fn restore(
        &self,
        entries: impl IntoIterator<Item = (CampaignId, CampaignSettings)>,
    ) -> usize {
        let mut campaigns = self.write();
        let mut restored = 0;
        for (id, settings) in entries {
            campaigns.insert(id, settings);
            restored += 1;
        }
        restored
    }

    fn reject(&self, campaign_id: &CampaignId, err: LinecastError) -> LinecastError {
        metrics::record_settings_rejection();
        warn!(campaign_id = %campaign_id, error = %err, "settings rejected");
        self.sink.notify(Notification::error(
            "Settings rejected",
            format!("Campaign {campaign_id}: {err}"),
        ));
        err
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<CampaignId, CampaignSettings>> {
        self.campaigns
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<CampaignId, CampaignSettings>> {
        self.campaigns
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// `scheduled` while the start date (in the schedule's timezone) is ahead,
/// otherwise `active`.
pub fn initial_status(schedule: &Schedule, now: DateTime<Utc>) -> CampaignStatus {
    if schedule.start_date > today_in(schedule, now) {
        CampaignStatus::Scheduled
    } else {
        CampaignStatus::Active
    }
}

fn not_found(campaign_id: &CampaignId) -> LinecastError {
    LinecastError::CampaignNotFound {
        campaign_id: campaign_id.to_string(),
    }
}

fn timezone_of(schedule: &Schedule) -> Option<Tz> {
    schedule.timezone.parse::<Tz>().ok()
}

/// The current date in the schedule's timezone, UTC when the zone is unknown.
fn today_in(schedule: &Schedule, now: DateTime<Utc>) -> NaiveDate {
    match timezone_of(schedule) {
        Some(tz) => now.with_timezone(&tz).date_naive(),
        None => now.date_naive(),
    }
}

fn schedule_allows(schedule: &Schedule, now: DateTime<Utc>) -> bool {
    let Some(tz) = timezone_of(schedule) else {
        return false;
    };
    let local = now.with_timezone(&tz);
    let date = local.date_naive();
    let time = local.time();

    schedule.days_of_week.contains(&local.weekday())
        && date >= schedule.start_date
        && schedule.end_date.is_none_or(|end| date <= end)
        && time >= schedule.start_time
        && time < schedule.end_time
}

/// Checks applied to a complete set of settings.
pub fn validate_settings(
    settings: &CampaignSettings,
    max_sms_rate: u32,
) -> Result<(), Vec<ValidationError>> {
    let schedule = &settings.schedule;
    let mut errors = Vec::new();

    if schedule.days_of_week.is_empty() {
        errors.push(ValidationError::NoDaysSelected);
    }
    check_schedule_shape(schedule, &mut errors);
    if timezone_of(schedule).is_none() {
        errors.push(ValidationError::UnknownTimezone(schedule.timezone.clone()));
    }
    check_rate(settings.sms_rate, max_sms_rate, &mut errors);

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Merge `update` into `current` and validate the result.
///
/// Schedule checks run only when the update carries a schedule. The start
/// date is compared with today in the merged timezone.
pub fn merge_update(
    current: &CampaignSettings,
    update: &SettingsUpdate,
    max_sms_rate: u32,
    now: DateTime<Utc>,
) -> Result<CampaignSettings, Vec<ValidationError>> {
    let mut merged = current.clone();
    let mut errors = Vec::new();

    if let Some(patch) = &update.schedule {
        let schedule = &mut merged.schedule;
        if let Some(days) = &patch.days_of_week {
            schedule.days_of_week = days.clone();
        }
        if let Some(tz) = &patch.timezone {
            schedule.timezone = tz.clone();
        }
        if let Some(start) = patch.start_time {
            schedule.start_time = start;
        }
        if let Some(end) = patch.end_time {
            schedule.end_time = end;
        }
        if let Some(start_date) = patch.start_date {
            schedule.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            schedule.end_date = Some(end_date);
        }

        if patch.days_of_week.as_ref().is_some_and(Vec::is_empty) {
            errors.push(ValidationError::NoDaysSelected);
        }
        check_schedule_shape(schedule, &mut errors);
        if let Some(start_date) = patch.start_date {
            let today = today_in(schedule, now);
            if start_date < today {
                errors.push(ValidationError::StartDateInPast {
                    start_date: start_date.to_string(),
                    today: today.to_string(),
                });
            }
        }
        if patch.timezone.is_some() && timezone_of(schedule).is_none() {
            errors.push(ValidationError::UnknownTimezone(schedule.timezone.clone()));
        }
    }

    if let Some(rate) = update.sms_rate {
        check_rate(rate, max_sms_rate, &mut errors);
        merged.sms_rate = rate;
    }
    if let Some(status) = update.status {
        merged.status = status;
    }

    if errors.is_empty() {
        Ok(merged)
    } else {
        Err(errors)
    }
}

fn check_schedule_shape(schedule: &Schedule, errors: &mut Vec<ValidationError>) {
    if schedule.end_time <= schedule.start_time {
        errors.push(ValidationError::EndTimeNotAfterStart {
            start: schedule.start_time.format("%H:%M").to_string(),
            end: schedule.end_time.format("%H:%M").to_string(),
        });
    }
    if let Some(end_date) = schedule.end_date
        && end_date < schedule.start_date
    {
        errors.push(ValidationError::EndDateBeforeStartDate {
            start_date: schedule.start_date.to_string(),
            end_date: end_date.to_string(),
        });
    }
}

fn check_rate(rate: u32, max: u32, errors: &mut Vec<ValidationError>) {
    if rate == 0 || rate > max {
        errors.push(ValidationError::SmsRateOutOfRange { rate, max });
    }
}
