// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the complete campaign service set over a manual
//! clock, a recording notification sink and either an in-memory or a
//! temp-file SQLite DNC store.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use serde_json::{Map, Value, json};

use linecast_campaign::CampaignServices;
use linecast_config::model::{LineConfig, LinecastConfig, StorageConfig};
use linecast_core::{
    CampaignId, CampaignSettings, CampaignStatus, Clock, DncEntry, DncStore, LineId,
    LinecastError, NotificationSink, PhoneNumber, Schedule,
};
use linecast_storage::SqliteStorage;

use crate::clock::ManualClock;
use crate::memory_store::MemoryDncStore;
use crate::sink::RecordingSink;

/// Monday 2026-10-19, 12:00 in New York.
pub fn default_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 16, 0, 0).unwrap()
}

/// Weekdays 09:00 to 17:00 New York time from `start_date`, no end date.
pub fn schedule(start_date: NaiveDate) -> Schedule {
    Schedule {
        days_of_week: vec![
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ],
        timezone: "America/New_York".to_string(),
        start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        start_date,
        end_date: None,
    }
}

/// An audience record with an `id`, a `status` and `phone1..` fields.
pub fn contact(id: &str, status: &str, phones: &[&str]) -> Value {
    let mut record = Map::new();
    record.insert("id".into(), json!(id));
    record.insert("name".into(), json!(format!("Contact {id}")));
    record.insert("status".into(), json!(status));
    for (i, phone) in phones.iter().enumerate() {
        record.insert(format!("phone{}", i + 1), json!(phone));
    }
    Value::Object(record)
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    line_count: usize,
    min_send_interval_ms: u64,
    batch_size: usize,
    batch_pause_ms: u64,
    max_sms_rate: u32,
    sqlite: bool,
    dnc: Vec<String>,
    start: DateTime<Utc>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let defaults = LinecastConfig::default();
        Self {
            line_count: 5,
            min_send_interval_ms: defaults.rotation.min_send_interval_ms,
            batch_size: defaults.audience.batch_size,
            batch_pause_ms: 0,
            max_sms_rate: defaults.settings.max_sms_rate,
            sqlite: false,
            dnc: Vec::new(),
            start: default_start(),
        }
    }

    /// Number of pool lines, with ids `"1"`, `"2"`, ...
    pub fn with_lines(mut self, count: usize) -> Self {
        self.line_count = count;
        self
    }

    pub fn with_min_send_interval_ms(mut self, ms: u64) -> Self {
        self.min_send_interval_ms = ms;
        self
    }

    pub fn with_batches(mut self, size: usize, pause_ms: u64) -> Self {
        self.batch_size = size;
        self.batch_pause_ms = pause_ms;
        self
    }

    pub fn with_max_sms_rate(mut self, rate: u32) -> Self {
        self.max_sms_rate = rate;
        self
    }

    /// Back the DNC registry with SQLite in a temp directory.
    pub fn with_sqlite(mut self) -> Self {
        self.sqlite = true;
        self
    }

    /// Numbers already on the DNC list when the registry loads.
    pub fn with_dnc(mut self, numbers: &[&str]) -> Self {
        self.dnc = numbers.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn starting_at(mut self, at: DateTime<Utc>) -> Self {
        self.start = at;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, LinecastError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| LinecastError::Storage { source: e.into() })?;

        let mut config = LinecastConfig::default();
        config.storage = StorageConfig {
            database_path: temp_dir.path().join("test.db").display().to_string(),
            wal_mode: true,
        };
        config.rotation.min_send_interval_ms = self.min_send_interval_ms;
        config.audience.batch_size = self.batch_size;
        config.audience.batch_pause_ms = self.batch_pause_ms;
        config.settings.max_sms_rate = self.max_sms_rate;
        config.lines = (1..=self.line_count)
            .map(|i| LineConfig {
                id: i.to_string(),
                name: format!("Line {i}"),
                number: format!("555010{i:04}"),
            })
            .collect();

        let initial: Vec<DncEntry> = self
            .dnc
            .iter()
            .map(|raw| {
                PhoneNumber::normalize(raw)
                    .map(|n| DncEntry::new(n, None, self.start))
                    .ok_or_else(|| LinecastError::InvalidPhoneNumber { input: raw.clone() })
            })
            .collect::<Result<_, _>>()?;

        let (store, memory): (Arc<dyn DncStore>, Option<Arc<MemoryDncStore>>) = if self.sqlite {
            let storage = SqliteStorage::new(config.storage.clone());
            storage.initialize().await?;
            for entry in &initial {
                storage.insert_entry(entry).await?;
            }
            let store: Arc<dyn DncStore> = Arc::new(storage);
            (store, None)
        } else {
            let memory = Arc::new(MemoryDncStore::with_entries(initial));
            let store: Arc<dyn DncStore> = memory.clone();
            (store, Some(memory))
        };

        let clock = Arc::new(ManualClock::new(self.start));
        let sink = Arc::new(RecordingSink::new());
        let services = CampaignServices::build(
            &config,
            Arc::clone(&store),
            Arc::clone(&clock) as Arc<dyn Clock>,
            Arc::clone(&sink) as Arc<dyn NotificationSink>,
        )
        .await?;

        Ok(TestHarness {
            services,
            clock,
            sink,
            store,
            memory,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete campaign service set under test control.
pub struct TestHarness {
    pub services: CampaignServices,
    pub clock: Arc<ManualClock>,
    pub sink: Arc<RecordingSink>,
    pub store: Arc<dyn DncStore>,
    /// Present unless built `with_sqlite()`.
    pub memory: Option<Arc<MemoryDncStore>>,
    pub config: LinecastConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with default options.
    pub async fn new() -> Result<Self, LinecastError> {
        Self::builder().build().await
    }

    /// Today in New York, per the harness clock.
    pub fn today(&self) -> NaiveDate {
        self.clock
            .now()
            .with_timezone(&chrono_tz::America::New_York)
            .date_naive()
    }

    /// Register an `active` campaign that started today.
    pub fn create_active_campaign(&self, id: &str) -> Result<CampaignId, LinecastError> {
        let campaign_id = CampaignId::from(id);
        self.services.settings.create_campaign(
            &campaign_id,
            CampaignSettings {
                schedule: schedule(self.today()),
                sms_rate: 10,
                status: CampaignStatus::Active,
            },
        )?;
        Ok(campaign_id)
    }

    /// Lease `lines` to the campaign.
    pub fn assign(&self, campaign_id: &CampaignId, lines: &[&str]) -> Result<(), LinecastError> {
        let ids: Vec<LineId> = lines.iter().map(|l| LineId::from(*l)).collect();
        self.services
            .scheduler
            .assign_lines_to_campaign(campaign_id, &ids)
    }
}
