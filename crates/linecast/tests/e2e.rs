// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete campaign pipeline.
//!
//! Each test builds its own services over a temp SQLite database. Tests are
//! independent and order-insensitive.

use std::sync::Arc;

use linecast_campaign::{CampaignServices, ProcessingStatus};
use linecast_config::model::LinecastConfig;
use linecast_core::{
    CampaignId, CampaignSettings, CampaignStatus, Clock, DncStore, LineId, NotificationSink,
    NullSink, PluginAdapter, SettingsRepository,
};
use linecast_storage::SqliteStorage;
use linecast_test_utils::{ManualClock, TestHarness, contact, harness::default_start, schedule};

fn config_in(dir: &tempfile::TempDir) -> LinecastConfig {
    let mut config = LinecastConfig::default();
    config.storage.database_path = dir.path().join("linecast.db").display().to_string();
    config
}

async fn open(config: &LinecastConfig) -> (Arc<SqliteStorage>, CampaignServices) {
    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await.unwrap();
    let services = CampaignServices::build(
        config,
        Arc::clone(&storage) as Arc<dyn DncStore>,
        Arc::new(ManualClock::new(default_start())) as Arc<dyn Clock>,
        Arc::new(NullSink) as Arc<dyn NotificationSink>,
    )
    .await
    .unwrap();
    (storage, services)
}

// ---- Test 1: Audience to rotation ----

#[tokio::test]
async fn campaign_pipeline_from_audience_to_rotation() {
    let h = TestHarness::builder()
        .with_sqlite()
        .with_dnc(&["5551234567"])
        .build()
        .await
        .unwrap();
    let id = h.create_active_campaign("fall").unwrap();
    h.assign(&id, &["1", "2", "3"]).unwrap();
    assert_eq!(h.services.scheduler.available_lines().len(), 2);

    let handle = h.services.audience.start_processing(
        id.clone(),
        vec![
            contact("a", "hot", &["555-123-4567"]),
            contact("b", "hot", &["(555) 987-6543"]),
            contact("c", "cold", &["5550001111"]),
        ],
        vec!["hot".to_string()],
    );
    handle.await.unwrap();

    let state = h.services.audience.processing_state(&id).unwrap();
    assert_eq!(state.status, ProcessingStatus::Completed);
    assert_eq!(state.progress, 100);
    assert_eq!(state.count("dnc"), 1);
    assert_eq!(state.count("hot"), 1);
    assert_eq!(state.count("campaign"), 1);

    h.services.driver.track(id.clone(), 2);
    let mut picked = Vec::new();
    for _ in 0..4 {
        let slots = h.services.driver.tick();
        assert_eq!(slots.len(), 1);
        picked.push(slots[0].line.id.as_str().to_string());
        assert!(h.services.driver.tick().is_empty(), "rate limit must hold");
        h.clock.advance_ms(60_000);
    }
    assert_eq!(picked, vec!["2", "3", "1", "2"]);

    h.services.settings.pause_campaign(&id).unwrap();
    assert!(h.services.driver.tick().is_empty());

    h.services.scheduler.release_lines(&id);
    assert_eq!(h.services.scheduler.available_lines().len(), 5);
    assert!(h.services.scheduler.rotation_state(&id).is_none());
}

// ---- Test 2: DNC durability ----

#[tokio::test]
async fn dnc_entries_survive_restart() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config_in(&dir);

    {
        let (storage, services) = open(&config).await;
        assert!(services.dnc.add("555.123.4567", Some("STOP reply".into())).await.unwrap());
        assert!(services.dnc.add("3125550100", None).await.unwrap());
        assert!(services.dnc.remove("(312) 555-0100").await.unwrap());
        storage.shutdown().await.unwrap();
    }

    let (storage, services) = open(&config).await;
    assert!(services.dnc.is_blocked("+1 (555) 123-4567"));
    assert!(!services.dnc.is_blocked("3125550100"));
    let entries = services.dnc.list();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].reason.as_deref(), Some("STOP reply"));
    assert_eq!(storage.dnc_count().await.unwrap(), 1);
}

// ---- Test 3: Settings snapshot ----

#[tokio::test]
async fn settings_snapshot_restores_paused_campaign() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config_in(&dir);
    let id = CampaignId::from("spring");
    let start_date = default_start().date_naive();

    {
        let (storage, services) = open(&config).await;
        services
            .settings
            .create_campaign(
                &id,
                CampaignSettings {
                    schedule: schedule(start_date),
                    sms_rate: 20,
                    status: CampaignStatus::Active,
                },
            )
            .unwrap();
        services.settings.pause_campaign(&id).unwrap();
        for (campaign_id, settings) in services.settings.snapshot() {
            storage.save_settings(&campaign_id, &settings).await.unwrap();
        }
        storage.shutdown().await.unwrap();
    }

    let (storage, services) = open(&config).await;
    let restored = services.settings.restore(storage.load_settings().await.unwrap());
    assert_eq!(restored, 1);
    let settings = services.settings.settings(&id).unwrap();
    assert_eq!(settings.status, CampaignStatus::Paused);
    assert_eq!(settings.sms_rate, 20);
    assert_eq!(settings.schedule.timezone, "America/New_York");

    // The restored campaign resumes into the send window it was built for.
    assert_eq!(
        services.settings.resume_campaign(&id).unwrap(),
        CampaignStatus::Active
    );
    services
        .scheduler
        .assign_lines_to_campaign(&id, &[LineId::from("1")])
        .unwrap();
    services.driver.track(id.clone(), 1);
    assert_eq!(services.driver.tick().len(), 1);
}
