// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign settings store: validation, transitions and notifications.

use chrono::{NaiveTime, TimeDelta, TimeZone, Utc};
use linecast_campaign::{CampaignSettingsStore, ScheduleUpdate, SettingsUpdate};
use linecast_core::{
    CampaignId, CampaignSettings, CampaignStatus, LinecastError, NotificationKind, Priority,
    SettingsRepository, ValidationError,
};
use linecast_storage::{Database, SqliteStorage};
use linecast_test_utils::{TestHarness, schedule};

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

#[tokio::test]
async fn reversed_hours_are_rejected_as_a_whole() {
    let h = TestHarness::new().await.unwrap();
    let id = h.create_active_campaign("fall").unwrap();
    let before = h.services.settings.settings(&id).unwrap();
    h.sink.clear();

    let err = h
        .services
        .settings
        .update_settings(
            &id,
            SettingsUpdate {
                schedule: Some(ScheduleUpdate {
                    start_time: Some(hm(17, 0)),
                    end_time: Some(hm(9, 0)),
                    ..Default::default()
                }),
                sms_rate: Some(20),
                ..Default::default()
            },
        )
        .unwrap_err();

    match err {
        LinecastError::Validation { errors } => {
            assert!(matches!(errors[0], ValidationError::EndTimeNotAfterStart { .. }));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(h.services.settings.settings(&id).unwrap(), before);

    let last = h.sink.last().unwrap();
    assert_eq!(last.kind, NotificationKind::Error);
    assert_eq!(last.priority, Priority::High);
}

#[tokio::test]
async fn accepted_update_merges_and_notifies() {
    let h = TestHarness::new().await.unwrap();
    let id = h.create_active_campaign("fall").unwrap();
    h.sink.clear();

    let merged = h
        .services
        .settings
        .update_settings(
            &id,
            SettingsUpdate {
                schedule: Some(ScheduleUpdate {
                    end_time: Some(hm(19, 30)),
                    ..Default::default()
                }),
                sms_rate: Some(30),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(merged.schedule.start_time, hm(9, 0));
    assert_eq!(merged.schedule.end_time, hm(19, 30));
    assert_eq!(merged.sms_rate, 30);
    assert_eq!(h.services.settings.settings(&id).unwrap(), merged);

    let notes = h.sink.notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].priority, Priority::Normal);
}

#[tokio::test]
async fn unknown_campaign_is_rejected() {
    let h = TestHarness::new().await.unwrap();
    let missing = CampaignId::from("nope");

    let err = h
        .services
        .settings
        .update_settings(&missing, SettingsUpdate::default())
        .unwrap_err();
    assert!(matches!(err, LinecastError::CampaignNotFound { .. }));
    assert!(h.services.settings.pause_campaign(&missing).is_err());
    assert!(h.services.settings.resume_campaign(&missing).is_err());
    assert_eq!(h.sink.with_priority(Priority::High).len(), 3);
}

#[tokio::test]
async fn sms_rate_is_bounded() {
    let h = TestHarness::builder().with_max_sms_rate(40).build().await.unwrap();
    let id = h.create_active_campaign("fall").unwrap();
    let update = |rate| SettingsUpdate {
        sms_rate: Some(rate),
        ..Default::default()
    };

    assert!(h.services.settings.update_settings(&id, update(40)).is_ok());
    assert!(h.services.settings.update_settings(&id, update(41)).is_err());
    assert!(h.services.settings.update_settings(&id, update(0)).is_err());
}

#[tokio::test]
async fn pause_and_resume_follow_start_date() {
    let h = TestHarness::new().await.unwrap();
    let settings = &h.services.settings;
    let running = h.create_active_campaign("running").unwrap();

    settings.pause_campaign(&running).unwrap();
    assert_eq!(settings.status(&running), Some(CampaignStatus::Paused));
    assert_eq!(settings.resume_campaign(&running).unwrap(), CampaignStatus::Active);

    let later = CampaignId::from("later");
    settings
        .create_campaign(
            &later,
            CampaignSettings {
                schedule: schedule(h.today() + TimeDelta::days(7)),
                sms_rate: 5,
                status: CampaignStatus::Scheduled,
            },
        )
        .unwrap();
    settings.pause_campaign(&later).unwrap();
    assert_eq!(settings.resume_campaign(&later).unwrap(), CampaignStatus::Scheduled);
}

#[tokio::test]
async fn duplicate_create_is_rejected() {
    let h = TestHarness::new().await.unwrap();
    h.create_active_campaign("twice").unwrap();
    let err = h.create_active_campaign("twice").unwrap_err();
    assert!(matches!(err, LinecastError::CampaignExists { .. }));
}

#[tokio::test]
async fn create_rejects_invalid_settings() {
    let h = TestHarness::new().await.unwrap();
    let mut bad = schedule(h.today());
    bad.days_of_week.clear();
    bad.timezone = "Nowhere/Special".into();

    let err = h
        .services
        .settings
        .create_campaign(
            &CampaignId::from("bad"),
            CampaignSettings {
                schedule: bad,
                sms_rate: 1,
                status: CampaignStatus::Active,
            },
        )
        .unwrap_err();
    match err {
        LinecastError::Validation { errors } => assert_eq!(errors.len(), 2),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(h.services.settings.settings(&CampaignId::from("bad")).is_none());
}

#[tokio::test]
async fn send_window_uses_campaign_timezone() {
    let h = TestHarness::new().await.unwrap();
    let id = h.create_active_campaign("tz").unwrap();
    let settings = &h.services.settings;

    let at = |d, h| Utc.with_ymd_and_hms(2026, 10, d, h, 0, 0).unwrap();

    // 12:00 New York on a Monday.
    assert!(settings.is_within_send_window(&id, at(19, 16)));
    // 22:00 New York.
    assert!(!settings.is_within_send_window(&id, at(20, 2)));
    // Saturday.
    assert!(!settings.is_within_send_window(&id, at(24, 16)));
    assert!(!settings.is_within_send_window(&CampaignId::from("unknown"), at(19, 16)));
}

#[tokio::test]
async fn snapshot_round_trips_through_sqlite() {
    let h = TestHarness::new().await.unwrap();
    h.create_active_campaign("a").unwrap();
    h.create_active_campaign("b").unwrap();
    h.services.settings.pause_campaign(&CampaignId::from("b")).unwrap();

    let storage = SqliteStorage::from_database(
        h.config.storage.clone(),
        Database::open_in_memory().await.unwrap(),
    );
    for (id, settings) in h.services.settings.snapshot() {
        storage.save_settings(&id, &settings).await.unwrap();
    }

    let fresh = CampaignSettingsStore::new(
        &h.config.settings,
        h.clock.clone(),
        h.sink.clone(),
    );
    assert_eq!(fresh.restore(storage.load_settings().await.unwrap()), 2);
    assert_eq!(fresh.snapshot(), h.services.settings.snapshot());
    assert_eq!(fresh.status(&CampaignId::from("b")), Some(CampaignStatus::Paused));
}
