// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign services for Linecast.
//!
//! Each service is an explicit object shared via `Arc`:
//!
//! - [`DncRegistry`]: persistent suppression list
//! - [`SchedulerService`]: phone line pool and per-campaign rotation
//! - [`CampaignSettingsStore`]: validated schedules and pause/resume
//! - [`AudienceProcessor`]: batch classification of campaign audiences
//! - [`RotationDriver`]: periodic polling of the rotation engine
//!
//! [`CampaignServices`] wires them together from a [`LinecastConfig`].

pub mod audience;
pub mod dnc;
pub mod driver;
pub mod metrics;
pub mod pool;
pub mod rotation;
pub mod scheduler;
pub mod settings;

use std::sync::Arc;

use tracing::info;

use linecast_config::model::{CampaignConfig, LinecastConfig};
use linecast_core::{
    CampaignId, CampaignSettings, Clock, DncStore, LineId, LinecastError, NotificationSink,
};

pub use audience::{AudienceProcessingState, AudienceProcessor, BucketEntry, ProcessingStatus};
pub use dnc::{DncRegistry, ImportReport};
pub use driver::{DispatchSlot, RotationDriver};
pub use pool::LinePool;
pub use rotation::{RotationPick, RotationState, send_window_open};
pub use scheduler::SchedulerService;
pub use settings::{CampaignSettingsStore, ScheduleUpdate, SettingsUpdate};

/// Every campaign service, built from one configuration.
#[derive(Clone)]
pub struct CampaignServices {
    pub dnc: Arc<DncRegistry>,
    pub scheduler: Arc<SchedulerService>,
    pub settings: Arc<CampaignSettingsStore>,
    pub audience: Arc<AudienceProcessor>,
    pub driver: Arc<RotationDriver>,
    clock: Arc<dyn Clock>,
}

impl CampaignServices {
    /// Build the services and load the DNC registry from `store`.
    pub async fn build(
        config: &LinecastConfig,
        store: Arc<dyn DncStore>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self, LinecastError> {
        let dnc = Arc::new(DncRegistry::load(store, Arc::clone(&clock)).await?);
        let pool = LinePool::from_config(&config.lines)?;
        let scheduler = Arc::new(SchedulerService::new(
            pool,
            &config.rotation,
            Arc::clone(&clock),
            Arc::clone(&sink),
        ));
        let settings = Arc::new(CampaignSettingsStore::new(
            &config.settings,
            Arc::clone(&clock),
            Arc::clone(&sink),
        ));
        let audience = Arc::new(AudienceProcessor::new(
            &config.audience,
            Arc::clone(&dnc),
            Arc::clone(&settings),
            sink,
        ));
        let driver = Arc::new(RotationDriver::new(
            &config.rotation,
            Arc::clone(&scheduler),
            Arc::clone(&settings),
            Arc::clone(&clock),
        ));

        Ok(Self {
            dnc,
            scheduler,
            settings,
            audience,
            driver,
            clock,
        })
    }

    /// Register a configured campaign: settings (unless already restored),
    /// line leases, and rotation tracking.
    pub fn register_campaign(&self, campaign: &CampaignConfig) -> Result<(), LinecastError> {
        let id = CampaignId::from(campaign.id.as_str());

        if self.settings.settings(&id).is_none() {
            let status = settings::initial_status(&campaign.schedule, self.clock.now());
            self.settings.create_campaign(
                &id,
                CampaignSettings {
                    schedule: campaign.schedule.clone(),
                    sms_rate: campaign.sms_rate,
                    status,
                },
            )?;
        }

        let lines: Vec<LineId> = campaign
            .lines
            .iter()
            .map(|line| LineId::from(line.as_str()))
            .collect();
        self.scheduler.assign_lines_to_campaign(&id, &lines)?;
        self.driver.track(id.clone(), campaign.message_variants);

        info!(
            campaign_id = %id,
            lines = lines.len(),
            message_variants = campaign.message_variants,
            "campaign registered"
        );
        Ok(())
    }
}
