// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the persistence traits.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use linecast_config::model::StorageConfig;
use linecast_core::{
    AdapterType, CampaignId, CampaignSettings, DncEntry, DncStore, HealthStatus, LinecastError,
    PhoneNumber, PluginAdapter, SettingsRepository,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates to the typed query modules. The
/// database is opened on the first call to [`SqliteStorage::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`](Self::initialize) is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wrap an already opened database, e.g. an in-memory one.
    pub fn from_database(config: StorageConfig, db: Database) -> Self {
        Self {
            config,
            db: OnceCell::new_with(Some(db)),
        }
    }

    /// Open the database and run migrations.
    pub async fn initialize(&self) -> Result<(), LinecastError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| LinecastError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    /// Number of stored DNC entries.
    pub async fn dnc_count(&self) -> Result<u64, LinecastError> {
        queries::dnc::count_entries(self.db()?).await
    }

    fn db(&self) -> Result<&Database, LinecastError> {
        self.db.get().ok_or_else(|| LinecastError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, LinecastError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LinecastError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl DncStore for SqliteStorage {
    async fn insert_entry(&self, entry: &DncEntry) -> Result<bool, LinecastError> {
        queries::dnc::insert_entry(self.db()?, entry).await
    }

    async fn delete_entry(&self, number: &PhoneNumber) -> Result<bool, LinecastError> {
        queries::dnc::delete_entry(self.db()?, number).await
    }

    async fn list_entries(&self) -> Result<Vec<DncEntry>, LinecastError> {
        queries::dnc::list_entries(self.db()?).await
    }
}

#[async_trait]
impl SettingsRepository for SqliteStorage {
    async fn save_settings(
        &self,
        campaign_id: &CampaignId,
        settings: &CampaignSettings,
    ) -> Result<(), LinecastError> {
        queries::settings::save_settings(self.db()?, campaign_id, settings).await
    }

    async fn load_settings(&self) -> Result<Vec<(CampaignId, CampaignSettings)>, LinecastError> {
        queries::settings::load_settings(self.db()?).await
    }

    async fn delete_settings(&self, campaign_id: &CampaignId) -> Result<bool, LinecastError> {
        queries::settings::delete_settings(self.db()?, campaign_id).await
    }
}
