// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory DNC persistence for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use linecast_core::{
    AdapterType, DncEntry, DncStore, HealthStatus, LinecastError, PhoneNumber, PluginAdapter,
};

/// A `DncStore` backed by a vector.
///
/// [`fail_writes`](Self::fail_writes) makes every insert and delete return a
/// storage error, to check that callers leave their state untouched.
#[derive(Debug, Default)]
pub struct MemoryDncStore {
    entries: Mutex<Vec<DncEntry>>,
    failing: AtomicBool,
}

impl MemoryDncStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with pre-existing entries, as if loaded from disk.
    pub fn with_entries(entries: Vec<DncEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
            failing: AtomicBool::new(false),
        }
    }

    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn stored(&self) -> Vec<DncEntry> {
        self.entries.lock().unwrap().clone()
    }

    fn check_writable(&self) -> Result<(), LinecastError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LinecastError::Storage {
                source: "injected write failure".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for MemoryDncStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, LinecastError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LinecastError> {
        Ok(())
    }
}

#[async_trait]
impl DncStore for MemoryDncStore {
    async fn insert_entry(&self, entry: &DncEntry) -> Result<bool, LinecastError> {
        self.check_writable()?;
        let mut entries = self.entries.lock().unwrap();
        if entries.iter().any(|e| e.number == entry.number) {
            return Ok(false);
        }
        entries.push(entry.clone());
        Ok(true)
    }

    async fn delete_entry(&self, number: &PhoneNumber) -> Result<bool, LinecastError> {
        self.check_writable()?;
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|e| &e.number != number);
        Ok(entries.len() < before)
    }

    async fn list_entries(&self) -> Result<Vec<DncEntry>, LinecastError> {
        let mut entries = self.entries.lock().unwrap().clone();
        entries.sort_by_key(|e| e.added_at);
        Ok(entries)
    }
}
