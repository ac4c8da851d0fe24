// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The do-not-contact registry.
//!
//! Lookups are served from an in-memory index keyed by canonical number so
//! the audience processor can check every number without touching storage.
//! Mutations write through to the [`DncStore`] first and update the index
//! only after the store accepted them.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tracing::{debug, info, warn};

use linecast_core::{Clock, DncEntry, DncStore, LinecastError, PhoneNumber};

/// Outcome of a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub added: usize,
    pub already_present: usize,
    /// Inputs with fewer than ten digits.
    pub rejected: Vec<String>,
}

/// Persistent set of suppressed phone numbers.
pub struct DncRegistry {
    store: Arc<dyn DncStore>,
    clock: Arc<dyn Clock>,
    index: RwLock<HashMap<PhoneNumber, DncEntry>>,
}

impl DncRegistry {
    /// Create a registry and load every stored entry into the index.
    pub async fn load(
        store: Arc<dyn DncStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, LinecastError> {
        let entries = store.list_entries().await?;
        info!(entries = entries.len(), store = store.name(), "DNC registry loaded");
        let index = entries
            .into_iter()
            .map(|entry| (entry.number.clone(), entry))
            .collect();
        Ok(Self {
            store,
            clock,
            index: RwLock::new(index),
        })
    }

    /// Suppress `raw`. Returns `false` if the number was already present.
    pub async fn add(&self, raw: &str, reason: Option<String>) -> Result<bool, LinecastError> {
        let number = PhoneNumber::normalize(raw).ok_or_else(|| {
            LinecastError::InvalidPhoneNumber {
                input: raw.to_string(),
            }
        })?;
        if self.read().contains_key(&number) {
            debug!(number = %number, "DNC add skipped, already present");
            return Ok(false);
        }

        let entry = DncEntry::new(number.clone(), reason, self.clock.now());
        let inserted = self.store.insert_entry(&entry).await?;
        if !inserted {
            // Another writer got there first; keep the index in line with storage.
            self.refresh_one(&number).await?;
            return Ok(false);
        }

        self.write().entry(number.clone()).or_insert(entry);
        info!(number = %number, "number added to DNC registry");
        Ok(true)
    }

    /// Stop suppressing `raw`. Returns `false` when it was not present or does
    /// not normalize.
    pub async fn remove(&self, raw: &str) -> Result<bool, LinecastError> {
        let Some(number) = PhoneNumber::normalize(raw) else {
            return Ok(false);
        };
        let deleted = self.store.delete_entry(&number).await?;
        let cached = self.write().remove(&number).is_some();
        if deleted || cached {
            info!(number = %number, "number removed from DNC registry");
        }
        Ok(deleted || cached)
    }

    /// Whether `raw` normalizes to a suppressed number.
    pub fn is_blocked(&self, raw: &str) -> bool {
        PhoneNumber::normalize(raw).is_some_and(|number| self.contains(&number))
    }

    pub fn contains(&self, number: &PhoneNumber) -> bool {
        self.read().contains_key(number)
    }

    /// Every entry, oldest first.
    pub fn list(&self) -> Vec<DncEntry> {
        let mut entries: Vec<DncEntry> = self.read().values().cloned().collect();
        entries.sort_by(|a, b| {
            a.added_at
                .cmp(&b.added_at)
                .then_with(|| a.number.cmp(&b.number))
        });
        entries
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Add many numbers with a shared reason.
    pub async fn import<I, S>(
        &self,
        numbers: I,
        reason: Option<String>,
    ) -> Result<ImportReport, LinecastError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = ImportReport::default();
        for raw in numbers {
            let raw = raw.as_ref();
            match self.add(raw, reason.clone()).await {
                Ok(true) => report.added += 1,
                Ok(false) => report.already_present += 1,
                Err(LinecastError::InvalidPhoneNumber { input }) => {
                    warn!(input = %input, "skipping invalid number during DNC import");
                    report.rejected.push(input);
                }
                Err(e) => return Err(e),
            }
        }
        info!(
            added = report.added,
            already_present = report.already_present,
            rejected = report.rejected.len(),
            "DNC import finished"
        );
        Ok(report)
    }

    async fn refresh_one(&self, number: &PhoneNumber) -> Result<(), LinecastError> {
        let stored = self
            .store
            .list_entries()
            .await?
            .into_iter()
            .find(|entry| &entry.number == number);
        if let Some(entry) = stored {
            self.write().insert(number.clone(), entry);
        }
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<PhoneNumber, DncEntry>> {
        self.index
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<PhoneNumber, DncEntry>> {
        self.index
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
