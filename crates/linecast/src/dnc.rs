// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `linecast dnc` command implementations.

use std::path::Path;
use std::sync::Arc;

use linecast_campaign::DncRegistry;
use linecast_config::model::LinecastConfig;
use linecast_core::{Clock, DncStore, LinecastError, PluginAdapter, SystemClock};
use linecast_storage::SqliteStorage;

/// Open storage and load the registry from it.
async fn open_registry(
    config: &LinecastConfig,
) -> Result<(Arc<SqliteStorage>, DncRegistry), LinecastError> {
    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    let registry = DncRegistry::load(
        Arc::clone(&storage) as Arc<dyn DncStore>,
        Arc::new(SystemClock) as Arc<dyn Clock>,
    )
    .await?;
    Ok((storage, registry))
}

pub async fn run_add(
    config: &LinecastConfig,
    numbers: &[String],
    reason: Option<String>,
) -> Result<(), LinecastError> {
    let (storage, registry) = open_registry(config).await?;
    for raw in numbers {
        if registry.add(raw, reason.clone()).await? {
            println!("added {raw}");
        } else {
            println!("{raw} is already on the DNC list");
        }
    }
    storage.shutdown().await
}

pub async fn run_remove(config: &LinecastConfig, numbers: &[String]) -> Result<(), LinecastError> {
    let (storage, registry) = open_registry(config).await?;
    for raw in numbers {
        if registry.remove(raw).await? {
            println!("removed {raw}");
        } else {
            println!("{raw} was not on the DNC list");
        }
    }
    storage.shutdown().await
}

pub async fn run_check(config: &LinecastConfig, number: &str) -> Result<(), LinecastError> {
    let (storage, registry) = open_registry(config).await?;
    let blocked = registry.is_blocked(number);
    println!("{number}: {}", if blocked { "blocked" } else { "not blocked" });
    storage.shutdown().await
}

pub async fn run_list(config: &LinecastConfig, json: bool) -> Result<(), LinecastError> {
    let (storage, registry) = open_registry(config).await?;
    let entries = registry.list();

    if json {
        let out = serde_json::to_string_pretty(&entries)
            .map_err(|e| LinecastError::Internal(format!("cannot encode DNC list: {e}")))?;
        println!("{out}");
    } else if entries.is_empty() {
        println!("DNC list is empty");
    } else {
        for entry in &entries {
            println!(
                "{}  {}  {}",
                entry.number,
                entry.added_at.format("%Y-%m-%d %H:%M"),
                entry.reason.as_deref().unwrap_or("-")
            );
        }
        println!("{} entries", entries.len());
    }
    storage.shutdown().await
}

pub async fn run_import(
    config: &LinecastConfig,
    file: &Path,
    reason: Option<String>,
) -> Result<(), LinecastError> {
    let content = tokio::fs::read_to_string(file).await.map_err(|e| {
        LinecastError::Internal(format!("cannot read {}: {e}", file.display()))
    })?;
    let (storage, registry) = open_registry(config).await?;

    let report = registry.import(import_lines(&content), reason).await?;
    println!(
        "imported {} new, {} already present, {} rejected",
        report.added,
        report.already_present,
        report.rejected.len()
    );
    for input in &report.rejected {
        println!("  rejected: {input}");
    }
    storage.shutdown().await
}

/// Numbers in an import file: one per line, blank lines and `#` comments
/// skipped, anything after a comma ignored so single-column CSV works.
fn import_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .map(|line| line.split(',').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}
