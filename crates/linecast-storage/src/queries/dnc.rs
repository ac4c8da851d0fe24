// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Do-not-contact entry operations.

use chrono::{DateTime, SecondsFormat, Utc};
use linecast_core::{DncEntry, LinecastError, PhoneNumber};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::queries::conversion_error;

/// Insert an entry. Returns `false` if its number was already present.
pub async fn insert_entry(db: &Database, entry: &DncEntry) -> Result<bool, LinecastError> {
    let id = entry.id.clone();
    let number = entry.number.as_str().to_string();
    let added_at = entry.added_at.to_rfc3339_opts(SecondsFormat::Millis, true);
    let reason = entry.reason.clone();
    db.connection()
        .call(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO dnc_entries (id, number, added_at, reason)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, number, added_at, reason],
            )?;
            Ok(inserted > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete the entry with the given canonical number.
pub async fn delete_entry(db: &Database, number: &PhoneNumber) -> Result<bool, LinecastError> {
    let number = number.as_str().to_string();
    db.connection()
        .call(move |conn| {
            let deleted =
                conn.execute("DELETE FROM dnc_entries WHERE number = ?1", params![number])?;
            Ok(deleted > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Every entry, oldest first.
pub async fn list_entries(db: &Database) -> Result<Vec<DncEntry>, LinecastError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, number, added_at, reason FROM dnc_entries
                 ORDER BY added_at ASC, rowid ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                let number: String = row.get(1)?;
                let added_at: String = row.get(2)?;
                Ok(DncEntry {
                    id: row.get(0)?,
                    number: PhoneNumber::try_from(number).map_err(|e| conversion_error(1, e))?,
                    added_at: DateTime::parse_from_rfc3339(&added_at)
                        .map(|t| t.with_timezone(&Utc))
                        .map_err(|e| conversion_error(2, e))?,
                    reason: row.get(3)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Number of stored entries.
pub async fn count_entries(db: &Database) -> Result<u64, LinecastError> {
    db.connection()
        .call(|conn| {
            conn.query_row("SELECT COUNT(*) FROM dnc_entries", [], |row| {
                row.get::<_, i64>(0)
            })
        })
        .await
        .map_err(map_tr_err)
        .map(|n| n.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(raw: &str, minute: u32) -> DncEntry {
        DncEntry::new(
            PhoneNumber::normalize(raw).unwrap(),
            Some("opted out".into()),
            Utc.with_ymd_and_hms(2026, 10, 1, 12, minute, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn insert_is_idempotent_per_number() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(insert_entry(&db, &entry("5551234567", 0)).await.unwrap());
        assert!(!insert_entry(&db, &entry("(555) 123-4567", 1)).await.unwrap());
        assert_eq!(count_entries(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_returns_oldest_first_with_fields() {
        let db = Database::open_in_memory().await.unwrap();
        insert_entry(&db, &entry("2125550002", 5)).await.unwrap();
        insert_entry(&db, &entry("2125550001", 1)).await.unwrap();

        let entries = list_entries(&db).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].number.as_str(), "(212) 555-0001");
        assert_eq!(entries[0].reason.as_deref(), Some("opted out"));
        assert_eq!(
            entries[0].added_at,
            Utc.with_ymd_and_hms(2026, 10, 1, 12, 1, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_existed() {
        let db = Database::open_in_memory().await.unwrap();
        let e = entry("3125550100", 0);
        insert_entry(&db, &e).await.unwrap();
        assert!(delete_entry(&db, &e.number).await.unwrap());
        assert!(!delete_entry(&db, &e.number).await.unwrap());
        assert!(list_entries(&db).await.unwrap().is_empty());
    }
}
