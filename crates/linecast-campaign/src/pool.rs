// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The phone line pool and its leasing rules.
//!
//! [`LinePool`] is plain data guarded by the scheduler's lock. Leasing is all
//! or nothing: a request naming an unknown line or a line held by another
//! campaign changes nothing.

use linecast_config::model::LineConfig;
use linecast_core::{CampaignId, LineId, LinecastError, PhoneLine, PhoneNumber};

/// Fixed set of sendable lines, kept in seed order.
#[derive(Debug, Clone, Default)]
pub struct LinePool {
    lines: Vec<PhoneLine>,
}

impl LinePool {
    pub fn new(lines: Vec<PhoneLine>) -> Self {
        Self { lines }
    }

    /// Build the pool from the configured seed set.
    pub fn from_config(seed: &[LineConfig]) -> Result<Self, LinecastError> {
        let lines = seed
            .iter()
            .map(|line| {
                let number = PhoneNumber::normalize(&line.number).ok_or_else(|| {
                    LinecastError::Config(format!(
                        "line `{}` has an invalid number `{}`",
                        line.id, line.number
                    ))
                })?;
                Ok(PhoneLine {
                    id: LineId(line.id.clone()),
                    name: line.name.clone(),
                    number,
                    in_use_by: None,
                })
            })
            .collect::<Result<Vec<_>, LinecastError>>()?;
        Ok(Self::new(lines))
    }

    pub fn lines(&self) -> &[PhoneLine] {
        &self.lines
    }

    pub fn get(&self, line_id: &LineId) -> Option<&PhoneLine> {
        self.lines.iter().find(|line| &line.id == line_id)
    }

    pub fn available(&self) -> impl Iterator<Item = &PhoneLine> {
        self.lines.iter().filter(|line| line.is_available())
    }

    pub fn in_use(&self) -> impl Iterator<Item = &PhoneLine> {
        self.lines.iter().filter(|line| !line.is_available())
    }

    /// Lines leased to `campaign_id`, in pool order.
    pub fn leased_to<'a>(
        &'a self,
        campaign_id: &'a CampaignId,
    ) -> impl Iterator<Item = &'a PhoneLine> + 'a {
        self.lines
            .iter()
            .filter(move |line| line.in_use_by.as_ref() == Some(campaign_id))
    }

    /// Lease every line in `line_ids` to `campaign_id`.
    ///
    /// All ids are checked before anything is written.
    pub fn lease(
        &mut self,
        campaign_id: &CampaignId,
        line_ids: &[LineId],
    ) -> Result<(), LinecastError> {
        for line_id in line_ids {
            let line = self.get(line_id).ok_or_else(|| LinecastError::LineNotFound {
                line_id: line_id.to_string(),
            })?;
            if let Some(holder) = &line.in_use_by
                && holder != campaign_id
            {
                return Err(LinecastError::LineConflict {
                    line_id: line_id.to_string(),
                    held_by: holder.to_string(),
                });
            }
        }

        for line in &mut self.lines {
            if line_ids.contains(&line.id) {
                line.in_use_by = Some(campaign_id.clone());
            }
        }
        Ok(())
    }

    /// Free every line held by `campaign_id`. Returns how many were freed.
    pub fn release(&mut self, campaign_id: &CampaignId) -> usize {
        let mut freed = 0;
        for line in &mut self.lines {
            if line.in_use_by.as_ref() == Some(campaign_id) {
                line.in_use_by = None;
                freed += 1;
            }
        }
        freed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> LinePool {
        LinePool::from_config(&[
            LineConfig {
                id: "1".into(),
                name: "One".into(),
                number: "5550100001".into(),
            },
            LineConfig {
                id: "2".into(),
                name: "Two".into(),
                number: "5550100002".into(),
            },
            LineConfig {
                id: "3".into(),
                name: "Three".into(),
                number: "5550100003".into(),
            },
        ])
        .unwrap()
    }

    fn ids(raw: &[&str]) -> Vec<LineId> {
        raw.iter().map(|id| LineId::from(*id)).collect()
    }

    #[test]
    fn seed_numbers_are_canonical() {
        let pool = pool();
        assert_eq!(pool.lines()[0].number.as_str(), "(555) 010-0001");
        assert_eq!(pool.available().count(), 3);
    }

    #[test]
    fn invalid_seed_number_is_a_config_error() {
        let err = LinePool::from_config(&[LineConfig {
            id: "x".into(),
            name: "Broken".into(),
            number: "12".into(),
        }])
        .unwrap_err();
        assert!(matches!(err, LinecastError::Config(_)));
    }

    #[test]
    fn conflicting_lease_changes_nothing() {
        let mut pool = pool();
        let a = CampaignId::from("a");
        let b = CampaignId::from("b");
        pool.lease(&a, &ids(&["2"])).unwrap();

        let err = pool.lease(&b, &ids(&["1", "2"])).unwrap_err();
        assert!(matches!(err, LinecastError::LineConflict { ref held_by, .. } if held_by == "a"));
        assert!(pool.get(&LineId::from("1")).unwrap().is_available());
    }

    #[test]
    fn unknown_line_changes_nothing() {
        let mut pool = pool();
        let a = CampaignId::from("a");
        let err = pool.lease(&a, &ids(&["1", "9"])).unwrap_err();
        assert!(matches!(err, LinecastError::LineNotFound { .. }));
        assert_eq!(pool.in_use().count(), 0);
    }

    #[test]
    fn release_frees_only_own_lines() {
        let mut pool = pool();
        let a = CampaignId::from("a");
        let b = CampaignId::from("b");
        pool.lease(&a, &ids(&["1", "3"])).unwrap();
        pool.lease(&b, &ids(&["2"])).unwrap();

        assert_eq!(pool.release(&a), 2);
        assert_eq!(pool.release(&a), 0);
        assert_eq!(pool.leased_to(&b).count(), 1);
        assert_eq!(pool.available().count(), 2);
    }
}
