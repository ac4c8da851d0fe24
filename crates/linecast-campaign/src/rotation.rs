// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-campaign rotation state and the send readiness rule.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use linecast_core::{CampaignId, PhoneLine};

/// Where a campaign is in its line and message rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationState {
    pub campaign_id: CampaignId,
    /// Index into the campaign's leased lines, in pool order.
    pub current_line_index: usize,
    pub current_message_index: usize,
    /// `None` until the first send.
    pub last_send_time: Option<DateTime<Utc>>,
}

impl RotationState {
    pub fn new(campaign_id: CampaignId) -> Self {
        Self {
            campaign_id,
            current_line_index: 0,
            current_message_index: 0,
            last_send_time: None,
        }
    }

    /// Step to the next line and message variant and stamp the send time.
    ///
    /// Callers check readiness first; `leased` and `total_messages` are
    /// non-zero.
    pub(crate) fn advance(&mut self, leased: usize, total_messages: usize, now: DateTime<Utc>) {
        self.current_line_index = (self.current_line_index + 1) % leased;
        self.current_message_index = (self.current_message_index + 1) % total_messages;
        self.last_send_time = Some(now);
    }
}

/// The line and message variant chosen for the next send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationPick {
    pub line: PhoneLine,
    pub message_index: usize,
}

/// Whether enough time has passed since `last` to send again.
///
/// A campaign that has never sent is always ready. A clock that went
/// backwards keeps the window closed.
pub fn send_window_open(
    last: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    min_interval: TimeDelta,
) -> bool {
    match last {
        None => true,
        Some(last) => now.signed_duration_since(last) >= min_interval,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_790_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn never_sent_is_ready() {
        assert!(send_window_open(None, at(0), TimeDelta::seconds(60)));
    }

    #[test]
    fn window_opens_exactly_at_interval() {
        let interval = TimeDelta::seconds(60);
        assert!(!send_window_open(Some(at(0)), at(59), interval));
        assert!(send_window_open(Some(at(0)), at(60), interval));
    }

    #[test]
    fn clock_skew_keeps_window_closed() {
        assert!(!send_window_open(Some(at(10)), at(5), TimeDelta::seconds(1)));
    }

    #[test]
    fn advance_wraps_both_indices() {
        let mut state = RotationState::new(CampaignId::from("c"));
        state.advance(3, 2, at(0));
        assert_eq!((state.current_line_index, state.current_message_index), (1, 1));
        state.advance(3, 2, at(60));
        assert_eq!((state.current_line_index, state.current_message_index), (2, 0));
        state.advance(3, 2, at(120));
        assert_eq!(state.current_line_index, 0);
        assert_eq!(state.last_send_time, Some(at(120)));
    }
}
