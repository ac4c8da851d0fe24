// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; nothing is exported unless the host installs a
//! recorder.

use metrics::describe_counter;

/// Register all Linecast metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        "linecast_rotations_total",
        "Successful line rotations across all campaigns"
    );
    describe_counter!(
        "linecast_audience_numbers_total",
        "Audience phone numbers classified, by bucket"
    );
    describe_counter!(
        "linecast_settings_rejections_total",
        "Rejected campaign settings mutations"
    );
}

pub fn record_rotation() {
    metrics::counter!("linecast_rotations_total").increment(1);
}

/// Status buckets are caller-named, so they all share the `status` label.
pub fn record_bucket(bucket: &str, count: usize) {
    metrics::counter!("linecast_audience_numbers_total", "bucket" => bucket_label(bucket))
        .increment(count as u64);
}

fn bucket_label(bucket: &str) -> &'static str {
    match bucket {
        "campaign" => "campaign",
        "dnc" => "dnc",
        "invalid" => "invalid",
        _ => "status",
    }
}

pub fn record_settings_rejection() {
    metrics::counter!("linecast_settings_rejections_total").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_buckets_share_one_label() {
        assert_eq!(bucket_label("campaign"), "campaign");
        assert_eq!(bucket_label("dnc"), "dnc");
        assert_eq!(bucket_label("invalid"), "invalid");
        assert_eq!(bucket_label("hot"), "status");
        assert_eq!(bucket_label("Lead-2026-10"), "status");
    }
}
