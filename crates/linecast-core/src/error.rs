// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Linecast.

use thiserror::Error;

/// The primary error type used across all Linecast services and adapters.
#[derive(Debug, Error)]
pub enum LinecastError {
    /// Configuration errors (invalid TOML, bad line seed set, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A settings mutation was rejected. Nothing was applied.
    #[error("validation failed: {}", join_validation_errors(errors))]
    Validation { errors: Vec<ValidationError> },

    /// The campaign has no registered settings.
    #[error("unknown campaign: {campaign_id}")]
    CampaignNotFound { campaign_id: String },

    /// A campaign with this id already has settings.
    #[error("campaign already exists: {campaign_id}")]
    CampaignExists { campaign_id: String },

    /// A requested line is already leased to another campaign.
    #[error("line {line_id} is already leased to campaign {held_by}")]
    LineConflict { line_id: String, held_by: String },

    /// A requested line does not exist in the pool.
    #[error("unknown phone line: {line_id}")]
    LineNotFound { line_id: String },

    /// Input did not contain at least ten digits.
    #[error("invalid phone number `{input}`: expected at least 10 digits")]
    InvalidPhoneNumber { input: String },

    /// An audience record could not be interpreted.
    #[error("invalid audience record at index {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LinecastError {
    /// Shorthand for a single-error validation rejection.
    pub fn validation(error: ValidationError) -> Self {
        Self::Validation {
            errors: vec![error],
        }
    }
}

/// A single reason a campaign settings mutation was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("end time {end} must be after start time {start}")]
    EndTimeNotAfterStart { start: String, end: String },

    #[error("start date {start_date} is in the past (today is {today})")]
    StartDateInPast { start_date: String, today: String },

    #[error("end date {end_date} is before start date {start_date}")]
    EndDateBeforeStartDate { start_date: String, end_date: String },

    #[error("at least one day of the week must be selected")]
    NoDaysSelected,

    #[error("unknown timezone `{0}`")]
    UnknownTimezone(String),

    #[error("sms rate {rate} is outside 1..={max} messages per minute")]
    SmsRateOutOfRange { rate: u32, max: u32 },

    #[error("status filter `{0}` collides with a built-in bucket name")]
    ReservedStatus(String),
}

fn join_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
