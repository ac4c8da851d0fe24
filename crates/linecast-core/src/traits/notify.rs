// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound notification channel.

use crate::types::Notification;

/// Receives user-facing notifications emitted on state transitions.
///
/// This is the only side-effect channel the campaign services have beyond
/// their own state. Implementations must not block.
pub trait NotificationSink: Send + Sync + 'static {
    fn notify(&self, notification: Notification);
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _notification: Notification) {}
}
