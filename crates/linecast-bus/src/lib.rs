// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process notification bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`NotificationBus`] is the default [`NotificationSink`] handed to the
//! campaign services. It is shared via `Arc<NotificationBus>`; any number of
//! subscribers (a UI bridge, the log forwarder) receive every notification.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use linecast_core::{
    AdapterType, HealthStatus, LinecastError, Notification, NotificationKind,
    NotificationSink, PluginAdapter, Priority,
};

/// Default buffer capacity for the broadcast channel.
pub const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out notification bus.
pub struct NotificationBus {
    sender: broadcast::Sender<Notification>,
}

impl NotificationBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unread notifications are dropped and
    /// slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish to all current subscribers. Dropped silently when nobody listens.
    pub fn publish(&self, notification: Notification) {
        let _ = self.sender.send(notification);
    }

    /// Subscribe to every notification published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl NotificationSink for NotificationBus {
    fn notify(&self, notification: Notification) {
        debug!(
            kind = %notification.kind,
            priority = %notification.priority,
            title = %notification.title,
            "notification published"
        );
        self.publish(notification);
    }
}

#[async_trait]
impl PluginAdapter for NotificationBus {
    fn name(&self) -> &str {
        "broadcast-bus"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Notifier
    }

    async fn health_check(&self) -> Result<HealthStatus, LinecastError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LinecastError> {
        Ok(())
    }
}

/// Forward notifications to the tracing log until cancelled or the bus closes.
///
/// High-priority errors log at `error`, warnings at `warn`, everything else at
/// `info`.
pub async fn forward_to_log(
    mut receiver: broadcast::Receiver<Notification>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            received = receiver.recv() => match received {
                Ok(n) => log_notification(&n),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "notification log forwarder lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("notification bus closed, log forwarder stopping");
                    break;
                }
            },
            _ = cancel.cancelled() => {
                debug!("notification log forwarder cancelled");
                break;
            }
        }
    }
}

fn log_notification(n: &Notification) {
    match (n.kind, n.priority) {
        (NotificationKind::Error, Priority::High) => {
            error!(title = %n.title, "{}", n.message);
        }
        (NotificationKind::Error, _) | (NotificationKind::Warning, _) => {
            warn!(title = %n.title, "{}", n.message);
        }
        _ => info!(title = %n.title, "{}", n.message),
    }
}
