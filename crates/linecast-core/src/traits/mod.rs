// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between Linecast services and their collaborators.
//!
//! Adapters extend the [`PluginAdapter`] base trait and use `#[async_trait]`
//! for dynamic dispatch compatibility. [`Clock`] and [`NotificationSink`] are
//! synchronous so they can be called while a service holds its state lock.

pub mod adapter;
pub mod clock;
pub mod notify;
pub mod storage;

pub use adapter::PluginAdapter;
pub use clock::{Clock, SystemClock};
pub use notify::{NotificationSink, NullSink};
pub use storage::{DncStore, SettingsRepository};
