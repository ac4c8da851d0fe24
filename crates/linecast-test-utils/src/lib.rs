// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Linecast integration tests.
//!
//! Provides deterministic collaborators and a harness that assembles the
//! campaign services without external state.
//!
//! # Components
//!
//! - [`ManualClock`] - clock that only moves when told to
//! - [`RecordingSink`] - notification sink that keeps everything it receives
//! - [`MemoryDncStore`] - in-memory `DncStore` with failure injection
//! - [`TestHarness`] - the full service set over the above

pub mod clock;
pub mod harness;
pub mod memory_store;
pub mod sink;

pub use clock::ManualClock;
pub use harness::{TestHarness, TestHarnessBuilder, contact, schedule};
pub use memory_store::MemoryDncStore;
pub use sink::RecordingSink;
