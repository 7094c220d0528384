// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! GPU fences for lamina.
//!
//! A [`GpuFence`] marks a point in a GPU command stream. The CPU can block
//! on it ([`GpuFence::client_wait`]) or the GPU can be told to wait for it
//! before running later commands ([`GpuFence::server_wait`]). On unix,
//! fences backed by a native sync file can be exported to and imported
//! from other processes as file descriptors.
//!
//! Platform glue implements [`SyncDriver`]. Which entry points are usable is
//! resolved once, when a [`Display`] is built, and cached as
//! [`SyncCapabilities`]:
//!
//! ```text
//! SyncDriver ──negotiate──▶ SyncCapabilities
//!      │                          │
//!      └────────── Display ◀──────┘
//!                     │
//!                 GpuFence (create / import / wait / export)
//! ```
//!
//! [`SoftwareDriver`] emulates a GPU timeline on the CPU for headless use
//! and tests.

mod caps;
mod display;
mod driver;
mod error;
mod fence;
mod software;

pub use caps::{SyncCapabilities, ext};
pub use display::Display;
pub use driver::{DriverVersion, RawSync, SyncApi, SyncDriver, SyncKind};
pub use error::{DriverError, FenceError};
pub use fence::GpuFence;
pub use software::{SoftwareConfig, SoftwareDriver};
