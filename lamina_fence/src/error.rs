// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;

/// Errors reported by a [`SyncDriver`](crate::SyncDriver).
#[derive(Debug, Error)]
pub enum DriverError {
    /// The driver could not create a sync object.
    #[error("driver returned no sync object")]
    NoSync,
    /// The sync object has no native fence descriptor.
    #[error("sync object has no native fence descriptor")]
    BadFd,
    /// An OS call failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors returned by [`GpuFence`](crate::GpuFence) operations.
///
/// None of these are fatal. Callers treat a failed creation as
/// "synchronization unavailable" and fall back to an unconditional wait.
#[derive(Debug, Error)]
pub enum FenceError {
    /// The display lacks the named capability.
    #[error("{0} is not supported by this display")]
    Unsupported(&'static str),
    /// The driver returned no sync object.
    #[error("fence creation failed")]
    CreationFailed,
    /// The fence was neither created exportable nor imported.
    #[error("fence is not exportable")]
    NotExportable,
    /// Any other driver failure.
    #[error(transparent)]
    Driver(#[from] DriverError),
}
