// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The platform boundary for sync objects.

use core::fmt;

#[cfg(unix)]
use std::os::fd::OwnedFd;

use crate::error::DriverError;

/// Version reported by the display connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DriverVersion {
    /// Major version.
    pub major: u16,
    /// Minor version.
    pub minor: u16,
}

impl DriverVersion {
    /// Creates a version.
    #[must_use]
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for DriverVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Which entry-point family creates and waits on sync objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyncApi {
    /// Core entry points (`eglCreateSync`, `eglClientWaitSync`, ...).
    Core,
    /// `EGL_KHR_fence_sync` entry points resolved by name.
    Khr,
}

/// The type of sync object to create.
#[derive(Debug)]
pub enum SyncKind {
    /// A plain fence local to the GPU context.
    Fence,
    /// A fence backed by a native sync file that can be exported.
    #[cfg(unix)]
    NativeFence,
    /// A native fence wrapping a descriptor signaled elsewhere.
    /// Ownership of the descriptor passes to the driver.
    #[cfg(unix)]
    ImportedNativeFence(OwnedFd),
}

/// An opaque driver sync handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawSync(pub u64);

impl fmt::Debug for RawSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawSync({:#x})", self.0)
    }
}

/// Sync-object operations of a display connection.
///
/// Implementations assume a current GPU context on the calling thread.
/// Entry points that the display does not provide may panic or do nothing;
/// [`SyncCapabilities`](crate::SyncCapabilities) keeps them from being
/// called.
pub trait SyncDriver: Send + Sync + fmt::Debug {
    /// Returns the display version.
    fn version(&self) -> DriverVersion;

    /// Returns `true` if the display advertises the extension `name`.
    fn has_extension(&self, name: &str) -> bool;

    /// Returns `true` if the entry point `name` resolves.
    fn has_entry_point(&self, name: &str) -> bool;

    /// Flushes queued commands to the GPU.
    fn flush(&self);

    /// Blocks until all submitted GPU work has completed.
    fn finish(&self);

    /// Creates a sync object at the current point of the command stream.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::NoSync`] if the driver cannot create one.
    fn create_sync(&self, api: SyncApi, kind: SyncKind) -> Result<RawSync, DriverError>;

    /// Destroys a sync object, signaled or not.
    fn destroy_sync(&self, api: SyncApi, sync: RawSync);

    /// Blocks the calling thread until `sync` is signaled.
    fn client_wait_sync(&self, api: SyncApi, sync: RawSync);

    /// Makes the GPU wait for `sync` before later commands.
    fn server_wait_sync(&self, api: SyncApi, sync: RawSync);

    /// Duplicates the native fence descriptor of `sync`.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::BadFd`] if `sync` has no native descriptor.
    #[cfg(unix)]
    fn dup_native_fence_fd(&self, sync: RawSync) -> Result<OwnedFd, DriverError>;
}
