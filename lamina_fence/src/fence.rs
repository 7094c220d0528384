// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The fence type.

#[cfg(unix)]
use std::os::fd::OwnedFd;

use crate::display::Display;
use crate::driver::{RawSync, SyncApi, SyncKind};
use crate::error::{DriverError, FenceError};

/// A point in the GPU command stream that can be waited on.
///
/// A fence owns its driver sync object and destroys it on drop, whether or
/// not it has been signaled. Fences cannot be cloned; hand out exported
/// descriptors instead.
#[derive(Debug)]
pub struct GpuFence {
    display: Display,
    api: SyncApi,
    sync: RawSync,
    exportable: bool,
}

impl GpuFence {
    /// Creates a fence after all commands issued so far, then flushes.
    ///
    /// # Errors
    ///
    /// Returns [`FenceError::Unsupported`] if the display has no sync api
    /// and [`FenceError::CreationFailed`] if the driver returns no sync.
    /// Either way the caller has no synchronization and must fall back to
    /// an unconditional wait.
    pub fn create(display: &Display) -> Result<Self, FenceError> {
        Self::create_with(display, SyncKind::Fence, false)
    }

    /// Creates a fence backed by a native sync file.
    ///
    /// # Errors
    ///
    /// Returns [`FenceError::Unsupported`] if native fences are unavailable
    /// and [`FenceError::CreationFailed`] if the driver returns no sync.
    #[cfg(unix)]
    pub fn create_exportable(display: &Display) -> Result<Self, FenceError> {
        if !display.capabilities().native_fence {
            return Err(FenceError::Unsupported("native fence"));
        }
        Self::create_with(display, SyncKind::NativeFence, true)
    }

    /// Wraps a sync-file descriptor signaled by another GPU client.
    ///
    /// Ownership of `fd` passes to the fence; it is closed when the driver
    /// sync object is destroyed. The resulting fence is exportable.
    ///
    /// # Errors
    ///
    /// Returns [`FenceError::Unsupported`] if native fences are unavailable.
    /// `fd` is closed in that case.
    #[cfg(unix)]
    pub fn import_fd(display: &Display, fd: OwnedFd) -> Result<Self, FenceError> {
        if !display.capabilities().native_fence {
            return Err(FenceError::Unsupported("native fence"));
        }
        Self::create_with(display, SyncKind::ImportedNativeFence(fd), true)
    }

    fn create_with(display: &Display, kind: SyncKind, exportable: bool) -> Result<Self, FenceError> {
        let api = display
            .capabilities()
            .api
            .ok_or(FenceError::Unsupported("sync objects"))?;
        let sync = match display.driver().create_sync(api, kind) {
            Ok(sync) => sync,
            Err(DriverError::NoSync) => return Err(FenceError::CreationFailed),
            Err(err) => return Err(err.into()),
        };
        display.driver().flush();
        Ok(Self {
            display: display.clone(),
            api,
            sync,
            exportable,
        })
    }

    /// Returns `true` if [`export_fd`](Self::export_fd) can succeed.
    #[must_use]
    pub fn is_exportable(&self) -> bool {
        self.exportable
    }

    /// Blocks the calling thread until the fence is signaled.
    ///
    /// There is no timeout. Only call this on a thread that can stall.
    pub fn client_wait(&self) {
        self.display.driver().client_wait_sync(self.api, self.sync);
    }

    /// Makes the GPU wait for the fence before later commands.
    ///
    /// Without server-wait support this is a [`client_wait`](Self::client_wait),
    /// which is correct but stalls the calling thread.
    pub fn server_wait(&self) {
        if !self.display.capabilities().server_wait {
            if self.display.first_server_wait_fallback() {
                log::debug!("server wait unsupported, falling back to client wait");
            }
            self.client_wait();
            return;
        }
        self.display.driver().server_wait_sync(self.api, self.sync);
    }

    /// Returns a new descriptor for the fence's sync file.
    ///
    /// Every call duplicates the descriptor. Each returned [`OwnedFd`] is
    /// independent and closes on drop.
    ///
    /// # Errors
    ///
    /// Returns [`FenceError::NotExportable`] for plain fences and
    /// [`FenceError::Unsupported`] if the export entry point is missing.
    #[cfg(unix)]
    pub fn export_fd(&self) -> Result<OwnedFd, FenceError> {
        if !self.exportable {
            return Err(FenceError::NotExportable);
        }
        if !self.display.capabilities().native_fence_export {
            return Err(FenceError::Unsupported("native fence export"));
        }
        Ok(self.display.driver().dup_native_fence_fd(self.sync)?)
    }
}

impl Drop for GpuFence {
    fn drop(&mut self) {
        self.display.driver().destroy_sync(self.api, self.sync);
    }
}
