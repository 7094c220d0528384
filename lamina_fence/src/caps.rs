// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One-time capability negotiation.

use crate::driver::{DriverVersion, SyncApi, SyncDriver};

/// Extension and entry-point names consulted during negotiation.
pub mod ext {
    /// Fence sync objects through KHR entry points.
    pub const KHR_FENCE_SYNC: &str = "EGL_KHR_fence_sync";
    /// GPU-side waits through KHR entry points.
    pub const KHR_WAIT_SYNC: &str = "EGL_KHR_wait_sync";
    /// Native sync-file fences.
    pub const ANDROID_NATIVE_FENCE_SYNC: &str = "EGL_ANDROID_native_fence_sync";

    /// KHR sync creation entry point.
    pub const CREATE_SYNC_KHR: &str = "eglCreateSyncKHR";
    /// KHR server wait entry point.
    pub const WAIT_SYNC_KHR: &str = "eglWaitSyncKHR";
    /// Native fence descriptor export entry point.
    pub const DUP_NATIVE_FENCE_FD: &str = "eglDupNativeFenceFDANDROID";
}

/// The first version with sync objects in core.
const CORE_SYNC_VERSION: DriverVersion = DriverVersion::new(1, 5);

/// What a display can do with sync objects.
///
/// Computed once by [`negotiate`](Self::negotiate) and cached on the
/// [`Display`](crate::Display).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncCapabilities {
    /// Entry-point family for sync objects, or `None` if fences are
    /// unavailable.
    pub api: Option<SyncApi>,
    /// Whether GPU-side waits are available.
    pub server_wait: bool,
    /// Whether native (sync-file) fences can be created and imported.
    pub native_fence: bool,
    /// Whether native fence descriptors can be exported.
    pub native_fence_export: bool,
}

impl SyncCapabilities {
    /// A display without any sync support.
    pub const NONE: Self = Self {
        api: None,
        server_wait: false,
        native_fence: false,
        native_fence_export: false,
    };

    /// Queries `driver` and resolves the usable sync paths.
    ///
    /// The core path is preferred. The KHR path is used only when the
    /// version predates core sync objects and the extension's entry points
    /// resolve.
    pub fn negotiate(driver: &dyn SyncDriver) -> Self {
        let api = if driver.version() >= CORE_SYNC_VERSION {
            Some(SyncApi::Core)
        } else if driver.has_extension(ext::KHR_FENCE_SYNC)
            && driver.has_entry_point(ext::CREATE_SYNC_KHR)
        {
            Some(SyncApi::Khr)
        } else {
            None
        };

        let server_wait = match api {
            Some(SyncApi::Core) => true,
            Some(SyncApi::Khr) => {
                driver.has_extension(ext::KHR_WAIT_SYNC)
                    && driver.has_entry_point(ext::WAIT_SYNC_KHR)
            }
            None => false,
        };

        let native_fence = cfg!(unix)
            && api.is_some()
            && driver.has_extension(ext::ANDROID_NATIVE_FENCE_SYNC);
        let native_fence_export = native_fence && driver.has_entry_point(ext::DUP_NATIVE_FENCE_FD);

        Self {
            api,
            server_wait,
            native_fence,
            native_fence_export,
        }
    }
}
