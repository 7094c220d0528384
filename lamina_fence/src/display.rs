// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::caps::SyncCapabilities;
use crate::driver::SyncDriver;

/// A display connection with its negotiated sync capabilities.
///
/// Cloning is cheap; clones share the driver and the cached capabilities.
#[derive(Clone, Debug)]
pub struct Display {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    driver: Arc<dyn SyncDriver>,
    caps: SyncCapabilities,
    server_wait_fallback_logged: AtomicBool,
}

impl Display {
    /// Wraps `driver`, negotiating its capabilities once.
    pub fn new(driver: Arc<dyn SyncDriver>) -> Self {
        let caps = SyncCapabilities::negotiate(&*driver);
        log::info!(
            "display {}: sync api {:?}, server wait {}, native fence {}, export {}",
            driver.version(),
            caps.api,
            caps.server_wait,
            caps.native_fence,
            caps.native_fence_export,
        );
        Self {
            shared: Arc::new(Shared {
                driver,
                caps,
                server_wait_fallback_logged: AtomicBool::new(false),
            }),
        }
    }

    /// Returns the cached capabilities.
    #[must_use]
    pub fn capabilities(&self) -> SyncCapabilities {
        self.shared.caps
    }

    /// Returns the driver.
    #[must_use]
    pub fn driver(&self) -> &dyn SyncDriver {
        &*self.shared.driver
    }

    /// Blocks until all submitted GPU work has completed.
    ///
    /// This is the wait of last resort for buffers produced without a
    /// fence.
    pub fn finish(&self) {
        self.shared.driver.finish();
    }

    /// Returns `true` the first time it is called for this display.
    pub(crate) fn first_server_wait_fallback(&self) -> bool {
        !self
            .shared
            .server_wait_fallback_logged
            .swap(true, Ordering::Relaxed)
    }
}
