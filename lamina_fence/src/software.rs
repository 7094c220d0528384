// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A CPU-emulated GPU timeline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(unix)]
use std::os::fd::OwnedFd;
#[cfg(unix)]
use std::os::unix::net::UnixStream;

use parking_lot::{Condvar, Mutex};

use crate::caps::ext;
use crate::driver::{DriverVersion, RawSync, SyncApi, SyncDriver, SyncKind};
use crate::error::DriverError;

/// What a [`SoftwareDriver`] claims to support.
#[derive(Clone, Copy, Debug)]
pub struct SoftwareConfig {
    /// Reported display version.
    pub version: DriverVersion,
    /// Advertised extensions.
    pub extensions: &'static [&'static str],
    /// Entry points that resolve.
    pub entry_points: &'static [&'static str],
    /// Make every sync creation fail with [`DriverError::NoSync`].
    pub fail_sync_creation: bool,
}

impl SoftwareConfig {
    /// A 1.5 display with native fences and export.
    pub const CORE: Self = Self {
        version: DriverVersion::new(1, 5),
        extensions: &[ext::ANDROID_NATIVE_FENCE_SYNC],
        entry_points: &[ext::DUP_NATIVE_FENCE_FD],
        fail_sync_creation: false,
    };

    /// A 1.4 display with the KHR fence and wait extensions.
    pub const KHR: Self = Self {
        version: DriverVersion::new(1, 4),
        extensions: &[ext::KHR_FENCE_SYNC, ext::KHR_WAIT_SYNC],
        entry_points: &[ext::CREATE_SYNC_KHR, ext::WAIT_SYNC_KHR],
        fail_sync_creation: false,
    };

    /// A 1.4 display without sync objects.
    pub const LEGACY: Self = Self {
        version: DriverVersion::new(1, 4),
        extensions: &[],
        entry_points: &[],
        fail_sync_creation: false,
    };
}

impl Default for SoftwareConfig {
    fn default() -> Self {
        Self::CORE
    }
}

#[derive(Debug)]
struct SyncRecord {
    point: u64,
    #[cfg(unix)]
    fd: Option<OwnedFd>,
}

#[derive(Debug, Default)]
struct Timeline {
    submitted: u64,
    signaled: u64,
    next_sync: u64,
    syncs: HashMap<u64, SyncRecord>,
}

/// A [`SyncDriver`] whose "GPU" is a counter advanced by the caller.
///
/// Work is queued with [`submit`](Self::submit) and completed with
/// [`signal_through`](Self::signal_through) or
/// [`signal_all`](Self::signal_all). A sync object is signaled once the
/// timeline reaches the work submitted before it was created.
/// [`finish`](SyncDriver::finish) completes all submitted work.
///
/// Native fences are backed by real socket descriptors, so exported
/// descriptors can be closed and checked independently.
#[derive(Debug)]
pub struct SoftwareDriver {
    config: SoftwareConfig,
    timeline: Mutex<Timeline>,
    progress: Condvar,
    flushes: AtomicUsize,
    finishes: AtomicUsize,
    client_waits: AtomicUsize,
    server_waits: AtomicUsize,
}

impl SoftwareDriver {
    /// Creates a driver with an idle timeline.
    #[must_use]
    pub fn new(config: SoftwareConfig) -> Self {
        Self {
            config,
            timeline: Mutex::new(Timeline::default()),
            progress: Condvar::new(),
            flushes: AtomicUsize::new(0),
            finishes: AtomicUsize::new(0),
            client_waits: AtomicUsize::new(0),
            server_waits: AtomicUsize::new(0),
        }
    }

    /// Queues one unit of GPU work and returns its timeline point.
    pub fn submit(&self) -> u64 {
        let mut timeline = self.timeline.lock();
        timeline.submitted += 1;
        timeline.submitted
    }

    /// Completes all work up to and including `point`.
    pub fn signal_through(&self, point: u64) {
        let mut timeline = self.timeline.lock();
        let point = point.min(timeline.submitted);
        if point > timeline.signaled {
            timeline.signaled = point;
            self.progress.notify_all();
        }
    }

    /// Completes all submitted work.
    pub fn signal_all(&self) {
        let submitted = self.timeline.lock().submitted;
        self.signal_through(submitted);
    }

    /// Returns the last submitted timeline point.
    #[must_use]
    pub fn submitted(&self) -> u64 {
        self.timeline.lock().submitted
    }

    /// Returns `true` if work through `point` has completed.
    #[must_use]
    pub fn is_signaled(&self, point: u64) -> bool {
        self.timeline.lock().signaled >= point
    }

    /// Number of [`flush`](SyncDriver::flush) calls.
    #[must_use]
    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::Relaxed)
    }

    /// Number of [`finish`](SyncDriver::finish) calls.
    #[must_use]
    pub fn finishes(&self) -> usize {
        self.finishes.load(Ordering::Relaxed)
    }

    /// Number of CPU-side waits.
    #[must_use]
    pub fn client_waits(&self) -> usize {
        self.client_waits.load(Ordering::Relaxed)
    }

    /// Number of GPU-side waits.
    #[must_use]
    pub fn server_waits(&self) -> usize {
        self.server_waits.load(Ordering::Relaxed)
    }

    /// Number of sync objects not yet destroyed.
    #[must_use]
    pub fn live_syncs(&self) -> usize {
        self.timeline.lock().syncs.len()
    }
}

impl SyncDriver for SoftwareDriver {
    fn version(&self) -> DriverVersion {
        self.config.version
    }

    fn has_extension(&self, name: &str) -> bool {
        self.config.extensions.contains(&name)
    }

    fn has_entry_point(&self, name: &str) -> bool {
        self.config.entry_points.contains(&name)
    }

    fn flush(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    fn finish(&self) {
        self.finishes.fetch_add(1, Ordering::Relaxed);
        self.signal_all();
    }

    fn create_sync(&self, _api: SyncApi, kind: SyncKind) -> Result<RawSync, DriverError> {
        if self.config.fail_sync_creation {
            return Err(DriverError::NoSync);
        }
        #[cfg(unix)]
        let fd = match kind {
            SyncKind::Fence => None,
            SyncKind::NativeFence => {
                let (ours, _peer) = UnixStream::pair()?;
                Some(OwnedFd::from(ours))
            }
            SyncKind::ImportedNativeFence(fd) => Some(fd),
        };
        #[cfg(not(unix))]
        let SyncKind::Fence = kind;

        let mut timeline = self.timeline.lock();
        timeline.next_sync += 1;
        let id = timeline.next_sync;
        let point = timeline.submitted;
        timeline.syncs.insert(
            id,
            SyncRecord {
                point,
                #[cfg(unix)]
                fd,
            },
        );
        Ok(RawSync(id))
    }

    fn destroy_sync(&self, _api: SyncApi, sync: RawSync) {
        self.timeline.lock().syncs.remove(&sync.0);
    }

    fn client_wait_sync(&self, _api: SyncApi, sync: RawSync) {
        self.client_waits.fetch_add(1, Ordering::Relaxed);
        let mut timeline = self.timeline.lock();
        let Some(point) = timeline.syncs.get(&sync.0).map(|s| s.point) else {
            return;
        };
        while timeline.signaled < point {
            self.progress.wait(&mut timeline);
        }
    }

    fn server_wait_sync(&self, _api: SyncApi, _sync: RawSync) {
        self.server_waits.fetch_add(1, Ordering::Relaxed);
    }

    #[cfg(unix)]
    fn dup_native_fence_fd(&self, sync: RawSync) -> Result<OwnedFd, DriverError> {
        let timeline = self.timeline.lock();
        let fd = timeline
            .syncs
            .get(&sync.0)
            .and_then(|s| s.fd.as_ref())
            .ok_or(DriverError::BadFd)?;
        Ok(fd.try_clone()?)
    }
}
