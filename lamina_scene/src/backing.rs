// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backing stores: per-layer buffer slots guarded by GPU fences.

use std::sync::Weak;
use std::sync::atomic::{AtomicU64, Ordering};

use lamina_core::layer::BackingId;
use lamina_core::trace::WaitKind;
use lamina_fence::{Display, GpuFence};
use lamina_render::BufferHandle;
use parking_lot::Mutex;

/// Receives new-buffer notifications from active backing stores.
pub trait Compositor: Send + Sync {
    /// `backing` received a buffer. The layers showing it are damaged and a
    /// redraw should be scheduled.
    fn on_new_buffer_available(&self, backing: BackingId);
}

static NEXT_BACKING_ID: AtomicU64 = AtomicU64::new(1);

/// The buffer slot presented by one layer.
///
/// Shared as `Arc<BackingStore>` between the producer, the scene registry
/// and in-flight paints. All mutable state sits behind one lock.
#[derive(Debug)]
pub struct BackingStore {
    id: BackingId,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    buffer: Option<BufferHandle>,
    fence: Option<GpuFence>,
    unsynchronized: bool,
    compositor: Option<Weak<dyn Compositor>>,
}

impl std::fmt::Debug for Inner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inner")
            .field("buffer", &self.buffer)
            .field("fence", &self.fence)
            .field("unsynchronized", &self.unsynchronized)
            .field("active", &self.compositor.is_some())
            .finish()
    }
}

impl Default for BackingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BackingStore {
    /// Creates an empty backing store with a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: BackingId(NEXT_BACKING_ID.fetch_add(1, Ordering::Relaxed)),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Returns the store's identity.
    #[must_use]
    pub fn id(&self) -> BackingId {
        self.id
    }

    /// Publishes a new buffer.
    ///
    /// `fence` marks the end of the producer's rendering into `buffer`.
    /// Pass `None` when fence creation failed; the next paint then waits
    /// for all GPU work before sampling. The bound compositor, if any, is
    /// notified after the store is unlocked.
    pub fn push_buffer(&self, buffer: BufferHandle, fence: Option<GpuFence>) {
        let compositor = {
            let mut inner = self.inner.lock();
            inner.buffer = Some(buffer);
            inner.unsynchronized = fence.is_none();
            inner.fence = fence;
            inner.compositor.as_ref().and_then(Weak::upgrade)
        };
        if let Some(compositor) = compositor {
            compositor.on_new_buffer_available(self.id);
        }
    }

    /// Returns the current buffer after making it safe to sample.
    ///
    /// A pending fence is server-waited, which falls back to a client wait
    /// on displays without server-wait support. A buffer published without
    /// a fence costs a [`Display::finish`]. Each published buffer is waited
    /// for once. Returns the buffer and the kind of wait performed.
    pub fn prepare_for_sampling(
        &self,
        display: &Display,
    ) -> (Option<BufferHandle>, Option<WaitKind>) {
        let (buffer, fence, unsynchronized) = {
            let mut inner = self.inner.lock();
            let unsynchronized = std::mem::take(&mut inner.unsynchronized);
            (inner.buffer, inner.fence.take(), unsynchronized)
        };
        let wait = if let Some(fence) = fence {
            fence.server_wait();
            Some(if display.capabilities().server_wait {
                WaitKind::Server
            } else {
                WaitKind::Client
            })
        } else if unsynchronized {
            log::debug!("{:?} has no fence, finishing all GPU work", self.id);
            display.finish();
            Some(WaitKind::Finish)
        } else {
            None
        };
        (buffer, wait)
    }

    /// Returns the current buffer.
    #[must_use]
    pub fn buffer(&self) -> Option<BufferHandle> {
        self.inner.lock().buffer
    }

    /// Returns `true` if the current buffer still needs a wait.
    #[must_use]
    pub fn needs_wait(&self) -> bool {
        let inner = self.inner.lock();
        inner.fence.is_some() || inner.unsynchronized
    }

    /// Drops the buffer and any pending fence.
    pub fn release_gpu_resources(&self) {
        let mut inner = self.inner.lock();
        inner.buffer = None;
        inner.fence = None;
        inner.unsynchronized = false;
    }

    /// Binds the store to a compositor for new-buffer notifications.
    pub fn activate(&self, compositor: Weak<dyn Compositor>) {
        self.inner.lock().compositor = Some(compositor);
    }

    /// Unbinds the store from its compositor.
    pub fn deactivate(&self) {
        self.inner.lock().compositor = None;
    }

    /// Returns `true` if the store is bound to a compositor.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.lock().compositor.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use lamina_fence::{SoftwareConfig, SoftwareDriver};

    use super::*;

    #[derive(Default)]
    struct CountingCompositor(AtomicUsize);

    impl Compositor for CountingCompositor {
        fn on_new_buffer_available(&self, _backing: BackingId) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn display(config: SoftwareConfig) -> (Arc<SoftwareDriver>, Display) {
        let driver = Arc::new(SoftwareDriver::new(config));
        (driver.clone(), Display::new(driver))
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(BackingStore::new().id(), BackingStore::new().id());
    }

    #[test]
    fn push_notifies_only_while_active() {
        let compositor = Arc::new(CountingCompositor::default());
        let backing = BackingStore::new();
        backing.push_buffer(BufferHandle(1), None);
        assert_eq!(compositor.0.load(Ordering::Relaxed), 0);

        let weak: Weak<dyn Compositor> = Arc::downgrade(&compositor) as Weak<dyn Compositor>;
        backing.activate(weak);
        backing.push_buffer(BufferHandle(2), None);
        assert_eq!(compositor.0.load(Ordering::Relaxed), 1);

        backing.deactivate();
        backing.push_buffer(BufferHandle(3), None);
        assert_eq!(compositor.0.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn fenced_buffer_is_server_waited_once() {
        let (driver, display) = display(SoftwareConfig::CORE);
        let backing = BackingStore::new();
        let fence = GpuFence::create(&display).unwrap();
        backing.push_buffer(BufferHandle(9), Some(fence));
        assert!(backing.needs_wait());

        let (buffer, wait) = backing.prepare_for_sampling(&display);
        assert_eq!(buffer, Some(BufferHandle(9)));
        assert_eq!(wait, Some(WaitKind::Server));
        assert_eq!(driver.server_waits(), 1);
        assert_eq!(driver.live_syncs(), 0);

        let (buffer, wait) = backing.prepare_for_sampling(&display);
        assert_eq!(buffer, Some(BufferHandle(9)));
        assert_eq!(wait, None);
    }

    #[test]
    fn unfenced_buffer_finishes_gpu_work() {
        let (driver, display) = display(SoftwareConfig::CORE);
        let backing = BackingStore::new();
        driver.submit();
        backing.push_buffer(BufferHandle(4), None);

        let (_, wait) = backing.prepare_for_sampling(&display);
        assert_eq!(wait, Some(WaitKind::Finish));
        assert_eq!(driver.finishes(), 1);
        assert!(driver.is_signaled(driver.submitted()));
    }

    #[test]
    fn release_drops_buffer_and_fence() {
        let (driver, display) = display(SoftwareConfig::CORE);
        let backing = BackingStore::new();
        backing.push_buffer(BufferHandle(5), GpuFence::create(&display).ok());
        backing.release_gpu_resources();
        assert_eq!(backing.buffer(), None);
        assert!(!backing.needs_wait());
        assert_eq!(driver.live_syncs(), 0);
    }
}
