// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Store handles and backing identities.

use core::fmt;

/// Sentinel value meaning "no layer" in index fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to a layer slot in a [`LayerStore`](super::LayerStore).
///
/// Carries a generation counter so a handle kept past
/// [`destroy_layer`](super::LayerStore::destroy_layer) is detected instead of
/// silently aliasing whichever layer reuses the slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerHandle {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl LayerHandle {
    /// Returns the raw slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for LayerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerHandle({}@gen{})", self.idx, self.generation)
    }
}

/// Identity of an externally managed backing store bound to a layer.
///
/// The store only records which backing a layer presents; pixel storage and
/// GPU buffers live with the buffer-management component.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BackingId(pub u64);

impl fmt::Debug for BackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BackingId({})", self.0)
    }
}
