// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Opaque handles for producer-owned GPU buffers.

use core::fmt;

/// An opaque handle to a GPU buffer (texture, dmabuf-backed image, ...).
///
/// Buffer handles are minted by the buffer-management component and handed
/// to the texture mapper unchanged. Neither the scene nor this crate
/// interprets the value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferHandle(pub u64);

impl fmt::Debug for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BufferHandle({:#x})", self.0)
    }
}
