// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channels for the layer store.
//!
//! Each committed scene state mutates layer properties through
//! [`LayerStore`](crate::layer::LayerStore), which marks one of these
//! channels in an [`understory_dirty`] tracker. The next
//! [`evaluate`](crate::layer::LayerStore::evaluate) drains them.
//!
//! [`TRANSFORM`] and [`OPACITY`] propagate eagerly from parent to child
//! because world transforms, effective opacity and effective hidden state are
//! inherited. [`CLIP`] and [`CONTENT`] are local. [`TOPOLOGY`] only requests a
//! traversal rebuild.

use understory_dirty::Channel;

/// Local transform or hidden flag changed.
pub const TRANSFORM: Channel = Channel::new(0);

/// Opacity changed.
pub const OPACITY: Channel = Channel::new(1);

/// Clip shape changed.
pub const CLIP: Channel = Channel::new(2);

/// Bounds or backing store binding changed.
pub const CONTENT: Channel = Channel::new(3);

/// Parent/child links changed, or a layer was created or destroyed.
pub const TOPOLOGY: Channel = Channel::new(4);
