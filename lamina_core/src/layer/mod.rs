// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer tree data model.
//!
//! The compositor mirrors the producer's layer tree in a [`LayerStore`]. Each
//! layer has:
//!
//! - A store handle ([`LayerHandle`]) that goes stale once the layer is
//!   destroyed. The producer's stable layer ids are mapped onto handles by the
//!   scene; the store never sees them.
//! - Topology: parent, first-child, and sibling links forming an ordered tree.
//! - **Local properties** written by commits: transform, opacity, clip,
//!   bounds, backing binding, and flags.
//! - **Computed properties** produced by [`evaluate`](LayerStore::evaluate):
//!   world transform, effective opacity, effective hidden state, and world
//!   bounds.
//!
//! Layers are stored in struct-of-arrays layout with index-based handles.

mod clip;
mod evaluate;
mod id;
mod store;
mod traverse;

pub use clip::ClipShape;
pub use evaluate::FrameChanges;
pub use id::{BackingId, INVALID, LayerHandle};
pub use store::{LayerFlags, LayerStore};
pub use traverse::{Children, Subtree};
