// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer tree and trace contract for the lamina compositor.
//!
//! `lamina_core` holds the data model a compositing scene mirrors from its
//! producer: a struct-of-arrays layer tree with generational handles, the
//! dirty channels that drive incremental evaluation, and the trace contract
//! the scene reports through. It is `no_std` compatible (with `alloc`).
//!
//! ```text
//!   SceneState ──► CompositingScene::commit ──► LayerStore mutations
//!                                                     │
//!                                  LayerStore::evaluate()
//!                                                     │
//!                           FrameChanges (damage, changed layers)
//! ```
//!
//! **[`layer`]**: Struct-of-arrays layer tree with generational handles.
//! Local properties are set by commits; world transforms, effective opacity,
//! effective hidden state and world bounds are computed by evaluation.
//!
//! **[`dirty`]**: Multi-channel dirty tracking via `understory_dirty`.
//!
//! **[`transform`]**: 4×4 transform type for layer and view matrices.
//!
//! **[`time`]**: Scene-local monotonic timestamps.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types,
//! with the zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies.
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-commit
//!   damage-rect events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod dirty;
pub mod layer;
pub mod time;
pub mod trace;
pub mod transform;
