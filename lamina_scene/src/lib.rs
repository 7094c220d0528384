// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A compositing scene for out-of-process rendering.
//!
//! A content producer describes its layer tree as a stream of
//! [`SceneState`] snapshots. A [`CompositingScene`] applies them to a
//! mirrored tree on the control thread and paints that tree through a
//! [`TextureMapper`] on the painting thread:
//!
//! ```text
//!  producer ──SceneState──▶ apply_state_changes ──▶ layer tree ──▶ paint_to_current_context
//!     │                            │                                    │
//!     └─BackingStore::push_buffer  └─SceneClient::add_surface_damage    └─fence wait, draw_layer
//!             │
//!             └─on_new_buffer_available ──▶ add_surface_damage, update_viewport
//! ```
//!
//! Buffers reach the scene through shared [`BackingStore`]s. Each buffer
//! carries the [`GpuFence`](lamina_fence::GpuFence) that marks the end of
//! its rendering, and a paint waits on that fence before sampling it. A
//! buffer published without a fence is made safe by draining the GPU.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Emits commit, paint and fence-wait
//!   events to the installed [`TraceSink`](lamina_core::trace::TraceSink).
//! - `trace-rich` (disabled by default, implies `trace`): Also emits the
//!   damage rectangles of each commit.

mod backing;
mod client;
mod config;
mod fps;
mod mapper;
mod scene;
mod state;

pub use backing::{BackingStore, Compositor};
pub use client::SceneClient;
pub use config::{SHOW_FPS_ENV, SceneConfig};
pub use fps::FpsCounter;
pub use mapper::{LayerPaint, TextureMapper, TextureMapperFactory};
pub use scene::{CompositingScene, Lifecycle};
pub use state::{LayerChange, LayerDelta, LayerId, SceneState};
