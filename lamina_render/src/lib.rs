// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint plans and damage tracking for lamina.
//!
//! This crate sits between [`lamina_core`]'s evaluated layer tree and the
//! texture mapper that rasterizes it. It defines:
//!
//! - [`PaintItem`]: one layer to draw, with its root-space transform
//! - [`PaintPlan`]: the back-to-front list of items for one paint
//! - [`Damage`] and [`Propagation`]: accumulated invalidation and how it is
//!   reported to the embedder
//! - [`BufferHandle`]: opaque handle for a producer-owned GPU buffer

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod damage;
mod plan;
mod resource;

pub use damage::{Damage, Propagation};
pub use plan::{PaintItem, PaintPlan};
pub use resource::BufferHandle;
