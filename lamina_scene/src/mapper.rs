// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The rasterization boundary.

use std::sync::Arc;

use kurbo::Rect;
use lamina_core::transform::Transform3d;
use lamina_render::{BufferHandle, Damage, PaintItem};

use crate::backing::BackingStore;

/// A paint item whose backing is kept alive by reference count.
pub type LayerPaint = PaintItem<Arc<BackingStore>>;

/// Draws layers into the current GPU context.
///
/// Created lazily on the painting thread by a [`TextureMapperFactory`] and
/// only ever used under the scene's painter lock. Implementations must not
/// call back into the scene; other threads may commit while a frame is
/// being drawn.
pub trait TextureMapper: Send {
    /// Starts a frame clipped to `clip`, flipping vertically if `flip_y`.
    ///
    /// `damage` is the region that changed since the last paint.
    /// [`Damage::Full`] is passed when damage propagation is off and on the
    /// first frame of a new mapper.
    fn begin_painting(&mut self, clip: Rect, flip_y: bool, damage: &Damage);

    /// Draws one layer. `buffer` is the backing's current buffer, already
    /// synchronized, or `None` for layers without content.
    fn draw_layer(&mut self, item: &LayerPaint, buffer: Option<BufferHandle>);

    /// Draws the FPS overlay.
    fn draw_fps(&mut self, fps: u32, transform: &Transform3d) {
        _ = (fps, transform);
    }

    /// Finishes the frame.
    fn end_painting(&mut self);

    /// Releases GPU resources before the mapper is dropped.
    fn release_resources(&mut self);
}

/// Creates texture mappers for the current GPU context.
pub trait TextureMapperFactory: Send {
    /// Creates a mapper bound to the current context.
    fn create(&self) -> Box<dyn TextureMapper>;
}

impl<F> TextureMapperFactory for F
where
    F: Fn() -> Box<dyn TextureMapper> + Send,
{
    fn create(&self) -> Box<dyn TextureMapper> {
        self()
    }
}
