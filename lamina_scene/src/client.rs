// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use lamina_render::Damage;

/// The embedder of a [`CompositingScene`](crate::CompositingScene).
///
/// A windowed view and a headless renderer implement this differently.
/// Callbacks run with the scene's control lock held, so they must not call
/// back into the scene.
pub trait SceneClient: Send + Sync {
    /// A new frame is ready; schedule a redraw.
    fn update_viewport(&self);

    /// Reports damage accumulated by commits and returns the region the
    /// next paint must cover.
    ///
    /// Only called when damage propagation is enabled. The default accepts
    /// the damage as is.
    fn add_surface_damage(&self, damage: &Damage) -> Damage {
        damage.clone()
    }
}
