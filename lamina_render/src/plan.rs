// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint plan: an ordered sequence of layers to draw for one paint.

use alloc::vec::Vec;

use lamina_core::layer::{ClipShape, LayerHandle, LayerStore};
use lamina_core::transform::Transform3d;

/// A single layer to draw.
///
/// `B` is whatever the scene uses to keep the layer's backing alive for the
/// duration of the paint (typically a reference-counted backing store).
#[derive(Clone, Debug)]
pub struct PaintItem<B> {
    /// The layer this item originates from.
    pub layer: LayerHandle,
    /// The backing to sample, if the layer has one.
    pub backing: Option<B>,
    /// `view * world` transform of the layer.
    pub transform: Transform3d,
    /// Effective opacity (0.0–1.0, accumulated from ancestors).
    pub opacity: f32,
    /// Clip shape in layer-local coordinates, if any.
    pub clip: Option<ClipShape>,
    /// Layer-local bounds of the content.
    pub bounds: kurbo::Rect,
}

/// The back-to-front list of items for a single paint.
///
/// A plan is built while the layer tree is locked and consumed after the
/// lock is released, so it owns everything the draw needs.
#[derive(Clone, Debug)]
pub struct PaintPlan<B> {
    /// Items in back-to-front order.
    pub items: Vec<PaintItem<B>>,
}

impl<B> Default for PaintPlan<B> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<B> PaintPlan<B> {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a plan from the evaluated subtree rooted at `root`.
    ///
    /// Effectively hidden layers are skipped, as are layers whose effective
    /// opacity is zero. `view` is pre-multiplied into every item transform.
    /// `backing_for` resolves a layer's backing, if any.
    pub fn build(
        store: &LayerStore,
        root: LayerHandle,
        view: Transform3d,
        mut backing_for: impl FnMut(LayerHandle) -> Option<B>,
    ) -> Self {
        let mut items = Vec::new();
        for layer in store.subtree(root) {
            if store.effective_hidden(layer) {
                continue;
            }
            let opacity = store.effective_opacity(layer);
            if opacity <= 0.0 {
                continue;
            }
            items.push(PaintItem {
                layer,
                backing: backing_for(layer),
                transform: view * store.world_transform(layer),
                opacity,
                clip: store.clip(layer),
                bounds: store.bounds(layer),
            });
        }
        Self { items }
    }

    /// Returns the number of items that sample a backing.
    #[must_use]
    pub fn backed_items(&self) -> usize {
        self.items.iter().filter(|i| i.backing.is_some()).count()
    }

    /// Returns `true` if the plan draws nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use lamina_core::layer::LayerFlags;

    use super::*;

    #[test]
    fn build_skips_hidden_subtrees_and_applies_view() {
        let mut store = LayerStore::new();
        let root = store.create_layer();
        let a = store.create_layer();
        let b = store.create_layer();
        let b_child = store.create_layer();
        store.add_child(root, a);
        store.add_child(root, b);
        store.add_child(b, b_child);
        store.set_transform(a, Transform3d::from_translation(5.0, 0.0, 0.0));
        store.set_flags(b, LayerFlags { hidden: true });
        let _ = store.evaluate();

        let view = Transform3d::from_scale(2.0, 2.0, 1.0);
        let plan = PaintPlan::build(&store, root, view, |l| (l == a).then_some(7_u8));

        let layers: Vec<_> = plan.items.iter().map(|i| i.layer).collect();
        assert_eq!(layers, [root, a]);
        assert_eq!(plan.backed_items(), 1);
        assert_eq!(
            plan.items[1].transform,
            view * Transform3d::from_translation(5.0, 0.0, 0.0)
        );
    }

    #[test]
    fn build_skips_transparent_layers() {
        let mut store = LayerStore::new();
        let root = store.create_layer();
        let faded = store.create_layer();
        store.add_child(root, faded);
        store.set_opacity(faded, 0.0);
        let _ = store.evaluate();

        let plan: PaintPlan<()> = PaintPlan::build(&store, root, Transform3d::IDENTITY, |_| None);
        assert_eq!(plan.items.len(), 1);
    }
}
