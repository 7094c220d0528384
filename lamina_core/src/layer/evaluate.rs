// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Evaluation and change tracking.
//!
//! Each dirty channel is drained and recomputed in parent-before-child order:
//!
//! 1. **TRANSFORM**: `world_transform = parent_world * local_transform`,
//!    `effective_hidden = parent_hidden || flags.hidden`, and world bounds.
//! 2. **OPACITY**: `effective_opacity = parent_effective * local_opacity`.
//! 3. **CLIP** / **CONTENT**: collected; content changes also refresh world
//!    bounds because bounds live on that channel.
//! 4. **TOPOLOGY**: drained and discarded (the traversal order was already
//!    rebuilt).
//!
//! Every recomputation that can change pixels also records the affected
//! root-space rectangles, old and new, in [`FrameChanges::damage`].

use alloc::vec::Vec;

use kurbo::Rect;

use super::id::INVALID;
use super::store::LayerStore;
use crate::dirty;
use crate::transform::Transform3d;

/// The set of changes produced by a single [`LayerStore::evaluate`] call.
///
/// Index lists hold raw slot indices. Scenes translate them back to handles
/// only when they need to.
#[derive(Clone, Debug, Default)]
pub struct FrameChanges {
    /// Layers whose world transform was recomputed.
    pub transforms: Vec<u32>,
    /// Layers whose effective opacity was recomputed.
    pub opacities: Vec<u32>,
    /// Layers whose clip shape changed.
    pub clips: Vec<u32>,
    /// Layers whose bounds or backing changed.
    pub content: Vec<u32>,
    /// Layers that transitioned from visible to effectively hidden.
    pub hidden: Vec<u32>,
    /// Layers that transitioned from effectively hidden to visible.
    pub unhidden: Vec<u32>,
    /// Layers added since the last evaluate.
    pub added: Vec<u32>,
    /// Layers removed since the last evaluate.
    pub removed: Vec<u32>,
    /// Root-space rectangles whose pixels may differ from the last evaluate.
    pub damage: Vec<Rect>,
    /// Whether the tree topology changed (traversal order was rebuilt).
    pub topology_changed: bool,
}

impl FrameChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.transforms.clear();
        self.opacities.clear();
        self.clips.clear();
        self.content.clear();
        self.hidden.clear();
        self.unhidden.clear();
        self.added.clear();
        self.removed.clear();
        self.damage.clear();
        self.topology_changed = false;
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
            && self.opacities.is_empty()
            && self.clips.is_empty()
            && self.content.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && self.damage.is_empty()
            && !self.topology_changed
    }
}

impl LayerStore {
    /// Evaluates the layer tree, recomputing dirty properties and returning
    /// the set of changes.
    pub fn evaluate(&mut self) -> FrameChanges {
        let mut changes = FrameChanges::default();
        self.evaluate_into(&mut changes);
        changes
    }

    /// Like [`evaluate`](Self::evaluate), but reuses a caller-provided buffer.
    pub fn evaluate_into(&mut self, changes: &mut FrameChanges) {
        changes.clear();
        core::mem::swap(&mut self.pending_exposed, &mut changes.damage);

        if self.traversal_dirty {
            self.rebuild_traversal_order();
            changes.topology_changed = true;
            self.traversal_dirty = false;
        }

        let dirty_transforms: Vec<u32> = self
            .dirty
            .drain(dirty::TRANSFORM)
            .affected()
            .deterministic()
            .run()
            .collect();
        for &idx in &dirty_transforms {
            let i = idx as usize;
            let parent_idx = self.parent[i];
            let (parent_world, parent_hidden) = if parent_idx != INVALID {
                (
                    self.world_transform[parent_idx as usize],
                    self.effective_hidden[parent_idx as usize],
                )
            } else {
                (Transform3d::IDENTITY, false)
            };
            self.world_transform[i] = parent_world * self.local_transform[i];

            let old_hidden = self.effective_hidden[i];
            let new_hidden = parent_hidden || self.flags[i].hidden;
            if new_hidden != old_hidden {
                if new_hidden {
                    changes.hidden.push(idx);
                } else {
                    changes.unhidden.push(idx);
                }
                self.effective_hidden[i] = new_hidden;
            }

            let old_bounds = self.world_bounds[i];
            self.world_bounds[i] = self.world_transform[i].map_rect_bounds(self.bounds[i]);
            if old_bounds != self.world_bounds[i] || old_hidden != new_hidden {
                if !old_hidden {
                    push_damage(&mut changes.damage, old_bounds);
                }
                if !new_hidden {
                    push_damage(&mut changes.damage, self.world_bounds[i]);
                }
            }
        }
        changes.transforms = dirty_transforms;

        let dirty_opacities: Vec<u32> = self
            .dirty
            .drain(dirty::OPACITY)
            .affected()
            .deterministic()
            .run()
            .collect();
        for &idx in &dirty_opacities {
            let i = idx as usize;
            let parent_opacity = if self.parent[i] != INVALID {
                self.effective_opacity[self.parent[i] as usize]
            } else {
                1.0
            };
            let new_opacity = parent_opacity * self.local_opacity[i];
            if new_opacity != self.effective_opacity[i] && !self.effective_hidden[i] {
                push_damage(&mut changes.damage, self.world_bounds[i]);
            }
            self.effective_opacity[i] = new_opacity;
        }
        changes.opacities = dirty_opacities;

        changes.clips = self
            .dirty
            .drain(dirty::CLIP)
            .deterministic()
            .run()
            .collect();
        for &idx in &changes.clips {
            if !self.effective_hidden[idx as usize] {
                push_damage(&mut changes.damage, self.world_bounds[idx as usize]);
            }
        }

        changes.content = self
            .dirty
            .drain(dirty::CONTENT)
            .deterministic()
            .run()
            .collect();
        for &idx in &changes.content {
            let i = idx as usize;
            let old_bounds = self.world_bounds[i];
            self.world_bounds[i] = self.world_transform[i].map_rect_bounds(self.bounds[i]);
            if !self.effective_hidden[i] {
                push_damage(&mut changes.damage, old_bounds);
                if old_bounds != self.world_bounds[i] {
                    push_damage(&mut changes.damage, self.world_bounds[i]);
                }
            }
        }

        let _: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();

        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);
    }

    /// Returns the current traversal order (depth-first pre-order over all
    /// parentless layers).
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn traversal_order(&self) -> &[u32] {
        &self.traversal_order
    }

    fn rebuild_traversal_order(&mut self) {
        self.traversal_order.clear();
        for idx in 0..self.len {
            if self.parent[idx as usize] == INVALID && self.alive[idx as usize] {
                self.dfs_collect(idx);
            }
        }
    }

    fn dfs_collect(&mut self, idx: u32) {
        self.traversal_order.push(idx);
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            self.dfs_collect(child);
            child = self.next_sibling[child as usize];
        }
    }
}

/// Records `rect` unless it is empty or already present.
fn push_damage(damage: &mut Vec<Rect>, rect: Rect) {
    if rect.area() > 0.0 && !damage.contains(&rect) {
        damage.push(rect);
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::*;
    use crate::layer::{BackingId, LayerFlags};

    #[test]
    fn evaluate_computes_world_transforms() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let child = store.create_layer();

        let parent_xf = Transform3d::from_translation(10.0, 0.0, 0.0);
        let child_xf = Transform3d::from_translation(0.0, 5.0, 0.0);

        store.set_transform(parent, parent_xf);
        store.set_transform(child, child_xf);
        store.add_child(parent, child);

        let _ = store.evaluate();

        assert_eq!(store.world_transform(parent), parent_xf);
        assert_eq!(store.world_transform(child), parent_xf * child_xf);
    }

    #[test]
    fn evaluate_computes_effective_opacity() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let child = store.create_layer();

        store.set_opacity(parent, 0.5);
        store.set_opacity(child, 0.8);
        store.add_child(parent, child);

        let _ = store.evaluate();

        let eps = 1e-6;
        assert!((store.effective_opacity(child) - 0.4).abs() < eps);
    }

    #[test]
    fn no_change_evaluate_returns_empty() {
        let mut store = LayerStore::new();
        let _root = store.create_layer();
        let _ = store.evaluate();

        let changes = store.evaluate();
        assert!(changes.is_empty(), "second evaluate saw {changes:?}");
    }

    #[test]
    fn moving_a_layer_damages_old_and_new_bounds() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        store.set_bounds(id, Rect::new(0.0, 0.0, 10.0, 10.0));
        let first = store.evaluate();
        assert_eq!(first.damage, [Rect::new(0.0, 0.0, 10.0, 10.0)]);

        store.set_transform(id, Transform3d::from_translation(100.0, 0.0, 0.0));
        let changes = store.evaluate();
        assert!(changes.damage.contains(&Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert!(changes.damage.contains(&Rect::new(100.0, 0.0, 110.0, 10.0)));
        assert_eq!(
            store.world_bounds(id),
            Rect::new(100.0, 0.0, 110.0, 10.0)
        );
    }

    #[test]
    fn destroying_a_layer_damages_its_last_bounds() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        store.set_bounds(id, Rect::new(5.0, 5.0, 15.0, 15.0));
        let _ = store.evaluate();

        store.destroy_layer(id);
        let changes = store.evaluate();
        assert_eq!(changes.removed, [id.index()]);
        assert_eq!(changes.damage, [Rect::new(5.0, 5.0, 15.0, 15.0)]);
    }

    #[test]
    fn hidden_parent_hides_children_without_damage_for_hidden_bounds() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let child = store.create_layer();
        store.add_child(parent, child);
        store.set_bounds(child, Rect::new(0.0, 0.0, 4.0, 4.0));
        let _ = store.evaluate();

        store.set_flags(parent, LayerFlags { hidden: true });
        let changes = store.evaluate();
        assert!(changes.hidden.contains(&child.index()));
        assert!(store.effective_hidden(child));

        // Content changes under a hidden ancestor produce no damage.
        store.set_backing(child, Some(BackingId(1)));
        let changes = store.evaluate();
        assert!(changes.damage.is_empty(), "damage was {:?}", changes.damage);
    }

    #[test]
    fn traversal_order_is_depth_first() {
        let mut store = LayerStore::new();
        let a = store.create_layer();
        let b = store.create_layer();
        let c = store.create_layer();
        let d = store.create_layer();

        store.add_child(a, b);
        store.add_child(a, c);
        store.add_child(b, d);

        let _ = store.evaluate();
        assert_eq!(
            store.traversal_order(),
            &[a.index(), b.index(), d.index(), c.index()]
        );
    }
}
