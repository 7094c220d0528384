// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays layer storage with allocation, topology, and property management.

use alloc::vec::Vec;

use kurbo::Rect;
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use crate::dirty;
use crate::transform::Transform3d;

use super::clip::ClipShape;
use super::id::{BackingId, INVALID, LayerHandle};
use super::traverse::{Children, Subtree};

/// Per-layer boolean flags.
///
/// A [`hidden`](Self::hidden) layer contributes nothing to painting, and
/// neither does its subtree. Properties can still be committed while hidden.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LayerFlags {
    /// Whether the layer (and its subtree) is hidden.
    pub hidden: bool,
}

/// Struct-of-arrays storage for all layers of one scene.
///
/// Destroyed slots are recycled through a free list; generation counters make
/// stale [`LayerHandle`]s fail validation.
#[derive(Debug)]
pub struct LayerStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Local properties (written by commits) --
    pub(crate) local_transform: Vec<Transform3d>,
    pub(crate) local_opacity: Vec<f32>,
    pub(crate) clip: Vec<Option<ClipShape>>,
    pub(crate) bounds: Vec<Rect>,
    pub(crate) backing: Vec<Option<BackingId>>,
    pub(crate) flags: Vec<LayerFlags>,

    // -- Computed properties (written by evaluate) --
    pub(crate) world_transform: Vec<Transform3d>,
    pub(crate) effective_opacity: Vec<f32>,
    pub(crate) effective_hidden: Vec<bool>,
    pub(crate) world_bounds: Vec<Rect>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Traversal cache --
    pub(crate) traversal_order: Vec<u32>,
    pub(crate) traversal_dirty: bool,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,
    pub(crate) pending_exposed: Vec<Rect>,
}

impl Default for LayerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerStore {
    /// Creates an empty layer store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            local_transform: Vec::new(),
            local_opacity: Vec::new(),
            clip: Vec::new(),
            bounds: Vec::new(),
            backing: Vec::new(),
            flags: Vec::new(),
            world_transform: Vec::new(),
            effective_opacity: Vec::new(),
            effective_hidden: Vec::new(),
            world_bounds: Vec::new(),
            generation: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            traversal_order: Vec::new(),
            traversal_dirty: true,
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
            pending_exposed: Vec::new(),
        }
    }

    // -- Allocation API --

    /// Creates a new layer and returns its handle.
    ///
    /// The layer starts with an identity transform, full opacity, empty
    /// bounds, no clip, no backing, and no parent.
    pub fn create_layer(&mut self) -> LayerHandle {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.local_transform[i] = Transform3d::IDENTITY;
            self.local_opacity[i] = 1.0;
            self.clip[i] = None;
            self.bounds[i] = Rect::ZERO;
            self.backing[i] = None;
            self.flags[i] = LayerFlags::default();
            self.world_transform[i] = Transform3d::IDENTITY;
            self.effective_opacity[i] = 1.0;
            self.effective_hidden[i] = false;
            self.world_bounds[i] = Rect::ZERO;
            self.alive[i] = true;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.local_transform.push(Transform3d::IDENTITY);
            self.local_opacity.push(1.0);
            self.clip.push(None);
            self.bounds.push(Rect::ZERO);
            self.backing.push(None);
            self.flags.push(LayerFlags::default());
            self.world_transform.push(Transform3d::IDENTITY);
            self.effective_opacity.push(1.0);
            self.effective_hidden.push(false);
            self.world_bounds.push(Rect::ZERO);
            self.generation.push(0);
            self.alive.push(true);
            idx
        };

        self.traversal_dirty = true;
        self.pending_added.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);
        // A fresh slot still needs its world properties computed.
        self.mark_subtree_inherited_dirty(idx);

        self.handle_at(idx)
    }

    /// Destroys a layer, freeing its slot for reuse.
    ///
    /// The pixels the layer last covered are reported as damage by the next
    /// [`evaluate`](Self::evaluate).
    ///
    /// # Panics
    ///
    /// Panics if the layer has children (detach them first) or if the handle
    /// is stale.
    pub fn destroy_layer(&mut self, id: LayerHandle) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy layer with children"
        );

        if self.parent[idx as usize] != INVALID {
            self.unlink_from_parent(idx);
        }

        self.dirty.remove_key(idx);

        if !self.effective_hidden[idx as usize] {
            self.expose(self.world_bounds[idx as usize]);
        }

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;
        self.alive[idx as usize] = false;

        self.free_list.push(idx);
        self.traversal_dirty = true;
        self.pending_removed.push(idx);
    }

    /// Returns whether the given handle refers to a live layer.
    #[must_use]
    pub fn is_alive(&self, id: LayerHandle) -> bool {
        id.idx < self.len
            && self.generation[id.idx as usize] == id.generation
            && self.alive[id.idx as usize]
    }

    /// Returns the number of live layers.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.alive.iter().filter(|a| **a).count()
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if `child` already has a parent.
    pub fn add_child(&mut self, parent: LayerHandle, child: LayerHandle) {
        self.validate(parent);
        self.validate(child);
        assert!(
            self.parent[child.idx as usize] == INVALID,
            "child already has a parent"
        );
        self.link_last(parent.idx, child.idx);
    }

    /// Removes `child` from its current parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the layer has no parent.
    pub fn remove_from_parent(&mut self, child: LayerHandle) {
        self.validate(child);
        let c = child.idx;
        assert!(self.parent[c as usize] != INVALID, "layer has no parent");
        self.detach_idx(c);
    }

    /// Moves `child` to be the last child of `new_parent`, detaching it from
    /// its current parent first.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if `new_parent` lies inside the
    /// subtree of `child` (check with [`is_ancestor`](Self::is_ancestor)).
    pub fn reparent(&mut self, child: LayerHandle, new_parent: LayerHandle) {
        self.validate(child);
        self.validate(new_parent);
        assert!(
            !self.is_ancestor(child, new_parent),
            "reparenting would create a cycle"
        );
        if self.parent[child.idx as usize] != INVALID {
            self.detach_idx(child.idx);
        }
        self.link_last(new_parent.idx, child.idx);
    }

    /// Returns `true` if `ancestor` is `id` itself or one of its ancestors.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: LayerHandle, id: LayerHandle) -> bool {
        self.validate(ancestor);
        self.validate(id);
        let mut cur = id.idx;
        while cur != INVALID {
            if cur == ancestor.idx {
                return true;
            }
            cur = self.parent[cur as usize];
        }
        false
    }

    /// Returns the parent of a layer, if any.
    #[must_use]
    pub fn parent(&self, id: LayerHandle) -> Option<LayerHandle> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.handle_at(p))
    }

    /// Returns an iterator over the direct children of a layer.
    #[must_use]
    pub fn children(&self, id: LayerHandle) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns a pre-order iterator over `id` and all of its descendants.
    #[must_use]
    pub fn subtree(&self, id: LayerHandle) -> Subtree<'_> {
        self.validate(id);
        Subtree::new(self, id.idx)
    }

    // -- Property getters (read-only, no dirty marking) --

    /// Returns the local transform of a layer.
    #[must_use]
    pub fn local_transform(&self, id: LayerHandle) -> Transform3d {
        self.validate(id);
        self.local_transform[id.idx as usize]
    }

    /// Returns the local opacity of a layer.
    #[must_use]
    pub fn local_opacity(&self, id: LayerHandle) -> f32 {
        self.validate(id);
        self.local_opacity[id.idx as usize]
    }

    /// Returns the clip shape of a layer.
    #[must_use]
    pub fn clip(&self, id: LayerHandle) -> Option<ClipShape> {
        self.validate(id);
        self.clip[id.idx as usize]
    }

    /// Returns the local bounds of a layer.
    #[must_use]
    pub fn bounds(&self, id: LayerHandle) -> Rect {
        self.validate(id);
        self.bounds[id.idx as usize]
    }

    /// Returns the backing bound to a layer.
    #[must_use]
    pub fn backing(&self, id: LayerHandle) -> Option<BackingId> {
        self.validate(id);
        self.backing[id.idx as usize]
    }

    /// Returns the flags of a layer.
    #[must_use]
    pub fn flags(&self, id: LayerHandle) -> LayerFlags {
        self.validate(id);
        self.flags[id.idx as usize]
    }

    /// Returns the computed world transform of a layer.
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn world_transform(&self, id: LayerHandle) -> Transform3d {
        self.validate(id);
        self.world_transform[id.idx as usize]
    }

    /// Returns the computed effective opacity of a layer.
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn effective_opacity(&self, id: LayerHandle) -> f32 {
        self.validate(id);
        self.effective_opacity[id.idx as usize]
    }

    /// Returns whether the layer is hidden by its own flag or an ancestor's.
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn effective_hidden(&self, id: LayerHandle) -> bool {
        self.validate(id);
        self.effective_hidden[id.idx as usize]
    }

    /// Returns the layer's bounds mapped into root space.
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn world_bounds(&self, id: LayerHandle) -> Rect {
        self.validate(id);
        self.world_bounds[id.idx as usize]
    }

    // -- Mutation API (auto-marks dirty) --

    /// Sets the local transform of a layer.
    pub fn set_transform(&mut self, id: LayerHandle, transform: Transform3d) {
        self.validate(id);
        self.local_transform[id.idx as usize] = transform;
        self.dirty.mark_with(id.idx, dirty::TRANSFORM, &EagerPolicy);
    }

    /// Sets the local opacity of a layer.
    pub fn set_opacity(&mut self, id: LayerHandle, opacity: f32) {
        self.validate(id);
        self.local_opacity[id.idx as usize] = opacity;
        self.dirty.mark_with(id.idx, dirty::OPACITY, &EagerPolicy);
    }

    /// Sets the clip shape of a layer.
    pub fn set_clip(&mut self, id: LayerHandle, clip: Option<ClipShape>) {
        self.validate(id);
        self.clip[id.idx as usize] = clip;
        self.dirty.mark(id.idx, dirty::CLIP);
    }

    /// Sets the local bounds of a layer.
    pub fn set_bounds(&mut self, id: LayerHandle, bounds: Rect) {
        self.validate(id);
        self.bounds[id.idx as usize] = bounds;
        self.dirty.mark(id.idx, dirty::CONTENT);
    }

    /// Binds (or unbinds) a backing store.
    ///
    /// Also used to signal that the bound backing has new contents.
    pub fn set_backing(&mut self, id: LayerHandle, backing: Option<BackingId>) {
        self.validate(id);
        self.backing[id.idx as usize] = backing;
        self.dirty.mark(id.idx, dirty::CONTENT);
    }

    /// Sets the flags of a layer.
    pub fn set_flags(&mut self, id: LayerHandle, flags: LayerFlags) {
        self.validate(id);
        self.flags[id.idx as usize] = flags;
        // Hidden state is recomputed alongside world transforms.
        self.dirty.mark_with(id.idx, dirty::TRANSFORM, &EagerPolicy);
    }

    // -- Internal helpers --

    pub(crate) fn handle_at(&self, idx: u32) -> LayerHandle {
        LayerHandle {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Panics if the handle is stale.
    fn validate(&self, id: LayerHandle) {
        assert!(
            self.is_alive(id),
            "stale LayerHandle: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    pub(crate) fn expose(&mut self, rect: Rect) {
        if rect.area() > 0.0 {
            self.pending_exposed.push(rect);
        }
    }

    fn link_last(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }

        // Child depends on parent for inherited channels.
        let _ = self.dirty.add_dependency(c, p, dirty::TRANSFORM);
        let _ = self.dirty.add_dependency(c, p, dirty::OPACITY);

        self.mark_subtree_inherited_dirty(c);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    fn detach_idx(&mut self, c: u32) {
        let p = self.parent[c as usize];
        self.unlink_from_parent(c);
        self.dirty.remove_dependency(c, p, dirty::TRANSFORM);
        self.dirty.remove_dependency(c, p, dirty::OPACITY);
        self.mark_subtree_inherited_dirty(c);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    fn mark_subtree_inherited_dirty(&mut self, idx: u32) {
        self.dirty.mark_with(idx, dirty::TRANSFORM, &EagerPolicy);
        self.dirty.mark_with(idx, dirty::OPACITY, &EagerPolicy);
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn create_and_destroy() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        assert!(store.is_alive(id));
        assert_eq!(store.live_count(), 1);
        store.destroy_layer(id);
        assert!(!store.is_alive(id));
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut store = LayerStore::new();
        let id1 = store.create_layer();
        store.destroy_layer(id1);
        let id2 = store.create_layer();
        assert!(!store.is_alive(id1));
        assert!(store.is_alive(id2));
        assert_eq!(id1.index(), id2.index());
        assert_ne!(id1.generation(), id2.generation());
    }

    #[test]
    fn add_child_and_query() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let child1 = store.create_layer();
        let child2 = store.create_layer();

        store.add_child(parent, child1);
        store.add_child(parent, child2);

        assert_eq!(store.parent(child1), Some(parent));
        let kids: Vec<_> = store.children(parent).collect();
        assert_eq!(kids, vec![child1, child2]);
    }

    #[test]
    fn remove_from_parent_works() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let child = store.create_layer();

        store.add_child(parent, child);
        store.remove_from_parent(child);
        assert_eq!(store.parent(child), None);
        assert!(store.children(parent).next().is_none());
    }

    #[test]
    fn reparent_moves_between_parents() {
        let mut store = LayerStore::new();
        let p1 = store.create_layer();
        let p2 = store.create_layer();
        let child = store.create_layer();

        store.add_child(p1, child);
        store.reparent(child, p2);
        assert_eq!(store.parent(child), Some(p2));
        assert!(store.children(p1).next().is_none());
    }

    #[test]
    fn is_ancestor_walks_up() {
        let mut store = LayerStore::new();
        let a = store.create_layer();
        let b = store.create_layer();
        let c = store.create_layer();
        store.add_child(a, b);
        store.add_child(b, c);

        assert!(store.is_ancestor(a, c));
        assert!(store.is_ancestor(c, c));
        assert!(!store.is_ancestor(c, a));
    }

    #[test]
    #[should_panic(expected = "reparenting would create a cycle")]
    fn reparent_into_own_subtree_panics() {
        let mut store = LayerStore::new();
        let a = store.create_layer();
        let b = store.create_layer();
        store.add_child(a, b);
        store.reparent(a, b);
    }

    #[test]
    fn subtree_is_pre_order() {
        let mut store = LayerStore::new();
        let a = store.create_layer();
        let b = store.create_layer();
        let c = store.create_layer();
        let d = store.create_layer();
        // a -> [b -> [d], c]
        store.add_child(a, b);
        store.add_child(a, c);
        store.add_child(b, d);

        let order: Vec<_> = store.subtree(a).collect();
        assert_eq!(order, vec![a, b, d, c]);
    }

    #[test]
    #[should_panic(expected = "cannot destroy layer with children")]
    fn destroy_with_children_panics() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let child = store.create_layer();
        store.add_child(parent, child);
        store.destroy_layer(parent);
    }

    #[test]
    #[should_panic(expected = "stale LayerHandle")]
    fn destroyed_handle_panics_on_set_transform() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        store.destroy_layer(id);
        store.set_transform(id, Transform3d::IDENTITY);
    }

    #[test]
    fn set_backing_marks_content() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        let _ = store.evaluate();

        store.set_backing(id, Some(BackingId(9)));
        let changes = store.evaluate();
        assert_eq!(store.backing(id), Some(BackingId(9)));
        assert!(
            changes.content.contains(&id.index()),
            "content channel should contain the layer"
        );
    }

    #[test]
    fn set_flags_marks_transform() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        let _ = store.evaluate();

        store.set_flags(id, LayerFlags { hidden: true });
        let changes = store.evaluate();
        assert!(
            changes.transforms.contains(&id.index()),
            "flags mark the TRANSFORM channel"
        );
        assert!(store.effective_hidden(id));
    }
}
