// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use alloc::vec::Vec;

use super::id::{INVALID, LayerHandle};
use super::store::LayerStore;

/// An iterator over the direct children of a layer.
///
/// Created by [`LayerStore::children`].
#[derive(Debug)]
pub struct Children<'a> {
    store: &'a LayerStore,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(store: &'a LayerStore, first: u32) -> Self {
        Self {
            store,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = LayerHandle;

    fn next(&mut self) -> Option<LayerHandle> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.next_sibling[idx as usize];
        Some(self.store.handle_at(idx))
    }
}

/// A depth-first pre-order iterator over a subtree, root included.
///
/// Created by [`LayerStore::subtree`]. Children are visited in sibling order,
/// which is back-to-front paint order.
#[derive(Debug)]
pub struct Subtree<'a> {
    store: &'a LayerStore,
    stack: Vec<u32>,
}

impl<'a> Subtree<'a> {
    pub(crate) fn new(store: &'a LayerStore, root: u32) -> Self {
        let mut stack = Vec::new();
        stack.push(root);
        Self { store, stack }
    }
}

impl Iterator for Subtree<'_> {
    type Item = LayerHandle;

    fn next(&mut self) -> Option<LayerHandle> {
        let idx = self.stack.pop()?;
        // Push children in reverse so the first child is popped next.
        let mark = self.stack.len();
        let mut child = self.store.first_child[idx as usize];
        while child != INVALID {
            self.stack.push(child);
            child = self.store.next_sibling[child as usize];
        }
        self.stack[mark..].reverse();
        Some(self.store.handle_at(idx))
    }
}
