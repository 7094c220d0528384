// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene-state snapshots produced by the content side.

use std::fmt;
use std::sync::Arc;

use kurbo::Rect;
use lamina_core::layer::ClipShape;
use lamina_core::transform::Transform3d;

use crate::backing::BackingStore;

/// Producer-assigned layer identity, stable across commits.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub u64);

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerId({})", self.0)
    }
}

/// Property changes for one layer. `None` fields are left untouched.
#[derive(Clone, Debug, Default)]
pub struct LayerDelta {
    /// New parent.
    pub parent: Option<LayerId>,
    /// New local transform.
    pub transform: Option<Transform3d>,
    /// New opacity.
    pub opacity: Option<f32>,
    /// New clip; `Some(None)` removes the clip.
    pub clip: Option<Option<ClipShape>>,
    /// New content bounds in local coordinates.
    pub bounds: Option<Rect>,
    /// New hidden flag.
    pub hidden: Option<bool>,
    /// New backing store; `Some(None)` unbinds the current one.
    pub backing: Option<Option<Arc<BackingStore>>>,
}

impl LayerDelta {
    /// Creates an empty delta.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the parent.
    #[must_use]
    pub fn parent(mut self, parent: LayerId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Sets the local transform.
    #[must_use]
    pub fn transform(mut self, transform: Transform3d) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Sets the opacity.
    #[must_use]
    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self
    }

    /// Sets or clears the clip.
    #[must_use]
    pub fn clip(mut self, clip: Option<ClipShape>) -> Self {
        self.clip = Some(clip);
        self
    }

    /// Sets the content bounds.
    #[must_use]
    pub fn bounds(mut self, bounds: Rect) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Sets the hidden flag.
    #[must_use]
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    /// Binds or unbinds a backing store.
    #[must_use]
    pub fn backing(mut self, backing: Option<Arc<BackingStore>>) -> Self {
        self.backing = Some(backing);
        self
    }
}

/// One mutation in a [`SceneState`].
#[derive(Clone, Debug)]
pub enum LayerChange {
    /// Creates a layer. Layers without a parent stay detached until
    /// parented or named as the root.
    Add(LayerId, LayerDelta),
    /// Changes an existing layer.
    Update(LayerId, LayerDelta),
    /// Destroys a layer. Its children become detached.
    Remove(LayerId),
}

/// A versioned batch of layer changes, applied as one commit.
#[derive(Clone, Debug, Default)]
pub struct SceneState {
    /// Producer commit version.
    pub version: u64,
    /// Root layer after this commit, if it changes.
    pub root: Option<LayerId>,
    /// Changes in application order.
    pub changes: Vec<LayerChange>,
}

impl SceneState {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new(version: u64) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    /// Names the root layer.
    #[must_use]
    pub fn with_root(mut self, root: LayerId) -> Self {
        self.root = Some(root);
        self
    }

    /// Appends an [`LayerChange::Add`].
    #[must_use]
    pub fn add(mut self, id: LayerId, delta: LayerDelta) -> Self {
        self.changes.push(LayerChange::Add(id, delta));
        self
    }

    /// Appends an [`LayerChange::Update`].
    #[must_use]
    pub fn update(mut self, id: LayerId, delta: LayerDelta) -> Self {
        self.changes.push(LayerChange::Update(id, delta));
        self
    }

    /// Appends a [`LayerChange::Remove`].
    #[must_use]
    pub fn remove(mut self, id: LayerId) -> Self {
        self.changes.push(LayerChange::Remove(id));
        self
    }
}
