// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The compositing scene.

use std::collections::HashMap;
use std::mem;
use std::sync::{Arc, Weak};
use std::time::Instant;

use kurbo::Rect;
use lamina_core::layer::{BackingId, LayerFlags, LayerHandle, LayerStore};
use lamina_core::time::HostTime;
use lamina_core::trace::{
    CommitEvent, FenceWaitEvent, PaintSummary, PhaseBeginEvent, PhaseEndEvent, PhaseKind,
    TraceSink, Tracer,
};
use lamina_core::transform::Transform3d;
use lamina_fence::Display;
use lamina_render::{Damage, PaintPlan, Propagation};
use parking_lot::Mutex;

use crate::backing::{BackingStore, Compositor};
use crate::client::SceneClient;
use crate::config::SceneConfig;
use crate::fps::FpsCounter;
use crate::mapper::{TextureMapper, TextureMapperFactory};
use crate::state::{LayerChange, LayerDelta, LayerId, SceneState};

/// Where a scene is in its life.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// No state has been applied yet.
    Idle,
    /// A root exists and painting is enabled.
    Active,
    /// A root exists but painting is suppressed. Commits still apply.
    Inactive,
    /// Torn down. Every operation is a no-op.
    Detached,
}

/// Client-facing state. Client callbacks run with this lock held.
struct Control {
    client: Option<Arc<dyn SceneClient>>,
    active: bool,
    propagation: Propagation,
    detached: bool,
}

/// The mirrored layer tree.
struct Tree {
    store: LayerStore,
    ids: HashMap<LayerId, LayerHandle>,
    handles: HashMap<LayerHandle, LayerId>,
    backings: HashMap<LayerHandle, Arc<BackingStore>>,
    /// Synthesized root; content roots are attached below it.
    root: Option<LayerHandle>,
    content_root: Option<LayerId>,
    /// Commit damage not yet reported to the client.
    pending_damage: Damage,
    /// Damage the next paint must cover.
    frame_damage: Damage,
    commits: u64,
}

impl Tree {
    fn new() -> Self {
        Self {
            store: LayerStore::new(),
            ids: HashMap::new(),
            handles: HashMap::new(),
            backings: HashMap::new(),
            root: None,
            content_root: None,
            pending_damage: Damage::None,
            frame_damage: Damage::None,
            commits: 0,
        }
    }

    fn ensure_root(&mut self) -> LayerHandle {
        if let Some(root) = self.root {
            return root;
        }
        let root = self.store.create_layer();
        self.root = Some(root);
        root
    }

    fn deactivate_backings(&mut self) {
        for backing in self.backings.values() {
            backing.deactivate();
        }
    }

    /// Deactivates `backing` unless another layer still shows it.
    fn unbind(&self, backing: &Arc<BackingStore>) {
        if !self.backings.values().any(|b| Arc::ptr_eq(b, backing)) {
            backing.deactivate();
        }
    }
}

/// Painting-thread state.
struct Painter {
    factory: Box<dyn TextureMapperFactory>,
    mapper: Option<Box<dyn TextureMapper>>,
    fps: Option<FpsCounter>,
    frames: u64,
}

impl Painter {
    fn release_mapper(&mut self) {
        if let Some(mut mapper) = self.mapper.take() {
            mapper.release_resources();
        }
    }
}

#[derive(Default)]
struct CommitCounts {
    added: u32,
    updated: u32,
    removed: u32,
    ignored: u32,
}

/// A layer tree mirrored from snapshots and painted through a
/// [`TextureMapper`].
///
/// The scene is shared between a control thread, which applies snapshots
/// and owns the client, and a painting thread. Internal locks are taken in
/// the order control, tree, painter. A commit holds the tree lock for a
/// whole snapshot, so a paint never observes a partial commit. Paints copy
/// what they need out of the tree and hold backing stores by reference
/// count, so a commit may drop a layer a paint is still drawing.
pub struct CompositingScene {
    this: Weak<Self>,
    display: Display,
    epoch: Instant,
    control: Mutex<Control>,
    tree: Mutex<Tree>,
    painter: Mutex<Painter>,
    inbox: Mutex<Vec<SceneState>>,
    trace: Mutex<Option<Box<dyn TraceSink>>>,
}

impl std::fmt::Debug for CompositingScene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositingScene")
            .field("display", &self.display)
            .finish_non_exhaustive()
    }
}

impl CompositingScene {
    /// Creates a scene in the [`Idle`](Lifecycle::Idle) state.
    pub fn new(
        client: Arc<dyn SceneClient>,
        display: Display,
        mapper_factory: Box<dyn TextureMapperFactory>,
        config: SceneConfig,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            display,
            epoch: Instant::now(),
            control: Mutex::new(Control {
                client: Some(client),
                active: config.active,
                propagation: config.damage_propagation,
                detached: false,
            }),
            tree: Mutex::new(Tree::new()),
            painter: Mutex::new(Painter {
                factory: mapper_factory,
                mapper: None,
                fps: config.fps_interval.map(FpsCounter::new),
                frames: 0,
            }),
            inbox: Mutex::new(Vec::new()),
            trace: Mutex::new(None),
        })
    }

    /// Installs a trace sink, returning the previous one.
    ///
    /// Events are only emitted with the `trace` feature enabled.
    pub fn set_trace_sink(&self, sink: Option<Box<dyn TraceSink>>) -> Option<Box<dyn TraceSink>> {
        mem::replace(&mut *self.trace.lock(), sink)
    }

    fn with_tracer(&self, f: impl FnOnce(&mut Tracer<'_>)) {
        let mut sink = self.trace.lock();
        let mut tracer = Tracer::new(sink.as_deref_mut().map(|s| s as &mut dyn TraceSink));
        f(&mut tracer);
    }

    fn now(&self) -> HostTime {
        HostTime::from_duration(self.epoch.elapsed())
    }

    // -- Control --

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        let control = self.control.lock();
        if control.detached {
            return Lifecycle::Detached;
        }
        if self.tree.lock().root.is_none() {
            Lifecycle::Idle
        } else if control.active {
            Lifecycle::Active
        } else {
            Lifecycle::Inactive
        }
    }

    /// Enables or disables painting. Ignored after [`detach`](Self::detach).
    pub fn set_active(&self, active: bool) {
        let mut control = self.control.lock();
        if !control.detached {
            control.active = active;
        }
    }

    /// Returns `true` if painting is enabled.
    #[must_use]
    pub fn is_active(&self) -> bool {
        let control = self.control.lock();
        control.active && !control.detached
    }

    /// Sets how commit damage is reported to the client.
    pub fn set_damage_propagation(&self, propagation: Propagation) {
        self.control.lock().propagation = propagation;
    }

    /// Tears the scene down.
    ///
    /// Clears the client, unbinds every backing store, destroys the layer
    /// tree and releases the texture mapper. Every later call is a no-op
    /// and fires no client callback. A fence wait already in progress on
    /// the painting thread is not interrupted.
    pub fn detach(&self) {
        let mut control = self.control.lock();
        if control.detached {
            return;
        }
        control.detached = true;
        control.client = None;
        {
            let mut tree = self.tree.lock();
            tree.deactivate_backings();
            *tree = Tree::new();
        }
        self.painter.lock().release_mapper();
        self.inbox.lock().clear();
        log::debug!("scene detached");
    }

    // -- Producer side --

    /// Queues a snapshot for the next [`update_scene_state`](Self::update_scene_state).
    pub fn queue_scene_state(&self, state: SceneState) {
        if self.control.lock().detached {
            return;
        }
        self.inbox.lock().push(state);
    }

    /// Applies every queued snapshot, then notifies the client that a new
    /// frame is ready.
    pub fn update_scene_state(&self) {
        let states = mem::take(&mut *self.inbox.lock());
        if !states.is_empty() {
            self.apply_state_changes(states);
        }
        self.update_viewport();
    }

    /// Applies snapshots in order, each one completely before the next.
    ///
    /// The synthesized root is created first if needed. Afterwards the
    /// accumulated damage is reported according to the propagation policy.
    pub fn apply_state_changes(&self, states: Vec<SceneState>) {
        let control = self.control.lock();
        if control.detached {
            return;
        }
        let report = {
            let mut tree = self.tree.lock();
            tree.ensure_root();
            for state in states {
                self.commit_scene_state(&mut tree, state);
            }
            mem::take(&mut tree.pending_damage)
        };
        self.report_damage(&control, &report);
    }

    /// Forwards `damage` to the client under the propagation policy and
    /// records the region it returns for the next paint.
    fn report_damage(&self, control: &Control, damage: &Damage) {
        let Some(damage) = damage.for_propagation(control.propagation) else {
            return;
        };
        let Some(client) = control.client.as_ref() else {
            return;
        };
        let consumed = client.add_surface_damage(&damage);
        self.tree.lock().frame_damage.merge(&consumed);
    }

    fn commit_scene_state(&self, tree: &mut Tree, state: SceneState) {
        let begin = self.now();
        let sequence = tree.commits;
        tree.commits += 1;
        self.with_tracer(|t| {
            t.phase_begin(&PhaseBeginEvent {
                sequence,
                phase: PhaseKind::Commit,
                timestamp: begin,
            });
        });

        let mut counts = CommitCounts::default();
        for change in state.changes {
            match change {
                LayerChange::Add(id, delta) => {
                    if let Some(&handle) = tree.ids.get(&id) {
                        log::warn!("{id:?} added twice, applying as an update");
                        self.apply_delta(tree, id, handle, delta, &mut counts);
                        counts.updated += 1;
                        continue;
                    }
                    let handle = tree.store.create_layer();
                    tree.ids.insert(id, handle);
                    tree.handles.insert(handle, id);
                    self.apply_delta(tree, id, handle, delta, &mut counts);
                    counts.added += 1;
                }
                LayerChange::Update(id, delta) => {
                    let Some(&handle) = tree.ids.get(&id) else {
                        log::debug!("ignoring update of unknown {id:?}");
                        counts.ignored += 1;
                        continue;
                    };
                    self.apply_delta(tree, id, handle, delta, &mut counts);
                    counts.updated += 1;
                }
                LayerChange::Remove(id) => {
                    let Some(handle) = tree.ids.remove(&id) else {
                        log::debug!("ignoring removal of unknown {id:?}");
                        counts.ignored += 1;
                        continue;
                    };
                    remove_layer(tree, id, handle);
                    counts.removed += 1;
                }
            }
        }

        if let Some(root_id) = state.root {
            set_content_root(tree, root_id, &mut counts);
        }

        let changes = tree.store.evaluate();
        for rect in &changes.damage {
            tree.pending_damage.add_rect(*rect);
        }

        let end = self.now();
        log::trace!(
            "commit {sequence} (v{}): +{} ~{} -{} ignored {}, {} damage rects",
            state.version,
            counts.added,
            counts.updated,
            counts.removed,
            counts.ignored,
            changes.damage.len(),
        );
        self.with_tracer(|t| {
            t.commit(&CommitEvent {
                commit_index: sequence,
                version: state.version,
                timestamp: end,
                added: counts.added,
                updated: counts.updated,
                removed: counts.removed,
                ignored: counts.ignored,
            });
            #[cfg(feature = "trace-rich")]
            if t.is_enabled() && !changes.damage.is_empty() {
                let rects: Vec<lamina_core::trace::DamageRect> =
                    changes.damage.iter().map(|r| (*r).into()).collect();
                t.damage_rects(sequence, &rects);
            }
            t.phase_end(&PhaseEndEvent {
                sequence,
                phase: PhaseKind::Commit,
                timestamp: end,
            });
        });
    }

    fn apply_delta(
        &self,
        tree: &mut Tree,
        id: LayerId,
        handle: LayerHandle,
        delta: LayerDelta,
        counts: &mut CommitCounts,
    ) {
        if let Some(parent_id) = delta.parent {
            match tree.ids.get(&parent_id).copied() {
                None => {
                    log::debug!("{id:?}: ignoring unknown parent {parent_id:?}");
                    counts.ignored += 1;
                }
                Some(parent) if tree.store.is_ancestor(handle, parent) => {
                    log::debug!("{id:?}: ignoring parent {parent_id:?}, it would create a cycle");
                    counts.ignored += 1;
                }
                Some(parent) => {
                    if tree.store.parent(handle) != Some(parent) {
                        tree.store.reparent(handle, parent);
                    }
                    if tree.content_root == Some(id) {
                        tree.content_root = None;
                    }
                }
            }
        }

        let store = &mut tree.store;
        if let Some(transform) = delta.transform {
            store.set_transform(handle, transform);
        }
        if let Some(opacity) = delta.opacity {
            store.set_opacity(handle, opacity);
        }
        if let Some(clip) = delta.clip {
            store.set_clip(handle, clip);
        }
        if let Some(bounds) = delta.bounds {
            store.set_bounds(handle, bounds);
        }
        if let Some(hidden) = delta.hidden {
            store.set_flags(handle, LayerFlags { hidden });
        }

        match delta.backing {
            None => {}
            Some(Some(backing)) => {
                if tree
                    .backings
                    .get(&handle)
                    .is_some_and(|current| Arc::ptr_eq(current, &backing))
                {
                    return;
                }
                let compositor: Weak<dyn Compositor> = self.this.clone();
                backing.activate(compositor);
                tree.store.set_backing(handle, Some(backing.id()));
                if let Some(old) = tree.backings.insert(handle, backing) {
                    tree.unbind(&old);
                }
            }
            Some(None) => {
                if let Some(old) = tree.backings.remove(&handle) {
                    tree.unbind(&old);
                    tree.store.set_backing(handle, None);
                }
            }
        }
    }

    // -- Painting side --

    /// Notifies the client that a new frame is ready.
    fn update_viewport(&self) {
        let control = self.control.lock();
        if control.detached {
            return;
        }
        if let Some(client) = &control.client {
            client.update_viewport();
        }
    }

    /// Paints the tree into the current GPU context.
    ///
    /// `matrix` is the view transform and `clip` the viewport. Does nothing
    /// unless the scene is [`Active`](Lifecycle::Active). Every backing's
    /// buffer is waited for before it is drawn.
    pub fn paint_to_current_context(&self, matrix: &Transform3d, clip: Rect, flip_y: bool) {
        let propagation = {
            let control = self.control.lock();
            if control.detached || !control.active {
                return;
            }
            control.propagation
        };

        let (plan, damage) = {
            let mut guard = self.tree.lock();
            let Some(root) = guard.root else {
                return;
            };
            let tree = &*guard;
            let plan = PaintPlan::build(&tree.store, root, *matrix, |layer| {
                tree.backings.get(&layer).cloned()
            });
            let damage = if propagation == Propagation::None {
                Damage::Full
            } else {
                mem::take(&mut guard.frame_damage)
            };
            (plan, damage)
        };

        let begin = self.now();
        let mut painter = self.painter.lock();
        let painter = &mut *painter;
        let frame_index = painter.frames;
        painter.frames += 1;
        self.with_tracer(|t| {
            t.phase_begin(&PhaseBeginEvent {
                sequence: frame_index,
                phase: PhaseKind::Paint,
                timestamp: begin,
            });
        });

        // A new mapper has no previous frame to reuse.
        let damage = if painter.mapper.is_none() {
            Damage::Full
        } else {
            damage
        };
        let mapper = painter.mapper.get_or_insert_with(|| painter.factory.create());
        mapper.begin_painting(clip, flip_y, &damage);
        let mut waits = 0_u32;
        for item in &plan.items {
            let buffer = match &item.backing {
                Some(backing) => {
                    let wait_begin = self.now();
                    let (buffer, wait) = backing.prepare_for_sampling(&self.display);
                    if let Some(kind) = wait {
                        waits += 1;
                        let wait_end = self.now();
                        self.with_tracer(|t| {
                            t.fence_wait(&FenceWaitEvent {
                                frame_index,
                                backing: backing.id(),
                                kind,
                                begin: wait_begin,
                                end: wait_end,
                            });
                        });
                    }
                    buffer
                }
                None => None,
            };
            mapper.draw_layer(item, buffer);
        }
        if let Some(fps) = painter.fps.as_mut() {
            fps.frame_painted(Instant::now());
            if let Some(rate) = fps.fps() {
                mapper.draw_fps(rate, matrix);
            }
        }
        mapper.end_painting();

        let end = self.now();
        log::trace!(
            "paint {frame_index}: {} items, {waits} waits",
            plan.items.len()
        );
        self.with_tracer(|t| {
            let items = u32::try_from(plan.items.len()).unwrap_or(u32::MAX);
            t.paint_summary(&PaintSummary {
                frame_index,
                items,
                waits,
                begin,
                end,
            });
            t.phase_end(&PhaseEndEvent {
                sequence: frame_index,
                phase: PhaseKind::Paint,
                timestamp: end,
            });
        });
    }

    /// Releases GPU-resident resources while keeping the layer tree.
    ///
    /// Every backing store drops its buffer and pending fence, and the
    /// texture mapper is released. The next paint creates a new mapper and
    /// repaints the whole surface.
    pub fn purge_gl_resources(&self) {
        let control = self.control.lock();
        if control.detached {
            return;
        }
        let begin = self.now();
        self.with_tracer(|t| {
            t.phase_begin(&PhaseBeginEvent {
                sequence: 0,
                phase: PhaseKind::Purge,
                timestamp: begin,
            });
        });
        {
            let mut tree = self.tree.lock();
            for backing in tree.backings.values() {
                backing.release_gpu_resources();
            }
            tree.frame_damage = Damage::Full;
        }
        self.painter.lock().release_mapper();
        let end = self.now();
        self.with_tracer(|t| {
            t.phase_end(&PhaseEndEvent {
                sequence: 0,
                phase: PhaseKind::Purge,
                timestamp: end,
            });
        });
        drop(control);
    }

    // -- Inspection --

    /// Returns the ids of all live layers, sorted.
    #[must_use]
    pub fn layer_ids(&self) -> Vec<LayerId> {
        let mut ids: Vec<_> = self.tree.lock().ids.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Returns the current content root.
    #[must_use]
    pub fn root_layer(&self) -> Option<LayerId> {
        self.tree.lock().content_root
    }

    /// Returns the parent of a layer, or `None` if it is unknown, detached
    /// or the content root.
    #[must_use]
    pub fn layer_parent(&self, id: LayerId) -> Option<LayerId> {
        let tree = self.tree.lock();
        let handle = *tree.ids.get(&id)?;
        let parent = tree.store.parent(handle)?;
        tree.handles.get(&parent).copied()
    }

    /// Returns the children of a layer in paint order.
    #[must_use]
    pub fn layer_children(&self, id: LayerId) -> Vec<LayerId> {
        let tree = self.tree.lock();
        let Some(&handle) = tree.ids.get(&id) else {
            return Vec::new();
        };
        tree.store
            .children(handle)
            .filter_map(|child| tree.handles.get(&child).copied())
            .collect()
    }

    /// Returns the local transform of a layer.
    #[must_use]
    pub fn layer_transform(&self, id: LayerId) -> Option<Transform3d> {
        let tree = self.tree.lock();
        let handle = *tree.ids.get(&id)?;
        Some(tree.store.local_transform(handle))
    }

    /// Returns the backing store bound to a layer.
    #[must_use]
    pub fn layer_backing(&self, id: LayerId) -> Option<Arc<BackingStore>> {
        let tree = self.tree.lock();
        let handle = tree.ids.get(&id)?;
        tree.backings.get(handle).cloned()
    }
}

impl Compositor for CompositingScene {
    fn on_new_buffer_available(&self, backing: BackingId) {
        let control = self.control.lock();
        if control.detached {
            return;
        }
        let damage = {
            let mut tree = self.tree.lock();
            let tree = &mut *tree;
            let showing: Vec<_> = tree
                .backings
                .iter()
                .filter(|(_, b)| b.id() == backing)
                .map(|(&handle, _)| handle)
                .collect();
            for handle in showing {
                tree.store.set_backing(handle, Some(backing));
            }
            let changes = tree.store.evaluate();
            let mut damage = Damage::None;
            for rect in &changes.damage {
                damage.add_rect(*rect);
            }
            damage
        };
        self.report_damage(&control, &damage);
        if let Some(client) = &control.client {
            client.update_viewport();
        }
    }
}

/// Destroys a layer, detaching its children and unbinding its backing.
fn remove_layer(tree: &mut Tree, id: LayerId, handle: LayerHandle) {
    let children: Vec<_> = tree.store.children(handle).collect();
    for child in children {
        tree.store.remove_from_parent(child);
    }
    tree.store.destroy_layer(handle);
    tree.handles.remove(&handle);
    if let Some(backing) = tree.backings.remove(&handle) {
        tree.unbind(&backing);
    }
    if tree.content_root == Some(id) {
        tree.content_root = None;
    }
}

/// Attaches `root_id` below the synthesized root, replacing the previous
/// content root.
fn set_content_root(tree: &mut Tree, root_id: LayerId, counts: &mut CommitCounts) {
    let Some(&handle) = tree.ids.get(&root_id) else {
        log::debug!("ignoring unknown root {root_id:?}");
        counts.ignored += 1;
        return;
    };
    let scene_root = tree.ensure_root();
    if tree.store.parent(handle) == Some(scene_root) {
        tree.content_root = Some(root_id);
        return;
    }
    let old_roots: Vec<_> = tree.store.children(scene_root).collect();
    for old in old_roots {
        tree.store.remove_from_parent(old);
    }
    tree.store.reparent(handle, scene_root);
    tree.content_root = Some(root_id);
}
