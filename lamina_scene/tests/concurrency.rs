// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Commits racing paints.

mod common;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::thread;

use kurbo::Rect;
use lamina_core::transform::Transform3d;
use lamina_render::{BufferHandle, Damage};
use lamina_scene::{
    BackingStore, CompositingScene, LayerDelta, LayerId, LayerPaint, SceneConfig, SceneState,
    TextureMapper,
};
use parking_lot::Mutex;

use common::{Harness, RecordingClient, VIEWPORT};

/// Has another thread remove the layer being drawn while `draw_layer` runs.
struct RemovingMapper {
    scene: Arc<Mutex<Weak<CompositingScene>>>,
    observed: Arc<AtomicUsize>,
}

impl TextureMapper for RemovingMapper {
    fn begin_painting(&mut self, _clip: Rect, _flip_y: bool, _damage: &Damage) {}

    fn draw_layer(&mut self, item: &LayerPaint, buffer: Option<BufferHandle>) {
        let Some(backing) = &item.backing else {
            return;
        };
        let Some(scene) = self.scene.lock().upgrade() else {
            return;
        };
        let committer = {
            let scene = scene.clone();
            thread::spawn(move || {
                scene.apply_state_changes(vec![SceneState::new(2).remove(LayerId(1))]);
            })
        };
        committer.join().unwrap();
        assert!(scene.layer_ids().is_empty(), "layer should be gone");
        // The paint's reference is now the only one.
        assert_eq!(Arc::strong_count(backing), 1, "paint should own the backing");
        assert_eq!(backing.buffer(), buffer, "backing should still be readable");
        self.observed.fetch_add(1, Ordering::Relaxed);
    }

    fn end_painting(&mut self) {}

    fn release_resources(&mut self) {}
}

#[test]
fn paint_keeps_a_backing_removed_mid_frame() {
    let h = Harness::new(SceneConfig::default());
    let scene_slot = Arc::new(Mutex::new(Weak::new()));
    let observed = Arc::new(AtomicUsize::new(0));
    let factory = {
        let scene_slot = scene_slot.clone();
        let observed = observed.clone();
        Box::new(move || {
            Box::new(RemovingMapper {
                scene: scene_slot.clone(),
                observed: observed.clone(),
            }) as Box<dyn TextureMapper>
        })
    };
    let client = Arc::new(RecordingClient::default());
    let scene = CompositingScene::new(client, h.display.clone(), factory, SceneConfig::ACTIVE);
    *scene_slot.lock() = Arc::downgrade(&scene);

    let backing = Arc::new(BackingStore::new());
    backing.push_buffer(BufferHandle(21), None);
    scene.apply_state_changes(vec![
        SceneState::new(1)
            .add(LayerId(1), LayerDelta::new().backing(Some(backing.clone())))
            .with_root(LayerId(1)),
    ]);
    let weak_backing = Arc::downgrade(&backing);
    drop(backing);

    scene.paint_to_current_context(&Transform3d::IDENTITY, VIEWPORT, false);
    assert_eq!(observed.load(Ordering::Relaxed), 1);
    assert!(weak_backing.upgrade().is_none());
}

#[test]
fn concurrent_commits_and_paints() {
    let h = Harness::new(SceneConfig::ACTIVE);
    let scene = h.scene.clone();
    let done = Arc::new(AtomicBool::new(false));
    let backings: Vec<_> = (0..8).map(|_| Arc::new(BackingStore::new())).collect();
    let weak: Vec<_> = backings.iter().map(Arc::downgrade).collect();

    let painter = {
        let scene = scene.clone();
        let done = done.clone();
        thread::spawn(move || {
            let mut paints = 0_usize;
            while !done.load(Ordering::Acquire) {
                scene.paint_to_current_context(&Transform3d::IDENTITY, VIEWPORT, false);
                paints += 1;
            }
            paints
        })
    };

    scene.apply_state_changes(vec![
        SceneState::new(0)
            .add(LayerId(0), LayerDelta::new())
            .with_root(LayerId(0)),
    ]);
    for round in 0..200_u64 {
        let slot = (round % 8) as usize;
        let id = LayerId(slot as u64 + 1);
        let backing = backings[slot].clone();
        backing.push_buffer(BufferHandle(round), None);
        let state = if round % 16 < 8 {
            SceneState::new(round + 1).add(
                id,
                LayerDelta::new()
                    .parent(LayerId(0))
                    .bounds(Rect::new(0.0, 0.0, 4.0, 4.0))
                    .backing(Some(backing)),
            )
        } else {
            SceneState::new(round + 1).remove(id)
        };
        scene.apply_state_changes(vec![state]);
    }
    done.store(true, Ordering::Release);
    let paints = painter.join().unwrap();
    assert!(paints > 0);

    // Rounds 192..200 re-added every slot.
    assert_eq!(scene.layer_ids().len(), 9);
    scene.detach();
    drop(backings);
    assert!(weak.iter().all(|w| w.upgrade().is_none()));
}
