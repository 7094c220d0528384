// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording a scene's commits and paints.

use std::sync::Arc;

use kurbo::Rect;
use lamina_core::trace::{PhaseKind, WaitKind};
use lamina_core::transform::Transform3d;
use lamina_debug::chrome;
use lamina_debug::recorder::{RecordedEvent, SharedRecorder, decode};
use lamina_fence::{Display, SoftwareConfig, SoftwareDriver};
use lamina_render::{BufferHandle, Damage};
use lamina_scene::{
    BackingStore, CompositingScene, LayerDelta, LayerId, LayerPaint, SceneClient, SceneConfig,
    SceneState, TextureMapper,
};

struct NullClient;

impl SceneClient for NullClient {
    fn update_viewport(&self) {}
}

struct NullMapper;

impl TextureMapper for NullMapper {
    fn begin_painting(&mut self, _clip: Rect, _flip_y: bool, _damage: &Damage) {}
    fn draw_layer(&mut self, _item: &LayerPaint, _buffer: Option<BufferHandle>) {}
    fn end_painting(&mut self) {}
    fn release_resources(&mut self) {}
}

#[test]
fn scene_events_are_recorded_and_exported() {
    let driver = Arc::new(SoftwareDriver::new(SoftwareConfig::CORE));
    let display = Display::new(driver);
    let scene = CompositingScene::new(
        Arc::new(NullClient),
        display,
        Box::new(|| Box::new(NullMapper) as Box<dyn TextureMapper>),
        SceneConfig::ACTIVE,
    );
    let recorder = SharedRecorder::new();
    assert!(scene.set_trace_sink(Some(Box::new(recorder.clone()))).is_none());

    let backing = Arc::new(BackingStore::new());
    scene.apply_state_changes(vec![
        SceneState::new(5)
            .add(
                LayerId(1),
                LayerDelta::new()
                    .bounds(Rect::new(0.0, 0.0, 64.0, 64.0))
                    .backing(Some(backing.clone())),
            )
            .update(LayerId(9), LayerDelta::new().opacity(0.0))
            .with_root(LayerId(1)),
    ]);
    backing.push_buffer(BufferHandle(1), None);
    scene.paint_to_current_context(&Transform3d::IDENTITY, Rect::new(0.0, 0.0, 64.0, 64.0), false);

    let bytes = recorder.bytes();
    let events: Vec<_> = decode(&bytes).collect();

    let commit = events.iter().find_map(|e| match e {
        RecordedEvent::Commit(c) => Some(*c),
        _ => None,
    });
    let commit = commit.expect("commit event recorded");
    assert_eq!(commit.version, 5);
    assert_eq!((commit.added, commit.ignored), (1, 1));

    assert!(events.iter().any(|e| matches!(
        e,
        RecordedEvent::DamageRectsCount { commit_index: 0, .. }
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        RecordedEvent::FenceWait(w) if w.kind == WaitKind::Finish && w.backing == backing.id()
    )));
    let phases: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            RecordedEvent::PhaseBegin(p) => Some(p.phase),
            _ => None,
        })
        .collect();
    assert_eq!(phases, [PhaseKind::Commit, PhaseKind::Paint]);
    assert!(matches!(events.last(), Some(RecordedEvent::PhaseEnd(_))));

    let mut json = Vec::new();
    chrome::export(&bytes, &mut json).unwrap();
    let parsed: Vec<serde_json::Value> = serde_json::from_slice(&json).unwrap();
    assert_eq!(parsed.len(), events.len());
}
