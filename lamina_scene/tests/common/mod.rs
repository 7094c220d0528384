// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording doubles shared by the scene integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use kurbo::Rect;
use lamina_core::transform::Transform3d;
use lamina_fence::{Display, SoftwareConfig, SoftwareDriver};
use lamina_render::{BufferHandle, Damage};
use lamina_scene::{
    CompositingScene, LayerPaint, SceneClient, SceneConfig, TextureMapper, TextureMapperFactory,
};
use parking_lot::Mutex;

pub const VIEWPORT: Rect = Rect::new(0.0, 0.0, 800.0, 600.0);

#[derive(Clone, Debug, PartialEq)]
pub enum Draw {
    Begin { flip_y: bool, damage: Damage },
    Layer {
        buffer: Option<BufferHandle>,
        transform: Transform3d,
    },
    Fps(u32),
    End,
    Release,
}

#[derive(Default)]
pub struct RecordingClient {
    pub viewport_updates: AtomicUsize,
    pub damage: Mutex<Vec<Damage>>,
    /// Returned from `add_surface_damage` instead of the input, if set.
    pub respond_with: Mutex<Option<Damage>>,
}

impl RecordingClient {
    pub fn viewport_updates(&self) -> usize {
        self.viewport_updates.load(Ordering::Relaxed)
    }

    pub fn damage_reports(&self) -> Vec<Damage> {
        self.damage.lock().clone()
    }
}

impl SceneClient for RecordingClient {
    fn update_viewport(&self) {
        self.viewport_updates.fetch_add(1, Ordering::Relaxed);
    }

    fn add_surface_damage(&self, damage: &Damage) -> Damage {
        self.damage.lock().push(damage.clone());
        self.respond_with
            .lock()
            .clone()
            .unwrap_or_else(|| damage.clone())
    }
}

#[derive(Clone, Default)]
pub struct DrawLog {
    pub draws: Arc<Mutex<Vec<Draw>>>,
    pub mappers_created: Arc<AtomicUsize>,
}

impl DrawLog {
    pub fn take(&self) -> Vec<Draw> {
        std::mem::take(&mut *self.draws.lock())
    }

    pub fn mappers_created(&self) -> usize {
        self.mappers_created.load(Ordering::Relaxed)
    }

    pub fn factory(&self) -> Box<dyn TextureMapperFactory> {
        let log = self.clone();
        Box::new(move || {
            log.mappers_created.fetch_add(1, Ordering::Relaxed);
            Box::new(RecordingMapper { log: log.clone() }) as Box<dyn TextureMapper>
        })
    }
}

pub struct RecordingMapper {
    log: DrawLog,
}

impl TextureMapper for RecordingMapper {
    fn begin_painting(&mut self, _clip: Rect, flip_y: bool, damage: &Damage) {
        self.log.draws.lock().push(Draw::Begin {
            flip_y,
            damage: damage.clone(),
        });
    }

    fn draw_layer(&mut self, item: &LayerPaint, buffer: Option<BufferHandle>) {
        self.log.draws.lock().push(Draw::Layer {
            buffer,
            transform: item.transform,
        });
    }

    fn draw_fps(&mut self, fps: u32, _transform: &Transform3d) {
        self.log.draws.lock().push(Draw::Fps(fps));
    }

    fn end_painting(&mut self) {
        self.log.draws.lock().push(Draw::End);
    }

    fn release_resources(&mut self) {
        self.log.draws.lock().push(Draw::Release);
    }
}

pub struct Harness {
    pub scene: Arc<CompositingScene>,
    pub client: Arc<RecordingClient>,
    pub driver: Arc<SoftwareDriver>,
    pub display: Display,
    pub log: DrawLog,
}

impl Harness {
    pub fn new(config: SceneConfig) -> Self {
        Self::with_driver(SoftwareConfig::CORE, config)
    }

    pub fn with_driver(driver_config: SoftwareConfig, config: SceneConfig) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let driver = Arc::new(SoftwareDriver::new(driver_config));
        let display = Display::new(driver.clone());
        let client = Arc::new(RecordingClient::default());
        let log = DrawLog::default();
        let scene = CompositingScene::new(client.clone(), display.clone(), log.factory(), config);
        Self {
            scene,
            client,
            driver,
            display,
            log,
        }
    }

    pub fn paint(&self) {
        self.scene
            .paint_to_current_context(&Transform3d::IDENTITY, VIEWPORT, false);
    }

    /// Buffers drawn by the last paints, in order.
    pub fn drawn_buffers(&self) -> Vec<Option<BufferHandle>> {
        self.log
            .take()
            .into_iter()
            .filter_map(|d| match d {
                Draw::Layer { buffer, .. } => Some(buffer),
                _ => None,
            })
            .collect()
    }
}
