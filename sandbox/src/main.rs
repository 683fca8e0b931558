// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Tandem Sandbox
// Headless demo: a few sprites spin while the render thread draws them.

use std::mem;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use tandem_sdk::logging;
use tandem_sdk::prelude::*;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
    uv: [f32; 2],
}

const QUAD: &[Vertex] = &[
    Vertex { position: [-16.0, -16.0, 0.0], uv: [0.0, 1.0] },
    Vertex { position: [16.0, -16.0, 0.0], uv: [1.0, 1.0] },
    Vertex { position: [16.0, 16.0, 0.0], uv: [1.0, 0.0] },
    Vertex { position: [-16.0, -16.0, 0.0], uv: [0.0, 1.0] },
    Vertex { position: [16.0, 16.0, 0.0], uv: [1.0, 0.0] },
    Vertex { position: [-16.0, 16.0, 0.0], uv: [0.0, 0.0] },
];

const SPRITE_COUNT: usize = 4;
const CHECKER_SIZE: u32 = 8;

fn checker_texels() -> Vec<u8> {
    let mut texels = Vec::with_capacity((CHECKER_SIZE * CHECKER_SIZE * 4) as usize);
    for y in 0..CHECKER_SIZE {
        for x in 0..CHECKER_SIZE {
            let value = if (x + y) % 2 == 0 { 255 } else { 32 };
            texels.extend_from_slice(&[value, value, value, 255]);
        }
    }
    texels
}

fn transform(angle: f32, offset: [f32; 2]) -> [f32; 16] {
    let (sin, cos) = angle.sin_cos();
    #[rustfmt::skip]
    let m = [
        cos,       sin,       0.0, 0.0,
        -sin,      cos,       0.0, 0.0,
        0.0,       0.0,       1.0, 0.0,
        offset[0], offset[1], 0.0, 1.0,
    ];
    m
}

#[derive(Default)]
struct SandboxScene {
    renderables: Vec<Renderable>,
    angle: f32,
    width: u32,
}

impl SceneManager for SandboxScene {
    fn start(&mut self, engine: &mut EngineContext<'_>) -> anyhow::Result<()> {
        log::info!("SandboxScene: Initializing GPU resources...");
        self.width = engine.render_system.capabilities().surface_size.0;

        // --- Step 1: Built-in sprite programs, compiled by the renderer ---
        let builtin = BuiltinMaterialFactory::start_up(engine)?;

        // --- Step 2: Geometry and texture ---
        let quad = engine.context.create_buffer(
            BufferDescriptor {
                label: Some("Sprite Quad".into()),
                size: mem::size_of_val(QUAD) as u64,
                usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
            },
            None,
        );
        engine.context.write_buffer_pod(quad.id, 0, QUAD);

        let checker = engine.context.create_texture(
            TextureDescriptor {
                label: Some("Checker".into()),
                width: CHECKER_SIZE,
                height: CHECKER_SIZE,
                format: TextureFormat::Rgba8,
            },
            Some(checker_texels()),
        );

        engine
            .context
            .wait_until_ready(&quad.ready)
            .context("sprite quad was not created")?;
        engine
            .context
            .wait_until_ready(&checker.ready)
            .context("checker texture was not created")?;
        log::info!(" -> Quad {:?} and texture {:?} ready", quad.id, checker.id);

        // --- Step 3: One renderable per sprite, sharing the material ---
        let material = Arc::new(builtin.sprite_image_material(checker.id));
        for _ in 0..SPRITE_COUNT {
            self.renderables.push(Renderable {
                material: material.clone(),
                vertex_buffer: quad.id,
                vertex_stride: mem::size_of::<Vertex>() as u32,
                vertex_count: QUAD.len() as u32,
                transform: transform(0.0, [0.0, 0.0]),
            });
        }
        Ok(())
    }

    fn update(&mut self, frame: &SceneFrame<'_>) -> anyhow::Result<()> {
        self.angle += frame.time.delta_secs() * std::f32::consts::PI;
        let width = frame
            .input
            .surface_size()
            .map_or(self.width, |(width, _)| width);
        let spacing = width as f32 / (SPRITE_COUNT as f32 + 1.0);

        for (i, renderable) in self.renderables.iter_mut().enumerate() {
            let x = spacing * (i as f32 + 1.0);
            renderable.transform = transform(self.angle * (i as f32 + 1.0), [x, 0.0]);
        }
        if frame.time.frame() % 60 == 0 {
            log::debug!("Frame {}: angle {:.2}", frame.time.frame(), self.angle);
        }
        Ok(())
    }

    fn renderables(&self) -> &[Renderable] {
        &self.renderables
    }

    fn view(&self) -> ViewInfo {
        ViewInfo {
            viewport: (self.width, self.width),
            clear_color: [0.1, 0.1, 0.15, 1.0],
            ..ViewInfo::default()
        }
    }
}

fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::from_file(&path)
            .with_context(|| format!("cannot load configuration from '{path}'"))?,
        None => EngineConfig {
            frame: FrameConfig {
                max_frames: Some(240),
                ..FrameConfig::default()
            },
            ..EngineConfig::default()
        },
    };
    logging::builder(&config.log_filter)
        .filter_module("tandem_infra::device", log::LevelFilter::Warn)
        .init();

    let mut engine = Engine::new(config, SandboxScene::default())?;
    let frames = engine.run()?;
    if let Some(system) = engine.render_system() {
        let stats = system.stats();
        log::info!(
            "Ran {frames} frames: {} presented, {} draw calls, {} failed commands.",
            stats.frame_number,
            stats.draw_calls,
            stats.commands_failed
        );
    }
    Ok(())
}
