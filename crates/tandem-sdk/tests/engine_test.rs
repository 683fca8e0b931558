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

use anyhow::Result;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tandem_core::asset::LoadedResource;
use tandem_core::plugin::{Plugin, PluginError, PluginHost, PluginRegistration};
use tandem_core::renderer::{
    BufferDescriptor, BufferUsage, DeferredRenderContext, RenderError, TextureDescriptor,
    TextureFormat,
};
use tandem_core::scene::{Renderable, SceneFrame, SceneManager};
use tandem_core::{EngineContext, WaitOptions};
use tandem_infra::{BuiltinMaterialFactory, StaticModuleSource};
use tandem_sdk::{Engine, EngineConfig, EngineError, Subsystem, STARTUP_ORDER};

// --- Test Setup ---

#[derive(Default)]
struct IdleScene {
    updates: u64,
}

impl SceneManager for IdleScene {
    fn update(&mut self, _frame: &SceneFrame<'_>) -> anyhow::Result<()> {
        self.updates += 1;
        Ok(())
    }

    fn renderables(&self) -> &[Renderable] {
        &[]
    }
}

/// Records the lifecycle callbacks it receives into a shared log.
struct LifecycleScene {
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl SceneManager for LifecycleScene {
    fn start(&mut self, engine: &mut EngineContext<'_>) -> anyhow::Result<()> {
        // The renderer already compiled the built-in programs.
        assert!(engine.programs.get("SpriteImage.vs").is_some());
        self.log.lock().unwrap().push("start");
        Ok(())
    }

    fn update(&mut self, _frame: &SceneFrame<'_>) -> anyhow::Result<()> {
        self.log.lock().unwrap().push("update");
        Ok(())
    }

    fn renderables(&self) -> &[Renderable] {
        &[]
    }

    fn shut_down(&mut self, _ctx: &mut DeferredRenderContext) {
        self.log.lock().unwrap().push("shut_down");
    }
}

/// Draws one textured triangle with the built-in image material.
#[derive(Default)]
struct SpriteScene {
    renderables: Vec<Renderable>,
}

impl SceneManager for SpriteScene {
    fn start(&mut self, engine: &mut EngineContext<'_>) -> anyhow::Result<()> {
        let builtin = BuiltinMaterialFactory::start_up(engine)?;
        let texture = engine.context.create_texture(
            TextureDescriptor {
                label: Some("checker".to_string()),
                width: 2,
                height: 2,
                format: TextureFormat::Rgba8,
            },
            Some(vec![255; 16]),
        );
        let vertices = engine.context.create_buffer(
            BufferDescriptor {
                label: Some("sprite".to_string()),
                size: 36,
                usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
            },
            Some(vec![0; 36]),
        );
        engine.context.wait_until_ready(&texture.ready)?;
        engine.context.wait_until_ready(&vertices.ready)?;

        self.renderables.push(Renderable {
            material: Arc::new(builtin.sprite_image_material(texture.id)),
            vertex_buffer: vertices.id,
            vertex_stride: 12,
            vertex_count: 3,
            transform: identity(),
        });
        Ok(())
    }

    fn update(&mut self, _frame: &SceneFrame<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    fn renderables(&self) -> &[Renderable] {
        &self.renderables
    }
}

struct NamelessPlugin;

impl Plugin for NamelessPlugin {
    fn name(&self) -> &str {
        "Nameless"
    }

    fn register(&self, _host: &mut dyn PluginHost) -> Result<(), PluginError> {
        Ok(())
    }
}

fn nameless_plugin() -> Box<dyn Plugin> {
    Box::new(NamelessPlugin)
}

fn identity() -> [f32; 16] {
    let mut m = [0.0; 16];
    for i in 0..4 {
        m[i * 5] = 1.0;
    }
    m
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config_with_frame_limit(frames: u64) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.frame.max_frames = Some(frames);
    config
}

/// Blocks until everything submitted on the primary context has executed.
fn flush<S: SceneManager>(engine: &mut Engine<S>) -> Result<()> {
    let mut engine_context = engine
        .engine_context()
        .ok_or_else(|| anyhow::anyhow!("engine is not running"))?;
    let done = engine_context.context.signal();
    engine_context.context.wait_until_ready(&done)?;
    Ok(())
}

// --- Startup and shutdown ---

#[test]
fn scene_starts_after_the_renderer_and_stops_before_teardown() -> Result<()> {
    init_logging();
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut engine = Engine::new(
        config_with_frame_limit(2),
        LifecycleScene { log: log.clone() },
    )?;
    assert_eq!(engine.started(), &STARTUP_ORDER[..]);

    assert_eq!(engine.run()?, 2);
    let stopped = engine.shut_down();
    assert_eq!(stopped.first(), Some(&Subsystem::ImporterPlugins));
    assert_eq!(stopped.last(), Some(&Subsystem::Time));
    assert_eq!(
        *log.lock().unwrap(),
        vec!["start", "update", "update", "shut_down"]
    );
    Ok(())
}

#[test]
fn missing_window_is_fatal() {
    init_logging();
    let mut config = EngineConfig::default();
    config.window = None;

    let err = Engine::new(config, IdleScene::default()).err();
    assert!(matches!(err, Some(EngineError::MissingRenderWindow)));
}

#[test]
fn unknown_render_system_is_fatal() {
    init_logging();
    let mut config = EngineConfig::default();
    config.render_system = "direct3d9".to_string();

    match Engine::new(config, IdleScene::default()) {
        Err(EngineError::MissingRenderSystem { name, known }) => {
            assert_eq!(name, "direct3d9");
            assert_eq!(known, "software");
        }
        other => panic!("expected MissingRenderSystem, got {:?}", other.err()),
    }
}

#[test]
fn unknown_renderer_is_fatal() {
    init_logging();
    let mut config = EngineConfig::default();
    config.renderer.name = "DeferredRenderer".to_string();

    let err = Engine::new(config, IdleScene::default()).err();
    assert!(matches!(
        err,
        Some(EngineError::MissingRenderer { ref name, .. }) if name == "DeferredRenderer"
    ));
}

#[test]
fn plugin_without_entry_point_is_fatal() {
    init_logging();
    let source = StaticModuleSource::default().with(PluginRegistration {
        module: "tandem_forward_renderer",
        symbol: "plugin_main",
        entry: nameless_plugin,
    });

    let err = Engine::with_module_source(EngineConfig::default(), IdleScene::default(), source).err();
    assert!(matches!(
        err,
        Some(EngineError::Plugin(PluginError::MissingEntryPoint { .. }))
    ));
}

#[test]
fn missing_importer_plugin_is_skipped() -> Result<()> {
    init_logging();
    let mut config = config_with_frame_limit(1);
    config.plugins.push("tandem_gltf_importer".to_string());

    let engine = Engine::new(config, IdleScene::default())?;
    assert_eq!(engine.loaded_plugins(), vec!["ForwardRenderer", "RawImporter"]);
    assert_eq!(engine.importers().extensions(), vec!["bin", "hlsl", "rgba"]);
    Ok(())
}

#[test]
fn configuration_loads_from_a_file() -> Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("engine.json");
    std::fs::write(
        &path,
        r#"{ "window": { "title": "From file", "width": 320, "height": 240 },
             "frame": { "max_frames": 3 } }"#,
    )?;

    let config = EngineConfig::from_file(&path)?;
    let mut engine = Engine::new(config, IdleScene::default())?;
    assert_eq!(engine.render_system().map(|s| s.capabilities().surface_size), Some((320, 240)));
    assert_eq!(engine.run()?, 3);
    assert_eq!(engine.scene().updates, 3);
    Ok(())
}

// --- Main loop ---

#[test]
fn close_request_ends_the_run() -> Result<()> {
    init_logging();
    let mut engine = Engine::new(EngineConfig::default(), IdleScene::default())?;
    let injector = engine
        .event_injector()
        .ok_or_else(|| anyhow::anyhow!("software backend has an injector"))?;
    assert!(injector.request_close());

    assert_eq!(engine.run()?, 1);
    assert!(engine.input().close_requested());
    Ok(())
}

#[test]
fn forward_renderer_draws_scene_renderables() -> Result<()> {
    init_logging();
    let mut engine = Engine::new(config_with_frame_limit(3), SpriteScene::default())?;
    assert_eq!(engine.run()?, 3);
    flush(&mut engine)?;

    let stats = engine
        .render_system()
        .map(|system| system.stats())
        .ok_or_else(|| anyhow::anyhow!("render system is running"))?;
    assert_eq!(stats.frame_number, 3);
    assert_eq!(stats.draw_calls, 3);
    assert_eq!(stats.triangles_rendered, 3);
    Ok(())
}

#[test]
fn resources_load_through_the_importer_plugins() -> Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("triangle.bin"), [0u8; 36])?;
    let mut config = EngineConfig::default();
    config.resources_root = dir.path().to_path_buf();

    let mut engine = Engine::new(config, IdleScene::default())?;
    let requests = engine
        .resources()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("resources are running"))?;
    let buffer = requests.load("triangle.bin");
    let missing = requests.load("missing.bin");

    // Housekeeping of one tick streams both requests.
    engine.tick()?;
    let options = WaitOptions::unbounded().with_timeout(Duration::from_secs(5));
    assert!(matches!(
        buffer.wait_with(&options)?,
        LoadedResource::Buffer { size: 36, .. }
    ));
    assert!(missing.wait_with(&options).is_err());
    Ok(())
}

#[test]
fn ticking_after_shutdown_is_an_error() -> Result<()> {
    init_logging();
    let mut engine = Engine::new(EngineConfig::default(), IdleScene::default())?;
    engine.tick()?;
    engine.shut_down();

    assert!(matches!(
        engine.tick(),
        Err(EngineError::Render(RenderError::NotInitialized))
    ));
    Ok(())
}
