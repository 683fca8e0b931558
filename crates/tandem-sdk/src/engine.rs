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

//! The engine: ordered startup, the main loop, and reverse-order shutdown.

use crate::config::EngineConfig;
use crate::error::{EngineError, Subsystem};
use crate::frame::{FrameDriver, FrameOutcome, FrameServices};
use crate::importer::ImporterRegistry;
use crate::resources::ResourceManager;
use tandem_core::asset::ResourceRequests;
use tandem_core::platform::{InputState, PlatformEvent, Time};
use tandem_core::renderer::{
    DeferredRenderContext, GpuProgramManager, RenderError, RenderEvent, RenderSystem, Renderer,
};
use tandem_core::scene::SceneManager;
use tandem_core::EngineContext;
use tandem_core::plugin::PLUGIN_ENTRY_POINT;
use tandem_infra::render::AVAILABLE_BACKENDS;
use tandem_infra::{
    select_backend, EventInjector, ModuleSource, PluginLoader, PluginRegistry, StaticModuleSource,
    ThreadedRenderSystem,
};

/// The order subsystems start in. They stop in the reverse order, so the
/// render system outlives every deferred context.
pub const STARTUP_ORDER: [Subsystem; 11] = [
    Subsystem::Time,
    Subsystem::Input,
    Subsystem::PluginManager,
    Subsystem::GpuProgramManager,
    Subsystem::RenderSystem,
    Subsystem::Renderer,
    Subsystem::PrimaryContext,
    Subsystem::SceneManager,
    Subsystem::Resources,
    Subsystem::Importer,
    Subsystem::ImporterPlugins,
];

fn not_running() -> EngineError {
    EngineError::Render(RenderError::NotInitialized)
}

/// Owns every subsystem and drives the main loop.
pub struct Engine<S: SceneManager> {
    config: EngineConfig,
    started: Vec<Subsystem>,
    time: Time,
    input: InputState,
    plugins: PluginLoader,
    registry: PluginRegistry,
    programs: GpuProgramManager,
    render_system: Option<Box<dyn RenderSystem>>,
    injector: Option<EventInjector>,
    platform_events: Option<flume::Receiver<PlatformEvent>>,
    diagnostics: Option<flume::Receiver<RenderEvent>>,
    renderer: Option<Box<dyn Renderer>>,
    context: Option<DeferredRenderContext>,
    scene: S,
    resources: Option<ResourceRequests>,
    importers: ImporterRegistry,
    driver: FrameDriver,
}

impl<S: SceneManager> Engine<S> {
    /// Starts the engine with the plugins linked into the binary.
    pub fn new(config: EngineConfig, scene: S) -> Result<Self, EngineError> {
        Self::with_module_source(config, scene, StaticModuleSource::linked())
    }

    /// Starts the engine, resolving plugin modules through `source`.
    ///
    /// If a subsystem fails to start, the ones already started are stopped
    /// in reverse order before the error is returned.
    pub fn with_module_source(
        config: EngineConfig,
        scene: S,
        source: impl ModuleSource + 'static,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let mut engine = Self {
            driver: FrameDriver::new(config.frame.clone()),
            config,
            started: Vec::with_capacity(STARTUP_ORDER.len()),
            time: Time::new(),
            input: InputState::new(),
            plugins: PluginLoader::new(source, PLUGIN_ENTRY_POINT),
            registry: PluginRegistry::default(),
            programs: GpuProgramManager::default(),
            render_system: None,
            injector: None,
            platform_events: None,
            diagnostics: None,
            renderer: None,
            context: None,
            scene,
            resources: None,
            importers: ImporterRegistry::default(),
        };
        engine.start_up()?;
        Ok(engine)
    }

    fn start_up(&mut self) -> Result<(), EngineError> {
        for subsystem in STARTUP_ORDER {
            log::debug!("Starting {subsystem}.");
            if let Err(err) = self.start_subsystem(subsystem) {
                log::error!("Failed to start {subsystem}: {err}");
                return Err(err);
            }
            self.started.push(subsystem);
        }
        log::info!("Engine started ({} subsystems).", self.started.len());
        Ok(())
    }

    fn start_subsystem(&mut self, subsystem: Subsystem) -> Result<(), EngineError> {
        match subsystem {
            Subsystem::Time => self.time = Time::new(),
            Subsystem::Input => self.input = InputState::new(),
            Subsystem::PluginManager => {
                let module = &self.config.renderer.module;
                if !self.plugins.load_into(module, &mut self.registry)? {
                    log::warn!("Renderer module '{module}' was not found.");
                }
            }
            Subsystem::GpuProgramManager => self.programs = GpuProgramManager::default(),
            Subsystem::RenderSystem => self.start_render_system()?,
            Subsystem::Renderer => self.start_renderer()?,
            Subsystem::PrimaryContext => {
                let system = self.render_system.as_deref().ok_or_else(not_running)?;
                let context = system.create_deferred_context("primary")?;
                self.context = Some(context);
            }
            Subsystem::SceneManager => {
                let system = self.render_system.as_deref().ok_or_else(not_running)?;
                let context = self.context.as_mut().ok_or_else(not_running)?;
                self.scene
                    .start(&mut EngineContext {
                        render_system: system,
                        context,
                        programs: &mut self.programs,
                    })
                    .map_err(EngineError::Scene)?;
            }
            Subsystem::Resources => {
                let system = self.render_system.as_deref().ok_or_else(not_running)?;
                let (requests, receiver) = ResourceRequests::channel();
                system.attach_streamer(Box::new(ResourceManager::new(
                    receiver,
                    self.importers.clone(),
                    self.config.resources_root.clone(),
                    system.ids(),
                    self.config.resources.max_loads_per_update,
                )))?;
                self.resources = Some(requests);
            }
            Subsystem::Importer => self.register_plugin_importers(),
            Subsystem::ImporterPlugins => {
                for module in &self.config.plugins {
                    if !self.plugins.load_into(module, &mut self.registry)? {
                        log::warn!("Plugin module '{module}' was not found; skipping it.");
                    }
                }
                self.register_plugin_importers();
            }
        }
        Ok(())
    }

    fn start_render_system(&mut self) -> Result<(), EngineError> {
        let window = self
            .config
            .window
            .as_ref()
            .ok_or(EngineError::MissingRenderWindow)?;
        let name = &self.config.render_system;
        let selection = select_backend(name, (window.width, window.height)).ok_or_else(|| {
            EngineError::MissingRenderSystem {
                name: name.clone(),
                known: AVAILABLE_BACKENDS.join(", "),
            }
        })?;

        let system = ThreadedRenderSystem::start(
            name.clone(),
            self.config.render_thread.clone().into(),
            selection.backend,
        )?;
        self.programs.bind_device(system.capabilities());
        self.platform_events = Some(system.platform_events());
        self.diagnostics = Some(system.diagnostics());
        self.injector = selection.injector;
        log::info!(
            "Render window '{}' is {}x{}.",
            window.title,
            window.width,
            window.height
        );
        self.render_system = Some(Box::new(system));
        Ok(())
    }

    /// Creates the configured renderer and lets it prepare its programs on a
    /// context of its own, flushed before startup continues.
    fn start_renderer(&mut self) -> Result<(), EngineError> {
        let renderer_config = &self.config.renderer;
        let mut renderer = self
            .registry
            .create_renderer(&renderer_config.name)
            .ok_or_else(|| EngineError::MissingRenderer {
                module: renderer_config.module.clone(),
                name: renderer_config.name.clone(),
            })?;

        let system = self.render_system.as_deref().ok_or_else(not_running)?;
        let mut context = system.create_deferred_context("renderer-startup")?;
        let started = renderer.start_up(&mut EngineContext {
            render_system: system,
            context: &mut context,
            programs: &mut self.programs,
        });
        context.submit_and_wait()?;
        started.map_err(|source| EngineError::Collaborator {
            subsystem: Subsystem::Renderer,
            source,
        })?;

        log::info!("Renderer '{}' is active.", renderer.name());
        self.renderer = Some(renderer);
        Ok(())
    }

    fn register_plugin_importers(&mut self) {
        for importer in self.registry.take_importers() {
            self.importers.register(importer);
        }
    }

    /// Stops every started subsystem in reverse startup order and returns
    /// the order they stopped in. Calling it again does nothing.
    pub fn shut_down(&mut self) -> Vec<Subsystem> {
        let mut stopped = Vec::with_capacity(self.started.len());
        if self.started.is_empty() {
            return stopped;
        }
        log::info!("Shutting down after {} frames.", self.driver.frames());
        while let Some(subsystem) = self.started.pop() {
            log::debug!("Stopping {subsystem}.");
            self.stop_subsystem(subsystem);
            stopped.push(subsystem);
        }
        log::info!("Engine shutdown complete.");
        stopped
    }

    fn stop_subsystem(&mut self, subsystem: Subsystem) {
        match subsystem {
            Subsystem::ImporterPlugins => {
                log::debug!("Plugins loaded: {:?}", self.plugins.loaded());
            }
            Subsystem::Importer => self.importers.clear(),
            // Loads still queued are abandoned when the render thread stops.
            Subsystem::Resources => self.resources = None,
            Subsystem::SceneManager => {
                if let Some(context) = self.context.as_mut() {
                    self.scene.shut_down(context);
                }
            }
            Subsystem::PrimaryContext => {
                if let Some(mut context) = self.context.take() {
                    if let Err(err) = context.submit_and_wait() {
                        log::warn!("Final flush of the primary context failed: {err}");
                    }
                }
            }
            Subsystem::Renderer => self.stop_renderer(),
            Subsystem::RenderSystem => {
                self.injector = None;
                self.platform_events = None;
                self.diagnostics = None;
                if let Some(mut system) = self.render_system.take() {
                    system.shutdown();
                }
            }
            Subsystem::GpuProgramManager => {
                self.programs = GpuProgramManager::default();
            }
            Subsystem::PluginManager => {
                self.plugins.unload_all();
                self.registry = PluginRegistry::default();
            }
            Subsystem::Input => self.input = InputState::new(),
            Subsystem::Time => {
                log::debug!("Ran for {:?}.", self.time.elapsed());
            }
        }
    }

    /// Shuts the renderer down and releases every cached program while the
    /// device is still alive.
    fn stop_renderer(&mut self) {
        let Some(mut renderer) = self.renderer.take() else {
            return;
        };
        let Some(system) = self.render_system.as_deref() else {
            return;
        };
        match system.create_deferred_context("renderer-teardown") {
            Ok(mut context) => {
                renderer.shut_down(&mut context);
                self.programs.clear(&mut context);
                if let Err(err) = context.submit_and_wait() {
                    log::warn!("Renderer teardown did not complete: {err}");
                }
            }
            Err(err) => log::warn!("Cannot shut the renderer down cleanly: {err}"),
        }
    }

    /// Runs one tick of the main loop.
    pub fn tick(&mut self) -> Result<FrameOutcome, EngineError> {
        let (Some(renderer), Some(context), Some(resources), Some(platform_events), Some(diagnostics)) = (
            self.renderer.as_deref_mut(),
            self.context.as_mut(),
            self.resources.as_ref(),
            self.platform_events.as_ref(),
            self.diagnostics.as_ref(),
        ) else {
            return Err(not_running());
        };

        let outcome = self.driver.tick(FrameServices {
            scene: &mut self.scene,
            renderer,
            context,
            time: &mut self.time,
            input: &mut self.input,
            resources,
            platform_events,
            diagnostics,
        })?;
        if outcome.command_failures > 0 {
            log::warn!(
                "Frame {}: {} commands failed on the render thread.",
                outcome.frame,
                outcome.command_failures
            );
        }
        Ok(outcome)
    }

    /// Ticks until the scene, the platform or the frame limit asks to stop.
    /// Returns the number of frames run.
    pub fn run(&mut self) -> Result<u64, EngineError> {
        loop {
            if self.tick()?.exit_requested {
                return Ok(self.driver.frames());
            }
        }
    }

    /// The configuration the engine started with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Started subsystems, in startup order.
    pub fn started(&self) -> &[Subsystem] {
        &self.started
    }

    /// The application's scene.
    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// The application's scene, mutably.
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    /// The active render system.
    pub fn render_system(&self) -> Option<&dyn RenderSystem> {
        self.render_system.as_deref()
    }

    /// Feeds platform events to a headless backend.
    pub fn event_injector(&self) -> Option<&EventInjector> {
        self.injector.as_ref()
    }

    /// Handle for requesting resource loads.
    pub fn resources(&self) -> Option<&ResourceRequests> {
        self.resources.as_ref()
    }

    /// The importer registry.
    pub fn importers(&self) -> &ImporterRegistry {
        &self.importers
    }

    /// Frame timing.
    pub fn time(&self) -> &Time {
        &self.time
    }

    /// Input state as of the last tick.
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// The frame driver.
    pub fn driver(&self) -> &FrameDriver {
        &self.driver
    }

    /// Names of the loaded plugins, in load order.
    pub fn loaded_plugins(&self) -> Vec<&str> {
        self.plugins.loaded()
    }

    /// Access to the render system, the primary context and the program
    /// cache, for work outside the scene's own callbacks.
    pub fn engine_context(&mut self) -> Option<EngineContext<'_>> {
        Some(EngineContext {
            render_system: self.render_system.as_deref()?,
            context: self.context.as_mut()?,
            programs: &mut self.programs,
        })
    }
}

impl<S: SceneManager> Drop for Engine<S> {
    fn drop(&mut self) {
        self.shut_down();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::scene::{Renderable, SceneFrame};

    struct IdleScene;

    impl SceneManager for IdleScene {
        fn update(&mut self, _frame: &SceneFrame<'_>) -> anyhow::Result<()> {
            Ok(())
        }

        fn renderables(&self) -> &[Renderable] {
            &[]
        }
    }

    #[test]
    fn startup_follows_the_documented_order() {
        let engine = Engine::new(EngineConfig::default(), IdleScene).unwrap();
        assert_eq!(engine.started(), &STARTUP_ORDER[..]);
        assert!(engine.render_system().is_some());
        assert_eq!(engine.loaded_plugins(), vec!["ForwardRenderer", "RawImporter"]);
    }

    #[test]
    fn shutdown_runs_in_reverse_and_only_once() {
        let mut engine = Engine::new(EngineConfig::default(), IdleScene).unwrap();
        let stopped = engine.shut_down();

        let mut expected = STARTUP_ORDER.to_vec();
        expected.reverse();
        assert_eq!(stopped, expected);
        assert!(engine.render_system().is_none());
        assert!(engine.shut_down().is_empty());
        assert!(matches!(engine.tick(), Err(EngineError::Render(RenderError::NotInitialized))));
    }
}
