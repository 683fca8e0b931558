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

//! The frame driver: the ordering contract of one simulation tick.

use crate::config::FrameConfig;
use crate::error::{EngineError, Subsystem};
use tandem_core::asset::ResourceRequests;
use tandem_core::platform::{InputState, PlatformEvent, Time};
use tandem_core::renderer::{DeferredRenderContext, RenderEvent, Renderer};
use tandem_core::scene::{SceneFrame, SceneManager};

/// The steps of one tick, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramePhase {
    /// The scene advances.
    SceneUpdate,
    /// Event pumping and resource streaming are recorded as commands.
    RecordHousekeeping,
    /// The housekeeping batch is submitted.
    Submit,
    /// The renderer records the frame, which is submitted without blocking.
    RenderAll,
    /// Time advances and input is sampled.
    AdvanceTime,
}

/// What one tick produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOutcome {
    /// The frame number, starting at 1.
    pub frame: u64,
    /// The scene, the platform or the frame limit asked the loop to stop.
    pub exit_requested: bool,
    /// Command failures the render thread reported since the previous tick.
    pub command_failures: usize,
}

/// Everything a tick touches, borrowed from the engine.
pub struct FrameServices<'a> {
    /// The application's scene.
    pub scene: &'a mut dyn SceneManager,
    /// The active renderer.
    pub renderer: &'a mut dyn Renderer,
    /// The primary context.
    pub context: &'a mut DeferredRenderContext,
    /// Frame timing.
    pub time: &'a mut Time,
    /// Input state.
    pub input: &'a mut InputState,
    /// Handle for resource loads, passed to the scene.
    pub resources: &'a ResourceRequests,
    /// Events pumped on the render thread.
    pub platform_events: &'a flume::Receiver<PlatformEvent>,
    /// Render thread diagnostics.
    pub diagnostics: &'a flume::Receiver<RenderEvent>,
}

/// Runs ticks in the fixed phase order.
#[derive(Debug)]
pub struct FrameDriver {
    config: FrameConfig,
    frames: u64,
    last_phases: Vec<FramePhase>,
    command_failures: u64,
}

impl FrameDriver {
    /// Creates a driver that has not run any frame.
    pub fn new(config: FrameConfig) -> Self {
        Self {
            config,
            frames: 0,
            last_phases: Vec::with_capacity(5),
            command_failures: 0,
        }
    }

    /// Frames run so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// The phases the last tick went through.
    pub fn last_phases(&self) -> &[FramePhase] {
        &self.last_phases
    }

    /// Command failures reported over the driver's lifetime.
    pub fn command_failures(&self) -> u64 {
        self.command_failures
    }

    /// Returns `true` once `max_frames` frames have run.
    pub fn limit_reached(&self) -> bool {
        self.config.max_frames.is_some_and(|max| self.frames >= max)
    }

    fn enter(&mut self, phase: FramePhase) {
        log::trace!("Frame {}: {phase:?}", self.frames + 1);
        self.last_phases.push(phase);
    }

    /// Runs one tick.
    pub fn tick(&mut self, services: FrameServices<'_>) -> Result<FrameOutcome, EngineError> {
        let FrameServices {
            scene,
            renderer,
            context,
            time,
            input,
            resources,
            platform_events,
            diagnostics,
        } = services;
        self.last_phases.clear();

        self.enter(FramePhase::SceneUpdate);
        scene
            .update(&SceneFrame {
                time: &*time,
                input: &*input,
                resources,
            })
            .map_err(EngineError::Scene)?;

        self.enter(FramePhase::RecordHousekeeping);
        context.pump_platform_events();
        context.update_resources();

        self.enter(FramePhase::Submit);
        if self.config.blocking_event_pump {
            context.submit_and_wait()?;
        } else {
            context.submit()?;
        }

        self.enter(FramePhase::RenderAll);
        renderer
            .render_all(context, scene.renderables(), &scene.view())
            .map_err(|source| EngineError::Collaborator {
                subsystem: Subsystem::Renderer,
                source,
            })?;
        context.submit()?;

        self.enter(FramePhase::AdvanceTime);
        time.update();
        input.sample(platform_events);
        let command_failures = diagnostics
            .try_iter()
            .filter(|event| matches!(event, RenderEvent::CommandFailed { .. }))
            .count();
        self.command_failures += command_failures as u64;

        self.frames += 1;
        let exit_requested = scene.wants_exit() || input.close_requested() || self.limit_reached();
        if exit_requested {
            log::info!("Exit requested after frame {}.", self.frames);
        }
        Ok(FrameOutcome {
            frame: self.frames,
            exit_requested,
            command_failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::renderer::{RenderSystem, ViewInfo};
    use tandem_core::scene::Renderable;
    use tandem_core::EngineContext;
    use tandem_infra::{RenderBackend, RenderSystemConfig, SoftwareDevice, ThreadedRenderSystem};

    #[derive(Default)]
    struct CountingScene {
        updates: u64,
        frames_seen: Vec<u64>,
    }

    impl SceneManager for CountingScene {
        fn update(&mut self, frame: &SceneFrame<'_>) -> anyhow::Result<()> {
            self.updates += 1;
            self.frames_seen.push(frame.time.frame());
            Ok(())
        }

        fn renderables(&self) -> &[Renderable] {
            &[]
        }
    }

    struct MarkerRenderer;

    impl Renderer for MarkerRenderer {
        fn name(&self) -> &str {
            "Marker"
        }

        fn start_up(&mut self, _engine: &mut EngineContext<'_>) -> anyhow::Result<()> {
            Ok(())
        }

        fn render_all(
            &mut self,
            ctx: &mut DeferredRenderContext,
            _renderables: &[Renderable],
            _view: &ViewInfo,
        ) -> anyhow::Result<()> {
            ctx.debug_marker("render-all");
            ctx.present();
            Ok(())
        }
    }

    struct Harness {
        system: ThreadedRenderSystem,
        context: DeferredRenderContext,
        time: Time,
        input: InputState,
        resources: ResourceRequests,
        events: flume::Receiver<PlatformEvent>,
        diagnostics: flume::Receiver<RenderEvent>,
    }

    impl Harness {
        fn new() -> Self {
            let system = ThreadedRenderSystem::start(
                "frame",
                RenderSystemConfig::default(),
                RenderBackend::new(SoftwareDevice::new((16, 16))),
            )
            .unwrap();
            let context = system.create_deferred_context("primary").unwrap();
            let events = system.platform_events();
            let diagnostics = system.diagnostics();
            Self {
                system,
                context,
                time: Time::new(),
                input: InputState::new(),
                resources: ResourceRequests::channel().0,
                events,
                diagnostics,
            }
        }

        fn tick(
            &mut self,
            driver: &mut FrameDriver,
            scene: &mut dyn SceneManager,
        ) -> Result<FrameOutcome, EngineError> {
            driver.tick(FrameServices {
                scene,
                renderer: &mut MarkerRenderer,
                context: &mut self.context,
                time: &mut self.time,
                input: &mut self.input,
                resources: &self.resources,
                platform_events: &self.events,
                diagnostics: &self.diagnostics,
            })
        }
    }

    #[test]
    fn phases_run_in_order() {
        let mut harness = Harness::new();
        let mut driver = FrameDriver::new(FrameConfig::default());
        let mut scene = CountingScene::default();

        let outcome = harness.tick(&mut driver, &mut scene).unwrap();

        assert_eq!(
            driver.last_phases(),
            &[
                FramePhase::SceneUpdate,
                FramePhase::RecordHousekeeping,
                FramePhase::Submit,
                FramePhase::RenderAll,
                FramePhase::AdvanceTime,
            ]
        );
        assert_eq!(outcome.frame, 1);
        assert!(!outcome.exit_requested);
        assert_eq!(harness.time.frame(), 1);
        assert_eq!(scene.updates, 1);
    }

    #[test]
    fn scene_sees_time_advanced_by_the_previous_tick() {
        let mut harness = Harness::new();
        let mut driver = FrameDriver::new(FrameConfig::default());
        let mut scene = CountingScene::default();

        for _ in 0..3 {
            harness.tick(&mut driver, &mut scene).unwrap();
        }
        assert_eq!(scene.frames_seen, vec![0, 1, 2]);
    }

    #[test]
    fn frame_limit_requests_exit() {
        let mut harness = Harness::new();
        let mut driver = FrameDriver::new(FrameConfig {
            blocking_event_pump: false,
            max_frames: Some(2),
        });
        let mut scene = CountingScene::default();

        assert!(!harness.tick(&mut driver, &mut scene).unwrap().exit_requested);
        assert!(harness.tick(&mut driver, &mut scene).unwrap().exit_requested);
        assert!(driver.limit_reached());

        harness.context.submit_and_wait().unwrap();
        assert_eq!(harness.system.stats().frame_number, 2);
    }
}
