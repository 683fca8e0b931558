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

//! A single-pass forward renderer.

use super::builtin::BuiltinMaterialFactory;
use tandem_core::context::EngineContext;
use tandem_core::plugin::{Plugin, PluginError, PluginHost, PluginRegistration, PLUGIN_ENTRY_POINT};
use tandem_core::renderer::{
    DeferredRenderContext, DrawCall, Material, ParamValue, PassDescriptor, Renderer, ViewInfo,
};
use tandem_core::scene::Renderable;

/// Module name the forward renderer plugin is linked under.
pub const FORWARD_RENDERER_MODULE: &str = "tandem_forward_renderer";
/// Name the forward renderer registers itself with.
pub const FORWARD_RENDERER_NAME: &str = "ForwardRenderer";

/// Draws every ready renderable into one clearing pass, then presents.
#[derive(Debug, Default)]
pub struct ForwardRenderer {
    builtin: Option<BuiltinMaterialFactory>,
    frames_recorded: u64,
    skipped_last_frame: usize,
}

impl ForwardRenderer {
    /// Built-in materials, available once the renderer has started.
    pub fn builtin(&self) -> Option<&BuiltinMaterialFactory> {
        self.builtin.as_ref()
    }

    /// Number of frames recorded so far.
    pub fn frames_recorded(&self) -> u64 {
        self.frames_recorded
    }

    /// Renderables skipped in the last frame because their programs were not ready.
    pub fn skipped_last_frame(&self) -> usize {
        self.skipped_last_frame
    }

    fn record_renderable(
        ctx: &mut DeferredRenderContext,
        renderable: &Renderable,
        view: &ViewInfo,
    ) {
        let material: &Material = &renderable.material;
        material.bind(ctx);

        let vertex = material.vertex_program.ready.expect_ready();
        let (width, height) = view.viewport;
        if vertex.has_parameter("worldTransform") {
            ctx.set_parameter("worldTransform", ParamValue::Mat4(renderable.transform));
        }
        if vertex.has_parameter("viewProjection") {
            ctx.set_parameter("viewProjection", ParamValue::Mat4(view.view_projection));
        }
        if vertex.has_parameter("halfViewportWidth") {
            ctx.set_parameter("halfViewportWidth", ParamValue::Float(width as f32 * 0.5));
        }
        if vertex.has_parameter("halfViewportHeight") {
            ctx.set_parameter("halfViewportHeight", ParamValue::Float(height as f32 * 0.5));
        }

        ctx.draw(DrawCall {
            vertex_buffer: renderable.vertex_buffer,
            vertex_stride: renderable.vertex_stride,
            first_vertex: 0,
            vertex_count: renderable.vertex_count,
            instance_count: 1,
        });
    }
}

impl Renderer for ForwardRenderer {
    fn name(&self) -> &str {
        FORWARD_RENDERER_NAME
    }

    fn start_up(&mut self, engine: &mut EngineContext<'_>) -> anyhow::Result<()> {
        self.builtin = Some(BuiltinMaterialFactory::start_up(engine)?);
        log::info!("{FORWARD_RENDERER_NAME} started.");
        Ok(())
    }

    fn render_all(
        &mut self,
        ctx: &mut DeferredRenderContext,
        renderables: &[Renderable],
        view: &ViewInfo,
    ) -> anyhow::Result<()> {
        self.frames_recorded += 1;
        self.skipped_last_frame = 0;

        ctx.debug_marker(format!("forward frame {}", self.frames_recorded));
        ctx.begin_pass(PassDescriptor::clearing("forward", view.clear_color));
        for renderable in renderables {
            if !renderable.material.is_ready() {
                log::trace!(
                    "Skipping '{}': programs not ready.",
                    renderable.material.name
                );
                self.skipped_last_frame += 1;
                continue;
            }
            Self::record_renderable(ctx, renderable, view);
        }
        ctx.end_pass();
        ctx.present();
        Ok(())
    }

    fn shut_down(&mut self, _ctx: &mut DeferredRenderContext) {
        // Programs belong to the program manager, which releases them.
        self.builtin = None;
        log::info!(
            "{FORWARD_RENDERER_NAME} shut down after {} frames.",
            self.frames_recorded
        );
    }
}

struct ForwardRendererPlugin;

impl Plugin for ForwardRendererPlugin {
    fn name(&self) -> &str {
        FORWARD_RENDERER_NAME
    }

    fn register(&self, host: &mut dyn PluginHost) -> Result<(), PluginError> {
        host.register_renderer(
            FORWARD_RENDERER_NAME,
            Box::new(|| Box::new(ForwardRenderer::default())),
        );
        Ok(())
    }
}

fn load_plugin() -> Box<dyn Plugin> {
    Box::new(ForwardRendererPlugin)
}

inventory::submit! {
    PluginRegistration {
        module: FORWARD_RENDERER_MODULE,
        symbol: PLUGIN_ENTRY_POINT,
        entry: load_plugin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tandem_core::command::Command;
    use tandem_core::renderer::{
        BufferId, ContextId, GpuProgram, GpuProgramHandle, IdAllocator, ProgramId, ProgramKind,
        RenderRequest,
    };
    use tandem_core::sync::ReadinessToken;

    fn ready_program(id: u64, kind: ProgramKind, parameters: &[&str]) -> GpuProgramHandle {
        GpuProgramHandle {
            id: ProgramId(id),
            ready: ReadinessToken::ready(GpuProgram {
                id: ProgramId(id),
                name: format!("p{id}"),
                kind,
                parameters: parameters.iter().map(|p| p.to_string()).collect(),
            }),
        }
    }

    fn context() -> (DeferredRenderContext, flume::Receiver<RenderRequest>) {
        let (tx, rx) = flume::unbounded();
        let ctx = DeferredRenderContext::new(ContextId(1), "test", tx, IdAllocator::shared())
            .unwrap();
        (ctx, rx)
    }

    fn queue_of(rx: &flume::Receiver<RenderRequest>) -> Arc<tandem_core::CommandQueue> {
        match rx.try_recv().unwrap() {
            RenderRequest::Register { queue, .. } => queue,
            other => panic!("unexpected request {other:?}"),
        }
    }

    fn renderable(material: Material) -> Renderable {
        Renderable {
            material: Arc::new(material),
            vertex_buffer: BufferId(7),
            vertex_stride: 20,
            vertex_count: 6,
            transform: ViewInfo::default().view_projection,
        }
    }

    #[test]
    fn frame_is_one_pass_followed_by_present() {
        let (mut ctx, rx) = context();
        let queue = queue_of(&rx);
        let material = Material::builder(
            "sprite",
            ready_program(1, ProgramKind::Vertex, &["worldTransform", "halfViewportWidth"]),
            ready_program(2, ProgramKind::Fragment, &["mainTexture"]),
        )
        .build();

        let mut renderer = ForwardRenderer::default();
        let view = ViewInfo {
            viewport: (640, 480),
            ..ViewInfo::default()
        };
        renderer
            .render_all(&mut ctx, &[renderable(material)], &view)
            .unwrap();

        let labels: Vec<&str> = queue.drain_for_execution().iter().map(Command::label).collect();
        assert_eq!(
            labels,
            vec![
                "DebugMarker",
                "BeginPass",
                "SetPipelineState",
                "BindProgram",
                "BindProgram",
                "SetParameter",
                "SetParameter",
                "Draw",
                "EndPass",
                "Present",
            ]
        );
        assert_eq!(renderer.frames_recorded(), 1);
    }

    #[test]
    fn half_viewport_is_derived_from_the_view() {
        let (mut ctx, rx) = context();
        let queue = queue_of(&rx);
        let material = Material::builder(
            "sprite",
            ready_program(1, ProgramKind::Vertex, &["halfViewportHeight"]),
            ready_program(2, ProgramKind::Fragment, &[]),
        )
        .build();
        let view = ViewInfo {
            viewport: (640, 480),
            ..ViewInfo::default()
        };

        ForwardRenderer::default()
            .render_all(&mut ctx, &[renderable(material)], &view)
            .unwrap();

        let value = queue.drain_for_execution().into_iter().find_map(|c| match c {
            Command::SetParameter { name, value } if name == "halfViewportHeight" => Some(value),
            _ => None,
        });
        assert_eq!(value, Some(ParamValue::Float(240.0)));
    }

    #[test]
    fn renderables_with_pending_programs_are_skipped() {
        let (mut ctx, rx) = context();
        let queue = queue_of(&rx);
        let (pending, _completer) = ReadinessToken::<GpuProgram>::pending();
        let material = Material::builder(
            "pending",
            GpuProgramHandle {
                id: ProgramId(1),
                ready: pending,
            },
            ready_program(2, ProgramKind::Fragment, &[]),
        )
        .build();

        let mut renderer = ForwardRenderer::default();
        renderer
            .render_all(&mut ctx, &[renderable(material)], &ViewInfo::default())
            .unwrap();

        assert_eq!(renderer.skipped_last_frame(), 1);
        let drained = queue.drain_for_execution();
        assert!(!drained.iter().any(|c| matches!(c, Command::Draw(_))));
        assert!(matches!(drained.last(), Some(Command::Present)));
    }

    #[test]
    fn plugin_is_linked_under_its_module_name() {
        let registration = tandem_core::plugin::linked_registrations()
            .find(|r| r.module == FORWARD_RENDERER_MODULE)
            .expect("forward renderer is linked");
        assert_eq!(registration.symbol, PLUGIN_ENTRY_POINT);
        assert_eq!((registration.entry)().name(), FORWARD_RENDERER_NAME);
    }
}
