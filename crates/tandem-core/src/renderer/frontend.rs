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

use super::context::DeferredRenderContext;
use crate::context::EngineContext;
use crate::scene::Renderable;

/// Camera data for one render-all pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewInfo {
    /// Column-major view-projection matrix.
    pub view_projection: [f32; 16],
    /// Viewport size in pixels.
    pub viewport: (u32, u32),
    /// Colour the frame is cleared to.
    pub clear_color: [f32; 4],
}

impl Default for ViewInfo {
    fn default() -> Self {
        #[rustfmt::skip]
        let identity = [
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        Self {
            view_projection: identity,
            viewport: (1, 1),
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// A high-level renderer that turns renderables into draw commands.
///
/// Renderers are registered by plugins and selected by name at startup. They
/// only ever record commands; the render thread executes them.
pub trait Renderer: Send {
    /// The name the renderer is registered under.
    fn name(&self) -> &str;

    /// Prepares built-in programs and materials.
    fn start_up(&mut self, engine: &mut EngineContext<'_>) -> anyhow::Result<()>;

    /// Records one frame's draw commands.
    fn render_all(
        &mut self,
        ctx: &mut DeferredRenderContext,
        renderables: &[Renderable],
        view: &ViewInfo,
    ) -> anyhow::Result<()>;

    /// Releases what [`start_up`](Self::start_up) created.
    fn shut_down(&mut self, _ctx: &mut DeferredRenderContext) {}
}
