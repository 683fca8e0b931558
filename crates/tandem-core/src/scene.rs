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

//! The scene collaborator: per-object update logic lives behind this trait.

use crate::asset::ResourceRequests;
use crate::context::EngineContext;
use crate::platform::{InputState, Time};
use crate::renderer::context::DeferredRenderContext;
use crate::renderer::frontend::ViewInfo;
use crate::renderer::material::Material;
use crate::renderer::types::BufferId;
use std::sync::Arc;

/// Something the renderer draws.
#[derive(Debug, Clone)]
pub struct Renderable {
    /// Material used for the draw.
    pub material: Arc<Material>,
    /// Vertex buffer holding a triangle list.
    pub vertex_buffer: BufferId,
    /// Size of one vertex in bytes.
    pub vertex_stride: u32,
    /// Number of vertices to draw.
    pub vertex_count: u32,
    /// Column-major world transform.
    pub transform: [f32; 16],
}

/// What a scene sees during its update.
pub struct SceneFrame<'a> {
    /// Frame timing.
    pub time: &'a Time,
    /// Input sampled at the end of the previous tick.
    pub input: &'a InputState,
    /// Handle for requesting resource loads.
    pub resources: &'a ResourceRequests,
}

/// Owns the simulation state and exposes what should be drawn.
pub trait SceneManager: Send {
    /// Called once during engine startup.
    fn start(&mut self, _engine: &mut EngineContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Advances the simulation by one tick.
    fn update(&mut self, frame: &SceneFrame<'_>) -> anyhow::Result<()>;

    /// What should be drawn this frame.
    fn renderables(&self) -> &[Renderable];

    /// The camera for this frame.
    fn view(&self) -> ViewInfo {
        ViewInfo::default()
    }

    /// Returns `true` when the scene wants the main loop to end.
    fn wants_exit(&self) -> bool {
        false
    }

    /// Called once during engine shutdown.
    fn shut_down(&mut self, _ctx: &mut DeferredRenderContext) {}
}
