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

//! Core engine context handed to collaborators during startup.

use crate::renderer::{DeferredRenderContext, GpuProgramManager, RenderSystem};

/// Engine context providing access to the rendering subsystems.
///
/// The engine builds one of these when it starts a collaborator, instead of
/// the collaborator reaching for global state.
pub struct EngineContext<'a> {
    /// The active render system.
    pub render_system: &'a dyn RenderSystem,
    /// The primary deferred context, owned by the simulation thread.
    pub context: &'a mut DeferredRenderContext,
    /// The GPU program cache.
    pub programs: &'a mut GpuProgramManager,
}
