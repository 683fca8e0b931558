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

//! Materials: a pair of GPU programs plus the state needed to draw with them.

use super::context::{DeferredRenderContext, GpuProgramHandle};
use super::types::{ParamValue, PipelineState, TextureId};

/// A vertex/fragment program pair with its pipeline state, textures and
/// parameter values.
#[derive(Debug, Clone)]
pub struct Material {
    /// Material name.
    pub name: String,
    /// Vertex stage program.
    pub vertex_program: GpuProgramHandle,
    /// Fragment stage program.
    pub fragment_program: GpuProgramHandle,
    /// Fixed-function state.
    pub pipeline: PipelineState,
    /// Textures bound per sampler slot.
    pub textures: Vec<(u32, TextureId)>,
    /// Parameter values assigned when the material is bound.
    pub parameters: Vec<(String, ParamValue)>,
}

impl Material {
    /// Starts building a material from two programs.
    pub fn builder(
        name: impl Into<String>,
        vertex_program: GpuProgramHandle,
        fragment_program: GpuProgramHandle,
    ) -> MaterialBuilder {
        MaterialBuilder {
            material: Material {
                name: name.into(),
                vertex_program,
                fragment_program,
                pipeline: PipelineState::default(),
                textures: Vec::new(),
                parameters: Vec::new(),
            },
        }
    }

    /// Returns `true` once both programs have compiled.
    pub fn is_ready(&self) -> bool {
        self.vertex_program.ready.is_ready() && self.fragment_program.ready.is_ready()
    }

    /// Records the commands that bind this material.
    pub fn bind(&self, ctx: &mut DeferredRenderContext) {
        ctx.set_pipeline_state(self.pipeline);
        ctx.bind_program(self.vertex_program.id);
        ctx.bind_program(self.fragment_program.id);
        for (slot, texture) in &self.textures {
            ctx.bind_texture(*slot, *texture);
        }
        for (name, value) in &self.parameters {
            ctx.set_parameter(name.clone(), *value);
        }
    }
}

/// Builder returned by [`Material::builder`].
#[derive(Debug, Clone)]
pub struct MaterialBuilder {
    material: Material,
}

impl MaterialBuilder {
    /// Sets the pipeline state.
    pub fn pipeline(mut self, pipeline: PipelineState) -> Self {
        self.material.pipeline = pipeline;
        self
    }

    /// Binds `texture` to `slot`.
    pub fn texture(mut self, slot: u32, texture: TextureId) -> Self {
        self.material.textures.push((slot, texture));
        self
    }

    /// Sets a parameter value.
    pub fn parameter(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.material.parameters.push((name.into(), value));
        self
    }

    /// Finishes the material.
    pub fn build(self) -> Material {
        self.material
    }
}
