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

use super::error::RenderError;
use super::types::{
    BufferDescriptor, BufferId, DeviceCapabilities, DrawCall, GpuProgram, GpuProgramDescriptor,
    ParamValue, PassDescriptor, PipelineState, ProgramId, TextureDescriptor, TextureId,
};

/// The device the render thread executes commands against.
///
/// A device is owned by exactly one render thread, which is why every method
/// takes `&mut self` and the trait only requires `Send`. Ids are allocated by
/// producers before the creating command runs; a device must reject an id it
/// already holds instead of silently replacing the resource.
pub trait RenderDevice: Send {
    /// Reports what the device supports. Called once when the render system starts.
    fn capabilities(&self) -> DeviceCapabilities;

    /// Compiles a GPU program and stores it under `id`.
    fn create_program(
        &mut self,
        id: ProgramId,
        descriptor: &GpuProgramDescriptor,
    ) -> Result<GpuProgram, RenderError>;

    /// Releases a GPU program.
    fn destroy_program(&mut self, id: ProgramId) -> Result<(), RenderError>;

    /// Creates a buffer, optionally filled with `contents`.
    fn create_buffer(
        &mut self,
        id: BufferId,
        descriptor: &BufferDescriptor,
        contents: Option<&[u8]>,
    ) -> Result<(), RenderError>;

    /// Writes `data` into a buffer at `offset`.
    fn write_buffer(&mut self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), RenderError>;

    /// Releases a buffer.
    fn destroy_buffer(&mut self, id: BufferId) -> Result<(), RenderError>;

    /// Creates a texture, optionally filled with `texels`.
    fn create_texture(
        &mut self,
        id: TextureId,
        descriptor: &TextureDescriptor,
        texels: Option<&[u8]>,
    ) -> Result<(), RenderError>;

    /// Releases a texture.
    fn destroy_texture(&mut self, id: TextureId) -> Result<(), RenderError>;

    /// Begins a render pass.
    fn begin_pass(&mut self, descriptor: &PassDescriptor) -> Result<(), RenderError>;

    /// Ends the current render pass.
    fn end_pass(&mut self) -> Result<(), RenderError>;

    /// Sets fixed-function pipeline state.
    fn set_pipeline_state(&mut self, state: &PipelineState) -> Result<(), RenderError>;

    /// Binds a program to the stage it was compiled for.
    fn bind_program(&mut self, id: ProgramId) -> Result<(), RenderError>;

    /// Assigns a parameter of the bound programs.
    fn set_parameter(&mut self, name: &str, value: &ParamValue) -> Result<(), RenderError>;

    /// Binds a texture to a sampler slot.
    fn bind_texture(&mut self, slot: u32, texture: TextureId) -> Result<(), RenderError>;

    /// Issues a draw call with the current bindings.
    fn draw(&mut self, call: &DrawCall) -> Result<(), RenderError>;

    /// Presents the current frame.
    fn present(&mut self) -> Result<(), RenderError>;

    /// Inserts a debug marker. Devices without marker support ignore it.
    fn insert_debug_marker(&mut self, _label: &str) {}
}
