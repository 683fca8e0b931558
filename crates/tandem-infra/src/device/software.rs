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

//! A CPU-side device that validates every operation without rasterizing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tandem_core::renderer::{
    BufferDescriptor, BufferId, BufferUsage, DeviceCapabilities, DrawCall, GpuProgram,
    GpuProgramDescriptor, ParamValue, PassDescriptor, PipelineState, ProgramId, ProgramKind,
    RenderDevice, RenderError, ResourceError, ShaderError, TextureDescriptor, TextureId,
};

/// Program languages the software device accepts.
pub const SOFTWARE_LANGUAGES: [&str; 3] = ["hlsl", "glsl", "wgsl"];

/// Number of sampler slots.
pub const MAX_TEXTURE_SLOTS: u32 = 16;

const MAX_TEXTURE_SIZE: u32 = 4096;

/// Counters shared between a [`SoftwareDevice`] and whoever wants to observe
/// it from another thread.
#[derive(Debug, Default)]
pub struct DeviceProbe {
    operations: AtomicU64,
    programs_compiled: AtomicU64,
    draws: AtomicU64,
    presents: AtomicU64,
    markers: Mutex<Vec<String>>,
}

impl DeviceProbe {
    /// Number of device calls, successful or not.
    pub fn operations(&self) -> u64 {
        self.operations.load(Ordering::SeqCst)
    }

    /// Number of programs compiled successfully.
    pub fn programs_compiled(&self) -> u64 {
        self.programs_compiled.load(Ordering::SeqCst)
    }

    /// Number of successful draws.
    pub fn draws(&self) -> u64 {
        self.draws.load(Ordering::SeqCst)
    }

    /// Number of successful presents.
    pub fn presents(&self) -> u64 {
        self.presents.load(Ordering::SeqCst)
    }

    /// Debug markers in the order the device received them.
    pub fn markers(&self) -> Vec<String> {
        self.markers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn push_marker(&self, label: &str) {
        self.markers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(label.to_string());
    }
}

#[derive(Debug)]
struct StoredBuffer {
    descriptor: BufferDescriptor,
    data: Vec<u8>,
}

#[derive(Debug)]
struct StoredTexture {
    descriptor: TextureDescriptor,
    texels: Vec<u8>,
}

/// An in-memory device.
///
/// It keeps every GPU object in host memory and enforces the rules a real
/// device would: ids are unique, draws happen inside a pass with both stages
/// bound, parameters must be declared by a bound program, and every access
/// stays within bounds. Program "compilation" checks the language, the entry
/// point and brace balance, and reflects top-level declarations as parameters.
#[derive(Debug)]
pub struct SoftwareDevice {
    surface_size: (u32, u32),
    languages: Vec<String>,
    programs: HashMap<ProgramId, GpuProgram>,
    buffers: HashMap<BufferId, StoredBuffer>,
    textures: HashMap<TextureId, StoredTexture>,
    framebuffer: Vec<[f32; 4]>,
    pass: Option<String>,
    pipeline: PipelineState,
    vertex_program: Option<ProgramId>,
    fragment_program: Option<ProgramId>,
    bound_textures: HashMap<u32, TextureId>,
    parameters: HashMap<String, ParamValue>,
    probe: Arc<DeviceProbe>,
}

impl SoftwareDevice {
    /// Creates a device presenting to a surface of the given size.
    pub fn new(surface_size: (u32, u32)) -> Self {
        let (width, height) = surface_size;
        Self {
            surface_size,
            languages: SOFTWARE_LANGUAGES.iter().map(|l| l.to_string()).collect(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            framebuffer: vec![[0.0; 4]; width as usize * height as usize],
            pass: None,
            pipeline: PipelineState::default(),
            vertex_program: None,
            fragment_program: None,
            bound_textures: HashMap::new(),
            parameters: HashMap::new(),
            probe: Arc::new(DeviceProbe::default()),
        }
    }

    /// Restricts the accepted program languages.
    pub fn with_languages(mut self, languages: &[&str]) -> Self {
        self.languages = languages.iter().map(|l| l.to_string()).collect();
        self
    }

    /// The probe observing this device.
    pub fn probe(&self) -> Arc<DeviceProbe> {
        self.probe.clone()
    }

    /// Current contents of a buffer.
    pub fn buffer_contents(&self, id: BufferId) -> Option<&[u8]> {
        self.buffers.get(&id).map(|b| b.data.as_slice())
    }

    /// Current texels of a texture.
    pub fn texture_texels(&self, id: TextureId) -> Option<&[u8]> {
        self.textures.get(&id).map(|t| t.texels.as_slice())
    }

    /// The colour of one framebuffer pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        let (width, height) = self.surface_size;
        if x >= width || y >= height {
            return None;
        }
        self.framebuffer
            .get(y as usize * width as usize + x as usize)
            .copied()
    }

    /// The value last assigned to a parameter.
    pub fn parameter(&self, name: &str) -> Option<ParamValue> {
        self.parameters.get(name).copied()
    }

    /// The current pipeline state.
    pub fn pipeline_state(&self) -> PipelineState {
        self.pipeline
    }

    fn touch(&self) {
        self.probe.operations.fetch_add(1, Ordering::SeqCst);
    }

    fn supports(&self, language: &str) -> bool {
        self.languages
            .iter()
            .any(|l| l.eq_ignore_ascii_case(language))
    }

    fn bound_program(&self, id: Option<ProgramId>) -> Option<&GpuProgram> {
        id.and_then(|id| self.programs.get(&id))
    }
}

impl Default for SoftwareDevice {
    fn default() -> Self {
        Self::new((640, 480))
    }
}

impl RenderDevice for SoftwareDevice {
    fn capabilities(&self) -> DeviceCapabilities {
        DeviceCapabilities {
            name: "Tandem Software Device".to_string(),
            program_languages: self.languages.clone(),
            max_texture_size: MAX_TEXTURE_SIZE,
            surface_size: self.surface_size,
        }
    }

    fn create_program(
        &mut self,
        id: ProgramId,
        descriptor: &GpuProgramDescriptor,
    ) -> Result<GpuProgram, RenderError> {
        self.touch();
        if self.programs.contains_key(&id) {
            return Err(ResourceError::AlreadyExists {
                kind: "program",
                id: id.0,
            }
            .into());
        }
        if !self.supports(&descriptor.language) {
            return Err(ShaderError::UnsupportedLanguage {
                label: descriptor.name.clone(),
                language: descriptor.language.clone(),
            }
            .into());
        }

        let parameters = compile(descriptor)?;
        let program = GpuProgram {
            id,
            name: descriptor.name.clone(),
            kind: descriptor.kind,
            parameters,
        };
        log::debug!(
            "Compiled {} program '{}' ({} parameters)",
            program.kind,
            program.name,
            program.parameters.len()
        );
        self.programs.insert(id, program.clone());
        self.probe.programs_compiled.fetch_add(1, Ordering::SeqCst);
        Ok(program)
    }

    fn destroy_program(&mut self, id: ProgramId) -> Result<(), RenderError> {
        self.touch();
        self.programs
            .remove(&id)
            .ok_or(ShaderError::NotFound { id })?;
        if self.vertex_program == Some(id) {
            self.vertex_program = None;
        }
        if self.fragment_program == Some(id) {
            self.fragment_program = None;
        }
        Ok(())
    }

    fn create_buffer(
        &mut self,
        id: BufferId,
        descriptor: &BufferDescriptor,
        contents: Option<&[u8]>,
    ) -> Result<(), RenderError> {
        self.touch();
        if self.buffers.contains_key(&id) {
            return Err(ResourceError::AlreadyExists {
                kind: "buffer",
                id: id.0,
            }
            .into());
        }
        if descriptor.size == 0 {
            return Err(ResourceError::InvalidDescriptor("buffer size is zero".to_string()).into());
        }

        let mut data = vec![0u8; descriptor.size as usize];
        if let Some(contents) = contents {
            if contents.len() as u64 > descriptor.size {
                return Err(ResourceError::OutOfBounds {
                    kind: "buffer",
                    id: id.0,
                    end: contents.len() as u64,
                    size: descriptor.size,
                }
                .into());
            }
            data[..contents.len()].copy_from_slice(contents);
        }

        self.buffers.insert(
            id,
            StoredBuffer {
                descriptor: descriptor.clone(),
                data,
            },
        );
        Ok(())
    }

    fn write_buffer(&mut self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), RenderError> {
        self.touch();
        let buffer = self.buffers.get_mut(&id).ok_or(ResourceError::NotFound {
            kind: "buffer",
            id: id.0,
        })?;
        if !buffer.descriptor.usage.contains(BufferUsage::COPY_DST) {
            return Err(RenderError::InvalidState(format!(
                "buffer {} was not created with COPY_DST usage",
                id.0
            )));
        }
        let end = offset.saturating_add(data.len() as u64);
        if end > buffer.descriptor.size {
            return Err(ResourceError::OutOfBounds {
                kind: "buffer",
                id: id.0,
                end,
                size: buffer.descriptor.size,
            }
            .into());
        }
        buffer.data[offset as usize..end as usize].copy_from_slice(data);
        Ok(())
    }

    fn destroy_buffer(&mut self, id: BufferId) -> Result<(), RenderError> {
        self.touch();
        self.buffers.remove(&id).ok_or(ResourceError::NotFound {
            kind: "buffer",
            id: id.0,
        })?;
        Ok(())
    }

    fn create_texture(
        &mut self,
        id: TextureId,
        descriptor: &TextureDescriptor,
        texels: Option<&[u8]>,
    ) -> Result<(), RenderError> {
        self.touch();
        if self.textures.contains_key(&id) {
            return Err(ResourceError::AlreadyExists {
                kind: "texture",
                id: id.0,
            }
            .into());
        }
        if descriptor.width == 0
            || descriptor.height == 0
            || descriptor.width > MAX_TEXTURE_SIZE
            || descriptor.height > MAX_TEXTURE_SIZE
        {
            return Err(ResourceError::InvalidDescriptor(format!(
                "texture size {}x{} is outside 1..={MAX_TEXTURE_SIZE}",
                descriptor.width, descriptor.height
            ))
            .into());
        }

        let size = descriptor.byte_size();
        let texels = match texels {
            Some(texels) if texels.len() as u64 != size => {
                return Err(ResourceError::InvalidDescriptor(format!(
                    "texture upload holds {} bytes, expected {size}",
                    texels.len()
                ))
                .into());
            }
            Some(texels) => texels.to_vec(),
            None => vec![0; size as usize],
        };

        self.textures.insert(
            id,
            StoredTexture {
                descriptor: descriptor.clone(),
                texels,
            },
        );
        Ok(())
    }

    fn destroy_texture(&mut self, id: TextureId) -> Result<(), RenderError> {
        self.touch();
        self.textures.remove(&id).ok_or(ResourceError::NotFound {
            kind: "texture",
            id: id.0,
        })?;
        self.bound_textures.retain(|_, bound| *bound != id);
        Ok(())
    }

    fn begin_pass(&mut self, descriptor: &PassDescriptor) -> Result<(), RenderError> {
        self.touch();
        if let Some(active) = &self.pass {
            return Err(RenderError::InvalidState(format!(
                "pass '{}' begun while '{active}' is still active",
                descriptor.label
            )));
        }
        if let Some(color) = descriptor.clear_color {
            self.framebuffer.fill(color);
        }
        self.pass = Some(descriptor.label.clone());
        Ok(())
    }

    fn end_pass(&mut self) -> Result<(), RenderError> {
        self.touch();
        match self.pass.take() {
            Some(_) => Ok(()),
            None => Err(RenderError::InvalidState(
                "end_pass without an active pass".to_string(),
            )),
        }
    }

    fn set_pipeline_state(&mut self, state: &PipelineState) -> Result<(), RenderError> {
        self.touch();
        self.pipeline = *state;
        Ok(())
    }

    fn bind_program(&mut self, id: ProgramId) -> Result<(), RenderError> {
        self.touch();
        let program = self.programs.get(&id).ok_or(ShaderError::NotFound { id })?;
        match program.kind {
            ProgramKind::Vertex => self.vertex_program = Some(id),
            ProgramKind::Fragment => self.fragment_program = Some(id),
            ProgramKind::Compute => {
                return Err(RenderError::InvalidState(format!(
                    "compute program '{}' cannot be bound for drawing",
                    program.name
                )))
            }
        }
        Ok(())
    }

    fn set_parameter(&mut self, name: &str, value: &ParamValue) -> Result<(), RenderError> {
        self.touch();
        let vertex = self.bound_program(self.vertex_program);
        let fragment = self.bound_program(self.fragment_program);
        if vertex.is_none() && fragment.is_none() {
            return Err(RenderError::InvalidState(format!(
                "parameter '{name}' set with no program bound"
            )));
        }
        let declared = [vertex, fragment]
            .into_iter()
            .flatten()
            .any(|program| program.has_parameter(name));
        if !declared {
            return Err(ShaderError::UnknownParameter {
                name: name.to_string(),
            }
            .into());
        }
        self.parameters.insert(name.to_string(), *value);
        Ok(())
    }

    fn bind_texture(&mut self, slot: u32, texture: TextureId) -> Result<(), RenderError> {
        self.touch();
        if slot >= MAX_TEXTURE_SLOTS {
            return Err(RenderError::InvalidState(format!(
                "texture slot {slot} exceeds the {MAX_TEXTURE_SLOTS} available slots"
            )));
        }
        if !self.textures.contains_key(&texture) {
            return Err(ResourceError::NotFound {
                kind: "texture",
                id: texture.0,
            }
            .into());
        }
        self.bound_textures.insert(slot, texture);
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall) -> Result<(), RenderError> {
        self.touch();
        if self.pass.is_none() {
            return Err(RenderError::InvalidState(
                "draw outside of a render pass".to_string(),
            ));
        }
        if self.bound_program(self.vertex_program).is_none() {
            return Err(RenderError::InvalidState("no vertex program bound".to_string()));
        }
        if self.bound_program(self.fragment_program).is_none() {
            return Err(RenderError::InvalidState(
                "no fragment program bound".to_string(),
            ));
        }

        let buffer = self
            .buffers
            .get(&call.vertex_buffer)
            .ok_or(ResourceError::NotFound {
                kind: "buffer",
                id: call.vertex_buffer.0,
            })?;
        if !buffer.descriptor.usage.contains(BufferUsage::VERTEX) {
            return Err(RenderError::InvalidState(format!(
                "buffer {} was not created with VERTEX usage",
                call.vertex_buffer.0
            )));
        }
        let end = u64::from(call.first_vertex)
            .saturating_add(u64::from(call.vertex_count))
            .saturating_mul(u64::from(call.vertex_stride));
        if end > buffer.descriptor.size {
            return Err(ResourceError::OutOfBounds {
                kind: "buffer",
                id: call.vertex_buffer.0,
                end,
                size: buffer.descriptor.size,
            }
            .into());
        }

        self.probe.draws.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.touch();
        if let Some(active) = &self.pass {
            return Err(RenderError::InvalidState(format!(
                "present while pass '{active}' is still active"
            )));
        }
        self.probe.presents.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn insert_debug_marker(&mut self, label: &str) {
        self.touch();
        self.probe.push_marker(label);
    }
}

/// Validates a program and returns the parameters it declares.
fn compile(descriptor: &GpuProgramDescriptor) -> Result<Vec<String>, ShaderError> {
    let source = strip_line_comments(&descriptor.source);
    if source.trim().is_empty() {
        return Err(ShaderError::CompilationError {
            label: descriptor.name.clone(),
            details: "empty source".to_string(),
        });
    }

    let mut depth: i32 = 0;
    let mut statement = String::new();
    let mut parameters = Vec::new();
    for c in source.chars() {
        match c {
            '{' => {
                if depth == 0 {
                    statement.clear();
                }
                depth += 1;
            }
            '}' => {
                depth -= 1;
                if depth < 0 {
                    break;
                }
            }
            ';' if depth == 0 => {
                if let Some(name) = declared_name(&statement) {
                    parameters.push(name);
                }
                statement.clear();
            }
            _ if depth == 0 => statement.push(c),
            _ => {}
        }
    }
    if depth != 0 {
        return Err(ShaderError::CompilationError {
            label: descriptor.name.clone(),
            details: "unbalanced braces".to_string(),
        });
    }

    if !declares_function(&source, &descriptor.entry_point) {
        return Err(ShaderError::InvalidEntryPoint {
            label: descriptor.name.clone(),
            entry_point: descriptor.entry_point.clone(),
        });
    }

    Ok(parameters)
}

fn strip_line_comments(source: &str) -> String {
    source
        .lines()
        .map(|line| line.split("//").next().unwrap_or(""))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extracts `name` from a top-level declaration such as
/// `float4x4 name : register(c0) = init`.
fn declared_name(statement: &str) -> Option<String> {
    let declaration = statement.split('=').next()?.split(':').next()?;
    let declaration = declaration.split('[').next()?;
    let mut tokens = declaration.split_whitespace();
    let _ty = tokens.next()?;
    let name = tokens.last()?;
    let is_identifier = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    is_identifier.then(|| name.to_string())
}

fn declares_function(source: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    source.match_indices(name).any(|(at, _)| {
        let before = source[..at].chars().next_back();
        let boundary = before.map_or(true, |c| !(c.is_ascii_alphanumeric() || c == '_'));
        let after = source[at + name.len()..].trim_start();
        boundary && after.starts_with('(')
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::renderer::TextureFormat;

    const SPRITE_VS: &str = "
        float halfViewportWidth;
        float halfViewportHeight;
        float4x4 worldTransform : register(c0);

        struct VS_OUT { float4 pos : POSITION; };

        // entry point
        VS_OUT vs_main(float3 pos : POSITION) {
            VS_OUT o;
            o.pos = mul(worldTransform, float4(pos, 1));
            return o;
        }
    ";

    const SPRITE_PS: &str = "
        sampler2D mainTexture;
        float4 ps_main(float2 uv : TEXCOORD0) : COLOR0 { return tex2D(mainTexture, uv); }
    ";

    fn program(name: &str, source: &str, entry: &str, kind: ProgramKind) -> GpuProgramDescriptor {
        GpuProgramDescriptor::new(
            name,
            source,
            entry,
            "hlsl",
            kind,
            "vs_3_0",
        )
    }

    fn vertex_buffer(device: &mut SoftwareDevice, id: u64, size: u64) {
        device
            .create_buffer(
                BufferId(id),
                &BufferDescriptor {
                    label: None,
                    size,
                    usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
                },
                None,
            )
            .unwrap();
    }

    fn ready_to_draw() -> SoftwareDevice {
        let mut device = SoftwareDevice::new((4, 4));
        device
            .create_program(ProgramId(1), &program("vs", SPRITE_VS, "vs_main", ProgramKind::Vertex))
            .unwrap();
        device
            .create_program(ProgramId(2), &program("ps", SPRITE_PS, "ps_main", ProgramKind::Fragment))
            .unwrap();
        vertex_buffer(&mut device, 1, 12 * 6);
        device.bind_program(ProgramId(1)).unwrap();
        device.bind_program(ProgramId(2)).unwrap();
        device
    }

    fn triangle_list(count: u32) -> DrawCall {
        DrawCall {
            vertex_buffer: BufferId(1),
            vertex_stride: 12,
            first_vertex: 0,
            vertex_count: count,
            instance_count: 1,
        }
    }

    #[test]
    fn compile_reflects_top_level_declarations() {
        let mut device = SoftwareDevice::default();
        let compiled = device
            .create_program(ProgramId(1), &program("vs", SPRITE_VS, "vs_main", ProgramKind::Vertex))
            .unwrap();
        assert_eq!(
            compiled.parameters,
            vec!["halfViewportWidth", "halfViewportHeight", "worldTransform"]
        );

        let compiled = device
            .create_program(ProgramId(2), &program("ps", SPRITE_PS, "ps_main", ProgramKind::Fragment))
            .unwrap();
        assert_eq!(compiled.parameters, vec!["mainTexture"]);
        assert_eq!(device.probe().programs_compiled(), 2);
    }

    #[test]
    fn compile_rejects_bad_programs() {
        let mut device = SoftwareDevice::default();

        let err = device
            .create_program(ProgramId(1), &program("vs", "void main() {", "main", ProgramKind::Vertex))
            .unwrap_err();
        assert!(err.to_string().contains("unbalanced braces"));

        let err = device
            .create_program(ProgramId(2), &program("vs", SPRITE_VS, "main", ProgramKind::Vertex))
            .unwrap_err();
        assert!(err.to_string().contains("Invalid entry point 'main'"));

        let mut glsl_only = SoftwareDevice::default().with_languages(&["glsl"]);
        let err = glsl_only
            .create_program(ProgramId(3), &program("vs", SPRITE_VS, "vs_main", ProgramKind::Vertex))
            .unwrap_err();
        assert!(err.to_string().contains("unsupported language 'hlsl'"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut device = SoftwareDevice::default();
        vertex_buffer(&mut device, 1, 16);
        let err = device
            .create_buffer(
                BufferId(1),
                &BufferDescriptor {
                    label: None,
                    size: 16,
                    usage: BufferUsage::VERTEX,
                },
                None,
            )
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Graphics resource operation failed: A buffer already exists with ID 1."
        );
    }

    #[test]
    fn write_buffer_checks_bounds() {
        let mut device = SoftwareDevice::default();
        vertex_buffer(&mut device, 1, 8);

        device
            .write_buffer(BufferId(1), 4, &[1, 2, 3, 4])
            .unwrap();
        assert_eq!(
            device.buffer_contents(BufferId(1)),
            Some(&[0, 0, 0, 0, 1, 2, 3, 4][..])
        );
        assert!(device.write_buffer(BufferId(1), 6, &[0; 4]).is_err());
    }

    #[test]
    fn draw_requires_pass_and_programs() {
        let mut device = SoftwareDevice::new((2, 2));
        vertex_buffer(&mut device, 1, 72);
        let err = device.draw(&triangle_list(3)).unwrap_err();
        assert!(err.to_string().contains("outside of a render pass"));

        let mut device = ready_to_draw();
        device.begin_pass(&PassDescriptor::loading("main")).unwrap();
        device.draw(&triangle_list(6)).unwrap();
        assert!(device.draw(&triangle_list(7)).is_err(), "out of bounds draw");
        device.end_pass().unwrap();
        device.present().unwrap();

        assert_eq!(device.probe().draws(), 1);
        assert_eq!(device.probe().presents(), 1);
    }

    #[test]
    fn draw_ranges_past_u64_are_out_of_bounds() {
        let mut device = SoftwareDevice::new((2, 2));
        vertex_buffer(&mut device, 1, 65536);
        device
            .create_program(ProgramId(1), &program("vs", SPRITE_VS, "vs_main", ProgramKind::Vertex))
            .unwrap();
        device
            .create_program(ProgramId(2), &program("ps", SPRITE_PS, "ps_main", ProgramKind::Fragment))
            .unwrap();
        device.bind_program(ProgramId(1)).unwrap();
        device.bind_program(ProgramId(2)).unwrap();
        device.begin_pass(&PassDescriptor::loading("main")).unwrap();

        // (u32::MAX + 65537) * (u32::MAX - 65534) wraps to exactly the buffer size in u64.
        let err = device
            .draw(&DrawCall {
                vertex_buffer: BufferId(1),
                vertex_stride: u32::MAX - 65534,
                first_vertex: u32::MAX,
                vertex_count: 65537,
                instance_count: 1,
            })
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::ResourceError(ResourceError::OutOfBounds { end: u64::MAX, .. })
        ));
        assert_eq!(device.probe().draws(), 0);
    }

    #[test]
    fn parameters_must_be_declared() {
        let mut device = ready_to_draw();
        device
            .set_parameter("halfViewportWidth", &ParamValue::Float(2.0))
            .unwrap();
        assert_eq!(
            device.parameter("halfViewportWidth"),
            Some(ParamValue::Float(2.0))
        );

        let err = device
            .set_parameter("tint", &ParamValue::Vec4([1.0; 4]))
            .unwrap_err();
        assert!(err.to_string().contains("No bound program declares parameter 'tint'"));
    }

    #[test]
    fn clear_fills_the_framebuffer() {
        let mut device = SoftwareDevice::new((2, 2));
        device
            .begin_pass(&PassDescriptor::clearing("main", [0.5, 0.25, 0.0, 1.0]))
            .unwrap();
        assert_eq!(device.pixel(1, 1), Some([0.5, 0.25, 0.0, 1.0]));
        assert_eq!(device.pixel(2, 0), None);
        assert!(device.present().is_err(), "present inside a pass");
        device.end_pass().unwrap();
        assert!(device.end_pass().is_err());
    }

    #[test]
    fn texture_upload_must_match_descriptor() {
        let mut device = SoftwareDevice::default();
        let descriptor = TextureDescriptor {
            label: None,
            width: 2,
            height: 1,
            format: TextureFormat::Rgba8,
        };
        assert!(device
            .create_texture(TextureId(1), &descriptor, Some(&[0; 4]))
            .is_err());
        device
            .create_texture(TextureId(1), &descriptor, Some(&[7; 8]))
            .unwrap();
        assert_eq!(device.texture_texels(TextureId(1)), Some(&[7u8; 8][..]));

        device.bind_texture(0, TextureId(1)).unwrap();
        device.destroy_texture(TextureId(1)).unwrap();
        assert!(device.bind_texture(0, TextureId(1)).is_err());
    }

    #[test]
    fn destroying_a_bound_program_unbinds_it() {
        let mut device = ready_to_draw();
        device.destroy_program(ProgramId(1)).unwrap();
        device.begin_pass(&PassDescriptor::loading("main")).unwrap();
        let err = device.draw(&triangle_list(3)).unwrap_err();
        assert!(err.to_string().contains("no vertex program bound"));
    }

    #[test]
    fn markers_are_observable() {
        let mut device = SoftwareDevice::default();
        let probe = device.probe();
        device.insert_debug_marker("a");
        device.insert_debug_marker("b");
        assert_eq!(probe.markers(), vec!["a", "b"]);
        assert_eq!(probe.operations(), 2);
    }
}
