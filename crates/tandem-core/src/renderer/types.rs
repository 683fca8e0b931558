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

//! Backend-agnostic descriptors and handles carried inside commands.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// An opaque handle to a GPU program (vertex, fragment or compute).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u64);

/// An opaque handle to a GPU buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

/// An opaque handle to a GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// Hands out resource ids on the producer side.
///
/// Ids are allocated before the creation command runs so that later commands
/// in the same batch can already reference the resource. A single allocator is
/// shared by every context and collaborator of one render system, which keeps
/// ids unique per resource kind.
#[derive(Debug, Default)]
pub struct IdAllocator {
    programs: AtomicU64,
    buffers: AtomicU64,
    textures: AtomicU64,
}

impl IdAllocator {
    /// Creates a shareable allocator.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Allocates a new program id.
    pub fn program(&self) -> ProgramId {
        ProgramId(self.programs.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Allocates a new buffer id.
    pub fn buffer(&self) -> BufferId {
        BufferId(self.buffers.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Allocates a new texture id.
    pub fn texture(&self) -> TextureId {
        TextureId(self.textures.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// The pipeline stage a GPU program is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// Vertex stage.
    Vertex,
    /// Fragment (pixel) stage.
    Fragment,
    /// Compute stage.
    Compute,
}

impl fmt::Display for ProgramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramKind::Vertex => write!(f, "vertex"),
            ProgramKind::Fragment => write!(f, "fragment"),
            ProgramKind::Compute => write!(f, "compute"),
        }
    }
}

/// Describes a GPU program to compile on the render thread.
///
/// The source text is an opaque payload; only the device interprets it.
#[derive(Debug, Clone)]
pub struct GpuProgramDescriptor {
    /// Unique name used for caching and diagnostics.
    pub name: String,
    /// Program source text.
    pub source: Arc<str>,
    /// Entry point function within `source`.
    pub entry_point: String,
    /// Source language, e.g. `"hlsl"`.
    pub language: String,
    /// Pipeline stage.
    pub kind: ProgramKind,
    /// Target profile, e.g. `"vs_3_0"`.
    pub profile: String,
}

impl GpuProgramDescriptor {
    /// Convenience constructor.
    pub fn new(
        name: impl Into<String>,
        source: impl Into<Arc<str>>,
        entry_point: impl Into<String>,
        language: impl Into<String>,
        kind: ProgramKind,
        profile: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            entry_point: entry_point.into(),
            language: language.into(),
            kind,
            profile: profile.into(),
        }
    }
}

/// A compiled GPU program, as observed once its readiness token is ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuProgram {
    /// The handle the program was created under.
    pub id: ProgramId,
    /// The descriptor name.
    pub name: String,
    /// Pipeline stage.
    pub kind: ProgramKind,
    /// Names of the parameters the program declares, in declaration order.
    pub parameters: Vec<String>,
}

impl GpuProgram {
    /// Returns `true` if the program declares a parameter called `name`.
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.iter().any(|p| p == name)
    }
}

/// A set of flags describing how a buffer will be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferUsage {
    bits: u32,
}

impl BufferUsage {
    /// The buffer can be the destination of a write.
    pub const COPY_DST: Self = Self { bits: 1 << 0 };
    /// The buffer can be bound as a vertex buffer.
    pub const VERTEX: Self = Self { bits: 1 << 1 };
    /// The buffer can be bound as an index buffer.
    pub const INDEX: Self = Self { bits: 1 << 2 };
    /// The buffer can be bound as a uniform buffer.
    pub const UNIFORM: Self = Self { bits: 1 << 3 };

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Returns `true` if every flag in `other` is set.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }
}

impl std::ops::BitOr for BufferUsage {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self {
            bits: self.bits | rhs.bits,
        }
    }
}

/// Describes a GPU buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// Size in bytes.
    pub size: u64,
    /// Allowed usages.
    pub usage: BufferUsage,
}

/// Pixel formats understood by the devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// 8-bit single channel.
    R8,
    /// 8-bit RGBA.
    Rgba8,
    /// 32-bit float depth.
    Depth32,
}

impl TextureFormat {
    /// Size of one texel in bytes.
    pub const fn bytes_per_texel(&self) -> u32 {
        match self {
            TextureFormat::R8 => 1,
            TextureFormat::Rgba8 | TextureFormat::Depth32 => 4,
        }
    }
}

/// Describes a 2D GPU texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Texel format.
    pub format: TextureFormat,
}

impl TextureDescriptor {
    /// The number of bytes a full upload of this texture requires.
    pub fn byte_size(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.format.bytes_per_texel() as u64
    }
}

/// Colour blending applied when writing fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// No blending.
    #[default]
    Opaque,
    /// Standard alpha blending.
    Alpha,
    /// Additive blending.
    Additive,
}

/// Face culling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullMode {
    /// Draw both faces.
    None,
    /// Cull back faces.
    #[default]
    Back,
    /// Cull front faces.
    Front,
}

/// Fixed-function pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineState {
    /// Colour blending.
    pub blend: BlendMode,
    /// Face culling.
    pub cull: CullMode,
    /// Whether depth testing is enabled.
    pub depth_test: bool,
    /// Whether depth writes are enabled.
    pub depth_write: bool,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            blend: BlendMode::Opaque,
            cull: CullMode::Back,
            depth_test: true,
            depth_write: true,
        }
    }
}

/// A value assigned to a program parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    /// A scalar float.
    Float(f32),
    /// A scalar integer.
    Int(i32),
    /// A 2-component vector.
    Vec2([f32; 2]),
    /// A 4-component vector.
    Vec4([f32; 4]),
    /// A column-major 4x4 matrix.
    Mat4([f32; 16]),
}

/// Describes a render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassDescriptor {
    /// Debug label.
    pub label: String,
    /// Clear the colour target to this value when the pass begins.
    pub clear_color: Option<[f32; 4]>,
    /// Clear the depth target when the pass begins.
    pub clear_depth: bool,
}

impl PassDescriptor {
    /// A pass that clears colour and depth.
    pub fn clearing(label: impl Into<String>, color: [f32; 4]) -> Self {
        Self {
            label: label.into(),
            clear_color: Some(color),
            clear_depth: true,
        }
    }

    /// A pass that keeps the previous contents.
    pub fn loading(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            clear_color: None,
            clear_depth: false,
        }
    }
}

/// A non-indexed draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    /// The vertex buffer to read from.
    pub vertex_buffer: BufferId,
    /// Size of one vertex in bytes.
    pub vertex_stride: u32,
    /// Index of the first vertex.
    pub first_vertex: u32,
    /// Number of vertices.
    pub vertex_count: u32,
    /// Number of instances.
    pub instance_count: u32,
}

impl DrawCall {
    /// Number of triangles this call rasterizes, assuming a triangle list.
    pub fn triangle_count(&self) -> u64 {
        (self.vertex_count / 3) as u64 * self.instance_count as u64
    }
}

/// What a device reports about itself when the render system starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCapabilities {
    /// Human-readable device name.
    pub name: String,
    /// Program source languages the device can compile.
    pub program_languages: Vec<String>,
    /// Largest supported texture edge.
    pub max_texture_size: u32,
    /// Size of the presentation surface.
    pub surface_size: (u32, u32),
}

impl DeviceCapabilities {
    /// Returns `true` if programs written in `language` can be compiled.
    pub fn supports_language(&self, language: &str) -> bool {
        self.program_languages
            .iter()
            .any(|l| l.eq_ignore_ascii_case(language))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_allocator_hands_out_distinct_ids_per_kind() {
        let ids = IdAllocator::default();
        assert_eq!(ids.program(), ProgramId(1));
        assert_eq!(ids.program(), ProgramId(2));
        assert_eq!(ids.buffer(), BufferId(1));
        assert_eq!(ids.texture(), TextureId(1));
    }

    #[test]
    fn buffer_usage_combines() {
        let usage = BufferUsage::VERTEX | BufferUsage::COPY_DST;
        assert!(usage.contains(BufferUsage::VERTEX));
        assert!(!usage.contains(BufferUsage::INDEX));
    }

    #[test]
    fn draw_call_counts_triangles_per_instance() {
        let call = DrawCall {
            vertex_buffer: BufferId(1),
            vertex_stride: 12,
            first_vertex: 0,
            vertex_count: 6,
            instance_count: 3,
        };
        assert_eq!(call.triangle_count(), 6);
    }

    #[test]
    fn texture_byte_size_uses_format() {
        let desc = TextureDescriptor {
            label: None,
            width: 4,
            height: 2,
            format: TextureFormat::Rgba8,
        };
        assert_eq!(desc.byte_size(), 32);
    }

    #[test]
    fn capabilities_language_match_is_case_insensitive() {
        let caps = DeviceCapabilities {
            name: "test".to_string(),
            program_languages: vec!["hlsl".to_string()],
            max_texture_size: 1024,
            surface_size: (1, 1),
        };
        assert!(caps.supports_language("HLSL"));
        assert!(!caps.supports_language("glsl"));
    }
}
