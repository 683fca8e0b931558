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

//! Importer for uncompressed vertex data, RGBA images and program sources.
//!
//! * `.bin`: raw vertex bytes, uploaded as-is into a vertex buffer.
//! * `.rgba`: a little-endian `u32` width and height followed by RGBA8 texels.
//! * `.hlsl`: program source; `name.vs.hlsl` compiles `vs_main` for the vertex
//!   stage and `name.ps.hlsl` compiles `ps_main` for the fragment stage.

use anyhow::{bail, ensure, Context as _};
use std::path::Path;
use std::sync::Arc;
use tandem_core::asset::{AssetImporter, ImportedAsset};
use tandem_core::plugin::{Plugin, PluginError, PluginHost, PluginRegistration, PLUGIN_ENTRY_POINT};
use tandem_core::renderer::{
    BufferDescriptor, BufferUsage, GpuProgramDescriptor, ProgramKind, TextureDescriptor,
    TextureFormat,
};

/// Module name the raw importer plugin is linked under.
pub const RAW_IMPORTER_MODULE: &str = "tandem_raw_importer";

const RGBA_HEADER_LEN: usize = 8;

/// Imports uncompressed files without any decoding.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawImporter;

impl RawImporter {
    fn import_vertices(path: &Path, bytes: &[u8]) -> anyhow::Result<ImportedAsset> {
        ensure!(!bytes.is_empty(), "{} holds no vertex data", path.display());
        Ok(ImportedAsset::Buffer {
            descriptor: BufferDescriptor {
                label: Some(path.display().to_string()),
                size: bytes.len() as u64,
                usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
            },
            contents: bytes.to_vec(),
        })
    }

    fn import_image(path: &Path, bytes: &[u8]) -> anyhow::Result<ImportedAsset> {
        ensure!(
            bytes.len() >= RGBA_HEADER_LEN,
            "{} is too short for an image header",
            path.display()
        );
        let (header, texels) = bytes.split_at(RGBA_HEADER_LEN);
        let [width, height]: [u32; 2] = bytemuck::pod_read_unaligned(header);
        let (width, height) = (u32::from_le(width), u32::from_le(height));
        ensure!(
            width > 0 && height > 0,
            "{} declares an empty {width}x{height} image",
            path.display()
        );

        let descriptor = TextureDescriptor {
            label: Some(path.display().to_string()),
            width,
            height,
            format: TextureFormat::Rgba8,
        };
        ensure!(
            texels.len() as u64 == descriptor.byte_size(),
            "{} declares {width}x{height} texels but holds {} bytes of pixel data",
            path.display(),
            texels.len()
        );
        Ok(ImportedAsset::Texture {
            descriptor,
            texels: texels.to_vec(),
        })
    }

    fn import_program(path: &Path, bytes: &[u8]) -> anyhow::Result<ImportedAsset> {
        let source = std::str::from_utf8(bytes)
            .with_context(|| format!("{} is not valid UTF-8", path.display()))?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .with_context(|| format!("{} has no file name", path.display()))?;

        let (kind, entry, profile) = match Path::new(stem).extension().and_then(|s| s.to_str()) {
            Some("vs") => (ProgramKind::Vertex, "vs_main", "vs_3_0"),
            Some("ps") => (ProgramKind::Fragment, "ps_main", "ps_3_0"),
            _ => bail!(
                "{} must be named <name>.vs.hlsl or <name>.ps.hlsl",
                path.display()
            ),
        };
        Ok(ImportedAsset::Program(GpuProgramDescriptor::new(
            stem, source, entry, "hlsl", kind, profile,
        )))
    }
}

impl AssetImporter for RawImporter {
    fn name(&self) -> &str {
        "RawImporter"
    }

    fn extensions(&self) -> &[&'static str] {
        &["bin", "rgba", "hlsl"]
    }

    fn import(&self, path: &Path, bytes: &[u8]) -> anyhow::Result<ImportedAsset> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "bin" => Self::import_vertices(path, bytes),
            "rgba" => Self::import_image(path, bytes),
            "hlsl" => Self::import_program(path, bytes),
            other => bail!("RawImporter cannot import '.{other}' files"),
        }
    }
}

struct RawImporterPlugin;

impl Plugin for RawImporterPlugin {
    fn name(&self) -> &str {
        "RawImporter"
    }

    fn register(&self, host: &mut dyn PluginHost) -> Result<(), PluginError> {
        host.register_importer(Arc::new(RawImporter));
        Ok(())
    }
}

fn load_plugin() -> Box<dyn Plugin> {
    Box::new(RawImporterPlugin)
}

inventory::submit! {
    PluginRegistration {
        module: RAW_IMPORTER_MODULE,
        symbol: PLUGIN_ENTRY_POINT,
        entry: load_plugin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba(width: u32, height: u32, texels: usize) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());
        bytes.resize(RGBA_HEADER_LEN + texels, 0xff);
        bytes
    }

    #[test]
    fn vertex_files_become_writable_vertex_buffers() {
        let asset = RawImporter
            .import(Path::new("quad.bin"), &[0u8; 48])
            .unwrap();
        match asset {
            ImportedAsset::Buffer {
                descriptor,
                contents,
            } => {
                assert_eq!(descriptor.size, 48);
                assert!(descriptor.usage.contains(BufferUsage::VERTEX));
                assert!(descriptor.usage.contains(BufferUsage::COPY_DST));
                assert_eq!(contents.len(), 48);
            }
            other => panic!("unexpected asset {other:?}"),
        }
    }

    #[test]
    fn empty_vertex_files_are_rejected() {
        let err = RawImporter.import(Path::new("empty.bin"), &[]).unwrap_err();
        assert!(err.to_string().contains("no vertex data"));
    }

    #[test]
    fn images_read_their_header() {
        let asset = RawImporter
            .import(Path::new("logo.RGBA"), &rgba(2, 3, 24))
            .unwrap();
        match asset {
            ImportedAsset::Texture { descriptor, texels } => {
                assert_eq!((descriptor.width, descriptor.height), (2, 3));
                assert_eq!(descriptor.format, TextureFormat::Rgba8);
                assert_eq!(texels.len(), 24);
            }
            other => panic!("unexpected asset {other:?}"),
        }
    }

    #[test]
    fn truncated_images_are_rejected() {
        let err = RawImporter
            .import(Path::new("logo.rgba"), &rgba(2, 2, 15))
            .unwrap_err();
        assert!(err.to_string().contains("holds 15 bytes"));

        assert!(RawImporter.import(Path::new("logo.rgba"), &[1, 0]).is_err());
        assert!(RawImporter
            .import(Path::new("logo.rgba"), &rgba(0, 4, 0))
            .is_err());
    }

    #[test]
    fn program_stage_comes_from_the_file_name() {
        let asset = RawImporter
            .import(Path::new("shaders/sprite.ps.hlsl"), b"float4 ps_main() : COLOR0 { return 1; }")
            .unwrap();
        match asset {
            ImportedAsset::Program(descriptor) => {
                assert_eq!(descriptor.name, "sprite.ps");
                assert_eq!(descriptor.kind, ProgramKind::Fragment);
                assert_eq!(descriptor.entry_point, "ps_main");
            }
            other => panic!("unexpected asset {other:?}"),
        }

        assert!(RawImporter
            .import(Path::new("sprite.hlsl"), b"void main() {}")
            .is_err());
    }

    #[test]
    fn unknown_extensions_are_rejected() {
        let err = RawImporter
            .import(Path::new("mesh.gltf"), b"{}")
            .unwrap_err();
        assert!(err.to_string().contains("'.gltf'"));
    }
}
