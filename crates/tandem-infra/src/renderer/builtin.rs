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

//! Built-in sprite programs and the materials made from them.

use anyhow::Context as _;
use tandem_core::context::EngineContext;
use tandem_core::renderer::{
    BlendMode, CullMode, GpuProgramDescriptor, GpuProgramHandle, Material, PipelineState,
    ProgramKind, TextureId,
};

const SPRITE_VS: &str = r#"
float halfViewportWidth;
float halfViewportHeight;
float4x4 worldTransform;

void vs_main(in float3 inPos : POSITION, in float2 uv : TEXCOORD0,
             out float4 oPosition : POSITION, out float2 oUv : TEXCOORD0)
{
    float4 world = mul(worldTransform, float4(inPos.xy, 0, 1));
    float x = ((world.x - 0.5f) / halfViewportWidth) - 1.0f;
    float y = ((world.y + 0.5f) / halfViewportHeight) + 1.0f;
    oPosition = float4(x, y, 0, 1);
    oUv = uv;
}
"#;

const SPRITE_TEXT_PS: &str = r#"
sampler2D mainTexture;

float4 ps_main(float2 uv : TEXCOORD0) : COLOR0
{
    return float4(1.0f, 1.0f, 1.0f, tex2D(mainTexture, uv).r);
}
"#;

const SPRITE_IMAGE_PS: &str = r#"
sampler2D mainTexture;

float4 ps_main(float2 uv : TEXCOORD0) : COLOR0
{
    return tex2D(mainTexture, uv);
}
"#;

/// Sampler slot the sprite programs read `mainTexture` from.
pub const MAIN_TEXTURE_SLOT: u32 = 0;

/// Compiles the sprite programs once and hands out materials using them.
#[derive(Debug, Clone)]
pub struct BuiltinMaterialFactory {
    text_vertex: GpuProgramHandle,
    text_fragment: GpuProgramHandle,
    image_vertex: GpuProgramHandle,
    image_fragment: GpuProgramHandle,
}

impl BuiltinMaterialFactory {
    /// Requests the sprite programs and blocks until all of them compiled.
    ///
    /// Programs are cached by name, so calling this again returns the same
    /// programs without recording anything.
    pub fn start_up(engine: &mut EngineContext<'_>) -> anyhow::Result<Self> {
        let mut request = |name: &str, source: &str, entry: &str, kind, profile: &str| {
            engine.programs.create(
                engine.context,
                GpuProgramDescriptor::new(name, source, entry, "hlsl", kind, profile),
            )
        };
        let factory = Self {
            text_vertex: request("SpriteText.vs", SPRITE_VS, "vs_main", ProgramKind::Vertex, "vs_3_0")?,
            text_fragment: request("SpriteText.ps", SPRITE_TEXT_PS, "ps_main", ProgramKind::Fragment, "ps_3_0")?,
            image_vertex: request("SpriteImage.vs", SPRITE_VS, "vs_main", ProgramKind::Vertex, "vs_2_0")?,
            image_fragment: request("SpriteImage.ps", SPRITE_IMAGE_PS, "ps_main", ProgramKind::Fragment, "ps_2_0")?,
        };

        for handle in factory.programs() {
            engine
                .context
                .wait_until_ready(&handle.ready)
                .with_context(|| format!("built-in program {:?} did not compile", handle.id))?;
        }
        log::debug!("Built-in sprite programs are ready.");
        Ok(factory)
    }

    fn programs(&self) -> [&GpuProgramHandle; 4] {
        [
            &self.text_vertex,
            &self.text_fragment,
            &self.image_vertex,
            &self.image_fragment,
        ]
    }

    /// An alpha-blended material drawing glyphs from a single-channel atlas.
    pub fn sprite_text_material(&self, atlas: TextureId) -> Material {
        Material::builder(
            "SpriteText",
            self.text_vertex.clone(),
            self.text_fragment.clone(),
        )
        .pipeline(sprite_pipeline(BlendMode::Alpha))
        .texture(MAIN_TEXTURE_SLOT, atlas)
        .build()
    }

    /// An opaque material drawing an image.
    pub fn sprite_image_material(&self, image: TextureId) -> Material {
        Material::builder(
            "SpriteImage",
            self.image_vertex.clone(),
            self.image_fragment.clone(),
        )
        .pipeline(sprite_pipeline(BlendMode::Opaque))
        .texture(MAIN_TEXTURE_SLOT, image)
        .build()
    }
}

fn sprite_pipeline(blend: BlendMode) -> PipelineState {
    PipelineState {
        blend,
        cull: CullMode::None,
        depth_test: false,
        depth_write: false,
    }
}
