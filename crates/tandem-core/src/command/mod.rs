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

//! Deferred render commands and the queue that carries them to the render thread.
//!
//! A [`Command`] is a closed set of operations, each carrying its captured
//! arguments. Producers never execute commands; they append them to a
//! [`CommandQueue`], and the render thread drains the queue as one
//! [`CommandBatch`] and dispatches every command with a `match`.

mod batch;
mod queue;

pub use self::batch::{BatchReport, CommandBatch, CommandFailure};
pub use self::queue::CommandQueue;

use crate::renderer::types::{
    BufferDescriptor, BufferId, DrawCall, GpuProgram, GpuProgramDescriptor, ParamValue,
    PassDescriptor, PipelineState, ProgramId, TextureDescriptor, TextureId,
};
use crate::sync::Completer;

/// One deferred unit of render work.
///
/// Creation commands carry the [`Completer`] of the readiness token handed to
/// the producer. The render thread settles it after running the command,
/// whether the command succeeded or not.
#[derive(Debug)]
pub enum Command {
    /// Compile a GPU program under a pre-allocated id.
    CreateGpuProgram {
        /// Id allocated by the producer.
        id: ProgramId,
        /// What to compile.
        descriptor: GpuProgramDescriptor,
        /// Settled with the compiled program.
        ready: Completer<GpuProgram>,
    },
    /// Release a GPU program.
    DestroyGpuProgram(ProgramId),
    /// Create a buffer, optionally filled with initial contents.
    CreateBuffer {
        /// Id allocated by the producer.
        id: BufferId,
        /// Buffer description.
        descriptor: BufferDescriptor,
        /// Initial contents; must not exceed `descriptor.size`.
        contents: Option<Vec<u8>>,
        /// Settled once the buffer exists.
        ready: Completer<BufferId>,
    },
    /// Overwrite part of a buffer.
    WriteBuffer {
        /// Target buffer.
        id: BufferId,
        /// Byte offset into the buffer.
        offset: u64,
        /// Bytes to write.
        data: Vec<u8>,
    },
    /// Release a buffer.
    DestroyBuffer(BufferId),
    /// Create a texture, optionally filled with texels.
    CreateTexture {
        /// Id allocated by the producer.
        id: TextureId,
        /// Texture description.
        descriptor: TextureDescriptor,
        /// Initial texels; must match the descriptor's byte size.
        texels: Option<Vec<u8>>,
        /// Settled once the texture exists.
        ready: Completer<TextureId>,
    },
    /// Release a texture.
    DestroyTexture(TextureId),
    /// Begin a render pass.
    BeginPass(PassDescriptor),
    /// End the current render pass.
    EndPass,
    /// Set fixed-function pipeline state.
    SetPipelineState(PipelineState),
    /// Bind a program to the stage it was compiled for.
    BindProgram(ProgramId),
    /// Assign a value to a parameter of the bound programs.
    SetParameter {
        /// Parameter name.
        name: String,
        /// New value.
        value: ParamValue,
    },
    /// Bind a texture to a sampler slot.
    BindTexture {
        /// Sampler slot.
        slot: u32,
        /// Texture to bind.
        texture: TextureId,
    },
    /// Issue a draw call.
    Draw(DrawCall),
    /// Present the frame.
    Present,
    /// Insert a labelled marker into the device's command stream.
    DebugMarker(String),
    /// Pump platform (window/input) events on the render thread.
    PumpPlatformEvents,
    /// Advance resource streaming on the render thread.
    UpdateResources,
    /// Settle a token once every earlier command of the batch has run.
    Signal(Completer<()>),
}

impl Command {
    /// A stable name for the command's kind, used in diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            Command::CreateGpuProgram { .. } => "CreateGpuProgram",
            Command::DestroyGpuProgram(_) => "DestroyGpuProgram",
            Command::CreateBuffer { .. } => "CreateBuffer",
            Command::WriteBuffer { .. } => "WriteBuffer",
            Command::DestroyBuffer(_) => "DestroyBuffer",
            Command::CreateTexture { .. } => "CreateTexture",
            Command::DestroyTexture(_) => "DestroyTexture",
            Command::BeginPass(_) => "BeginPass",
            Command::EndPass => "EndPass",
            Command::SetPipelineState(_) => "SetPipelineState",
            Command::BindProgram(_) => "BindProgram",
            Command::SetParameter { .. } => "SetParameter",
            Command::BindTexture { .. } => "BindTexture",
            Command::Draw(_) => "Draw",
            Command::Present => "Present",
            Command::DebugMarker(_) => "DebugMarker",
            Command::PumpPlatformEvents => "PumpPlatformEvents",
            Command::UpdateResources => "UpdateResources",
            Command::Signal(_) => "Signal",
        }
    }

    /// Returns `true` for commands that settle a readiness token.
    pub fn settles_token(&self) -> bool {
        matches!(
            self,
            Command::CreateGpuProgram { .. }
                | Command::CreateBuffer { .. }
                | Command::CreateTexture { .. }
                | Command::Signal(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::ReadinessToken;

    #[test]
    fn labels_name_the_variant() {
        assert_eq!(Command::Present.label(), "Present");
        assert_eq!(
            Command::DebugMarker("frame".to_string()).label(),
            "DebugMarker"
        );
        assert_eq!(Command::UpdateResources.label(), "UpdateResources");
    }

    #[test]
    fn creation_commands_settle_tokens() {
        let (_token, completer) = ReadinessToken::<()>::pending();
        assert!(Command::Signal(completer).settles_token());
        assert!(!Command::EndPass.settles_token());
    }
}
