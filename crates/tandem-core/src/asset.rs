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

//! Asset import and resource streaming contracts.
//!
//! Producers ask for a file with [`ResourceRequests::load`] and get a
//! readiness token back. A [`ResourceStreamer`] running on the render thread
//! picks the requests up when an `UpdateResources` command executes, imports
//! them through an [`AssetImporter`] and creates the device objects.

use crate::renderer::device::RenderDevice;
use crate::renderer::types::{
    BufferDescriptor, BufferId, GpuProgram, GpuProgramDescriptor, TextureDescriptor, TextureId,
};
use crate::sync::{Completer, ReadinessToken};
use std::path::{Path, PathBuf};

/// The device-independent result of importing a file.
#[derive(Debug, Clone)]
pub enum ImportedAsset {
    /// Raw buffer contents.
    Buffer {
        /// Buffer description.
        descriptor: BufferDescriptor,
        /// Bytes to upload.
        contents: Vec<u8>,
    },
    /// Texture texels.
    Texture {
        /// Texture description.
        descriptor: TextureDescriptor,
        /// Texels to upload.
        texels: Vec<u8>,
    },
    /// A GPU program to compile.
    Program(GpuProgramDescriptor),
}

/// Turns file bytes into an [`ImportedAsset`].
pub trait AssetImporter: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Lower-case file extensions this importer handles, without the dot.
    fn extensions(&self) -> &[&'static str];

    /// Decodes `bytes`, read from `path`.
    fn import(&self, path: &Path, bytes: &[u8]) -> anyhow::Result<ImportedAsset>;
}

/// A resource that finished loading on the render thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadedResource {
    /// A buffer now exists on the device.
    Buffer {
        /// Device id.
        id: BufferId,
        /// Size in bytes.
        size: u64,
    },
    /// A texture now exists on the device.
    Texture {
        /// Device id.
        id: TextureId,
        /// Width in texels.
        width: u32,
        /// Height in texels.
        height: u32,
    },
    /// A program compiled.
    Program(GpuProgram),
}

/// A queued load, consumed by a [`ResourceStreamer`].
#[derive(Debug)]
pub struct LoadRequest {
    /// File to load, relative to the streamer's root unless absolute.
    pub path: PathBuf,
    /// Settled with the loaded resource.
    pub ready: Completer<LoadedResource>,
}

/// Producer-side handle for requesting resource loads. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ResourceRequests {
    sender: crossbeam_channel::Sender<LoadRequest>,
}

impl ResourceRequests {
    /// Creates a request handle and the receiver a streamer consumes.
    pub fn channel() -> (Self, crossbeam_channel::Receiver<LoadRequest>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self { sender }, receiver)
    }

    /// Queues a load and returns its readiness token.
    ///
    /// If the streamer is gone the token fails with `Abandoned` right away.
    pub fn load(&self, path: impl Into<PathBuf>) -> ReadinessToken<LoadedResource> {
        let (token, ready) = ReadinessToken::pending();
        let path = path.into();
        if let Err(err) = self.sender.send(LoadRequest { path, ready }) {
            let request = err.into_inner();
            log::warn!(
                "Resource streamer is gone; dropping load of {}",
                request.path.display()
            );
        }
        token
    }

    /// Number of loads waiting for the streamer.
    pub fn queued(&self) -> usize {
        self.sender.len()
    }
}

/// Advances resource streaming. Runs on the render thread when an
/// `UpdateResources` command executes.
pub trait ResourceStreamer: Send {
    /// Processes queued work against the device and returns how many
    /// resources were settled.
    fn update(&mut self, device: &mut dyn RenderDevice) -> anyhow::Result<usize>;
}
